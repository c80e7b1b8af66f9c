use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use stockbook_core::{DomainError, ItemId};
use stockbook_transactions::{Direction, Page, Sort, TransactionFilter};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", post(submit_transaction).get(list_transactions))
}

/// POST /transactions — apply one stock movement.
///
/// Validation order matches the engine contract: quantity positivity first,
/// then the transaction type vocabulary, then existence/sufficiency inside
/// the engine.
pub async fn submit_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SubmitTransactionRequest>,
) -> axum::response::Response {
    if body.quantity <= 0 {
        return errors::domain_error_to_response(DomainError::validation(
            "quantity must be greater than zero",
        ));
    }

    let direction = match Direction::parse(&body.kind) {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let item_id: ItemId = match body.item_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"),
    };

    match services.engine.submit(item_id, body.quantity, direction) {
        Ok(committed) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "item": dto::item_to_json(&committed.item),
                "transaction": committed.transaction,
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// GET /transactions?item_id=..&direction=out&quantity_gte=5&sort=quantity desc&page=2&page_size=10
///
/// `page`, `page_size` and `sort` are reserved parameters; every other
/// parameter is a filter predicate over the closed field set and unknown
/// fields are rejected.
pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let mut page_number = None;
    let mut page_size = None;
    let mut sort = Sort::default();
    let mut filter_pairs: Vec<(&str, &str)> = Vec::new();

    for (key, value) in &params {
        match key.as_str() {
            "page" => match value.parse::<u32>() {
                Ok(n) => page_number = Some(n),
                Err(_) => {
                    return errors::json_error(
                        StatusCode::BAD_REQUEST,
                        "validation_error",
                        format!("invalid page: {value}"),
                    );
                }
            },
            "page_size" => match value.parse::<u32>() {
                Ok(n) => page_size = Some(n),
                Err(_) => {
                    return errors::json_error(
                        StatusCode::BAD_REQUEST,
                        "validation_error",
                        format!("invalid page size: {value}"),
                    );
                }
            },
            "sort" => match Sort::parse(value) {
                Ok(s) => sort = s,
                Err(e) => return errors::domain_error_to_response(e),
            },
            _ => filter_pairs.push((key.as_str(), value.as_str())),
        }
    }

    let filter = match TransactionFilter::parse(filter_pairs) {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let page = match Page::new(page_number, page_size, services.engine.config().max_page_size) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.engine.query(&filter, sort, page) {
        Ok((views, meta)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "data": views,
                "meta": meta,
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
