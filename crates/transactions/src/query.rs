//! Read-side query model: filter predicates, sorting, pagination.
//!
//! The filterable and sortable fields form a closed set fixed at compile
//! time. Unknown fields are rejected at parse time rather than silently
//! ignored, so a typo can never produce an accidentally unfiltered query.

use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use stockbook_core::{DomainError, DomainResult, ItemId};
use stockbook_inventory::ItemSnapshot;

use crate::record::{Direction, Transaction};

/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Comparison operator for range predicates.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Cmp {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
}

fn cmp_holds<T: PartialOrd>(op: Cmp, left: &T, right: &T) -> bool {
    match op {
        Cmp::Eq => left == right,
        Cmp::Gt => left > right,
        Cmp::Lt => left < right,
        Cmp::Gte => left >= right,
        Cmp::Lte => left <= right,
    }
}

/// Split a raw filter key into field name and comparison operator.
fn split_operator(key: &str) -> (&str, Cmp) {
    for (suffix, op) in [
        ("_gte", Cmp::Gte),
        ("_lte", Cmp::Lte),
        ("_gt", Cmp::Gt),
        ("_lt", Cmp::Lt),
    ] {
        if let Some(field) = key.strip_suffix(suffix) {
            return (field, op);
        }
    }
    (key, Cmp::Eq)
}

/// Conjunction of predicates over the closed set of filterable fields:
/// equality on `item_id` and `direction`, comparisons on `quantity` and
/// `created_at`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub item_id: Option<ItemId>,
    pub direction: Option<Direction>,
    quantity: Vec<(Cmp, i64)>,
    created_at: Vec<(Cmp, DateTime<Utc>)>,
}

impl TransactionFilter {
    /// Parse raw `field[_operator] = value` pairs into a typed filter.
    pub fn parse<'a, I>(pairs: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut filter = Self::default();

        for (key, value) in pairs {
            let (field, op) = split_operator(key);
            match field {
                "item_id" => {
                    if op != Cmp::Eq {
                        return Err(DomainError::validation(
                            "filter operator not supported for field: item_id",
                        ));
                    }
                    filter.item_id = Some(value.parse()?);
                }
                "direction" => {
                    if op != Cmp::Eq {
                        return Err(DomainError::validation(
                            "filter operator not supported for field: direction",
                        ));
                    }
                    filter.direction = Some(Direction::parse(value)?);
                }
                "quantity" => {
                    let quantity: i64 = value.parse().map_err(|_| {
                        DomainError::validation(format!("invalid quantity filter value: {value}"))
                    })?;
                    filter.quantity.push((op, quantity));
                }
                "created_at" => {
                    let instant = DateTime::parse_from_rfc3339(value)
                        .map_err(|e| {
                            DomainError::validation(format!("invalid created_at filter value: {e}"))
                        })?
                        .with_timezone(&Utc);
                    filter.created_at.push((op, instant));
                }
                other => {
                    return Err(DomainError::validation(format!(
                        "unknown filter field: {other}"
                    )));
                }
            }
        }

        Ok(filter)
    }

    /// Add an equality predicate on the item.
    pub fn for_item(mut self, item_id: ItemId) -> Self {
        self.item_id = Some(item_id);
        self
    }

    pub(crate) fn matches(&self, record: &Transaction) -> bool {
        if let Some(item_id) = &self.item_id {
            if record.item_id != *item_id {
                return false;
            }
        }
        if let Some(direction) = &self.direction {
            if record.direction != *direction {
                return false;
            }
        }
        self.quantity
            .iter()
            .all(|(op, value)| cmp_holds(*op, &record.quantity, value))
            && self
                .created_at
                .iter()
                .all(|(op, value)| cmp_holds(*op, &record.created_at, value))
    }
}

/// Sortable fields (closed set; extensible by adding a variant).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SortField {
    Quantity,
    CreatedAt,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort key plus direction.
///
/// Ties are always broken by record id ascending, so the resulting order is
/// total and pagination stays stable across repeated calls even when the
/// sort key has duplicate values.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Asc,
        }
    }
}

impl Sort {
    /// Parse `"field"` or `"field direction"` (e.g. `"quantity desc"`).
    pub fn parse(s: &str) -> DomainResult<Self> {
        let mut tokens = s.split_whitespace();

        let field = match tokens.next() {
            Some("quantity") => SortField::Quantity,
            Some("created_at") => SortField::CreatedAt,
            Some(other) => {
                return Err(DomainError::validation(format!(
                    "unknown sort field: {other}"
                )));
            }
            None => return Err(DomainError::validation("sort expression cannot be empty")),
        };

        let direction = match tokens.next() {
            None => SortDirection::Asc,
            Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(other) => {
                return Err(DomainError::validation(format!(
                    "unknown sort direction: {other}"
                )));
            }
        };

        if tokens.next().is_some() {
            return Err(DomainError::validation(
                "sort expression must be \"field\" or \"field direction\"",
            ));
        }

        Ok(Self { field, direction })
    }

    pub(crate) fn ordering(&self, a: &Transaction, b: &Transaction) -> Ordering {
        let key = match self.field {
            SortField::Quantity => a.quantity.cmp(&b.quantity),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        let key = match self.direction {
            SortDirection::Asc => key,
            SortDirection::Desc => key.reverse(),
        };
        key.then(a.id.cmp(&b.id))
    }
}

/// 1-based page selection with a clamped size.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Page {
    number: u32,
    size: u32,
}

impl Page {
    /// Build a page selection, clamping the size to `max_size`.
    ///
    /// Missing values default to page 1 with [`DEFAULT_PAGE_SIZE`]. A page
    /// or size of zero is rejected.
    pub fn new(number: Option<u32>, size: Option<u32>, max_size: u32) -> DomainResult<Self> {
        let number = number.unwrap_or(1);
        if number == 0 {
            return Err(DomainError::validation("page must be at least 1"));
        }

        let size = size.unwrap_or(DEFAULT_PAGE_SIZE);
        if size == 0 {
            return Err(DomainError::validation("page size must be at least 1"));
        }

        Ok(Self {
            number,
            size: size.min(max_size),
        })
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub(crate) fn meta(&self, total: u64) -> PageMeta {
        PageMeta {
            total,
            page: self.number,
            page_size: self.size,
            total_pages: total.div_ceil(u64::from(self.size)) as u32,
        }
    }

    pub(crate) fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = (self.number as usize - 1) * self.size as usize;
        items
            .into_iter()
            .skip(offset)
            .take(self.size as usize)
            .collect()
    }
}

/// Pagination metadata returned beside every page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// One log record joined with the current state of the item it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    pub transaction: Transaction,
    pub item: ItemSnapshot,
}
