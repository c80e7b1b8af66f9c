//! HTTP transport for the stockbook engine.

pub mod app;
