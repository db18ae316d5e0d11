//! Chat history persistence and the chat request orchestration.
//!
//! `HistoryStore` is implemented by the infrastructure layer once per
//! backend; `RoutedHistoryStore` picks the backend from the identity kind.

pub mod error;
pub mod repository;
pub mod routed;
pub mod service;
