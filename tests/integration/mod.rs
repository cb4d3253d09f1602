//! Integration tests for the query dashboard.

pub mod postgres_test;
pub mod sqlite_test;
pub mod web_test;
