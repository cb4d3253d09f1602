//! Query Dashboard - run a fixed catalog of SQL queries from the browser.
//!
//! This library exposes the core modules for use in integration tests.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod web;
