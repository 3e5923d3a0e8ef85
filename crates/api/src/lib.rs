//! HTTP API for the investor reporting core.

pub mod app;
pub mod config;
pub mod context;
pub mod demo;
pub mod middleware;
pub mod query;
pub mod rate_limit;
pub mod report_service;
