// src/lib.rs
//! Dashboard data access over a hosted table store.
//!
//! [`DashboardService`] turns high-level dashboard requests (full listings,
//! pages, grouped counts for charts, summary statistics, ranked lists) into
//! queries against a [`TableClient`] and reshapes the rows it gets back.

pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod service;
pub mod statistics;
pub mod types;

pub use client::{MemoryClient, TableClient};
pub use config::ServiceConfig;
pub use error::Error;
pub use query::{Condition, OrderDirection, QueryResponse, SelectQuery};
pub use service::{DashboardService, Page, RankOptions};
pub use statistics::{ChartSeries, StatisticsSummary};
pub use types::{Row, Value};
