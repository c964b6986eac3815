use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::client::TableClient;
use crate::config::ServiceConfig;
use crate::error::Error;
use crate::query::{OrderDirection, SelectQuery};
use crate::statistics::{self, ChartSeries, StatisticsSummary};
use crate::types::Row;

/// One page of rows plus the size of the whole result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub rows: Vec<Row>,
    pub total_count: u64,
}

/// Parameters for `ranked` beyond the value column.
#[derive(Debug, Clone, PartialEq)]
pub struct RankOptions {
    /// Column a caller displays next to each value. Not used to filter or project.
    pub name_column: String,
    pub limit: usize,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            name_column: "name".to_string(),
            limit: 10,
        }
    }
}

/// Dashboard reads over a remote table store.
///
/// Every operation comes in two forms. `try_*` returns the backend error so
/// callers can tell a failed query from an empty table. The plain form logs
/// the error and returns an empty value instead: no rows, a zero count, an
/// empty chart, or a zeroed summary.
pub struct DashboardService<C> {
    client: C,
    config: ServiceConfig,
}

impl<C: TableClient> DashboardService<C> {
    pub fn new(client: C) -> Self {
        Self::with_config(client, ServiceConfig::default())
    }

    pub fn with_config(client: C, config: ServiceConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// All rows of `table`, newest first.
    pub async fn try_list(&self, table: &str) -> Result<Vec<Row>, Error> {
        debug!(table, "list");
        let query = SelectQuery::from(table)
            .select_all()
            .order(&self.config.created_at_column, OrderDirection::Descending);
        Ok(self.client.select(&query).await?.rows)
    }

    pub async fn list(&self, table: &str) -> Vec<Row> {
        fail_soft("list", table, self.try_list(table).await)
    }

    /// Rows `[page*page_size, page*page_size + page_size - 1]`, newest first,
    /// with the exact row count of the table.
    pub async fn try_page(&self, table: &str, page: usize, page_size: usize) -> Result<Page, Error> {
        debug!(table, page, page_size, "page");

        if page_size == 0 {
            let query = SelectQuery::from(table).count_exact().head();
            let response = self.client.select(&query).await?;
            return Ok(Page {
                rows: Vec::new(),
                total_count: response.count.unwrap_or(0),
            });
        }

        let from = page
            .checked_mul(page_size)
            .and_then(|from| from.checked_add(page_size - 1).map(|to| (from, to)));
        let (from, to) = from.ok_or_else(|| {
            Error::InvalidRequest(format!("page {} of size {} is out of range", page, page_size))
        })?;

        let query = SelectQuery::from(table)
            .select_all()
            .count_exact()
            .order(&self.config.created_at_column, OrderDirection::Descending)
            .range(from, to);
        let response = self.client.select(&query).await?;

        Ok(Page {
            rows: response.rows,
            total_count: response.count.unwrap_or(0),
        })
    }

    pub async fn page(&self, table: &str, page: usize, page_size: usize) -> Page {
        fail_soft("page", table, self.try_page(table, page, page_size).await)
    }

    /// Row counts per distinct value of `column`, for a pie or bar chart.
    ///
    /// Rows where `column` is null land under the configured unknown label
    /// ("Unknown"). Note that `statistics` drops null statuses instead.
    pub async fn try_grouped_counts(&self, table: &str, column: &str) -> Result<ChartSeries, Error> {
        debug!(table, column, "grouped counts");
        let query = SelectQuery::from(table).select_all();
        let rows = self.client.select(&query).await?.rows;

        Ok(statistics::group_counts(
            &rows,
            column,
            &self.config.unknown_label,
            &self.config.palette,
        ))
    }

    pub async fn grouped_counts(&self, table: &str, column: &str) -> ChartSeries {
        fail_soft("grouped counts", table, self.try_grouped_counts(table, column).await)
    }

    /// Summary figures for `table` as of now.
    pub async fn try_statistics(
        &self,
        table: &str,
        value_column: Option<&str>,
    ) -> Result<StatisticsSummary, Error> {
        self.try_statistics_at(table, value_column, Utc::now()).await
    }

    /// Summary figures for `table`, with the recent window ending at `now`.
    ///
    /// Round-trips run one after another: total count, recent count, the
    /// value column (if any), then the status column. A table without a
    /// status column gets no breakdown; any other failure aborts.
    pub async fn try_statistics_at(
        &self,
        table: &str,
        value_column: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<StatisticsSummary, Error> {
        debug!(table, value_column = ?value_column, "statistics");

        let total = self
            .client
            .select(&SelectQuery::from(table).count_exact().head())
            .await?;

        let since = TimeDelta::try_hours(self.config.recent_window_hours)
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| {
                Error::InvalidRequest(format!(
                    "recent window of {} hours is out of range",
                    self.config.recent_window_hours
                ))
            })?;
        let recent = self
            .client
            .select(
                &SelectQuery::from(table)
                    .count_exact()
                    .head()
                    .gte(&self.config.created_at_column, since),
            )
            .await?;

        let mut summary = StatisticsSummary {
            total_records: total.count.unwrap_or(0),
            recent_records: recent.count.unwrap_or(0),
            ..StatisticsSummary::default()
        };

        if let Some(column) = value_column {
            let query = SelectQuery::from(table).select(column).not_null(column);
            let rows = self.client.select(&query).await?.rows;
            if let Some(stats) = statistics::value_stats(&rows, column) {
                summary.total_value = Some(stats.total);
                summary.average_value = Some(stats.average);
            }
        }

        let status = &self.config.status_column;
        let query = SelectQuery::from(table).select(status).not_null(status);
        match self.client.select(&query).await {
            Ok(response) => summary.status_breakdown = statistics::breakdown(&response.rows, status),
            Err(e @ Error::UnknownColumn { .. }) => debug!(table, error = %e, "no status breakdown"),
            Err(e) => return Err(e),
        }

        Ok(summary)
    }

    pub async fn statistics(&self, table: &str, value_column: Option<&str>) -> StatisticsSummary {
        fail_soft("statistics", table, self.try_statistics(table, value_column).await)
    }

    /// Top rows by `value_column`, highest first, skipping rows without a value.
    pub async fn try_ranked(
        &self,
        table: &str,
        value_column: &str,
        options: &RankOptions,
    ) -> Result<Vec<Row>, Error> {
        debug!(
            table,
            value_column,
            name_column = %options.name_column,
            limit = options.limit,
            "ranked"
        );
        let query = SelectQuery::from(table)
            .select_all()
            .not_null(value_column)
            .order(value_column, OrderDirection::Descending)
            .limit(options.limit);
        Ok(self.client.select(&query).await?.rows)
    }

    pub async fn ranked(&self, table: &str, value_column: &str, options: &RankOptions) -> Vec<Row> {
        fail_soft("ranked", table, self.try_ranked(table, value_column, options).await)
    }

    /// Rank options seeded from the configured default limit.
    pub fn rank_options(&self) -> RankOptions {
        RankOptions {
            limit: self.config.default_rank_limit,
            ..RankOptions::default()
        }
    }
}

fn fail_soft<T: Default>(operation: &str, table: &str, result: Result<T, Error>) -> T {
    result.unwrap_or_else(|e| {
        error!(operation, table, error = %e, "query failed, returning empty result");
        T::default()
    })
}
