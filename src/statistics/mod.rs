use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::types::Row;

/// One series of a chart, in the shape chart widgets consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<u64>,
    pub background_color: Vec<String>,
}

/// Category labels with per-label counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Counts of the first dataset, or an empty slice.
    pub fn counts(&self) -> &[u64] {
        self.datasets.first().map(|d| d.data.as_slice()).unwrap_or(&[])
    }
}

/// Dashboard summary for one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSummary {
    pub total_records: u64,
    pub recent_records: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_breakdown: Option<BTreeMap<String, u64>>,
}

/// Sum and mean over the non-null values of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueStats {
    pub total: f64,
    pub average: f64,
    pub count: usize,
}

/// Count rows per distinct value of `column`, in first-seen label order.
///
/// Null or missing values are counted under `unknown_label`. Colors cycle
/// through `palette` by label position. No rows gives a series with no
/// datasets.
pub fn group_counts(rows: &[Row], column: &str, unknown_label: &str, palette: &[String]) -> ChartSeries {
    let mut labels: Vec<String> = Vec::new();
    let mut counts: Vec<u64> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let label = row
            .get(column)
            .to_label()
            .unwrap_or_else(|| unknown_label.to_string());

        match index.get(&label).copied() {
            Some(i) => counts[i] += 1,
            None => {
                index.insert(label.clone(), labels.len());
                labels.push(label);
                counts.push(1);
            }
        }
    }

    if labels.is_empty() {
        return ChartSeries::default();
    }

    let background_color = if palette.is_empty() {
        Vec::new()
    } else {
        (0..labels.len()).map(|i| palette[i % palette.len()].clone()).collect()
    };

    ChartSeries {
        labels,
        datasets: vec![Dataset {
            label: format!("Count by {}", column),
            data: counts,
            background_color,
        }],
    }
}

/// Count rows per non-null value of `column`.
///
/// Unlike `group_counts`, null values are dropped rather than bucketed.
/// Returns `None` when no row has a value.
pub fn breakdown(rows: &[Row], column: &str) -> Option<BTreeMap<String, u64>> {
    let mut counts = BTreeMap::new();
    for label in rows.iter().filter_map(|row| row.get(column).to_label()) {
        *counts.entry(label).or_insert(0) += 1;
    }
    if counts.is_empty() {
        None
    } else {
        Some(counts)
    }
}

/// Sum and average of the non-null values in `column`; `None` if there are none.
pub fn value_stats(rows: &[Row], column: &str) -> Option<ValueStats> {
    let values: Vec<f64> = rows
        .iter()
        .map(|row| row.get(column))
        .filter(|v| !v.is_null())
        .map(|v| v.to_number())
        .collect();

    if values.is_empty() {
        return None;
    }

    let total: f64 = values.iter().sum();
    Some(ValueStats {
        total,
        average: total / values.len() as f64,
        count: values.len(),
    })
}
