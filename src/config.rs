use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Longest accepted recent-records window, one hundred years.
pub const MAX_RECENT_WINDOW_HOURS: i64 = 24 * 365 * 100;

/// Display colors handed out to chart labels by position.
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#3B82F6", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#06B6D4", "#84CC16", "#F97316",
    "#EC4899", "#6B7280",
];

/// Column conventions and defaults shared by every dashboard operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Newest-first ordering and the recent-records window use this column.
    pub created_at_column: String,
    pub status_column: String,
    pub recent_window_hours: i64,
    /// Chart label for rows whose group column is null.
    pub unknown_label: String,
    pub palette: Vec<String>,
    pub default_page_size: usize,
    pub default_rank_limit: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            created_at_column: "created_at".to_string(),
            status_column: "status".to_string(),
            recent_window_hours: 24,
            unknown_label: "Unknown".to_string(),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            default_page_size: 10,
            default_rank_limit: 10,
        }
    }
}

impl ServiceConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: ServiceConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.created_at_column.is_empty() || self.status_column.is_empty() {
            return Err(Error::Config("column names must not be empty".into()));
        }
        if self.recent_window_hours <= 0 || self.recent_window_hours > MAX_RECENT_WINDOW_HOURS {
            return Err(Error::Config(format!(
                "recent_window_hours must be between 1 and {}, got {}",
                MAX_RECENT_WINDOW_HOURS, self.recent_window_hours
            )));
        }
        if self.palette.is_empty() {
            return Err(Error::Config("palette must contain at least one color".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.palette.len(), 10);
        assert_eq!(config.palette[0], "#3B82F6");
    }

    #[test]
    fn test_partial_file() -> Result<(), Error> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{"status_column": "stage", "recent_window_hours": 48}}"#)?;

        let config = ServiceConfig::load(file.path())?;
        assert_eq!(config.status_column, "stage");
        assert_eq!(config.recent_window_hours, 48);
        assert_eq!(config.created_at_column, "created_at");

        Ok(())
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = ServiceConfig {
            recent_window_hours: 0,
            ..ServiceConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = ServiceConfig {
            recent_window_hours: 3_000_000_000,
            ..ServiceConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = ServiceConfig {
            palette: Vec::new(),
            ..ServiceConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
