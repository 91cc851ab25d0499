// ⚙️ Engine Configuration - Category tables + aggregation size
//
// JSON file, every key optional:
//   { "club_team_size": 5, "tables": { "divisions": { "MasterI": ["M1"] } } }

use crate::categories::CategoryTables;
use crate::ranking::DEFAULT_CLUB_TEAM_SIZE;
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tables: CategoryTables,

    /// Best N scores per club summed for the club standings
    pub club_team_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            tables: CategoryTables::default(),
            club_team_size: DEFAULT_CLUB_TEAM_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: EngineConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.club_team_size == 0 {
            errors.push("club_team_size must be at least 1".to_string());
        }
        if let Err(table_errors) = self.tables.validate() {
            errors.extend(table_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Division;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.club_team_size, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "club_team_size": 3 }}"#).unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.club_team_size, 3);
        assert_eq!(config.tables, CategoryTables::default());
    }

    #[test]
    fn test_tables_override_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{ "tables": {{ "divisions": {{ "Open": ["Open", "Apsolutno"] }} }} }}"#
        )
        .unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(
            config.tables.divisions.get(&Division::Open),
            Some(&vec!["Open".to_string(), "Apsolutno".to_string()])
        );
        assert!(!config.tables.divisions.contains_key(&Division::Junior));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut config = EngineConfig::default();
        config.club_team_size = 0;
        config.tables.equipped_markers = vec![String::new()];

        let errors = config.validate().unwrap_err();
        assert!(errors.len() >= 2, "{:?}", errors);
        assert!(errors.iter().any(|e| e.contains("club_team_size")));
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(EngineConfig::from_file("/nonexistent/config.json").is_err());
        assert!(EngineConfig::load_or_default(None).is_ok());
    }
}
