// 🏷️ Category Normalizer - Synonym tables as data
// Maps free-text equipment and division strings to canonical categories
//
// Lookup key = lowercase alphanumerics only, so "Master 1", "master-1" and
// "MASTER1" all hit the same entry. An unknown value is an error, never a
// default: a miscategorized lifter is worse than a stopped run.

use crate::error::{CategoryField, EngineError};
use crate::record::{Division, Equipment};
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;

// ============================================================================
// TABLES (configuration)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoryTables {
    /// Canonical equipment → accepted spellings
    pub equipment: BTreeMap<Equipment, Vec<String>>,

    /// Canonical division → accepted spellings
    pub divisions: BTreeMap<Division, Vec<String>>,

    /// Division tokens that force Equipped ("Open-EQ", "Junior EQ")
    pub equipped_markers: Vec<String>,

    /// Words stripped from division text before lookup
    /// (OpenPowerlifting style "Men's Raw Masters 2 Bench Only")
    pub division_noise: Vec<String>,

    /// Division text starting with one of these is not a ranked entry
    pub unranked_division_prefixes: Vec<String>,

    /// Division tokens marking entries outside the ranking ("Open-OSI")
    pub unranked_division_markers: Vec<String>,

    /// Equipment assumed when the source leaves the field blank
    pub blank_equipment: Option<Equipment>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for CategoryTables {
    fn default() -> Self {
        let mut equipment = BTreeMap::new();
        equipment.insert(
            Equipment::Raw,
            strings(&["Raw", "Sleeves", "Wraps", "Straps", "Classic"]),
        );
        equipment.insert(
            Equipment::Equipped,
            strings(&["Equipped", "Single-ply", "Multi-ply", "Unlimited"]),
        );

        let mut divisions = BTreeMap::new();
        divisions.insert(
            Division::SubJunior,
            strings(&["Sub-Junior", "Sub-Juniors", "Kadet", "Kadeti", "T1", "Teen"]),
        );
        divisions.insert(
            Division::Junior,
            strings(&["Junior", "Juniors", "Juniori", "Jun"]),
        );
        divisions.insert(
            Division::Open,
            strings(&["Open", "Senior", "Seniors", "Seniori"]),
        );
        divisions.insert(
            Division::MasterI,
            strings(&["Master I", "Master 1", "Masters I", "Masters 1", "M1", "Veterani 1"]),
        );
        divisions.insert(
            Division::MasterII,
            strings(&["Master II", "Master 2", "Masters II", "Masters 2", "M2", "Veterani 2"]),
        );
        divisions.insert(
            Division::MasterIII,
            strings(&["Master III", "Master 3", "Masters III", "Masters 3", "M3", "Veterani 3"]),
        );
        divisions.insert(
            Division::MasterIV,
            strings(&["Master IV", "Master 4", "Masters IV", "Masters 4", "M4", "Veterani 4"]),
        );
        divisions.insert(
            Division::Guest,
            strings(&["Guest", "Guests", "Gost", "Gosti"]),
        );

        CategoryTables {
            equipment,
            divisions,
            equipped_markers: strings(&["eq", "equipped"]),
            division_noise: strings(&[
                "men's", "mens", "women's", "womens", "raw", "classic", "bench only",
                "powerlifting", "full power",
            ]),
            unranked_division_prefixes: strings(&["best"]),
            unranked_division_markers: strings(&["osi"]),
            blank_equipment: Some(Equipment::Raw),
        }
    }
}

impl CategoryTables {
    /// Load tables from a JSON file; missing keys fall back to the defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read category tables: {:?}", path.as_ref()))?;

        let tables: CategoryTables =
            serde_json::from_str(&content).context("Failed to parse category tables JSON")?;

        Ok(tables)
    }

    /// Check the tables; returns every problem found, not just the first
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let mut seen_equipment: HashMap<String, Equipment> = HashMap::new();
        for (canonical, synonyms) in &self.equipment {
            for synonym in synonyms {
                let key = lookup_key(synonym);
                if key.is_empty() {
                    errors.push(format!("equipment.{:?}: empty synonym", canonical));
                    continue;
                }
                if let Some(previous) = seen_equipment.insert(key, *canonical) {
                    if previous != *canonical {
                        errors.push(format!(
                            "equipment: '{}' maps to both {:?} and {:?}",
                            synonym, previous, canonical
                        ));
                    }
                }
            }
        }

        let mut seen_divisions: HashMap<String, Division> = HashMap::new();
        for (canonical, synonyms) in &self.divisions {
            for synonym in synonyms {
                let key = lookup_key(synonym);
                if key.is_empty() {
                    errors.push(format!("divisions.{:?}: empty synonym", canonical));
                    continue;
                }
                if let Some(previous) = seen_divisions.insert(key, *canonical) {
                    if previous != *canonical {
                        errors.push(format!(
                            "divisions: '{}' maps to both {:?} and {:?}",
                            synonym, previous, canonical
                        ));
                    }
                }
            }
        }

        for marker in self
            .equipped_markers
            .iter()
            .chain(self.unranked_division_markers.iter())
        {
            if lookup_key(marker).is_empty() {
                errors.push("division markers: empty marker".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ============================================================================
// KEY HELPERS
// ============================================================================

/// Case/spacing-insensitive lookup key
pub fn lookup_key(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Last '-'-separated segment of a word, if the word has more than one
fn dash_suffix(word: &str) -> Option<(&str, &str)> {
    word.rsplit_once('-')
}

// ============================================================================
// NORMALIZER
// ============================================================================

/// Canonical categories of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Categories {
    pub equipment: Equipment,
    pub division: Division,
}

/// A value that no table entry matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedValue {
    pub field: CategoryField,
    pub value: String,
}

impl UnrecognizedValue {
    pub fn for_competitor(self, competitor: &str) -> EngineError {
        EngineError::UnrecognizedCategory {
            field: self.field,
            value: self.value,
            competitor: competitor.to_string(),
        }
    }
}

pub struct CategoryNormalizer {
    tables: CategoryTables,
    equipment_index: HashMap<String, Equipment>,
    division_index: HashMap<String, Division>,
    noise: Vec<Vec<String>>,
}

impl CategoryNormalizer {
    /// Build lookup indexes; inconsistent tables are a fatal error
    pub fn new(tables: CategoryTables) -> Result<Self, EngineError> {
        tables
            .validate()
            .map_err(|errors| EngineError::InvalidTables(errors.join("; ")))?;

        let equipment_index = tables
            .equipment
            .iter()
            .flat_map(|(canonical, synonyms)| {
                synonyms.iter().map(move |s| (lookup_key(s), *canonical))
            })
            .collect();

        let division_index = tables
            .divisions
            .iter()
            .flat_map(|(canonical, synonyms)| {
                synonyms.iter().map(move |s| (lookup_key(s), *canonical))
            })
            .collect();

        // Longest phrases first so "bench only" wins over a shorter overlap
        let mut noise: Vec<Vec<String>> = tables
            .division_noise
            .iter()
            .map(|phrase| phrase.split_whitespace().map(|w| w.to_lowercase()).collect())
            .filter(|words: &Vec<String>| !words.is_empty())
            .collect();
        noise.sort_by(|a, b| b.len().cmp(&a.len()));

        Ok(CategoryNormalizer {
            tables,
            equipment_index,
            division_index,
            noise,
        })
    }

    pub fn tables(&self) -> &CategoryTables {
        &self.tables
    }

    /// Map raw equipment/division text to canonical categories.
    ///
    /// An equipped marker in the division ("Open-EQ") forces Equipped and
    /// is stripped before the division lookup.
    pub fn normalize(
        &self,
        equipment_raw: &str,
        division_raw: &str,
    ) -> Result<Categories, UnrecognizedValue> {
        let (division_text, forced_equipped) = self.strip_equipped_marker(division_raw);

        let equipment = if forced_equipped {
            Equipment::Equipped
        } else {
            self.lookup_equipment(equipment_raw)?
        };

        let division = self.lookup_division(&division_text).ok_or_else(|| UnrecognizedValue {
            field: CategoryField::Division,
            value: division_raw.trim().to_string(),
        })?;

        debug!(
            equipment_raw,
            division_raw,
            ?equipment,
            ?division,
            "normalized categories"
        );

        Ok(Categories {
            equipment,
            division,
        })
    }

    /// Award rows ("Best Lifter") and para entries never enter the ranking
    pub fn is_unranked_division(&self, division_raw: &str) -> bool {
        let lower = division_raw.trim().to_lowercase();

        if self
            .tables
            .unranked_division_prefixes
            .iter()
            .any(|prefix| lower.starts_with(&prefix.to_lowercase()))
        {
            return true;
        }

        lower.split_whitespace().any(|word| {
            word.split('-').any(|segment| {
                self.tables
                    .unranked_division_markers
                    .iter()
                    .any(|marker| segment == marker.to_lowercase())
            })
        })
    }

    fn lookup_equipment(&self, equipment_raw: &str) -> Result<Equipment, UnrecognizedValue> {
        let key = lookup_key(equipment_raw);

        if key.is_empty() {
            return self.tables.blank_equipment.ok_or_else(|| UnrecognizedValue {
                field: CategoryField::Equipment,
                value: String::new(),
            });
        }

        self.equipment_index
            .get(&key)
            .copied()
            .ok_or_else(|| UnrecognizedValue {
                field: CategoryField::Equipment,
                value: equipment_raw.trim().to_string(),
            })
    }

    fn lookup_division(&self, division_text: &str) -> Option<Division> {
        let words: Vec<String> = division_text
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();

        let mut kept: Vec<&str> = Vec::with_capacity(words.len());
        let mut i = 0;
        'outer: while i < words.len() {
            for phrase in &self.noise {
                let end = i + phrase.len();
                if end <= words.len() && words[i..end] == phrase[..] {
                    i = end;
                    continue 'outer;
                }
            }
            kept.push(&words[i]);
            i += 1;
        }

        let key = lookup_key(&kept.join(" "));
        if key.is_empty() {
            return None;
        }
        self.division_index.get(&key).copied()
    }

    /// Returns the division text without equipped markers, and whether one was found
    fn strip_equipped_marker(&self, division_raw: &str) -> (String, bool) {
        let is_marker = |text: &str| {
            self.tables
                .equipped_markers
                .iter()
                .any(|marker| text.eq_ignore_ascii_case(marker))
        };

        let mut forced = false;
        let mut words: Vec<String> = Vec::new();

        for word in division_raw.split_whitespace() {
            if is_marker(word) {
                forced = true;
                continue;
            }
            match dash_suffix(word) {
                Some((head, tail)) if is_marker(tail) => {
                    forced = true;
                    if !head.is_empty() {
                        words.push(head.to_string());
                    }
                }
                _ => words.push(word.to_string()),
            }
        }

        (words.join(" "), forced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> CategoryNormalizer {
        CategoryNormalizer::new(CategoryTables::default()).unwrap()
    }

    #[test]
    fn test_master_two_synonyms_agree() {
        let n = normalizer();
        for spelling in ["Masters 2", "Master II", "master 2", "MASTER-2", "Masters  II"] {
            let result = n.normalize("Raw", spelling).unwrap();
            assert_eq!(result.division, Division::MasterII, "spelling {}", spelling);
        }
    }

    #[test]
    fn test_every_default_synonym_resolves_to_its_division() {
        let tables = CategoryTables::default();
        let n = normalizer();
        for (canonical, synonyms) in &tables.divisions {
            for synonym in synonyms {
                let result = n.normalize("Raw", synonym).unwrap();
                assert_eq!(result.division, *canonical);
            }
        }
    }

    #[test]
    fn test_equipment_synonyms() {
        let n = normalizer();
        for raw in ["Sleeves", "Raw", "Wraps", "Straps"] {
            assert_eq!(n.normalize(raw, "Open").unwrap().equipment, Equipment::Raw);
        }
        for equipped in ["Single-ply", "Multi-ply", "Unlimited", "single ply"] {
            assert_eq!(
                n.normalize(equipped, "Open").unwrap().equipment,
                Equipment::Equipped
            );
        }
    }

    #[test]
    fn test_eq_suffix_forces_equipped() {
        let n = normalizer();
        let result = n.normalize("Raw", "Open-EQ").unwrap();
        assert_eq!(result.equipment, Equipment::Equipped);
        assert_eq!(result.division, Division::Open);

        let result = n.normalize("Sleeves", "Master 1 EQ").unwrap();
        assert_eq!(result.equipment, Equipment::Equipped);
        assert_eq!(result.division, Division::MasterI);
    }

    #[test]
    fn test_openpowerlifting_style_division_names() {
        let n = normalizer();
        let result = n.normalize("Raw", "Women's Raw Masters 2 Bench Only").unwrap();
        assert_eq!(result.division, Division::MasterII);

        let result = n.normalize("Raw", "Men's Raw Sub-Juniors").unwrap();
        assert_eq!(result.division, Division::SubJunior);
    }

    #[test]
    fn test_unknown_division_is_an_error() {
        let n = normalizer();
        let err = n.normalize("Raw", "Novice").unwrap_err();
        assert_eq!(err.field, CategoryField::Division);
        assert_eq!(err.value, "Novice");

        let err = n.normalize("Raw", "").unwrap_err();
        assert_eq!(err.field, CategoryField::Division);
    }

    #[test]
    fn test_unknown_equipment_is_an_error() {
        let n = normalizer();
        let err = n.normalize("Bananas", "Open").unwrap_err();
        assert_eq!(err.field, CategoryField::Equipment);

        let engine_err = err.for_competitor("Ana Horvat");
        assert!(engine_err.is_fatal());
    }

    #[test]
    fn test_blank_equipment_uses_configured_default() {
        let n = normalizer();
        assert_eq!(n.normalize("", "Open").unwrap().equipment, Equipment::Raw);

        let tables = CategoryTables {
            blank_equipment: None,
            ..CategoryTables::default()
        };
        let strict = CategoryNormalizer::new(tables).unwrap();
        assert!(strict.normalize("  ", "Open").is_err());
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let n = normalizer();
        let first = n.normalize("Wraps", "Juniors").unwrap();
        for _ in 0..10 {
            assert_eq!(n.normalize("Wraps", "Juniors").unwrap(), first);
        }
    }

    #[test]
    fn test_unranked_divisions() {
        let n = normalizer();
        assert!(n.is_unranked_division("Best Lifter Men"));
        assert!(n.is_unranked_division("Open-OSI"));
        assert!(n.is_unranked_division("Open-OSI-EQ"));
        assert!(!n.is_unranked_division("Open-EQ"));
        assert!(!n.is_unranked_division("Master 1"));
    }

    #[test]
    fn test_conflicting_tables_rejected() {
        let mut tables = CategoryTables::default();
        tables
            .divisions
            .get_mut(&Division::Junior)
            .unwrap()
            .push("Open".to_string());

        let errors = tables.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("'Open'"));

        match CategoryNormalizer::new(tables) {
            Err(EngineError::InvalidTables(_)) => {}
            _ => panic!("expected InvalidTables"),
        }
    }

    #[test]
    fn test_alternate_tables_injected() {
        let mut tables = CategoryTables::default();
        tables
            .divisions
            .get_mut(&Division::Open)
            .unwrap()
            .push("Elite".to_string());

        let n = CategoryNormalizer::new(tables).unwrap();
        assert_eq!(n.normalize("Raw", "Elite").unwrap().division, Division::Open);
    }

    #[test]
    fn test_tables_json_roundtrip_and_partial_file() {
        let json = serde_json::to_string(&CategoryTables::default()).unwrap();
        let parsed: CategoryTables = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, CategoryTables::default());

        let partial: CategoryTables =
            serde_json::from_str(r#"{ "blank_equipment": null }"#).unwrap();
        assert_eq!(partial.blank_equipment, None);
        assert_eq!(partial.divisions, CategoryTables::default().divisions);
    }
}
