// 🤝 Club Resolver - Join competitors against the club roster
//
// Identity is the normalized full name: trimmed, case-folded, internal
// whitespace collapsed. Roster wins; a `Team` value printed in the results
// file is only a fallback.

use crate::error::EngineError;
use crate::record::ClubRosterEntry;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Normalize a competitor identity for joining
pub fn normalize_identity(name: &str) -> String {
    name.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// RESOLUTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClubResolution {
    /// Exactly one roster entry matched
    Resolved(String),

    /// Several roster entries matched; the first is used
    Ambiguous { club: String, candidates: Vec<String> },

    /// Roster had nothing, the results file named a team
    TeamHint(String),

    Unresolved,
}

impl ClubResolution {
    /// Club to use for aggregation, if any
    pub fn club(&self) -> Option<&str> {
        match self {
            ClubResolution::Resolved(club)
            | ClubResolution::Ambiguous { club, .. }
            | ClubResolution::TeamHint(club) => Some(club),
            ClubResolution::Unresolved => None,
        }
    }

    /// Recoverable condition to surface in diagnostics, if any
    pub fn issue(&self, competitor: &str) -> Option<EngineError> {
        match self {
            ClubResolution::Ambiguous { candidates, .. } => {
                Some(EngineError::AmbiguousClubMapping {
                    competitor: competitor.to_string(),
                    clubs: candidates.clone(),
                })
            }
            ClubResolution::Unresolved => Some(EngineError::UnresolvedClub {
                competitor: competitor.to_string(),
            }),
            _ => None,
        }
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

pub struct ClubResolver {
    /// normalized name → clubs in roster order
    index: HashMap<String, Vec<String>>,
}

impl ClubResolver {
    pub fn new(roster: &[ClubRosterEntry]) -> Self {
        let mut index: HashMap<String, Vec<String>> = HashMap::new();

        for entry in roster {
            let key = normalize_identity(&entry.name);
            let club = entry.club.trim();
            if key.is_empty() || club.is_empty() {
                continue;
            }
            index.entry(key).or_default().push(club.to_string());
        }

        debug!(identities = index.len(), "club roster indexed");
        ClubResolver { index }
    }

    /// Resolve a competitor against the roster only
    pub fn resolve(&self, competitor: &str) -> ClubResolution {
        self.resolve_with_hint(competitor, None)
    }

    /// Resolve against the roster, falling back to the results file's team
    pub fn resolve_with_hint(&self, competitor: &str, team: Option<&str>) -> ClubResolution {
        let key = normalize_identity(competitor);

        match self.index.get(&key).map(Vec::as_slice) {
            Some([club]) => ClubResolution::Resolved(club.clone()),
            Some(candidates) if !candidates.is_empty() => {
                warn!(
                    competitor,
                    candidates = ?candidates,
                    "ambiguous club mapping, using first roster entry"
                );
                ClubResolution::Ambiguous {
                    club: candidates[0].clone(),
                    candidates: candidates.to_vec(),
                }
            }
            _ => match team.map(str::trim).filter(|t| !t.is_empty()) {
                Some(team) => {
                    debug!(competitor, team, "club taken from results file team");
                    ClubResolution::TeamHint(team.to_string())
                }
                None => {
                    warn!(competitor, "no club found");
                    ClubResolution::Unresolved
                }
            },
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<ClubRosterEntry> {
        vec![
            ClubRosterEntry::new("Ana Horvat", "PK Alpha"),
            ClubRosterEntry::new("Ivan  Kovač", "PK Beta"),
            ClubRosterEntry::new("Marko Babić", "PK Alpha"),
            ClubRosterEntry::new("marko babić", "PK Gamma"),
            ClubRosterEntry::new("Nobody Clubless", "  "),
        ]
    }

    #[test]
    fn test_normalize_identity() {
        assert_eq!(normalize_identity("  Ivan   KOVAČ "), "ivan kovač");
        assert_eq!(normalize_identity("Ana\tHorvat"), "ana horvat");
    }

    #[test]
    fn test_resolves_case_and_spacing_insensitive() {
        let resolver = ClubResolver::new(&roster());
        assert_eq!(
            resolver.resolve("ANA HORVAT"),
            ClubResolution::Resolved("PK Alpha".to_string())
        );
        assert_eq!(
            resolver.resolve("Ivan Kovač"),
            ClubResolution::Resolved("PK Beta".to_string())
        );
    }

    #[test]
    fn test_ambiguous_uses_first_match() {
        let resolver = ClubResolver::new(&roster());
        let resolution = resolver.resolve("Marko Babić");

        assert_eq!(resolution.club(), Some("PK Alpha"));
        match resolution.issue("Marko Babić") {
            Some(EngineError::AmbiguousClubMapping { clubs, .. }) => {
                assert_eq!(clubs, vec!["PK Alpha".to_string(), "PK Gamma".to_string()]);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_unresolved_and_blank_club_rows() {
        let resolver = ClubResolver::new(&roster());
        assert_eq!(resolver.len(), 3);

        let resolution = resolver.resolve("Nobody Clubless");
        assert_eq!(resolution, ClubResolution::Unresolved);
        assert_eq!(resolution.club(), None);
        assert!(matches!(
            resolution.issue("Nobody Clubless"),
            Some(EngineError::UnresolvedClub { .. })
        ));
    }

    #[test]
    fn test_team_hint_only_when_roster_misses() {
        let resolver = ClubResolver::new(&roster());

        assert_eq!(
            resolver.resolve_with_hint("Ana Horvat", Some("Other Club")),
            ClubResolution::Resolved("PK Alpha".to_string())
        );
        assert_eq!(
            resolver.resolve_with_hint("Petra Perić", Some(" PK Delta ")),
            ClubResolution::TeamHint("PK Delta".to_string())
        );
        assert_eq!(
            resolver.resolve_with_hint("Petra Perić", Some("")),
            ClubResolution::Unresolved
        );
        assert!(resolver
            .resolve_with_hint("Petra Perić", Some("PK Delta"))
            .issue("Petra Perić")
            .is_none());
    }
}
