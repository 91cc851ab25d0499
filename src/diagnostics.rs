// 📋 Diagnostics - Every drop and every recoverable condition, counted
//
// Nothing the engine skips goes unreported: counts for the summary plus one
// issue per competitor so a human can fix the source data.

use crate::clubs::ClubResolution;
use crate::eligibility::{EligibilityOutcome, EligibleRecord};
use crate::error::EngineError;
use crate::record::CompetitorRecord;
use crate::scoring::ScoreSource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical, // Run cannot continue
    Warning,  // Result affected, source data should be corrected
    Info,     // Worth knowing, result unaffected
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    UnrecognizedCategory,
    AmbiguousClubMapping,
    UnresolvedClub,
    InsufficientDataForScore,
    TeamHintClub,
    NoShow,
    Disqualified,
    ZeroTotal,
    UnrankedDivision,
    InvalidTables,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    pub kind: IssueKind,
    pub competitor: String,
    pub message: String,
}

impl From<&EngineError> for DiagnosticIssue {
    fn from(err: &EngineError) -> Self {
        let kind = match err {
            EngineError::UnrecognizedCategory { .. } => IssueKind::UnrecognizedCategory,
            EngineError::InvalidTables(_) => IssueKind::InvalidTables,
            EngineError::AmbiguousClubMapping { .. } => IssueKind::AmbiguousClubMapping,
            EngineError::InsufficientDataForScore { .. } => IssueKind::InsufficientDataForScore,
            EngineError::UnresolvedClub { .. } => IssueKind::UnresolvedClub,
        };

        DiagnosticIssue {
            severity: if err.is_fatal() {
                Severity::Critical
            } else {
                Severity::Warning
            },
            kind,
            competitor: err.competitor().unwrap_or_default().to_string(),
            message: err.to_string(),
        }
    }
}

// ============================================================================
// DIAGNOSTICS SUMMARY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub records_in: usize,
    pub eligible: usize,

    // Drops
    pub dropped_no_show: usize,
    pub dropped_disqualified: usize,
    pub dropped_zero_total: usize,
    pub dropped_unranked_division: usize,

    // Club resolution (eligible records only)
    pub unresolved_clubs: usize,
    pub ambiguous_clubs: usize,
    pub team_hint_clubs: usize,

    // Score resolution (eligible records only)
    pub score_fallbacks: usize,
    pub insufficient_score_data: usize,

    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new(records_in: usize) -> Self {
        Diagnostics {
            records_in,
            ..Diagnostics::default()
        }
    }

    /// Award row or para entry skipped before normalization
    pub fn record_unranked(&mut self, record: &CompetitorRecord) {
        self.dropped_unranked_division += 1;
        self.issues.push(DiagnosticIssue {
            severity: Severity::Info,
            kind: IssueKind::UnrankedDivision,
            competitor: record.name.clone(),
            message: format!(
                "Division '{}' is not ranked (line {})",
                record.division_raw, record.line_number
            ),
        });
    }

    pub fn record_filter(&mut self, outcome: &EligibilityOutcome) {
        self.eligible = outcome.summary.kept;
        self.dropped_no_show += outcome.summary.dropped_no_show;
        self.dropped_disqualified += outcome.summary.dropped_disqualified;
        self.dropped_zero_total += outcome.summary.dropped_zero_total;

        for dropped in &outcome.dropped {
            let kind = match dropped.reason {
                crate::eligibility::DropReason::NoShow => IssueKind::NoShow,
                crate::eligibility::DropReason::Disqualified => IssueKind::Disqualified,
                crate::eligibility::DropReason::ZeroTotal => IssueKind::ZeroTotal,
            };
            self.issues.push(DiagnosticIssue {
                severity: Severity::Info,
                kind,
                competitor: dropped.name.clone(),
                message: format!(
                    "Dropped: {} (line {})",
                    dropped.reason.as_str(),
                    dropped.line_number
                ),
            });
        }
    }

    /// Tally club and score conditions of one eligible record
    pub fn record_eligible(&mut self, record: &EligibleRecord) {
        let name = record.name();

        match &record.classified.club {
            ClubResolution::Resolved(_) => {}
            ClubResolution::Ambiguous { .. } => self.ambiguous_clubs += 1,
            ClubResolution::Unresolved => self.unresolved_clubs += 1,
            ClubResolution::TeamHint(team) => {
                self.team_hint_clubs += 1;
                self.issues.push(DiagnosticIssue {
                    severity: Severity::Info,
                    kind: IssueKind::TeamHintClub,
                    competitor: name.to_string(),
                    message: format!("Not in roster, using team '{}' from results", team),
                });
            }
        }
        if let Some(err) = record.classified.club.issue(name) {
            self.issues.push(DiagnosticIssue::from(&err));
        }

        match &record.classified.score {
            Ok(resolved) if resolved.source == ScoreSource::Computed => self.score_fallbacks += 1,
            Ok(_) => {}
            Err(err) => {
                self.insufficient_score_data += 1;
                self.issues.push(DiagnosticIssue::from(err));
            }
        }
    }

    pub fn total_dropped(&self) -> usize {
        self.dropped_no_show
            + self.dropped_disqualified
            + self.dropped_zero_total
            + self.dropped_unranked_division
    }

    /// Source data should be looked at by a human
    pub fn needs_review(&self) -> bool {
        self.issues.iter().any(|i| i.severity != Severity::Info)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn summary(&self) -> String {
        format!(
            "Records: {} in, {} eligible, {} dropped (no-show {}, DQ {}, zero total {}, unranked {}) | Clubs: {} unresolved, {} ambiguous, {} from team | Scores: {} computed, {} insufficient",
            self.records_in,
            self.eligible,
            self.total_dropped(),
            self.dropped_no_show,
            self.dropped_disqualified,
            self.dropped_zero_total,
            self.dropped_unranked_division,
            self.unresolved_clubs,
            self.ambiguous_clubs,
            self.team_hint_clubs,
            self.score_fallbacks,
            self.insufficient_score_data,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CategoryField;

    #[test]
    fn test_issue_from_engine_error() {
        let issue = DiagnosticIssue::from(&EngineError::UnresolvedClub {
            competitor: "Ana".to_string(),
        });
        assert_eq!(issue.kind, IssueKind::UnresolvedClub);
        assert_eq!(issue.severity, Severity::Warning);
        assert_eq!(issue.competitor, "Ana");

        let fatal = DiagnosticIssue::from(&EngineError::UnrecognizedCategory {
            field: CategoryField::Division,
            value: "X".to_string(),
            competitor: "Ivan".to_string(),
        });
        assert_eq!(fatal.severity, Severity::Critical);
    }

    #[test]
    fn test_needs_review_ignores_info() {
        let mut diagnostics = Diagnostics::new(3);
        diagnostics.issues.push(DiagnosticIssue {
            severity: Severity::Info,
            kind: IssueKind::NoShow,
            competitor: "A".to_string(),
            message: "Dropped".to_string(),
        });
        assert!(!diagnostics.needs_review());

        diagnostics.issues.push(DiagnosticIssue::from(&EngineError::UnresolvedClub {
            competitor: "B".to_string(),
        }));
        assert!(diagnostics.needs_review());
        assert_eq!(diagnostics.warnings().count(), 1);
    }

    #[test]
    fn test_summary_mentions_counts() {
        let diagnostics = Diagnostics {
            records_in: 10,
            eligible: 7,
            dropped_no_show: 2,
            dropped_zero_total: 1,
            ambiguous_clubs: 1,
            ..Diagnostics::default()
        };
        let summary = diagnostics.summary();
        assert!(summary.contains("10 in, 7 eligible, 3 dropped"));
        assert!(summary.contains("1 ambiguous"));
    }
}
