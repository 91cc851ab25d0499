// ✅ Eligibility Filter - Who takes part in the standings
//
// Drops no-shows, disqualifications and zero totals (every drop counted),
// and marks guests (Guest division or Place G) as listed-but-not-counted
// for clubs.

use crate::categories::Categories;
use crate::clubs::ClubResolution;
use crate::error::EngineError;
use crate::record::{CompetitorRecord, Division, PartitionKey, Status};
use crate::scoring::ResolvedScore;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// CLASSIFIED RECORD (input of the filter)
// ============================================================================

/// A record after normalization, club resolution and score resolution
#[derive(Debug, Clone)]
pub struct ClassifiedRecord {
    pub record: CompetitorRecord,

    /// Position in the input collection (stable tie-break)
    pub input_index: usize,

    pub categories: Categories,
    pub club: ClubResolution,
    pub score: Result<ResolvedScore, EngineError>,
}

impl ClassifiedRecord {
    pub fn partition(&self) -> PartitionKey {
        PartitionKey::new(
            self.record.sex,
            self.record.discipline,
            self.categories.equipment,
        )
    }
}

/// A record that passed the filter
#[derive(Debug, Clone)]
pub struct EligibleRecord {
    pub classified: ClassifiedRecord,
    pub excluded_from_team_aggregation: bool,
}

impl EligibleRecord {
    pub fn name(&self) -> &str {
        &self.classified.record.name
    }

    pub fn partition(&self) -> PartitionKey {
        self.classified.partition()
    }

    pub fn club(&self) -> Option<&str> {
        self.classified.club.club()
    }

    /// Score, if one could be resolved
    pub fn score(&self) -> Option<f64> {
        self.classified.score.as_ref().ok().map(|s| s.value)
    }

    /// Counts toward its club: not a guest, has a club, has a score
    pub fn counts_for_club(&self) -> bool {
        !self.excluded_from_team_aggregation && self.club().is_some() && self.score().is_some()
    }
}

// ============================================================================
// OUTCOME
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    NoShow,
    Disqualified,
    ZeroTotal,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::NoShow => "no-show",
            DropReason::Disqualified => "disqualified",
            DropReason::ZeroTotal => "zero or missing total",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedRecord {
    pub name: String,
    pub line_number: usize,
    pub reason: DropReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub considered: usize,
    pub kept: usize,
    pub dropped_no_show: usize,
    pub dropped_disqualified: usize,
    pub dropped_zero_total: usize,
    pub guests_marked: usize,
}

impl FilterSummary {
    pub fn total_dropped(&self) -> usize {
        self.dropped_no_show + self.dropped_disqualified + self.dropped_zero_total
    }
}

#[derive(Debug, Clone)]
pub struct EligibilityOutcome {
    pub eligible: Vec<EligibleRecord>,
    pub dropped: Vec<DroppedRecord>,
    pub summary: FilterSummary,
}

// ============================================================================
// FILTER
// ============================================================================

fn drop_reason(record: &CompetitorRecord) -> Option<DropReason> {
    match record.status {
        Status::NoShow => return Some(DropReason::NoShow),
        Status::Disqualified => return Some(DropReason::Disqualified),
        Status::Completed => {}
    }

    match record.total_kg {
        Some(total) if total > 0.0 => None,
        _ => Some(DropReason::ZeroTotal),
    }
}

/// Keep completed records with a positive total; input order is preserved
pub fn filter(records: Vec<ClassifiedRecord>) -> EligibilityOutcome {
    let mut summary = FilterSummary {
        considered: records.len(),
        ..FilterSummary::default()
    };
    let mut eligible = Vec::with_capacity(records.len());
    let mut dropped = Vec::new();

    for mut classified in records {
        if let Some(reason) = drop_reason(&classified.record) {
            match reason {
                DropReason::NoShow => summary.dropped_no_show += 1,
                DropReason::Disqualified => summary.dropped_disqualified += 1,
                DropReason::ZeroTotal => summary.dropped_zero_total += 1,
            }
            warn!(
                competitor = %classified.record.name,
                line = classified.record.line_number,
                reason = reason.as_str(),
                "record dropped"
            );
            dropped.push(DroppedRecord {
                name: classified.record.name.clone(),
                line_number: classified.record.line_number,
                reason,
            });
            continue;
        }

        // Place G: guest whatever the printed division
        if classified.record.guest {
            classified.categories.division = Division::Guest;
        }
        let is_guest = classified.categories.division.is_guest();
        if is_guest {
            summary.guests_marked += 1;
        }

        eligible.push(EligibleRecord {
            classified,
            excluded_from_team_aggregation: is_guest,
        });
    }

    summary.kept = eligible.len();
    info!(
        considered = summary.considered,
        kept = summary.kept,
        dropped = summary.total_dropped(),
        guests = summary.guests_marked,
        "eligibility filter applied"
    );

    EligibilityOutcome {
        eligible,
        dropped,
        summary,
    }
}
