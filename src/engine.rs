// 🏋️ Standings Engine - One pass from loaded records to standings
//
// normalize → resolve club → resolve score → filter → rank
//
// The first unrecognized category aborts the run before any standings
// exist; everything else is recoverable and ends up in the diagnostics.

use crate::categories::CategoryNormalizer;
use crate::clubs::ClubResolver;
use crate::config::EngineConfig;
use crate::diagnostics::Diagnostics;
use crate::eligibility::{self, ClassifiedRecord};
use crate::error::EngineError;
use crate::ranking::{PartitionStandings, RankingEngine};
use crate::record::{ClubRosterEntry, CompetitorRecord, PartitionKey};
use crate::scoring::resolve_score;
use crate::statistics::MeetStatistics;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

// ============================================================================
// STANDINGS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standings {
    /// Partitions with at least one eligible record, in partition order
    pub partitions: Vec<PartitionStandings>,
    pub diagnostics: Diagnostics,
    #[serde(default)]
    pub statistics: MeetStatistics,
}

impl Standings {
    pub fn partition(&self, key: &PartitionKey) -> Option<&PartitionStandings> {
        self.partitions.iter().find(|p| &p.key == key)
    }

    /// SHA-256 over the ranked content. Identical input gives an identical
    /// fingerprint; diagnostics and statistics are not part of it.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();

        for partition in &self.partitions {
            hasher.update(format!("P|{}\n", partition.key.slug()));

            for entry in partition.individual.entries() {
                hasher.update(format!(
                    "I|{}|{}|{}|{}|{}|{:.4}\n",
                    entry.division_label(),
                    entry.weight_class,
                    entry.place,
                    entry.name,
                    entry.club_label(),
                    entry.score
                ));
            }
            for club in &partition.clubs {
                hasher.update(format!("C|{}|{}|{:.4}\n", club.place, club.club, club.points));
                for contributor in &club.contributors {
                    hasher.update(format!("c|{}|{}\n", contributor.rank, contributor.name));
                }
            }
            for unscored in &partition.unscored {
                hasher.update(format!("U|{}\n", unscored.name));
            }
        }

        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct StandingsEngine {
    normalizer: CategoryNormalizer,
    ranking: RankingEngine,
}

impl StandingsEngine {
    /// Build an engine; invalid tables or team size fail here, not mid-run
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config
            .validate()
            .map_err(|errors| EngineError::InvalidTables(errors.join("; ")))?;

        let ranking = RankingEngine::new(config.club_team_size);
        let normalizer = CategoryNormalizer::new(config.tables)?;

        Ok(StandingsEngine {
            normalizer,
            ranking,
        })
    }

    pub fn normalizer(&self) -> &CategoryNormalizer {
        &self.normalizer
    }

    /// Compute individual and club standings for a meet.
    ///
    /// Same input, same output: ties keep input order everywhere.
    pub fn run(
        &self,
        records: &[CompetitorRecord],
        roster: &[ClubRosterEntry],
    ) -> Result<Standings, EngineError> {
        let resolver = ClubResolver::new(roster);
        let mut diagnostics = Diagnostics::new(records.len());
        let mut classified = Vec::with_capacity(records.len());

        for (input_index, record) in records.iter().enumerate() {
            if self.normalizer.is_unranked_division(&record.division_raw) {
                diagnostics.record_unranked(record);
                continue;
            }

            let categories = self
                .normalizer
                .normalize(&record.equipment_raw, &record.division_raw)
                .map_err(|value| value.for_competitor(&record.name))?;

            let club = resolver.resolve_with_hint(&record.name, record.team.as_deref());
            let score = resolve_score(record);

            classified.push(ClassifiedRecord {
                record: record.clone(),
                input_index,
                categories,
                club,
                score,
            });
        }

        let outcome = eligibility::filter(classified);
        diagnostics.record_filter(&outcome);
        for record in &outcome.eligible {
            diagnostics.record_eligible(record);
        }

        let partitions = self.ranking.rank(&outcome.eligible);
        let statistics = MeetStatistics::compute(&partitions);

        if diagnostics.needs_review() {
            warn!(
                unresolved = diagnostics.unresolved_clubs,
                ambiguous = diagnostics.ambiguous_clubs,
                insufficient = diagnostics.insufficient_score_data,
                "standings computed with issues"
            );
        }
        info!(
            records = records.len(),
            eligible = diagnostics.eligible,
            partitions = partitions.len(),
            "standings computed"
        );

        Ok(Standings {
            partitions,
            diagnostics,
            statistics,
        })
    }
}
