// 🏆 Ranking Engine - Individual placings and club standings per partition
//
// Partition = (sex, discipline, equipment). Within a partition, lifters are
// ordered by division precedence, weight class, then score; places are
// awarded 1..n inside each (division, weight class) group. Clubs score the
// sum of their best `club_team_size` lifters (guests never count).

use crate::eligibility::EligibleRecord;
use crate::record::{Division, PartitionKey, WeightClass};
use crate::scoring::ScoreSource;
use crate::sort_policy::{compare_entries, compare_score, Rankable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::cmp::Ordering;
use tracing::debug;

/// Label used when a lifter has no club
pub const UNAFFILIATED: &str = "unaffiliated";

/// Default number of lifters counted per club (top-5 rule)
pub const DEFAULT_CLUB_TEAM_SIZE: usize = 5;

// ============================================================================
// INDIVIDUAL RANKING TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub place: u32,
    pub name: String,
    pub club: Option<String>,
    pub division: Division,
    pub weight_class: WeightClass,
    pub bodyweight_kg: Option<f64>,
    pub total_kg: f64,
    pub score: f64,
    pub score_source: ScoreSource,
    pub counts_for_club: bool,
}

impl RankedEntry {
    pub fn club_label(&self) -> &str {
        self.club.as_deref().unwrap_or(UNAFFILIATED)
    }

    pub fn division_label(&self) -> &'static str {
        self.division.label()
    }
}

impl Rankable for RankedEntry {
    fn division(&self) -> Division {
        self.division
    }

    fn weight_class(&self) -> &WeightClass {
        &self.weight_class
    }

    fn score(&self) -> f64 {
        self.score
    }
}

/// Lifters of one division and weight class, placed 1..n
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightClassGroup {
    pub weight_class: WeightClass,
    pub entries: Vec<RankedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionRanking {
    pub division: Division,
    /// False for guests: listed apart from official results
    pub official: bool,
    pub groups: Vec<WeightClassGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndividualRanking {
    pub divisions: Vec<DivisionRanking>,
}

impl IndividualRanking {
    /// All entries in presentation order
    pub fn entries(&self) -> impl Iterator<Item = &RankedEntry> {
        self.divisions
            .iter()
            .flat_map(|d| d.groups.iter())
            .flat_map(|g| g.entries.iter())
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.divisions.is_empty()
    }

    pub fn division(&self, division: Division) -> Option<&DivisionRanking> {
        self.divisions.iter().find(|d| d.division == division)
    }
}

/// Eligible lifter without a usable score (audit only, never ranked)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnscoredEntry {
    pub name: String,
    pub club: Option<String>,
    pub division: Division,
    pub weight_class: WeightClass,
    pub total_kg: f64,
    pub reason: String,
}

// ============================================================================
// CLUB RANKING TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubContributor {
    /// 1-based rank inside the club
    pub rank: u32,
    pub name: String,
    pub division: Division,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubScore {
    pub place: u32,
    pub club: String,
    pub partition: PartitionKey,
    pub points: f64,
    pub contributors: Vec<ClubContributor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionStandings {
    pub key: PartitionKey,
    pub individual: IndividualRanking,
    pub clubs: Vec<ClubScore>,
    pub unscored: Vec<UnscoredEntry>,
}

// ============================================================================
// RANKING ENGINE
// ============================================================================

pub struct RankingEngine {
    club_team_size: usize,
}

impl RankingEngine {
    pub fn new(club_team_size: usize) -> Self {
        RankingEngine { club_team_size }
    }

    pub fn club_team_size(&self) -> usize {
        self.club_team_size
    }

    /// Rank every partition that has at least one eligible record.
    ///
    /// `eligible` must be in input order; that order breaks every tie.
    pub fn rank(&self, eligible: &[EligibleRecord]) -> Vec<PartitionStandings> {
        let mut partitions: BTreeMap<PartitionKey, Vec<&EligibleRecord>> = BTreeMap::new();
        for record in eligible {
            partitions.entry(record.partition()).or_default().push(record);
        }

        partitions
            .into_iter()
            .map(|(key, records)| self.rank_partition(key, &records))
            .collect()
    }

    fn rank_partition(&self, key: PartitionKey, records: &[&EligibleRecord]) -> PartitionStandings {
        let (individual, unscored) = rank_individuals(records);
        let clubs = self.aggregate_clubs(key, records);

        debug!(
            partition = %key.label(),
            ranked = individual.len(),
            unscored = unscored.len(),
            clubs = clubs.len(),
            "partition ranked"
        );

        PartitionStandings {
            key,
            individual,
            clubs,
            unscored,
        }
    }

    /// Club standings for one partition: top `club_team_size` scores per club
    pub fn aggregate_clubs(&self, key: PartitionKey, records: &[&EligibleRecord]) -> Vec<ClubScore> {
        // Clubs kept in order of first appearance for the stable tie-break
        let mut order: Vec<String> = Vec::new();
        let mut members: HashMap<String, Vec<&EligibleRecord>> = HashMap::new();

        for record in records.iter().copied().filter(|r| r.counts_for_club()) {
            let Some(club) = record.club() else { continue };
            if !members.contains_key(club) {
                order.push(club.to_string());
            }
            members.entry(club.to_string()).or_default().push(record);
        }

        let mut clubs: Vec<ClubScore> = order
            .into_iter()
            .map(|club| {
                let mut lifters = members.remove(&club).unwrap_or_default();
                lifters.sort_by(|a, b| compare_score(score_of(a), score_of(b)));
                lifters.truncate(self.club_team_size);

                let contributors: Vec<ClubContributor> = lifters
                    .iter()
                    .enumerate()
                    .map(|(i, r)| ClubContributor {
                        rank: i as u32 + 1,
                        name: r.name().to_string(),
                        division: r.classified.categories.division,
                        score: score_of(r),
                    })
                    .collect();

                let points = contributors.iter().map(|c| c.score).sum();

                ClubScore {
                    place: 0,
                    club,
                    partition: key,
                    points,
                    contributors,
                }
            })
            .collect();

        clubs.sort_by(|a, b| compare_score(a.points, b.points));
        for (i, club) in clubs.iter_mut().enumerate() {
            club.place = i as u32 + 1;
        }

        clubs
    }
}

impl Default for RankingEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CLUB_TEAM_SIZE)
    }
}

fn score_of(record: &EligibleRecord) -> f64 {
    record.score().unwrap_or(f64::NAN)
}

/// Individual ranking of one partition, plus the lifters that had no score
pub fn rank_individuals(records: &[&EligibleRecord]) -> (IndividualRanking, Vec<UnscoredEntry>) {
    let mut ranked: Vec<RankedEntry> = Vec::with_capacity(records.len());
    let mut unscored: Vec<UnscoredEntry> = Vec::new();

    for record in records {
        let classified = &record.classified;
        let source = &classified.record;
        let total_kg = source.total_kg.unwrap_or(0.0);

        match &classified.score {
            Ok(resolved) => ranked.push(RankedEntry {
                place: 0,
                name: source.name.clone(),
                club: record.club().map(str::to_string),
                division: classified.categories.division,
                weight_class: source.weight_class.clone(),
                bodyweight_kg: source.bodyweight_kg,
                total_kg,
                score: resolved.value,
                score_source: resolved.source,
                counts_for_club: record.counts_for_club(),
            }),
            Err(err) => unscored.push(UnscoredEntry {
                name: source.name.clone(),
                club: record.club().map(str::to_string),
                division: classified.categories.division,
                weight_class: source.weight_class.clone(),
                total_kg,
                reason: err.to_string(),
            }),
        }
    }

    ranked.sort_by(compare_entries);

    let mut divisions: Vec<DivisionRanking> = Vec::new();
    for entry in ranked {
        let same_division = divisions
            .last()
            .map_or(false, |d| d.division == entry.division);
        if !same_division {
            divisions.push(DivisionRanking {
                division: entry.division,
                official: !entry.division.is_guest(),
                groups: Vec::new(),
            });
        }

        let Some(division) = divisions.last_mut() else { continue };
        let same_class = division
            .groups
            .last()
            .map_or(false, |g| g.weight_class.cmp_class(&entry.weight_class) == Ordering::Equal);
        if !same_class {
            division.groups.push(WeightClassGroup {
                weight_class: entry.weight_class.clone(),
                entries: Vec::new(),
            });
        }

        if let Some(group) = division.groups.last_mut() {
            let mut entry = entry;
            entry.place = group.entries.len() as u32 + 1;
            group.entries.push(entry);
        }
    }

    (IndividualRanking { divisions }, unscored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::Categories;
    use crate::clubs::ClubResolution;
    use crate::eligibility::ClassifiedRecord;
    use crate::error::EngineError;
    use crate::record::{CompetitorRecord, Discipline, Equipment, Sex};
    use crate::scoring::ResolvedScore;

    struct Lifter {
        name: &'static str,
        club: Option<&'static str>,
        division: Division,
        class: &'static str,
        score: Option<f64>,
    }

    fn lifter(name: &'static str, club: Option<&'static str>, division: Division, class: &'static str, score: f64) -> Lifter {
        Lifter {
            name,
            club,
            division,
            class,
            score: Some(score),
        }
    }

    fn eligible(lifters: &[Lifter]) -> Vec<EligibleRecord> {
        eligible_in(Sex::Male, Equipment::Raw, lifters)
    }

    fn eligible_in(sex: Sex, equipment: Equipment, lifters: &[Lifter]) -> Vec<EligibleRecord> {
        lifters
            .iter()
            .enumerate()
            .map(|(i, l)| {
                let record = CompetitorRecord::new(
                    l.name.to_string(),
                    sex,
                    Discipline::FullPower,
                    equipment.label().to_string(),
                    l.division.label().to_string(),
                    WeightClass::parse(l.class),
                )
                .with_bodyweight(80.0)
                .with_total(500.0);

                let club = match l.club {
                    Some(c) => ClubResolution::Resolved(c.to_string()),
                    None => ClubResolution::Unresolved,
                };
                let score = match l.score {
                    Some(value) => Ok(ResolvedScore {
                        value,
                        source: ScoreSource::Supplied,
                    }),
                    None => Err(EngineError::InsufficientDataForScore {
                        competitor: l.name.to_string(),
                        reason: "bodyweight missing".to_string(),
                    }),
                };

                EligibleRecord {
                    classified: ClassifiedRecord {
                        record,
                        input_index: i,
                        categories: Categories {
                            equipment,
                            division: l.division,
                        },
                        club,
                        score,
                    },
                    excluded_from_team_aggregation: l.division.is_guest(),
                }
            })
            .collect()
    }

    #[test]
    fn test_junior_83_scenario() {
        let records = eligible(&[
            lifter("Lower", Some("Alpha"), Division::Junior, "83", 300.0),
            lifter("Higher", Some("Alpha"), Division::Junior, "83", 310.5),
        ]);
        let standings = RankingEngine::default().rank(&records);
        assert_eq!(standings.len(), 1);

        let entries: Vec<&RankedEntry> = standings[0].individual.entries().collect();
        assert_eq!(entries[0].name, "Higher");
        assert_eq!(entries[0].place, 1);
        assert_eq!(entries[1].name, "Lower");
        assert_eq!(entries[1].place, 2);
    }

    #[test]
    fn test_top_five_cap() {
        let scores = [100.0, 95.0, 90.0, 85.0, 80.0, 70.0];
        let lifters: Vec<Lifter> = ["A", "B", "C", "D", "E", "F"]
            .into_iter()
            .zip(scores)
            .map(|(name, score)| lifter(name, Some("Alpha"), Division::Open, "93", score))
            .collect();

        let clubs = RankingEngine::default().rank(&eligible(&lifters))[0].clubs.clone();
        assert_eq!(clubs.len(), 1);
        assert_eq!(clubs[0].club, "Alpha");
        assert_eq!(clubs[0].points, 450.0);
        assert_eq!(clubs[0].contributors.len(), 5);
        assert!(clubs[0].contributors.iter().all(|c| c.name != "F"));
    }

    #[test]
    fn test_small_club_sums_what_it_has() {
        let records = eligible(&[
            lifter("A", Some("Beta"), Division::Open, "93", 60.0),
            lifter("B", Some("Beta"), Division::Junior, "74", 40.5),
        ]);
        let standings = RankingEngine::default().rank(&records);
        let clubs = &standings[0].clubs;
        assert_eq!(clubs[0].points, 100.5);
        assert_eq!(clubs[0].contributors.len(), 2);
    }

    #[test]
    fn test_guests_and_unaffiliated_never_count() {
        let records = eligible(&[
            lifter("Guest Star", Some("Alpha"), Division::Guest, "93", 999.0),
            lifter("Member", Some("Alpha"), Division::Open, "93", 50.0),
            lifter("Loner", None, Division::Open, "93", 80.0),
        ]);
        let all = RankingEngine::default().rank(&records);
        let standings = &all[0];

        assert_eq!(standings.clubs.len(), 1);
        assert_eq!(standings.clubs[0].points, 50.0);
        assert!(standings.clubs[0]
            .contributors
            .iter()
            .all(|c| c.division != Division::Guest));

        // still listed individually
        assert_eq!(standings.individual.len(), 3);
        let loner = standings
            .individual
            .entries()
            .find(|e| e.name == "Loner")
            .unwrap();
        assert_eq!(loner.club_label(), UNAFFILIATED);
    }

    #[test]
    fn test_guest_division_listed_last_and_unofficial() {
        let records = eligible(&[
            lifter("Guest", None, Division::Guest, "All Guest", 999.0),
            lifter("Master", Some("Alpha"), Division::MasterI, "105", 70.0),
            lifter("Sub", Some("Alpha"), Division::SubJunior, "59", 60.0),
        ]);
        let standings = RankingEngine::default().rank(&records);
        let ranking = &standings[0].individual;

        let order: Vec<Division> = ranking.divisions.iter().map(|d| d.division).collect();
        assert_eq!(order, vec![Division::SubJunior, Division::MasterI, Division::Guest]);
        assert!(!ranking.division(Division::Guest).unwrap().official);
        assert!(ranking.division(Division::MasterI).unwrap().official);
    }

    #[test]
    fn test_places_restart_per_weight_class_and_have_no_gaps() {
        let records = eligible(&[
            lifter("A", None, Division::Open, "93", 70.0),
            lifter("B", None, Division::Open, "83", 75.0),
            lifter("C", None, Division::Open, "93", 90.0),
            lifter("D", None, Division::Open, "120+", 60.0),
            lifter("E", None, Division::Open, "83", 80.0),
            lifter("F", None, Division::Open, "93", 85.0),
        ]);
        let open = RankingEngine::default().rank(&records)[0]
            .individual
            .division(Division::Open)
            .cloned()
            .unwrap();

        let classes: Vec<String> = open.groups.iter().map(|g| g.weight_class.to_string()).collect();
        assert_eq!(classes, vec!["83", "93", "120+"]);

        for group in &open.groups {
            for (i, entry) in group.entries.iter().enumerate() {
                assert_eq!(entry.place, i as u32 + 1);
            }
            for pair in group.entries.windows(2) {
                assert!(pair[0].score >= pair[1].score);
            }
        }
        let names_93: Vec<&str> = open.groups[1].entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names_93, vec!["C", "F", "A"]);
    }

    #[test]
    fn test_score_ties_keep_input_order() {
        let records = eligible(&[
            lifter("First", None, Division::Open, "83", 88.0),
            lifter("Second", None, Division::Open, "83", 88.0),
            lifter("Third", None, Division::Open, "83", 88.0),
        ]);
        let names: Vec<String> = RankingEngine::default().rank(&records)[0]
            .individual
            .entries()
            .map(|e| e.name.clone())
            .collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_club_ties_keep_first_appearance_order() {
        let records = eligible(&[
            lifter("A", Some("Zeta"), Division::Open, "83", 50.0),
            lifter("B", Some("Alpha"), Division::Open, "83", 50.0),
            lifter("C", Some("Mid"), Division::Open, "83", 70.0),
        ]);
        let standings = RankingEngine::default().rank(&records);
        let clubs = &standings[0].clubs;
        let order: Vec<(&str, u32)> = clubs.iter().map(|c| (c.club.as_str(), c.place)).collect();
        assert_eq!(order, vec![("Mid", 1), ("Zeta", 2), ("Alpha", 3)]);
    }

    #[test]
    fn test_unscored_listed_for_audit_only() {
        let mut lifters = vec![lifter("Scored", Some("Alpha"), Division::Open, "83", 70.0)];
        lifters.push(Lifter {
            name: "No Bodyweight",
            club: Some("Alpha"),
            division: Division::Open,
            class: "83",
            score: None,
        });

        let all = RankingEngine::default().rank(&eligible(&lifters));
        let standings = &all[0];
        assert_eq!(standings.individual.len(), 1);
        assert_eq!(standings.unscored.len(), 1);
        assert_eq!(standings.unscored[0].name, "No Bodyweight");
        assert_eq!(standings.clubs[0].points, 70.0);
        assert_eq!(standings.clubs[0].contributors.len(), 1);
    }

    #[test]
    fn test_partitions_are_independent_and_empty_ones_omitted() {
        let mut records = eligible_in(
            Sex::Male,
            Equipment::Raw,
            &[lifter("M", Some("Alpha"), Division::Open, "93", 80.0)],
        );
        records.extend(eligible_in(
            Sex::Female,
            Equipment::Equipped,
            &[lifter("F", Some("Alpha"), Division::Open, "63", 90.0)],
        ));

        let standings = RankingEngine::default().rank(&records);
        assert_eq!(standings.len(), 2);
        assert_eq!(standings[0].key.slug(), "male_full_power_raw");
        assert_eq!(standings[1].key.slug(), "female_full_power_equipped");
        assert_eq!(standings[0].clubs[0].points, 80.0);
        assert_eq!(standings[1].clubs[0].points, 90.0);

        assert!(RankingEngine::default().rank(&[]).is_empty());
    }

    #[test]
    fn test_configurable_team_size() {
        let lifters: Vec<Lifter> = ["A", "B", "C"]
            .into_iter()
            .map(|name| lifter(name, Some("Alpha"), Division::Open, "93", 10.0))
            .collect();
        let standings = RankingEngine::new(2).rank(&eligible(&lifters));
        assert_eq!(standings[0].clubs[0].points, 20.0);
    }
}
