// 📊 Meet Statistics - Headline numbers for the report
//
// Entry counts by sex and event, unique athletes, clubs, mean and best
// points, and the top lifters by score per partition and per division.
// Guests are counted as entries but never lead and never enter the points
// figures.

use crate::clubs::normalize_identity;
use crate::ranking::{PartitionStandings, RankedEntry};
use crate::record::{Discipline, Division, PartitionKey, Sex};
use crate::sort_policy::compare_score;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Lifters listed per leaderboard
pub const TOP_LIFTERS: usize = 5;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub sex: Sex,
    pub discipline: Discipline,
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopLifter {
    pub rank: u32,
    pub name: String,
    pub club: Option<String>,
    pub division: Division,
    pub total_kg: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionLeaders {
    pub division: Division,
    pub lifters: Vec<TopLifter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionLeaders {
    pub key: PartitionKey,
    pub overall: Vec<TopLifter>,
    pub by_division: Vec<DivisionLeaders>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeetStatistics {
    /// Eligible entries, ranked or not (one lifter in two events is two)
    pub entries: usize,
    pub male_entries: usize,
    pub female_entries: usize,
    pub full_power_entries: usize,
    pub bench_only_entries: usize,
    /// Full power before bench, men before women
    pub by_category: Vec<CategoryCount>,
    pub unique_athletes: usize,
    pub clubs: usize,
    pub mean_points: Option<f64>,
    pub best_points: Option<f64>,
    pub leaders: Vec<PartitionLeaders>,
}

// ============================================================================
// COMPUTATION
// ============================================================================

/// Best `TOP_LIFTERS` by score; ties keep presentation order
fn top_lifters<'a, I>(entries: I) -> Vec<TopLifter>
where
    I: Iterator<Item = &'a RankedEntry>,
{
    let mut sorted: Vec<&RankedEntry> = entries.collect();
    sorted.sort_by(|a, b| compare_score(a.score, b.score));

    sorted
        .into_iter()
        .take(TOP_LIFTERS)
        .enumerate()
        .map(|(i, entry)| TopLifter {
            rank: i as u32 + 1,
            name: entry.name.clone(),
            club: entry.club.clone(),
            division: entry.division,
            total_kg: entry.total_kg,
            score: entry.score,
        })
        .collect()
}

fn partition_leaders(partition: &PartitionStandings) -> PartitionLeaders {
    let official = partition.individual.divisions.iter().filter(|d| d.official);

    let overall = top_lifters(
        official
            .clone()
            .flat_map(|d| d.groups.iter())
            .flat_map(|g| g.entries.iter()),
    );

    let by_division = official
        .map(|d| DivisionLeaders {
            division: d.division,
            lifters: top_lifters(d.groups.iter().flat_map(|g| g.entries.iter())),
        })
        .collect();

    PartitionLeaders {
        key: partition.key,
        overall,
        by_division,
    }
}

impl MeetStatistics {
    pub fn compute(partitions: &[PartitionStandings]) -> Self {
        let mut stats = MeetStatistics::default();
        let mut by_category: BTreeMap<(Discipline, Sex), usize> = BTreeMap::new();
        let mut athletes = HashSet::new();
        let mut clubs = BTreeSet::new();
        let mut official_scores = Vec::new();

        for partition in partitions {
            let listed = partition.individual.len() + partition.unscored.len();
            stats.entries += listed;
            match partition.key.sex {
                Sex::Male => stats.male_entries += listed,
                Sex::Female => stats.female_entries += listed,
            }
            match partition.key.discipline {
                Discipline::FullPower => stats.full_power_entries += listed,
                Discipline::BenchOnly => stats.bench_only_entries += listed,
            }
            *by_category
                .entry((partition.key.discipline, partition.key.sex))
                .or_default() += listed;

            for division in &partition.individual.divisions {
                for entry in division.groups.iter().flat_map(|g| g.entries.iter()) {
                    athletes.insert(normalize_identity(&entry.name));
                    if let Some(club) = &entry.club {
                        clubs.insert(club.clone());
                    }
                    if division.official {
                        official_scores.push(entry.score);
                    }
                }
            }
            for unscored in &partition.unscored {
                athletes.insert(normalize_identity(&unscored.name));
                if let Some(club) = &unscored.club {
                    clubs.insert(club.clone());
                }
            }

            stats.leaders.push(partition_leaders(partition));
        }

        stats.by_category = by_category
            .into_iter()
            .map(|((discipline, sex), entries)| CategoryCount {
                sex,
                discipline,
                entries,
            })
            .collect();
        stats.unique_athletes = athletes.len();
        stats.clubs = clubs.len();

        if !official_scores.is_empty() {
            let sum: f64 = official_scores.iter().sum();
            stats.mean_points = Some(sum / official_scores.len() as f64);
            stats.best_points = official_scores.iter().copied().reduce(f64::max);
        }

        stats
    }

    pub fn category(&self, sex: Sex, discipline: Discipline) -> usize {
        self.by_category
            .iter()
            .find(|c| c.sex == sex && c.discipline == discipline)
            .map_or(0, |c| c.entries)
    }

    pub fn leaders_for(&self, key: &PartitionKey) -> Option<&PartitionLeaders> {
        self.leaders.iter().find(|l| &l.key == key)
    }
}
