// 📤 Export - Standings to plain files
//
// Per partition: <slug>_individual.csv, <slug>_clubs.csv
// Per run:       summary.json (run id, timestamp, fingerprint, diagnostics,
//                meet statistics)
//
// Values are rounded to 2 decimals here and only here.

use crate::diagnostics::Diagnostics;
use crate::engine::Standings;
use crate::ranking::{PartitionStandings, UnscoredEntry};
use crate::scoring::ScoreSource;
use crate::statistics::MeetStatistics;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

pub const SUMMARY_FILE: &str = "summary.json";

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// ROWS
// ============================================================================

#[derive(Debug, Serialize)]
struct IndividualRow<'a> {
    #[serde(rename = "Division")]
    division: &'static str,
    #[serde(rename = "WeightClassKg")]
    weight_class: String,
    #[serde(rename = "Place")]
    place: u32,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Club")]
    club: &'a str,
    #[serde(rename = "BodyweightKg")]
    bodyweight_kg: Option<f64>,
    #[serde(rename = "TotalKg")]
    total_kg: f64,
    #[serde(rename = "Score")]
    score: f64,
    #[serde(rename = "ScoreSource")]
    score_source: &'static str,
    #[serde(rename = "CountsForClub")]
    counts_for_club: bool,
}

#[derive(Debug, Serialize)]
struct ClubRow<'a> {
    #[serde(rename = "Place")]
    place: u32,
    #[serde(rename = "Club")]
    club: &'a str,
    #[serde(rename = "Points")]
    points: f64,
    #[serde(rename = "Lifters")]
    lifters: usize,
    #[serde(rename = "Contributors")]
    contributors: String,
}

fn source_label(source: ScoreSource) -> &'static str {
    match source {
        ScoreSource::Supplied => "supplied",
        ScoreSource::Computed => "computed",
    }
}

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionSummary {
    pub partition: String,
    pub slug: String,
    pub ranked: usize,
    pub clubs: usize,
    pub unscored: Vec<UnscoredEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub engine_version: String,
    pub fingerprint: String,
    pub partitions: Vec<PartitionSummary>,
    pub diagnostics: Diagnostics,
    pub statistics: MeetStatistics,
}

impl RunSummary {
    pub fn new(standings: &Standings) -> Self {
        RunSummary {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            engine_version: crate::VERSION.to_string(),
            fingerprint: standings.fingerprint(),
            partitions: standings
                .partitions
                .iter()
                .map(|p| PartitionSummary {
                    partition: p.key.label(),
                    slug: p.key.slug(),
                    ranked: p.individual.len(),
                    clubs: p.clubs.len(),
                    unscored: p.unscored.clone(),
                })
                .collect(),
            diagnostics: standings.diagnostics.clone(),
            statistics: standings.statistics.clone(),
        }
    }
}

/// What an export wrote
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub run_id: Uuid,
    pub files: Vec<PathBuf>,
}

// ============================================================================
// WRITERS
// ============================================================================

pub fn write_individual_csv(partition: &PartitionStandings, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for entry in partition.individual.entries() {
        writer
            .serialize(IndividualRow {
                division: entry.division_label(),
                weight_class: entry.weight_class.to_string(),
                place: entry.place,
                name: &entry.name,
                club: entry.club_label(),
                bodyweight_kg: entry.bodyweight_kg,
                total_kg: entry.total_kg,
                score: round2(entry.score),
                score_source: source_label(entry.score_source),
                counts_for_club: entry.counts_for_club,
            })
            .with_context(|| format!("Failed to write row for '{}'", entry.name))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

pub fn write_clubs_csv(partition: &PartitionStandings, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for club in &partition.clubs {
        let contributors = club
            .contributors
            .iter()
            .map(|c| format!("{}. {} ({:.2})", c.rank, c.name, c.score))
            .collect::<Vec<_>>()
            .join("; ");

        writer
            .serialize(ClubRow {
                place: club.place,
                club: &club.club,
                points: round2(club.points),
                lifters: club.contributors.len(),
                contributors,
            })
            .with_context(|| format!("Failed to write row for club '{}'", club.club))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

/// Write every partition's tables plus summary.json into `dir`
pub fn export_standings(standings: &Standings, dir: &Path) -> Result<ExportReport> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let mut files = Vec::new();

    for partition in &standings.partitions {
        let slug = partition.key.slug();

        let individual = dir.join(format!("{}_individual.csv", slug));
        write_individual_csv(partition, &individual)?;
        files.push(individual);

        let clubs = dir.join(format!("{}_clubs.csv", slug));
        write_clubs_csv(partition, &clubs)?;
        files.push(clubs);
    }

    let summary = RunSummary::new(standings);
    let summary_path = dir.join(SUMMARY_FILE);
    let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
    fs::write(&summary_path, json)
        .with_context(|| format!("Failed to write {}", summary_path.display()))?;
    files.push(summary_path);

    info!(
        run_id = %summary.run_id,
        files = files.len(),
        dir = %dir.display(),
        "standings exported"
    );

    Ok(ExportReport {
        run_id: summary.run_id,
        files,
    })
}
