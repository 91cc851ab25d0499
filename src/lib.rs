// Meet Standings - Core Library
// Normalization & ranking engine for powerlifting meet results

pub mod error;
pub mod record;
pub mod categories;   // Category Normalizer
pub mod clubs;        // Club Resolver
pub mod scoring;      // Score Resolver (GL points)
pub mod eligibility;  // Eligibility Filter
pub mod sort_policy;
pub mod ranking;      // Individual + club standings
pub mod statistics;   // Meet statistics
pub mod diagnostics;
pub mod config;
pub mod engine;       // Pipeline
pub mod parser;       // Results + roster loaders
pub mod export;

// Re-export commonly used types
pub use error::{CategoryField, EngineError};
pub use record::{
    ClubRosterEntry, CompetitorRecord, Discipline, Division, Equipment,
    PartitionKey, Sex, Status, WeightClass,
};
pub use categories::{Categories, CategoryNormalizer, CategoryTables};
pub use clubs::{ClubResolution, ClubResolver};
pub use scoring::{gl_points, resolve_score, ResolvedScore, ScoreSource};
pub use eligibility::{EligibilityOutcome, EligibleRecord, FilterSummary};
pub use ranking::{
    ClubContributor, ClubScore, IndividualRanking, PartitionStandings,
    RankedEntry, RankingEngine, UnscoredEntry,
};
pub use statistics::{MeetStatistics, PartitionLeaders, TopLifter};
pub use diagnostics::{DiagnosticIssue, Diagnostics, IssueKind, Severity};
pub use config::EngineConfig;
pub use engine::{Standings, StandingsEngine};
pub use parser::{
    ResultsLayout, ResultsLoader, FileValidator,
    detect_layout, get_loader, load_results, load_roster, discover_inputs,
    FlatLoader, MetadataPrefixedLoader, InputFiles,
};
pub use export::{export_standings, ExportReport, RunSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
