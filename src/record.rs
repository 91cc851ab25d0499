// 🏋️ Competitor Records - Input shape shared by every loader
//
// A CompetitorRecord is what a loader hands to the engine: free-text
// equipment/division values as found in the source file, parsed numbers,
// and provenance. Canonical categories are derived later, never read in.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

// ============================================================================
// ENUMERATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Parse the one-letter code used by results files
    pub fn parse(value: &str) -> Option<Sex> {
        match value.trim().to_ascii_uppercase().as_str() {
            "M" | "MALE" => Some(Sex::Male),
            "F" | "FEMALE" => Some(Sex::Female),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Discipline {
    /// Squat + bench + deadlift
    FullPower,
    BenchOnly,
}

impl Discipline {
    /// Parse the `Event` column ("SBD" / "B")
    pub fn parse(value: &str) -> Option<Discipline> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SBD" => Some(Discipline::FullPower),
            "B" => Some(Discipline::BenchOnly),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Discipline::FullPower => "SBD",
            Discipline::BenchOnly => "B",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Discipline::FullPower => "Full Power",
            Discipline::BenchOnly => "Bench Only",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Equipment {
    Raw,
    Equipped,
}

impl Equipment {
    pub fn label(&self) -> &'static str {
        match self {
            Equipment::Raw => "Raw",
            Equipment::Equipped => "Equipped",
        }
    }
}

/// Canonical age/experience bracket.
///
/// Declaration order is the presentation precedence: SubJunior first,
/// Guest always last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Division {
    SubJunior,
    Junior,
    Open,
    MasterI,
    MasterII,
    MasterIII,
    MasterIV,
    Guest,
}

impl Division {
    pub const ALL: [Division; 8] = [
        Division::SubJunior,
        Division::Junior,
        Division::Open,
        Division::MasterI,
        Division::MasterII,
        Division::MasterIII,
        Division::MasterIV,
        Division::Guest,
    ];

    /// Position in the fixed presentation order (0 = first)
    pub fn precedence(&self) -> u8 {
        match self {
            Division::SubJunior => 0,
            Division::Junior => 1,
            Division::Open => 2,
            Division::MasterI => 3,
            Division::MasterII => 4,
            Division::MasterIII => 5,
            Division::MasterIV => 6,
            Division::Guest => 7,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Division::SubJunior => "Sub-Junior",
            Division::Junior => "Junior",
            Division::Open => "Open",
            Division::MasterI => "Master I",
            Division::MasterII => "Master II",
            Division::MasterIII => "Master III",
            Division::MasterIV => "Master IV",
            Division::Guest => "Guest",
        }
    }

    /// Guests are listed but never count for clubs
    pub fn is_guest(&self) -> bool {
        matches!(self, Division::Guest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Completed,
    NoShow,
    Disqualified,
}

// ============================================================================
// WEIGHT CLASS
// ============================================================================

/// Weight class as printed in results files.
///
/// - `"83"` → `Limit(83.0)`
/// - `"120+"` → `SuperHeavy(120.0)` (sorts after every numeric limit)
/// - anything else (e.g. `"All Guest"`) → `Unclassified`, sorted last
#[derive(Debug, Clone, PartialEq)]
pub enum WeightClass {
    Limit(f64),
    SuperHeavy(f64),
    Unclassified(String),
}

impl WeightClass {
    pub fn parse(value: &str) -> WeightClass {
        let trimmed = value.trim();

        if let Some(base) = trimmed.strip_suffix('+') {
            if let Ok(kg) = base.trim().parse::<f64>() {
                return WeightClass::SuperHeavy(kg);
            }
        }

        match trimmed.parse::<f64>() {
            Ok(kg) if kg.is_finite() => WeightClass::Limit(kg),
            _ => WeightClass::Unclassified(trimmed.to_string()),
        }
    }

    /// Sort bucket: numeric limits, then superheavy, then unclassified
    pub fn rank_bucket(&self) -> u8 {
        match self {
            WeightClass::Limit(_) => 0,
            WeightClass::SuperHeavy(_) => 1,
            WeightClass::Unclassified(_) => 2,
        }
    }

    /// Total order used by the sort policy
    pub fn cmp_class(&self, other: &WeightClass) -> Ordering {
        match (self, other) {
            (WeightClass::Limit(a), WeightClass::Limit(b))
            | (WeightClass::SuperHeavy(a), WeightClass::SuperHeavy(b)) => a.total_cmp(b),
            (WeightClass::Unclassified(a), WeightClass::Unclassified(b)) => a.cmp(b),
            _ => self.rank_bucket().cmp(&other.rank_bucket()),
        }
    }
}

impl fmt::Display for WeightClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightClass::Limit(kg) => write!(f, "{}", kg),
            WeightClass::SuperHeavy(kg) => write!(f, "{}+", kg),
            WeightClass::Unclassified(text) => f.write_str(text),
        }
    }
}

impl Serialize for WeightClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeightClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(WeightClass::parse(&text))
    }
}

// ============================================================================
// COMPETITOR RECORD
// ============================================================================

/// One attempt-set for one competitor in one event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorRecord {
    pub name: String,
    pub sex: Sex,
    pub discipline: Discipline,

    // Free text, normalized by the engine
    pub equipment_raw: String,
    pub division_raw: String,

    pub bodyweight_kg: Option<f64>,
    pub weight_class: WeightClass,

    /// None or <= 0 marks a non-participating record
    pub total_kg: Option<f64>,

    /// Supplied governing-body score, if the source had one
    pub score: Option<f64>,
    pub status: Status,

    /// Competing out of the ranking (Place `G`); listed with the guests
    #[serde(default)]
    pub guest: bool,

    /// Club printed in the results file itself (`Team` column)
    pub team: Option<String>,

    // Provenance
    pub place_raw: Option<String>,
    pub line_number: usize,
}

impl CompetitorRecord {
    /// Create a completed record with the required fields
    pub fn new(
        name: String,
        sex: Sex,
        discipline: Discipline,
        equipment_raw: String,
        division_raw: String,
        weight_class: WeightClass,
    ) -> Self {
        CompetitorRecord {
            name,
            sex,
            discipline,
            equipment_raw,
            division_raw,
            bodyweight_kg: None,
            weight_class,
            total_kg: None,
            score: None,
            status: Status::Completed,
            guest: false,
            team: None,
            place_raw: None,
            line_number: 0,
        }
    }

    pub fn with_bodyweight(mut self, kg: f64) -> Self {
        self.bodyweight_kg = Some(kg);
        self
    }

    pub fn with_total(mut self, kg: f64) -> Self {
        self.total_kg = Some(kg);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_guest(mut self) -> Self {
        self.guest = true;
        self
    }

    pub fn with_team(mut self, team: String) -> Self {
        self.team = Some(team);
        self
    }

    pub fn with_line(mut self, line_number: usize) -> Self {
        self.line_number = line_number;
        self
    }
}

/// One row of the club roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubRosterEntry {
    pub name: String,
    pub club: String,
    /// Kept for the renderer; ranking never reads it
    pub birth_year: Option<i32>,
}

impl ClubRosterEntry {
    pub fn new(name: &str, club: &str) -> Self {
        ClubRosterEntry {
            name: name.to_string(),
            club: club.to_string(),
            birth_year: None,
        }
    }
}

// ============================================================================
// PARTITION KEY
// ============================================================================

/// Scope of every ranking: (sex, discipline, equipment).
///
/// Ordering: every Raw partition before any Equipped one; within an
/// equipment, full power before bench, then men before women.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    pub sex: Sex,
    pub discipline: Discipline,
    pub equipment: Equipment,
}

impl PartitionKey {
    pub fn new(sex: Sex, discipline: Discipline, equipment: Equipment) -> Self {
        PartitionKey {
            sex,
            discipline,
            equipment,
        }
    }

    pub fn label(&self) -> String {
        format!(
            "{} {} {}",
            self.sex.label(),
            self.discipline.label(),
            self.equipment.label()
        )
    }

    /// File-name friendly label, e.g. `male_full_power_raw`
    pub fn slug(&self) -> String {
        self.label().to_lowercase().replace(' ', "_")
    }
}

impl Ord for PartitionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.equipment, self.discipline, self.sex).cmp(&(
            other.equipment,
            other.discipline,
            other.sex,
        ))
    }
}

impl PartialOrd for PartitionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
