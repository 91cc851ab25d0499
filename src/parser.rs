// 🏗️ Results Loader - Meet results and club roster files
// Two results layouts behind one trait, plus the roster loader
//
// Flat:             header on line 1
// MetadataPrefixed: OpenPowerlifting export, a few meet-info lines first,
//                   header somewhere in the first 10 lines, Place column first

use crate::record::{ClubRosterEntry, CompetitorRecord, Discipline, Sex, Status, WeightClass};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Lines searched for a header row
pub const HEADER_SEARCH_LINES: usize = 10;

/// Roster file names, checked in this order
pub const ROSTER_FILE_NAMES: [&str; 2] = ["klubovi.csv", "clubs.csv"];

// ============================================================================
// CORE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultsLayout {
    Flat,
    MetadataPrefixed,
}

impl ResultsLayout {
    pub fn name(&self) -> &str {
        match self {
            ResultsLayout::Flat => "Flat CSV",
            ResultsLayout::MetadataPrefixed => "OpenPowerlifting CSV",
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ResultsLayout::Flat => "csv",
            ResultsLayout::MetadataPrefixed => "opl",
        }
    }
}

/// ResultsLoader - one implementation per results layout
pub trait ResultsLoader: Send + Sync {
    /// Load every row of the file as a competitor record
    fn load(&self, file_path: &Path) -> Result<Vec<CompetitorRecord>>;

    fn layout(&self) -> ResultsLayout;

    /// Loader version (for provenance tracking)
    fn version(&self) -> &str {
        "1.0.0"
    }
}

/// FileValidator - Optional capability: check a file before loading it
pub trait FileValidator {
    fn can_load(&self, file_path: &Path) -> bool;
}

// ============================================================================
// FACTORY FUNCTIONS
// ============================================================================

/// Detect the layout from the file name, then from the first line.
///
/// `*.opl.csv` is always MetadataPrefixed. Otherwise a first line carrying
/// Name, Sex and Event columns means Flat.
pub fn detect_layout(file_path: &Path) -> Result<ResultsLayout> {
    let filename = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();

    if filename.ends_with(".opl.csv") {
        return Ok(ResultsLayout::MetadataPrefixed);
    }

    let content = read_text(file_path)?;
    let first_line = content.lines().next().unwrap_or("");

    if is_results_header(first_line) {
        Ok(ResultsLayout::Flat)
    } else {
        Ok(ResultsLayout::MetadataPrefixed)
    }
}

/// Factory: Box<dyn ResultsLoader> for a layout
pub fn get_loader(layout: ResultsLayout) -> Box<dyn ResultsLoader> {
    match layout {
        ResultsLayout::Flat => Box::new(FlatLoader::new()),
        ResultsLayout::MetadataPrefixed => Box::new(MetadataPrefixedLoader::new()),
    }
}

/// Detect, pick the loader, load
pub fn load_results(file_path: &Path) -> Result<Vec<CompetitorRecord>> {
    let layout = detect_layout(file_path)?;
    info!(file = %file_path.display(), layout = layout.code(), "loading results");
    get_loader(layout).load(file_path)
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

fn read_text(file_path: &Path) -> Result<String> {
    let content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read file: {}", file_path.display()))?;
    Ok(content.trim_start_matches('\u{feff}').to_string())
}

fn file_label(file_path: &Path) -> String {
    file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.csv")
        .to_string()
}

/// `;` when the line has more semicolons than commas, `,` otherwise
pub fn sniff_delimiter(line: &str) -> u8 {
    let semicolons = line.matches(';').count();
    let commas = line.matches(',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

/// Split one line into trimmed cells
fn split_line(line: &str, delimiter: u8) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => record.iter().map(|c| c.trim().to_string()).collect(),
        _ => Vec::new(),
    }
}

fn header_key(cell: &str) -> String {
    cell.trim().to_lowercase()
}

fn is_results_header(line: &str) -> bool {
    let cells: Vec<String> = split_line(line, sniff_delimiter(line))
        .iter()
        .map(|c| header_key(c))
        .collect();
    ["name", "sex", "event"]
        .iter()
        .all(|required| cells.iter().any(|c| c == required))
}

/// Index of the first line (within `limit`) accepted by `is_header`
fn find_header_line<F>(content: &str, limit: usize, is_header: F) -> Option<usize>
where
    F: Fn(&str) -> bool,
{
    content.lines().take(limit).position(is_header)
}

/// Number cell; empty → None, decimal comma accepted ("82,5"), NaN and
/// infinities rejected
fn parse_number(cell: &str) -> Result<Option<f64>> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: f64 = trimmed
        .replace(',', ".")
        .parse()
        .map_err(|_| anyhow!("'{}' is not a number", trimmed))?;
    if !value.is_finite() {
        return Err(anyhow!("'{}' is not a finite number", trimmed));
    }
    Ok(Some(value))
}

fn parse_status(place: &str) -> Status {
    match place.trim().to_uppercase().as_str() {
        "NS" => Status::NoShow,
        "DQ" | "DD" => Status::Disqualified,
        _ => Status::Completed,
    }
}

/// Place `G`: lifted as a guest, outside the ranking
fn is_guest_place(place: &str) -> bool {
    place.trim().eq_ignore_ascii_case("G")
}

// ============================================================================
// COLUMN MAP (results)
// ============================================================================

/// Column positions resolved from the header row
#[derive(Debug, Clone, Default)]
struct ResultsColumns {
    place: Option<usize>,
    name: usize,
    sex: usize,
    event: usize,
    equipment: Option<usize>,
    division: Option<usize>,
    bodyweight: Option<usize>,
    weight_class: Option<usize>,
    best_squat: Option<usize>,
    best_bench: Option<usize>,
    best_deadlift: Option<usize>,
    total: Option<usize>,
    score: Option<usize>,
    team: Option<usize>,
}

impl ResultsColumns {
    fn from_header(header: &[String]) -> Result<Self> {
        let keys: Vec<String> = header.iter().map(|h| header_key(h)).collect();
        let require = |column: &str| {
            find_column(&keys, &[column]).ok_or_else(|| {
                anyhow!(
                    "Missing required column '{}'. Found columns: {}",
                    column,
                    header.join(", ")
                )
            })
        };

        Ok(ResultsColumns {
            place: find_column(&keys, &["place"]),
            name: require("name")?,
            sex: require("sex")?,
            event: require("event")?,
            equipment: find_column(&keys, &["equipment"]),
            division: find_column(&keys, &["division"]),
            bodyweight: find_column(&keys, &["bodyweightkg", "bodyweight"]),
            weight_class: find_column(&keys, &["weightclasskg", "weightclass"]),
            best_squat: find_column(&keys, &["best3squatkg"]),
            best_bench: find_column(&keys, &["best3benchkg"]),
            best_deadlift: find_column(&keys, &["best3deadliftkg"]),
            total: find_column(&keys, &["totalkg", "total"]),
            score: find_column(&keys, &["score", "points", "goodlift", "ipf gl points"]),
            team: find_column(&keys, &["team", "club"]),
        })
    }
}

/// First alias present in `keys`, in alias order
fn find_column(keys: &[String], aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| keys.iter().position(|k| k == alias))
}

fn cell<'a>(row: &'a csv::StringRecord, column: Option<usize>) -> &'a str {
    column.and_then(|i| row.get(i)).unwrap_or("").trim()
}

/// Total from the best lifts: bench alone for bench-only, all three
/// (each successful) for full power
fn derive_total(
    discipline: Discipline,
    squat: Option<f64>,
    bench: Option<f64>,
    deadlift: Option<f64>,
) -> Option<f64> {
    let good = |lift: Option<f64>| lift.filter(|kg| *kg > 0.0);

    match discipline {
        Discipline::BenchOnly => good(bench),
        Discipline::FullPower => Some(good(squat)? + good(bench)? + good(deadlift)?),
    }
}

/// Parse the rows that follow the header at `header_index` (0-based)
fn load_rows(content: &str, header_index: usize, file_path: &Path) -> Result<Vec<CompetitorRecord>> {
    let filename = file_label(file_path);
    let body: String = content
        .lines()
        .skip(header_index)
        .collect::<Vec<_>>()
        .join("\n");
    let header_line = body.lines().next().unwrap_or("");
    let delimiter = sniff_delimiter(header_line);

    let header = split_line(header_line, delimiter);
    let columns = ResultsColumns::from_header(&header)
        .with_context(|| format!("Unrecognized results header in {}", filename))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut records = Vec::new();

    for (row_num, result) in reader.records().enumerate() {
        let row = result.with_context(|| {
            format!("Failed to parse CSV row {} in {}", row_num + 1, filename)
        })?;
        let line_number = row
            .position()
            .map(|p| header_index + p.line() as usize)
            .unwrap_or(header_index + row_num + 2);

        let name = cell(&row, Some(columns.name));
        if name.is_empty() {
            debug!(file = %filename, line = line_number, "skipping row without name");
            continue;
        }

        let record = parse_row(&row, &columns, name)
            .with_context(|| format!("{}:{}: invalid row for '{}'", filename, line_number, name))?;
        records.push(record.with_line(line_number));
    }

    info!(file = %filename, records = records.len(), "results loaded");
    Ok(records)
}

fn parse_row(row: &csv::StringRecord, columns: &ResultsColumns, name: &str) -> Result<CompetitorRecord> {
    let sex_raw = cell(row, Some(columns.sex));
    let sex = Sex::parse(sex_raw).ok_or_else(|| anyhow!("unsupported Sex '{}'", sex_raw))?;

    let event_raw = cell(row, Some(columns.event));
    let discipline = Discipline::parse(event_raw)
        .ok_or_else(|| anyhow!("unsupported Event '{}'", event_raw))?;

    // No Division column at all: everyone is Open
    let division_raw = match columns.division {
        Some(_) => cell(row, columns.division),
        None => "Open",
    };

    let mut record = CompetitorRecord::new(
        name.to_string(),
        sex,
        discipline,
        cell(row, columns.equipment).to_string(),
        division_raw.to_string(),
        WeightClass::parse(cell(row, columns.weight_class)),
    );

    let place = cell(row, columns.place);
    if !place.is_empty() {
        record.status = parse_status(place);
        record.guest = is_guest_place(place);
        record.place_raw = Some(place.to_string());
    }

    record.bodyweight_kg = parse_number(cell(row, columns.bodyweight)).context("BodyweightKg")?;
    record.score = parse_number(cell(row, columns.score)).context("score")?;

    record.total_kg = match parse_number(cell(row, columns.total)).context("TotalKg")? {
        Some(total) => Some(total),
        None => derive_total(
            discipline,
            parse_number(cell(row, columns.best_squat)).context("Best3SquatKg")?,
            parse_number(cell(row, columns.best_bench)).context("Best3BenchKg")?,
            parse_number(cell(row, columns.best_deadlift)).context("Best3DeadliftKg")?,
        ),
    };

    let team = cell(row, columns.team);
    if !team.is_empty() {
        record.team = Some(team.to_string());
    }

    Ok(record)
}

// ============================================================================
// LOADERS
// ============================================================================

/// Header on the first line
pub struct FlatLoader;

impl FlatLoader {
    pub fn new() -> Self {
        FlatLoader
    }
}

impl Default for FlatLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultsLoader for FlatLoader {
    fn load(&self, file_path: &Path) -> Result<Vec<CompetitorRecord>> {
        let content = read_text(file_path)?;
        load_rows(&content, 0, file_path)
    }

    fn layout(&self) -> ResultsLayout {
        ResultsLayout::Flat
    }
}

impl FileValidator for FlatLoader {
    fn can_load(&self, file_path: &Path) -> bool {
        read_text(file_path)
            .map(|content| is_results_header(content.lines().next().unwrap_or("")))
            .unwrap_or(false)
    }
}

/// Meet-info lines first, header within the first 10 lines
pub struct MetadataPrefixedLoader;

impl MetadataPrefixedLoader {
    pub fn new() -> Self {
        MetadataPrefixedLoader
    }
}

impl Default for MetadataPrefixedLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultsLoader for MetadataPrefixedLoader {
    fn load(&self, file_path: &Path) -> Result<Vec<CompetitorRecord>> {
        let content = read_text(file_path)?;
        let header_index = find_header_line(&content, HEADER_SEARCH_LINES, is_results_header)
            .ok_or_else(|| {
                anyhow!(
                    "No Name/Sex/Event header in the first {} lines of {}",
                    HEADER_SEARCH_LINES,
                    file_label(file_path)
                )
            })?;

        debug!(header_line = header_index + 1, "results header found");
        load_rows(&content, header_index, file_path)
    }

    fn layout(&self) -> ResultsLayout {
        ResultsLayout::MetadataPrefixed
    }
}

impl FileValidator for MetadataPrefixedLoader {
    fn can_load(&self, file_path: &Path) -> bool {
        read_text(file_path)
            .map(|content| {
                find_header_line(&content, HEADER_SEARCH_LINES, is_results_header).is_some()
            })
            .unwrap_or(false)
    }
}

// ============================================================================
// ROSTER
// ============================================================================

#[derive(Debug, Clone, Default)]
struct RosterColumns {
    first_name: Option<usize>,
    last_name: Option<usize>,
    full_name: Option<usize>,
    club: usize,
    birth_year: Option<usize>,
}

impl RosterColumns {
    fn from_cells(cells: &[String]) -> Option<Self> {
        let keys: Vec<String> = cells.iter().map(|c| c.trim().to_uppercase()).collect();

        let columns = RosterColumns {
            first_name: find_column(&keys, &["IME"]),
            last_name: find_column(&keys, &["PREZIME"]),
            full_name: find_column(&keys, &["NAME", "FULL NAME"]),
            club: find_column(&keys, &["KLUB", "CLUB"])?,
            birth_year: find_column(&keys, &["GODIŠTE", "GODISTE", "BIRTHYEAR", "BIRTH YEAR"]),
        };

        let has_split_name = columns.first_name.is_some() && columns.last_name.is_some();
        if has_split_name || columns.full_name.is_some() {
            Some(columns)
        } else {
            None
        }
    }

    fn name(&self, row: &csv::StringRecord) -> String {
        match (self.first_name, self.last_name) {
            (Some(first), Some(last)) => {
                format!("{} {}", cell(row, Some(first)), cell(row, Some(last)))
                    .trim()
                    .to_string()
            }
            _ => cell(row, self.full_name).to_string(),
        }
    }

    fn is_repeated_header(&self, row: &csv::StringRecord) -> bool {
        let club = cell(row, Some(self.club)).to_uppercase();
        club == "KLUB" || club == "CLUB"
    }
}

/// Load the club roster.
///
/// Header row (IME/PREZIME or NAME, KLUB/CLUB) is searched in the first 10
/// lines; rows without a name or club and repeated headers are skipped.
pub fn load_roster(file_path: &Path) -> Result<Vec<ClubRosterEntry>> {
    let filename = file_label(file_path);
    let content = read_text(file_path)?;

    let (header_index, delimiter, columns) = content
        .lines()
        .take(HEADER_SEARCH_LINES)
        .enumerate()
        .find_map(|(i, line)| {
            let delimiter = sniff_delimiter(line);
            RosterColumns::from_cells(&split_line(line, delimiter)).map(|c| (i, delimiter, c))
        })
        .ok_or_else(|| {
            anyhow!(
                "No roster header (IME/PREZIME or NAME, KLUB/CLUB) in the first {} lines of {}",
                HEADER_SEARCH_LINES,
                filename
            )
        })?;

    let body: String = content
        .lines()
        .skip(header_index)
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut roster = Vec::new();
    let mut skipped = 0usize;

    for (row_num, result) in reader.records().enumerate() {
        let row = result.with_context(|| {
            format!("Failed to parse roster row {} in {}", row_num + 1, filename)
        })?;

        let name = columns.name(&row);
        let club = cell(&row, Some(columns.club));
        if name.is_empty() || club.is_empty() || columns.is_repeated_header(&row) {
            skipped += 1;
            continue;
        }

        let mut entry = ClubRosterEntry::new(&name, club);
        entry.birth_year = parse_number(cell(&row, columns.birth_year))
            .ok()
            .flatten()
            .map(|year| year as i32);
        roster.push(entry);
    }

    if skipped > 0 {
        debug!(file = %filename, skipped, "roster rows skipped");
    }
    info!(file = %filename, entries = roster.len(), "roster loaded");
    Ok(roster)
}

// ============================================================================
// INPUT DISCOVERY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFiles {
    pub results: PathBuf,
    pub roster: Option<PathBuf>,
}

fn is_roster_name(filename: &str) -> bool {
    ROSTER_FILE_NAMES
        .iter()
        .any(|roster| filename.eq_ignore_ascii_case(roster))
}

/// Find the results file and the roster in a directory.
///
/// Every `*.csv` except the roster is a results candidate; `*.opl.csv`
/// wins, then the first by name.
pub fn discover_inputs(dir: &Path) -> Result<InputFiles> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read input directory: {}", dir.display()))?;

    let mut csv_files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to list input directory: {}", dir.display()))?
            .path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            csv_files.push(path);
        }
    }
    csv_files.sort();

    let roster = ROSTER_FILE_NAMES.iter().find_map(|roster_name| {
        csv_files
            .iter()
            .find(|p| file_label(p).eq_ignore_ascii_case(roster_name))
            .cloned()
    });

    let candidates: Vec<&PathBuf> = csv_files
        .iter()
        .filter(|p| !is_roster_name(&file_label(p)))
        .collect();

    let results = candidates
        .iter()
        .find(|p| file_label(p).to_lowercase().ends_with(".opl.csv"))
        .or_else(|| candidates.first())
        .map(|p| (*p).clone())
        .ok_or_else(|| {
            anyhow!(
                "No results file in {} (expected *.csv or *.opl.csv)",
                dir.display()
            )
        })?;

    if candidates.len() > 1 {
        warn!(
            chosen = %results.display(),
            candidates = candidates.len(),
            "several results files found"
        );
    }
    if roster.is_none() {
        warn!(dir = %dir.display(), "no roster file found");
    }

    Ok(InputFiles { results, roster })
}
