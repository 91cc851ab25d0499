// 🏆 meet-standings - CLI
// run: load results + roster → standings → CSV/JSON files

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::error;

use meet_standings::{
    detect_layout, discover_inputs, export_standings, get_loader, load_roster, CategoryTables,
    EngineConfig, Severity, Standings, StandingsEngine,
};

#[derive(Parser, Debug)]
#[command(name = "meet-standings", version, about = "Individual and club standings for powerlifting meets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute standings and write them to an output directory
    Run(RunArgs),
    /// Print the detected layout of a results file
    Detect {
        file: PathBuf,
    },
    /// Print the built-in category tables as JSON
    Tables,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Results file (.csv or .opl.csv)
    #[arg(long, conflicts_with = "input_dir")]
    results: Option<PathBuf>,

    /// Club roster file (klubovi.csv)
    #[arg(long, conflicts_with = "input_dir")]
    roster: Option<PathBuf>,

    /// Directory to discover results and roster in
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Output directory
    #[arg(long, default_value = "output")]
    out: PathBuf,

    /// Engine config (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            init_tracing(args.verbose);
            run(args)
        }
        Commands::Detect { file } => {
            init_tracing(false);
            let layout = detect_layout(&file)?;
            println!("📄 {}: {} ({})", file.display(), layout.name(), layout.code());
            Ok(())
        }
        Commands::Tables => {
            let json = serde_json::to_string_pretty(&CategoryTables::default())
                .context("Failed to serialize category tables")?;
            println!("{}", json);
            Ok(())
        }
    }
}

/// Results and roster paths from explicit flags or directory discovery
fn resolve_inputs(args: &RunArgs) -> Result<(PathBuf, Option<PathBuf>)> {
    if let Some(dir) = &args.input_dir {
        let inputs = discover_inputs(dir)?;
        return Ok((inputs.results, inputs.roster));
    }

    let results = args
        .results
        .clone()
        .ok_or_else(|| anyhow!("either --results or --input-dir is required"))?;
    Ok((results, args.roster.clone()))
}

fn run(args: RunArgs) -> Result<()> {
    println!("🏋️  Meet Standings v{}", meet_standings::VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = EngineConfig::load_or_default(args.config.as_deref())?;
    let engine = StandingsEngine::new(config)?;

    // 1. Load
    let (results_path, roster_path) = resolve_inputs(&args)?;
    println!("\n📂 Loading results: {}", results_path.display());
    let layout = detect_layout(&results_path)?;
    let records = get_loader(layout).load(&results_path)?;
    println!("✓ Loaded {} records ({})", records.len(), layout.name());

    let roster = match &roster_path {
        Some(path) => {
            println!("\n📋 Loading roster: {}", path.display());
            let roster = load_roster(path)?;
            println!("✓ Loaded {} roster entries", roster.len());
            roster
        }
        None => {
            println!("\n⚠️  No roster, clubs come from the results file only");
            Vec::new()
        }
    };

    // 2. Rank
    println!("\n🧮 Computing standings...");
    let standings = match engine.run(&records, &roster) {
        Ok(standings) => standings,
        Err(err) => {
            error!(%err, "run aborted");
            eprintln!("❌ {}", err);
            return Err(err.into());
        }
    };
    print_standings(&standings);

    // 3. Export
    println!("\n💾 Writing files to {}...", args.out.display());
    let report = export_standings(&standings, &args.out)?;
    for file in &report.files {
        println!("   {}", display_name(file));
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Run {} complete", report.run_id);
    println!("🔑 Fingerprint: {}", standings.fingerprint());

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("?")
        .to_string()
}

fn print_standings(standings: &Standings) {
    for partition in &standings.partitions {
        println!(
            "\n🏅 {}: {} ranked, {} clubs",
            partition.key.label(),
            partition.individual.len(),
            partition.clubs.len()
        );
        for club in partition.clubs.iter().take(3) {
            println!("   {}. {} - {:.2}", club.place, club.club, club.points);
        }
        if !partition.unscored.is_empty() {
            println!("   ⚠️  {} without score", partition.unscored.len());
        }
    }

    let stats = &standings.statistics;
    println!(
        "\n📈 {} entries ({} men, {} women; {} full power, {} bench), {} athletes, {} clubs",
        stats.entries,
        stats.male_entries,
        stats.female_entries,
        stats.full_power_entries,
        stats.bench_only_entries,
        stats.unique_athletes,
        stats.clubs
    );
    if let (Some(mean), Some(best)) = (stats.mean_points, stats.best_points) {
        println!("   Points: mean {:.2}, best {:.2}", mean, best);
    }

    let diagnostics = &standings.diagnostics;
    println!("\n📊 {}", diagnostics.summary());

    if diagnostics.needs_review() {
        println!("\n⚠️  Needs review:");
        for issue in diagnostics
            .issues
            .iter()
            .filter(|i| i.severity != Severity::Info)
        {
            println!("   - {}", issue.message);
        }
    }
}
