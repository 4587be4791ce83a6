use clap::{Parser, Subcommand};
use colored::Colorize;
use framelift::dedup::DuplicateRule;
use framelift::pipeline::analyze_markup;
use framelift::simhash::{hamming_distance, jaccard_similarity};
use framelift::{
    DuplicateGrouper, LogFormat, LogLevel, MigrateError, Migration, MigrationConfig,
    MigrationStats, Thresholds, DEFAULT_CONFIG_FILE,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// framelift - Flatten frame-based HTML corpora and flag near-duplicate pages
#[derive(Parser)]
#[command(name = "framelift")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate a legacy document tree
    Migrate {
        /// Source tree root
        source: PathBuf,

        /// Output directory for pages and reports
        #[arg(short, long, default_value = "migrated")]
        output: PathBuf,

        /// Only documents under this relative prefix enter navigation
        #[arg(long)]
        content_root: Option<String>,

        /// Keep plugin-hook scripts instead of stripping them
        #[arg(long)]
        preserve_scripts: bool,

        /// Maximum differing fingerprint bits for a duplicate
        #[arg(long)]
        hamming: Option<u32>,

        /// Minimum token-set similarity for a duplicate (0.0 to 1.0)
        #[arg(long)]
        jaccard: Option<f64>,

        /// Extra navigation exclusion globs (can be repeated)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Print run statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how two documents compare under the duplicate rules
    Compare {
        /// First file
        file1: PathBuf,

        /// Second file
        file2: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match MigrationConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => fail(&e),
    };
    init_tracing(&config, cli.quiet);

    let result = match cli.command {
        Commands::Migrate {
            source,
            output,
            content_root,
            preserve_scripts,
            hamming,
            jaccard,
            exclude,
            json,
        } => {
            let mut config = config;
            if let Some(root) = content_root {
                config.content_root = root;
            }
            config.preserve_scripts |= preserve_scripts;
            if let Some(h) = hamming {
                config.hamming_threshold = h;
            }
            if let Some(j) = jaccard {
                config.jaccard_threshold = j;
            }
            config.exclude.extend(exclude);
            cmd_migrate(&config, &source, &output, json, cli.quiet)
        }
        Commands::Compare { file1, file2 } => cmd_compare(&config, &file1, &file2),
    };

    if let Err(e) = result {
        fail(&e);
    }
}

fn fail(e: &MigrateError) -> ! {
    eprintln!("{}: {}", "error".red().bold(), e);
    std::process::exit(1);
}

fn init_tracing(config: &MigrationConfig, quiet: bool) {
    let level = if quiet { LogLevel::Warn } else { config.logging.level };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("framelift={}", level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = match config.logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
}

fn cmd_migrate(
    config: &MigrationConfig,
    source: &Path,
    output: &Path,
    json: bool,
    quiet: bool,
) -> Result<(), MigrateError> {
    if !quiet && !json {
        println!("{} {}", "Migrating".cyan().bold(), source.display());
    }

    let outcome = Migration::new(config, source, output).run()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.stats)?);
        return Ok(());
    }

    if !quiet {
        print_stats(&outcome.stats);
        for failure in &outcome.report.failures {
            println!("  {} {}: {}", "!".red(), failure.path, failure.error.dimmed());
        }
        println!();
        println!("{} {}", "Output written to".green(), output.display().to_string().cyan());
    }

    Ok(())
}

fn print_stats(stats: &MigrationStats) {
    println!();
    println!("{}", "Migration Statistics".green().bold());
    println!("  Files scanned:       {}", stats.files_scanned.to_string().cyan());
    println!("  Documents:           {}", stats.documents.to_string().cyan());
    println!("  Normal pages:        {}", stats.normal_pages.to_string().cyan());
    println!("  Merged framesets:    {}", stats.merged_framesets.to_string().cyan());
    println!("  Frameset listings:   {}", stats.fallback_framesets.to_string().cyan());
    println!("  Navigation entries:  {}", stats.candidates.to_string().cyan());
    println!("  Title groups:        {}", stats.title_groups.to_string().cyan());
    println!(
        "  Duplicates flagged:  {} (in {} groups)",
        stats.duplicates.to_string().yellow(),
        stats.groups_with_duplicates
    );
    if stats.failures > 0 {
        println!("  Failures:            {}", stats.failures.to_string().red());
    }
    println!("  Time elapsed:        {}ms", stats.elapsed_ms);
}

fn cmd_compare(config: &MigrationConfig, file1: &Path, file2: &Path) -> Result<(), MigrateError> {
    let read = |path: &Path| -> Result<String, MigrateError> {
        let bytes = fs::read(path).map_err(|e| MigrateError::io(path, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    };

    let a = analyze_markup(&file1.to_string_lossy(), &read(file1)?, config);
    let b = analyze_markup(&file2.to_string_lossy(), &read(file2)?, config);

    let grouper = DuplicateGrouper::new(Thresholds {
        hamming: config.hamming_threshold,
        jaccard: config.jaccard_threshold,
    });
    // Longer text plays the canonical role, as in a real group.
    let (canonical, member) = if b.text_len > a.text_len { (&b, &a) } else { (&a, &b) };
    let verdict = grouper.classify(canonical, member);

    println!("{}", "Comparison".green().bold());
    println!();
    println!("  File 1: {} ({} chars)", a.path.cyan(), a.text_len);
    println!("  File 2: {} ({} chars)", b.path.cyan(), b.text_len);
    println!("  Titles: {:?} / {:?}", a.strict_title, b.strict_title);
    if a.strict_title != b.strict_title {
        println!("  {}", "Titles differ: these pages would never be grouped".yellow());
    }
    println!();
    println!("{}", "Similarity".green().bold());
    println!();
    println!(
        "  Hamming:  {} of 64 bits (threshold {})",
        hamming_distance(a.fingerprint, b.fingerprint),
        config.hamming_threshold
    );
    println!(
        "  Jaccard:  {:.4} (threshold {})",
        jaccard_similarity(&a.tokens, &b.tokens),
        config.jaccard_threshold
    );
    println!();

    match verdict {
        Some(m) => {
            let rule = match m.rule {
                DuplicateRule::Hamming => "Hamming",
                DuplicateRule::Jaccard => "Jaccard",
            };
            println!(
                "{} {} is a duplicate of {} ({} rule)",
                "DUPLICATE".red().bold(),
                member.path,
                canonical.path.cyan(),
                rule
            );
        }
        None => println!("{}", "Distinct documents".green()),
    }

    Ok(())
}
