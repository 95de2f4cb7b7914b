use anyhow::Result;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

mod chart;
mod command;
mod config;
mod error;
mod ingest;
mod lookup;
mod snapshot;
mod term;
mod types;
mod utils;

use config::{Config, DEFAULT_CONFIG_FILE};

#[derive(Parser)]
#[command(name = "gradebot")]
#[command(about = "Course grade distribution lookups backed by a CSV export")]
struct Cli {
    /// CONL settings file (defaults apply when it does not exist)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert the department CSV export into the JSON snapshot
    Ingest {
        /// CSV export to read
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Snapshot file to write
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Answer a grades command, e.g. `gradebot grades 111 BOKLAN Fall 2024`
    Grades {
        #[arg(value_name = "COURSE SURNAME [TERM]", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List the terms on file for a course and professor
    Terms {
        course: String,
        surname: String,
    },
    /// Print the effective configuration as CONL
    Config,
    /// Remove the snapshot and rendered charts
    Clean,
}

fn run_grades(args: &[String], config: &Config) -> Result<()> {
    let reply = command::handle(&args.join(" "), config);
    println!("{}", reply.text);
    if let Some(path) = reply.chart {
        println!();
        println!("Chart: {}", utils::file_link(&path, &path.display().to_string()));
    }
    Ok(())
}

fn run_terms(course: &str, surname: &str, config: &Config) -> Result<()> {
    let snapshot = snapshot::load(&config.snapshot_path)?;
    println!("{}", command::terms_text(&snapshot, course, surname, config));
    Ok(())
}

fn run_clean(config: &Config) -> Result<()> {
    println!("Cleaning generated files...");

    if config.snapshot_path.exists() {
        fs::remove_file(&config.snapshot_path)?;
        println!("  Removed {}", config.snapshot_path.display());
    }

    if config.chart_dir.exists() {
        fs::remove_dir_all(&config.chart_dir)?;
        println!("  Removed {}/", config.chart_dir.display());
    }

    println!("Clean complete!");
    Ok(())
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Ingest { input, output } => ingest::run_ingest(
            input.as_ref().unwrap_or(&config.csv_path),
            output.as_ref().unwrap_or(&config.snapshot_path),
            &config.department,
        ),
        Commands::Grades { args } => run_grades(&args, &config),
        Commands::Terms { course, surname } => run_terms(&course, &surname, &config),
        Commands::Config => {
            print!("{}", config.to_conl()?);
            Ok(())
        }
        Commands::Clean => run_clean(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn test_config(dir: &Path) -> Config {
        Config {
            snapshot_path: dir.join("grades.json"),
            chart_dir: dir.join("charts"),
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_removes_snapshot_and_charts() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        fs::write(&config.snapshot_path, "{}").unwrap();
        fs::create_dir_all(&config.chart_dir).unwrap();
        fs::write(config.chart_dir.join("a.png"), b"png").unwrap();

        run_clean(&config).unwrap();

        assert!(!config.snapshot_path.exists());
        assert!(!config.chart_dir.exists());
    }

    #[test]
    fn test_clean_with_nothing_to_remove() {
        let dir = tempfile::tempdir().unwrap();
        run_clean(&test_config(dir.path())).unwrap();
    }

    #[test]
    fn test_terms_needs_a_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_terms("111", "boklan", &test_config(dir.path())).unwrap_err();
        assert!(err.to_string().contains("Failed to read snapshot"));
    }
}
