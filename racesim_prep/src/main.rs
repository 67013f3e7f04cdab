use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use mcs_analysis::{load_results, mcs_analysis, PlotBackend, TextPlot};
use race_pars::{import_pars, ImportOptions, Imported, ParameterBundle, VsePathSet};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "racesim-prep")]
#[command(about = "Parameter import and result analysis for the race simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import and validate a race and its MCS parameters
    Check(CheckArgs),
    /// Aggregate final positions of simulated races
    Analyse(AnalyseArgs),
    /// Bundle or restore a VSE model directory
    #[command(subcommand)]
    Archive(ArchiveCommand),
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Race parameter file
    #[arg(long, env = "RACE_PARS_FILE")]
    race_pars: PathBuf,

    /// Monte Carlo parameter file
    #[arg(long, env = "MCS_PARS_FILE")]
    mcs_pars: PathBuf,

    /// Directory with trained VSE models
    #[arg(long, env = "VSE_PATH")]
    vse_dir: Option<PathBuf>,

    /// Write the validated parameters and VSE paths as JSON to this file
    #[arg(long)]
    dump: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AnalyseArgs {
    /// JSON list of race results
    #[arg(long, env = "RESULTS_FILE")]
    results: PathBuf,

    /// Do not print mean positions
    #[arg(long)]
    quiet: bool,

    /// Draw position histograms as text
    #[arg(long)]
    plot: bool,
}

#[derive(Subcommand, Debug)]
enum ArchiveCommand {
    /// Write <BASE>.zip from the contents of <DIR>
    Export { dir: PathBuf, base: PathBuf },
    /// Replace <DIR> with the contents of <BUNDLE>
    Import { bundle: PathBuf, dir: PathBuf },
}

#[derive(Serialize)]
struct Dump<'a> {
    pars: &'a ParameterBundle,
    vse_paths: Option<&'a VsePathSet>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Check(args) => check(args),
        Commands::Analyse(args) => analyse(args),
        Commands::Archive(cmd) => archive(cmd),
    }
}

fn check(args: CheckArgs) -> Result<()> {
    let opts = ImportOptions {
        race_pars_file: args.race_pars,
        mcs_pars_file: args.mcs_pars,
        vse_dir: args.vse_dir,
    };
    let Imported { bundle, vse_paths, defaulted } = import_pars(&opts).map_err(|e| {
        error!(class = ?e.class(), "parameter import failed");
        e
    })?;

    if !defaulted.is_empty() {
        let names: Vec<_> = defaulted.iter().map(|d| d.parameter).collect();
        info!(parameters = ?names, "track parameters defaulted");
    }
    if let Some(paths) = &vse_paths {
        for (role, path) in paths.iter() {
            info!(role = role.key(), path = %path.display(), "VSE artifact");
        }
    }

    if let Some(path) = &args.dump {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        let dump = Dump {
            pars: &bundle,
            vse_paths: vse_paths.as_ref(),
        };
        serde_json::to_writer_pretty(&mut out, &dump).context("failed to encode parameters")?;
        writeln!(out)?;
        out.flush()
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote validated parameters");
    }
    Ok(())
}

fn analyse(args: AnalyseArgs) -> Result<()> {
    let results = load_results(&args.results)?;

    let mut out = io::stdout();
    let mut text_plot = args.plot.then(|| TextPlot::new(io::stdout(), 40));

    let print_to: Option<&mut dyn Write> = if args.quiet { None } else { Some(&mut out) };
    let plot = text_plot.as_mut().map(|p| p as &mut dyn PlotBackend);
    let dist = mcs_analysis(&results, print_to, plot)?;
    info!(runs = dist.runs(), "analysis finished");
    Ok(())
}

fn archive(cmd: ArchiveCommand) -> Result<()> {
    match cmd {
        ArchiveCommand::Export { dir, base } => {
            let bundle = vse_artifacts::export_archive(&dir, &base)?;
            println!("{}", bundle.display());
        }
        ArchiveCommand::Import { bundle, dir } => {
            vse_artifacts::import_archive(&bundle, &dir)?;
        }
    }
    Ok(())
}
