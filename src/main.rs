//! commit-viewer CLI
//!
//! Usage:
//!   commit-viewer <COMMIT_OUTPUT_DIR> <MAX_STREAMLINES> [--model stick|cylinder] [--config FILE]

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use eframe::egui;

use commit_viewer::{
    AppState, CommitViewerApp, MicrostructureModel, ViewerState, discover_models, load, load_config,
    parse_model_choice,
};

/// Visualize how COMMIT streamline weights evolve over the solver iterations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// COMMIT output directory (the one holding dictionary_TRK_fibers.trk)
    commit_output_path: PathBuf,

    /// Number of streamlines to load
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    streamlines_number: u64,

    /// Model output to show when both are present (default: ask)
    #[arg(long, value_enum)]
    model: Option<ModelArg>,

    /// Config file path (default: ./commit-viewer.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModelArg {
    Stick,
    Cylinder,
}

impl From<ModelArg> for MicrostructureModel {
    fn from(m: ModelArg) -> Self {
        match m {
            ModelArg::Stick => MicrostructureModel::Stick,
            ModelArg::Cylinder => MicrostructureModel::Cylinder,
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref()).context("loading configuration")?;

    let dir = &args.commit_output_path;
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let model = select_model(&args)?;
    let max_streamlines = usize::try_from(args.streamlines_number).unwrap_or(usize::MAX);
    let data = load(dir, model, max_streamlines, &config.cylinder)
        .with_context(|| format!("loading COMMIT output from {}", dir.display()))?;

    let viewer = ViewerState::new(data, &config.view);
    let state = AppState::new(viewer, config);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([state.config.window.width, state.config.window.height])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "COMMIT convergence viewer",
        options,
        Box::new(|_cc| Ok(Box::new(CommitViewerApp::new(state)))),
    )
    .map_err(|e| anyhow!("GUI error: {e}"))
}

fn select_model(args: &Args) -> Result<MicrostructureModel> {
    let available = discover_models(&args.commit_output_path);
    if let Some(requested) = args.model.map(MicrostructureModel::from) {
        if !available.contains(&requested) {
            bail!("no {requested} results in {}", args.commit_output_path.display());
        }
        return Ok(requested);
    }
    match available.as_slice() {
        [] => bail!(
            "No valid model: expected Results_StickZeppelinBall or \
             Results_CylinderZeppelinBall in {}",
            args.commit_output_path.display()
        ),
        [only] => Ok(*only),
        several => prompt_model(several),
    }
}

fn prompt_model(models: &[MicrostructureModel]) -> Result<MicrostructureModel> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        writeln!(stdout, "Several model outputs were found:")?;
        for (i, m) in models.iter().enumerate() {
            writeln!(stdout, "  {}: {m}", i + 1)?;
        }
        write!(stdout, "Choose one [1-{}]: ", models.len())?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            bail!("no model selected");
        }
        match parse_model_choice(&line, models) {
            Some(model) => return Ok(model),
            None => {
                let n = models.len();
                writeln!(stdout, "Please answer with a number between 1 and {n}.")?;
            }
        }
    }
}
