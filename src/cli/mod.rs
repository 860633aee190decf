//! Flight delay CLI
//!
//! Offline preprocessing and training, one-off predictions and evaluation,
//! and the HTTP server.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::inference::{InferenceConfig, PredictionService};
use crate::preprocessing::{FeatureSet, PreprocessingConfig};
use crate::store::ArtifactStore;
use crate::training::{EvaluationReport, ModelKind, Trainer, TrainingConfig};
use crate::utils::DataSaver;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "flight-delay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Flight departure delay prediction")]
#[command(long_about = None)]
pub struct Cli {
    /// Directory for scalers and models (overrides MODELS_DIR)
    #[arg(long, global = true)]
    pub models_dir: Option<PathBuf>,

    /// Directory for preprocessed archives and evaluation tables (overrides DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory for prediction outputs (overrides RESULTS_DIR)
    #[arg(long, global = true)]
    pub results_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Artifact store from the environment with command-line overrides applied
    pub fn store(&self) -> ArtifactStore {
        let mut store = ArtifactStore::from_env();
        if let Some(dir) = &self.models_dir {
            store.models_dir = dir.clone();
        }
        if let Some(dir) = &self.data_dir {
            store.data_dir = dir.clone();
        }
        if let Some(dir) = &self.results_dir {
            store.results_dir = dir.clone();
        }
        store
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean, split and scale raw flight records for each feature set
    Preprocess {
        /// Raw CSV with the 24 required columns
        #[arg(short, long)]
        data: PathBuf,

        /// Randomly keep this many rows before splitting
        #[arg(long)]
        sample: Option<usize>,

        /// Feature set to prepare (baseline, flight_status, weather, knn, all)
        #[arg(long, default_value = "all")]
        feature_set: String,
    },

    /// Train classifiers on the preprocessed archives
    Train {
        /// Model to train (random_forest, logistic_regression, k_nearest_neighbor, gradient_boosting, all)
        #[arg(short, long, default_value = "all")]
        model: String,

        /// Number of random forest trees
        #[arg(long)]
        n_estimators: Option<usize>,

        /// Maximum random forest tree depth
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Predict delays for a CSV of flight records
    Predict {
        /// Model to use
        #[arg(short, long, default_value = "random_forest")]
        model: String,

        /// Input CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Randomly keep at most this many rows
        #[arg(long, default_value = "3000")]
        sample_size: usize,

        /// Also write the predictions here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Re-score every trained model on its held-out evaluation table
    Evaluate,

    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },
}

fn parse_feature_sets(arg: &str) -> anyhow::Result<Vec<FeatureSet>> {
    if arg == "all" {
        return Ok(FeatureSet::ALL.to_vec());
    }
    Ok(vec![arg.parse()?])
}

fn parse_models(arg: &str) -> anyhow::Result<Vec<ModelKind>> {
    if arg == "all" {
        return Ok(ModelKind::ALL.to_vec());
    }
    Ok(vec![arg.parse()?])
}

fn print_report(name: &str, report: &EvaluationReport) {
    println!();
    println!("  {}", name.white().bold());
    println!("  {:<16} {}", muted("Accuracy"), format!("{:.4}", report.accuracy).white().bold());
    for (label, metrics) in &report.classification_report.classes {
        println!(
            "  {:<16} {}",
            muted(&format!("Class {}", label)),
            format!(
                "precision {:.3}  recall {:.3}  f1 {:.3}  support {}",
                metrics.precision, metrics.recall, metrics.f1_score, metrics.support
            )
            .white()
        );
    }
    let rows: Vec<String> = report
        .confusion_matrix
        .iter()
        .map(|row| format!("{:?}", row))
        .collect();
    println!("  {:<16} {}", muted("Confusion"), dim(&rows.join(" ")));
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_preprocess(
    store: ArtifactStore,
    data_path: &Path,
    sample: Option<usize>,
    feature_set: &str,
) -> anyhow::Result<()> {
    section("Preprocess");

    let mut config = PreprocessingConfig::new().with_feature_sets(parse_feature_sets(feature_set)?);
    if let Some(n) = sample {
        config = config.with_sample_size(n);
    }
    let trainer = Trainer::new(store).with_preprocessing(config);

    step_run(&format!("Preparing {}", data_path.display()));
    let start = Instant::now();
    let summaries = trainer.preprocess_file(data_path)?;
    step_done(&format!("{:?}", start.elapsed()));

    for summary in &summaries {
        step_ok(&format!(
            "{:<14} {} train / {} test, {} features",
            summary.feature_set.as_str().cyan(),
            summary.n_train,
            summary.n_test,
            summary.feature_names.len()
        ));
    }
    println!();
    Ok(())
}

pub fn cmd_train(
    store: ArtifactStore,
    model: &str,
    n_estimators: Option<usize>,
    max_depth: Option<usize>,
) -> anyhow::Result<()> {
    section("Train");

    let mut config = TrainingConfig::new().with_models(parse_models(model)?);
    if let Some(n) = n_estimators {
        config = config.with_n_estimators(n);
    }
    if let Some(depth) = max_depth {
        config = config.with_max_depth(depth);
    }
    let trainer = Trainer::new(store).with_training(config.clone());

    for kind in &config.models {
        step_run(&format!("Training {}", kind.display_name().cyan()));
        let summary = trainer.train_model(*kind)?;
        step_done(&format!(
            "accuracy {:.4} in {:.2}s",
            summary.report.accuracy, summary.training_time_secs
        ));
    }
    println!();
    Ok(())
}

pub fn cmd_predict(
    store: ArtifactStore,
    model: &str,
    data_path: &Path,
    sample_size: usize,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Predict");

    let service = PredictionService::new(store)
        .with_config(InferenceConfig::new().with_default_sample_size(sample_size));

    step_run(&format!("Predicting with {}", model.cyan()));
    let start = Instant::now();
    let mut prediction = service.predict_file(data_path, model, Some(sample_size))?;
    step_done(&format!("{} rows in {:?}", prediction.n_rows(), start.elapsed()));

    if let Some(path) = &prediction.output_path {
        step_ok(&format!("Saved → {}", path.display()));
    }
    if let Some(path) = output {
        DataSaver::save_csv(&mut prediction.frame, path)?;
        step_ok(&format!("Saved → {}", path.display()));
    }
    println!();
    Ok(())
}

pub fn cmd_evaluate(store: ArtifactStore) -> anyhow::Result<()> {
    section("Evaluate");

    let service = PredictionService::new(store);
    step_run("Scoring held-out data");
    let reports = service.evaluate()?;
    step_done(&format!("{} models", reports.len()));

    for (name, report) in &reports {
        print_report(name, report);
    }
    println!();
    Ok(())
}

pub async fn cmd_serve(store: ArtifactStore, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    let defaults = ServerConfig::default();
    let config = defaults
        .clone()
        .with_address(host.unwrap_or(defaults.host), port.unwrap_or(defaults.port))
        .with_store(store);

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Flight Delay Prediction".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Predict ", &format!("POST http://{}:{}/predict", config.host, config.port)));
    line_box(&kv("Evaluate", &format!("GET  http://{}:{}/evaluate", config.host, config.port)));
    line_box(&kv("Health  ", &format!("GET  http://{}:{}/health", config.host, config.port)));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config).await
}
