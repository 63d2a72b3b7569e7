//! Command-line entry points: `serve`, `predict`, `extract`, `describe-model`.

use std::io::Read;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::api::{self, ApiContext};
use crate::config::{TriageConfig, APP_NAME, APP_VERSION};
use crate::extraction::{ExtractionError, IntakeExtractor, OllamaClient};
use crate::pipeline::{ModelHandle, TriageEngine, TriageResult};

#[derive(Parser, Debug)]
#[command(name = "hybrid-triage", version, about = "Hybrid ML + rule-based patient triage")]
pub struct Cli {
    /// Directory holding the classifier artifacts [env: TRIAGE_MODEL_DIR]
    #[arg(long, global = true)]
    pub model_dir: Option<PathBuf>,

    /// Primary ("risk") artifact, relative to the model directory [env: TRIAGE_PRIMARY_MODEL]
    #[arg(long, global = true)]
    pub primary_model: Option<PathBuf>,

    /// Fallback ("health") artifact, relative to the model directory [env: TRIAGE_FALLBACK_MODEL]
    #[arg(long, global = true)]
    pub fallback_model: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Listen address [env: TRIAGE_BIND_ADDR]
        #[arg(long)]
        bind: Option<SocketAddr>,

        #[command(flatten)]
        llm: LlmArgs,

        /// Disable the /api/extract_intake endpoint
        #[arg(long)]
        no_extraction: bool,
    },
    /// Read one intake JSON object from stdin, print the triage result
    Predict,
    /// Extract an intake record from a plain-text medical document
    Extract {
        /// Document to read
        file: PathBuf,

        #[command(flatten)]
        llm: LlmArgs,
    },
    /// Show which classifier artifact loads and its feature schema
    DescribeModel,
}

#[derive(clap::Args, Debug, Default)]
pub struct LlmArgs {
    /// LLM server base URL [env: TRIAGE_LLM_URL]
    #[arg(long)]
    pub llm_url: Option<String>,

    /// LLM model name [env: TRIAGE_LLM_MODEL]
    #[arg(long)]
    pub llm_model: Option<String>,
}

impl Cli {
    /// Flags take precedence over the environment.
    pub fn apply_overrides(&self, config: &mut TriageConfig) {
        if let Some(dir) = &self.model_dir {
            config.model_dir = dir.clone();
        }
        if let Some(primary) = &self.primary_model {
            config.primary_model = primary.clone();
        }
        if let Some(fallback) = &self.fallback_model {
            config.fallback_model = fallback.clone();
        }
        match &self.command {
            Command::Serve { bind, llm, .. } => {
                if let Some(bind) = bind {
                    config.bind_addr = *bind;
                }
                llm.apply(config);
            }
            Command::Extract { llm, .. } => llm.apply(config),
            Command::Predict | Command::DescribeModel => {}
        }
    }
}

impl LlmArgs {
    fn apply(&self, config: &mut TriageConfig) {
        if let Some(url) = &self.llm_url {
            config.llm_url = url.clone();
        }
        if let Some(model) = &self.llm_model {
            config.llm_model = model.clone();
        }
    }
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> ExitCode {
    let config = match TriageConfig::from_env() {
        Ok(mut config) => {
            cli.apply_overrides(&mut config);
            config
        }
        Err(e) => {
            tracing::error!("Configuration error: {e}");
            // predict keeps its contract: a valid record on stdout, exit 0.
            if matches!(cli.command, Command::Predict) {
                let engine = TriageEngine::new(Arc::new(ModelHandle::unavailable(e.to_string())));
                return predict(&engine);
            }
            eprintln!("{APP_NAME}: {e}");
            return ExitCode::from(2);
        }
    };

    match &cli.command {
        Command::Serve { no_extraction, .. } => serve(&config, *no_extraction),
        Command::Predict => predict(&load_engine(&config)),
        Command::Extract { file, .. } => extract(&config, file),
        Command::DescribeModel => describe_model(&config),
    }
}

fn load_engine(config: &TriageConfig) -> TriageEngine {
    let model = ModelHandle::load(&config.primary_model_path(), &config.fallback_model_path());
    TriageEngine::new(Arc::new(model))
}

fn build_extractor(config: &TriageConfig) -> Result<IntakeExtractor, ExtractionError> {
    let client = OllamaClient::new(&config.llm_url, config.llm_timeout_secs)?;
    Ok(IntakeExtractor::new(Box::new(client), config.llm_model.clone()))
}

fn serve(config: &TriageConfig, no_extraction: bool) -> ExitCode {
    tracing::info!("{APP_NAME} v{APP_VERSION} starting");

    let mut ctx = ApiContext::new(load_engine(config));
    if !no_extraction {
        // The blocking HTTP client is built outside the async runtime.
        match build_extractor(config) {
            Ok(extractor) => {
                tracing::info!(url = %config.llm_url, model = %config.llm_model, "Intake extraction enabled");
                log_llm_readiness(&extractor);
                ctx = ctx.with_extractor(extractor);
            }
            Err(e) => tracing::warn!("Intake extraction disabled: {e}"),
        }
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(api::serve(ctx, config.bind_addr)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(addr = %config.bind_addr, "Server failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Checked once at startup. Extraction stays enabled when the LLM server is down.
fn log_llm_readiness(extractor: &IntakeExtractor) {
    match extractor.is_ready() {
        Ok(true) => tracing::info!(model = extractor.model(), "LLM model available"),
        Ok(false) => tracing::warn!(
            model = extractor.model(),
            "LLM model not found on server, extraction requests will fail until it is pulled"
        ),
        Err(e) => tracing::warn!("LLM server not reachable yet: {e}"),
    }
}

/// Always prints a complete record and exits 0.
fn predict(engine: &TriageEngine) -> ExitCode {
    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        tracing::warn!("Failed to read stdin: {e}");
    }

    let result = engine.triage_json_str(&input);
    print_result(&result);
    ExitCode::SUCCESS
}

fn print_result(result: &TriageResult) {
    match serde_json::to_string(result) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!("Failed to serialize triage result: {e}");
            println!(
                r#"{{"risk_level":"Medium","confidence":0.0,"department":"Internal Medicine","priority":"Normal","wait_time":"45 mins","explanations":["Routine analysis based on vitals and lifestyle factors."],"error":"result serialization failed"}}"#
            );
        }
    }
}

fn extract(config: &TriageConfig, file: &Path) -> ExitCode {
    let outcome = std::fs::read_to_string(file)
        .map_err(ExtractionError::from)
        .and_then(|text| build_extractor(config)?.extract(&text));

    match outcome {
        Ok(intake) => match serde_json::to_string(&intake) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => print_error(&e.to_string()),
        },
        Err(e) => print_error(&e.to_string()),
    }
}

fn print_error(message: &str) -> ExitCode {
    println!("{}", serde_json::json!({ "error": message }));
    ExitCode::FAILURE
}

fn describe_model(config: &TriageConfig) -> ExitCode {
    let model = ModelHandle::load(&config.primary_model_path(), &config.fallback_model_path());
    let description = model.describe();

    match serde_json::to_string_pretty(&description) {
        Ok(json) => println!("{json}"),
        Err(e) => return print_error(&e.to_string()),
    }
    if description.available {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
