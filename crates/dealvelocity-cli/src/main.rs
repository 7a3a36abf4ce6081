mod analyze;
mod display;
mod rfp;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dealvelocity_ai::{AiError, AnalyzerConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use dealvelocity_core::{EvaluatorPersona, RedlineChange, RiskLevel};
use dealvelocity_services::DocumentClient;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dealvelocity")]
#[command(about = "Contract risk analysis and RFP response tooling", version)]
struct Cli {
    #[command(flatten)]
    model: ModelArgs,

    /// Document processor service
    #[arg(long, global = true, env = "DOCUMENT_PROCESSOR_URL", default_value = "http://localhost:8000")]
    processor_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ModelArgs {
    /// API key for the chat-completions endpoint
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model identifier
    #[arg(long, global = true, env = "AI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Chat-completions API root
    #[arg(long, global = true, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

impl ModelArgs {
    fn config(&self) -> anyhow::Result<AnalyzerConfig> {
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AiError::Config("OPENAI_API_KEY is not set".to_string()))?;
        Ok(AnalyzerConfig::new(api_key)
            .with_model(self.model.clone())
            .with_base_url(self.base_url.clone()))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a contract for vendor risk
    Analyze {
        /// Contract file (plain text, or any format the processor accepts with --via-processor)
        file: PathBuf,
        /// Convert the file with the document processor first
        #[arg(long)]
        via_processor: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Clauses prescreened below this score skip detailed analysis
        #[arg(long, default_value_t = dealvelocity_ai::DEFAULT_PRESCREEN_THRESHOLD)]
        threshold: u8,
        /// Detailed analysis calls in flight at once
        #[arg(long, default_value_t = dealvelocity_ai::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
        /// Write accepted redline changes as JSON, for `redline`
        #[arg(long)]
        changes_out: Option<PathBuf>,
        /// Write the contract text with accepted suggestions applied
        #[arg(long)]
        final_out: Option<PathBuf>,
        /// Accept suggestions at or above this risk level for --changes-out and --final-out
        #[arg(long, default_value = "high")]
        accept_from: RiskLevel,
    },
    /// Extract text and metadata with the document processor
    Parse {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Produce a tracked-changes .docx from original text and accepted changes
    Redline {
        /// Original contract text
        original: PathBuf,
        /// JSON array of {"original", "new"} pairs
        changes: PathBuf,
        #[arg(short, long, default_value = "redlined_contract.docx")]
        output: PathBuf,
    },
    /// Check the document processor is up
    Health,
    /// RFP responder
    Rfp {
        #[command(subcommand)]
        command: RfpCommands,
    },
}

#[derive(Subcommand)]
enum RfpCommands {
    /// Extract requirements from an RFP
    Parse {
        file: PathBuf,
        #[arg(long)]
        via_processor: bool,
        #[arg(long)]
        json: bool,
    },
    /// Score a proposal section as a simulated evaluator would
    Simulate {
        #[arg(long)]
        requirement: String,
        /// File containing the proposal section text
        #[arg(long)]
        proposal: PathBuf,
        /// technical-lead, contract-officer or executive
        #[arg(long, default_value = "technical-lead")]
        persona: EvaluatorPersona,
    },
    /// Draft a proposal section from vector-store context
    Draft {
        #[arg(long)]
        requirement: String,
        #[arg(long, env = "VECTOR_STORE_URL", default_value = "http://localhost:8001")]
        vector_store_url: String,
        #[arg(long, env = "VECTOR_STORE_API_KEY", hide_env_values = true)]
        vector_store_api_key: Option<String>,
        /// Draft without retrieving context
        #[arg(long)]
        no_context: bool,
    },
}

/// Read `path` as text, or convert it through the document processor.
async fn load_text(path: &Path, via_processor: bool, processor_url: &str) -> anyhow::Result<String> {
    if via_processor {
        let doc = DocumentClient::new(processor_url)
            .parse_file(path)
            .await
            .with_context(|| format!("converting {}", path.display()))?;
        eprintln!(
            "  Converted {} ({}, {} pages)",
            doc.metadata.filename, doc.metadata.doc_type, doc.metadata.page_count
        );
        return Ok(doc.full_text);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("dealvelocity v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            file,
            via_processor,
            json,
            threshold,
            batch_size,
            changes_out,
            final_out,
            accept_from,
        } => {
            let config = cli
                .model
                .config()?
                .with_prescreen_threshold(threshold)
                .with_batch_size(batch_size);
            let text = load_text(&file, via_processor, &cli.processor_url).await?;
            let result = analyze::run_analysis(config, &text).await?;

            let ledger = analyze::accept_from_level(&result, accept_from)?;
            if let Some(path) = changes_out {
                let changes = ledger.redline_changes();
                let body = serde_json::to_string_pretty(&changes)?;
                tokio::fs::write(&path, body)
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
                eprintln!("  Wrote {} changes to {}", changes.len(), path.display());
            }
            if let Some(path) = final_out {
                tokio::fs::write(&path, ledger.final_text(&text))
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
                eprintln!("  Wrote final draft to {}", path.display());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                display::print_report(&file.display().to_string(), &result);
            }
        }
        Commands::Parse { file, json } => {
            let doc = DocumentClient::new(&cli.processor_url)
                .parse_file(&file)
                .await
                .with_context(|| format!("parsing {}", file.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                display::print_document(&doc);
            }
        }
        Commands::Redline {
            original,
            changes,
            output,
        } => {
            let original_text = tokio::fs::read_to_string(&original)
                .await
                .with_context(|| format!("reading {}", original.display()))?;
            let raw = tokio::fs::read_to_string(&changes)
                .await
                .with_context(|| format!("reading {}", changes.display()))?;
            let changes: Vec<RedlineChange> =
                serde_json::from_str(&raw).context("changes file must be a JSON array of {original, new}")?;

            let docx = DocumentClient::new(&cli.processor_url)
                .redline(&original_text, &changes)
                .await
                .context("generating redlined document")?;
            tokio::fs::write(&output, &docx)
                .await
                .with_context(|| format!("writing {}", output.display()))?;
            eprintln!("  Wrote {} ({} bytes, {} changes)", output.display(), docx.len(), changes.len());
        }
        Commands::Health => {
            let health = DocumentClient::new(&cli.processor_url)
                .health()
                .await
                .context("document processor health check")?;
            println!("{}: {}", cli.processor_url, health.status);
            if !health.is_healthy() {
                anyhow::bail!("document processor is {}", health.status);
            }
        }
        Commands::Rfp { command } => rfp::run(command, &cli.model, &cli.processor_url).await?,
    }

    Ok(())
}
