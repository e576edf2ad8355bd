mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use coverbind_core::{Insurer, RandomIdGenerator};
use coverbind_engine::{
    ComparePipeline, CompareRequest, ConflictPolicy, EvidenceBinder, EvidenceRetriever,
    KeywordConflictPolicy, RetrieverConfig, StrictKeywordConflictPolicy,
};
use coverbind_store::{Corpus, MemoryDocumentStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coverbind")]
#[command(about = "Evidence-bound coverage comparison across insurers")]
#[command(version)]
struct Cli {
    /// JSON corpus of coverages and policy excerpts
    #[arg(long, global = true, env = "COVERBIND_CORPUS", default_value = "corpus.json")]
    corpus: PathBuf,

    /// Arrow IPC file of policy excerpts; replaces the corpus documents
    #[arg(long, global = true, env = "COVERBIND_DOCUMENTS")]
    documents: Option<PathBuf>,

    /// Retriever config file (JSON)
    #[arg(long, global = true, env = "COVERBIND_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compare one coverage across insurers
    Compare {
        /// Canonical coverage code
        code: String,

        /// Insurer to compare (repeatable; defaults to every insurer in the corpus)
        #[arg(short, long = "insurer")]
        insurers: Vec<Insurer>,

        /// Conflict policy for condition evidence
        #[arg(long, value_enum, default_value_t = Policy::Keyword)]
        policy: Policy,

        /// Print JSON instead of cards
        #[arg(long)]
        json: bool,
    },

    /// Show retrieval slots and the drop trail for one insurer
    Inspect {
        /// Canonical coverage code
        code: String,

        #[arg(short, long)]
        insurer: Insurer,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List coverage codes in the corpus
    Coverages {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    /// Record non-coverage terms without asserting a conflict
    Keyword,
    /// Any non-coverage term is a conflict
    Strict,
}

impl Policy {
    fn build(self) -> Arc<dyn ConflictPolicy> {
        match self {
            Self::Keyword => Arc::new(KeywordConflictPolicy),
            Self::Strict => Arc::new(StrictKeywordConflictPolicy),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    info!("coverbind v{}", env!("CARGO_PKG_VERSION"));

    let mut corpus = Corpus::load(&cli.corpus)
        .with_context(|| format!("loading corpus {}", cli.corpus.display()))?;
    if let Some(path) = &cli.documents {
        corpus.documents = MemoryDocumentStore::load_ipc(path)
            .with_context(|| format!("loading documents {}", path.display()))?;
        info!(path = %path.display(), "documents loaded from arrow file");
    }
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Compare {
            code,
            insurers,
            policy,
            json,
        } => cmd_compare(corpus, config, code, insurers, policy, json).await,
        Command::Inspect {
            code,
            insurer,
            json,
        } => cmd_inspect(corpus, config, &code, insurer, json),
        Command::Coverages { json } => cmd_coverages(&corpus, json),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RetrieverConfig> {
    let Some(path) = path else {
        return Ok(RetrieverConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    RetrieverConfig::from_json_str(&json)
        .with_context(|| format!("parsing config {}", path.display()))
}

async fn cmd_compare(
    corpus: Corpus,
    config: RetrieverConfig,
    code: String,
    insurers: Vec<Insurer>,
    policy: Policy,
    json: bool,
) -> anyhow::Result<()> {
    let insurers = if insurers.is_empty() {
        corpus.documents.insurers_for(code.trim())
    } else {
        insurers
    };
    if insurers.is_empty() {
        bail!("no insurers given and none found in the corpus for '{code}'");
    }

    let request = CompareRequest::new(code, insurers)?;
    let retriever = EvidenceRetriever::with_config(Arc::new(corpus.documents), config);
    let binder = EvidenceBinder::new(Arc::new(RandomIdGenerator), policy.build());
    let pipeline = ComparePipeline::new(Arc::new(corpus.registry), Arc::new(retriever), binder);

    let outcome = pipeline.compare_concurrent(&request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        display::print_comparison(&outcome);
    }
    Ok(())
}

fn cmd_inspect(
    corpus: Corpus,
    config: RetrieverConfig,
    code: &str,
    insurer: Insurer,
    json: bool,
) -> anyhow::Result<()> {
    let retriever = EvidenceRetriever::with_config(Arc::new(corpus.documents), config);
    let (outcome, debug) = retriever.retrieve(code, insurer)?;

    if json {
        let value = serde_json::json!({
            "coverage_code": code,
            "insurer": insurer,
            "retrieval": outcome,
            "debug": debug,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        display::print_retrieval(code, insurer, &outcome, &debug);
    }
    Ok(())
}

fn cmd_coverages(corpus: &Corpus, json: bool) -> anyhow::Result<()> {
    if json {
        let entries: Vec<_> = corpus
            .registry
            .entries()
            .map(|(code, name)| serde_json::json!({ "code": code, "name": name }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        display::print_coverages(&corpus.registry);
    }
    Ok(())
}
