mod config;
mod human;
mod llm;
mod output;
mod parse;
mod prompt;
mod store;

use anyhow::{Context, Result, ensure};
use chrono::Utc;
use clap::Parser;
use reqwest::Client;
use std::io;
use std::path::PathBuf;
use tierrank_core::{
    Candidate, Category, ItemId, RankedItem, RankingState, ScorePolicy, compute_insertion_rank,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::TierrankConfig;
use crate::human::Terminal;
use crate::llm::{DEFAULT_CRITERION, LlmConfig, LlmOracle};

#[derive(Parser)]
#[command(name = "tierrank", version, about = "Rank titles into liked/neutral/disliked tiers, one comparison at a time")]
struct Cli {
    /// Path to config file (default: ~/.config/tierrank/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Rank a new title into one of your tiers
    Add(AddArgs),
    /// Print the current ranking
    Show(ShowArgs),
    /// Create a default config file at ~/.config/tierrank/config.toml
    Init,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OracleKind {
    /// Answer each comparison yourself
    Human,
    /// Let an OpenAI-compatible model answer
    Llm,
}

#[derive(Parser)]
struct AddArgs {
    /// Title to rank
    #[arg(long)]
    title: String,

    /// Tier the title belongs in: liked, neutral or disliked
    #[arg(long)]
    category: Category,

    /// Item id (default: one more than the largest id so far)
    #[arg(long)]
    id: Option<ItemId>,

    /// Artwork reference shown next to the title
    #[arg(long)]
    poster: Option<String>,

    /// Who answers the comparisons
    #[arg(long, value_enum, default_value_t = OracleKind::Human)]
    oracle: OracleKind,

    /// State file (default: tierrank.json, or state_file from config)
    #[arg(long)]
    state: Option<PathBuf>,

    /// OpenAI-compatible base URL (e.g. http://localhost:8000)
    #[arg(long)]
    endpoint: Option<String>,

    /// Bearer token for the API (also reads OPENAI_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,

    /// Model ID for the API
    #[arg(long)]
    model: Option<String>,

    /// LLM sampling temperature. Default: 0.3.
    #[arg(long)]
    temperature: Option<f64>,

    /// Question the model answers for each pair
    #[arg(long)]
    criterion: Option<String>,

    /// Output JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct ShowArgs {
    /// State file (default: tierrank.json, or state_file from config)
    #[arg(long)]
    state: Option<PathBuf>,

    /// Only show one tier
    #[arg(long)]
    category: Option<Category>,

    /// Output JSON instead of table
    #[arg(long)]
    json: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => config::config_path()?,
    };

    match cli.command {
        Commands::Init => {
            config::create_default_config(&config_path)?;
            println!("Created config at {}", config_path.display());
            println!("Edit it to set your state file, endpoint, model, etc.");
            Ok(())
        }
        Commands::Show(args) => {
            let cfg = config::load_config(&config_path)?;
            let state = store::load_state(&state_path(args.state, &cfg), policy(&cfg))?;
            if args.json {
                println!("{}", output::render_json(&state, args.category)?);
            } else {
                print!("{}", output::render_table(&state, args.category));
            }
            Ok(())
        }
        Commands::Add(args) => {
            let cfg = config::load_config(&config_path)?;
            run_add(args, cfg).await
        }
    }
}

/// State file: CLI arg > config file > ./tierrank.json
fn state_path(arg: Option<PathBuf>, cfg: &TierrankConfig) -> PathBuf {
    arg.or_else(|| cfg.state_file.clone())
        .unwrap_or_else(|| PathBuf::from(store::DEFAULT_STATE_FILE))
}

fn policy(cfg: &TierrankConfig) -> ScorePolicy {
    match cfg.score_visibility_threshold {
        Some(threshold) => ScorePolicy::default().with_visibility_threshold(threshold),
        None => ScorePolicy::default(),
    }
}

fn next_id(state: &RankingState) -> ItemId {
    state.ranked().map(|item| item.id).max().map_or(1, |max| max + 1)
}

async fn run_add(args: AddArgs, cfg: TierrankConfig) -> Result<()> {
    let path = state_path(args.state.clone(), &cfg);
    let mut state = store::load_state(&path, policy(&cfg))?;

    let id = args.id.unwrap_or_else(|| next_id(&state));
    ensure!(!state.contains(id), "Item id {id} is already ranked");
    let mut candidate = Candidate::new(id, args.title.clone());
    if let Some(ref poster) = args.poster {
        candidate = candidate.with_poster(poster.clone());
    }

    info!(id, title = %args.title, category = %args.category, "ranking new title");

    let (item, comparisons) = match args.oracle {
        OracleKind::Human => {
            let pending = state.begin_insertion(args.category, candidate)?;
            let mut terminal = Terminal::new(io::stdin().lock(), io::stdout());
            let Some(done) = terminal.rank(pending)? else {
                println!("Stopped. Nothing was saved.");
                return Ok(());
            };
            let comparisons = done.comparisons();
            (done.commit(&mut state, Utc::now())?.clone(), comparisons)
        }
        OracleKind::Llm => rank_with_llm(&args, &cfg, &mut state, candidate).await?,
    };

    store::save_state(&path, &state)?;
    println!("{}", output::render_placement(&item, &state, comparisons, args.json)?);
    Ok(())
}

async fn rank_with_llm(
    args: &AddArgs,
    cfg: &TierrankConfig,
    state: &mut RankingState,
    candidate: Candidate,
) -> Result<(RankedItem, usize)> {
    let endpoint = args
        .endpoint
        .clone()
        .or_else(|| cfg.endpoint.clone())
        .context("No endpoint specified. Pass --endpoint or set it in the config file")?;
    let model = args
        .model
        .clone()
        .or_else(|| cfg.model.clone())
        .context("No model specified. Pass --model or set it in the config file")?;
    let api_key = args
        .api_key
        .clone()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok());

    let llm_config = LlmConfig {
        endpoint,
        model,
        api_key,
        temperature: args.temperature.or(cfg.temperature).unwrap_or(0.3),
        criterion: args
            .criterion
            .clone()
            .or_else(|| cfg.criterion.clone())
            .unwrap_or_else(|| DEFAULT_CRITERION.to_string()),
    };
    info!(endpoint = %llm_config.endpoint, model = %llm_config.model, "using LLM oracle");

    let mut oracle = LlmOracle::new(Client::new(), llm_config, args.category);
    let existing = state.candidates(args.category);
    let rank = compute_insertion_rank(&existing, &candidate, &mut oracle)
        .await
        .context("Comparison failed; nothing was saved")?;

    let item = state
        .insert_at(args.category, rank - 1, candidate, Utc::now())?
        .clone();
    Ok((item, oracle.calls()))
}
