//! Hybrid Search Agent
//!
//! Interactive loop answering questions with the local vector index, hosted
//! web search, or both.

use std::sync::Arc;

use clap::Parser;
use mimalloc::MiMalloc;
use tokio::io::BufReader;
use tracing::info;

use tool_agents::config::{AppConfig, ConfigArgs};
use tool_agents::hybrid::{HybridSearchAgent, SAMPLE_DOCUMENTS, run_repl};
use tool_agents::tools::{HostedTool, InternalSearchTool, ToolRegistry};
use tool_agents::vector::{FastEmbedder, LocalIndex, VectorStore, ingest_documents};
use tool_agents::{llm, telemetry};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Chat with local vector search plus hosted web search", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Clear the index before starting (sample documents are re-seeded)
    #[arg(long)]
    reset_index: bool,

    /// Carry the conversation across questions instead of starting fresh each time
    #[arg(long)]
    keep_history: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = AppConfig::from_args(&cli.config)?;
    telemetry::init(&config.log);

    config.llm.require_api_key()?;
    let settings = config.llm.settings()?;
    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        "LLM configuration loaded"
    );

    let index = Arc::new(
        LocalIndex::open(
            &config.index.path,
            &config.index.collection,
            Arc::new(FastEmbedder::new()),
        )
        .await?,
    );
    if cli.reset_index {
        index.reset().await?;
    }

    // Index sample docs if collection is empty
    if index.count().await? == 0 {
        ingest_documents(index.as_ref(), SAMPLE_DOCUMENTS).await?;
        println!("[+] Sample documents ingested into the vector index for demo…");
    }

    let search = InternalSearchTool::new(index).with_default_top_k(config.index.top_k);
    let tools = ToolRegistry::new()
        .with_tool(Arc::new(search))
        .with_hosted(HostedTool::WebSearch);
    let mut agent = HybridSearchAgent::with_tools(llm::driver_for(settings), tools)
        .with_max_iterations(config.agent.max_iterations);
    if let Some(temperature) = config.llm.temperature {
        agent = agent.with_temperature(temperature);
    }

    println!("\nHybrid Search Agent – type your question (Ctrl-C to exit):\n");

    // Ctrl-C ends the session, also while a question is being answered
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    run_repl(
        &agent,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        cli.keep_history,
        shutdown,
    )
    .await?;
    Ok(())
}
