//! Automated SDR
//!
//! Runs the fixed sales-email prompt through the agent workflow once and
//! prints the run result.

use std::sync::Arc;

use clap::Parser;
use mimalloc::MiMalloc;
use tracing::info;

use tool_agents::agents::{Runner, sales};
use tool_agents::config::{AppConfig, ConfigArgs};
use tool_agents::email::{EmailSender, SendGridClient};
use tool_agents::{llm, telemetry};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Draft, pick and send one cold sales email", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Instruction given to the Sales Manager
    #[arg(long, default_value = sales::DEFAULT_PROMPT)]
    prompt: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env, letting it win over the inherited environment
    let _ = dotenvy::dotenv_override();

    let cli = Cli::parse();
    let config = AppConfig::from_args(&cli.config)?;
    telemetry::init(&config.log);

    let mailbox = config.email.mailbox()?;
    let settings = config.llm.settings()?;

    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        "LLM configuration loaded"
    );

    let model = settings.model.clone();
    let driver = llm::driver_for(settings);
    let email_sender: Arc<dyn EmailSender> = Arc::new(SendGridClient::with_base_url(
        config.email.sendgrid_base_url.clone(),
        config.email.sendgrid_api_key.clone(),
    ));

    let runner = Runner::new(driver).with_max_turns(config.agent.max_turns);
    let manager = sales::build_sales_manager(&runner, email_sender, &mailbox, &model);

    let result = sales::run_workflow(&runner, &manager, &cli.prompt).await?;
    println!("{result}");
    Ok(())
}
