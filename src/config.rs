use crate::agents::sales::{DEFAULT_MODEL, Mailbox};
use crate::email::sendgrid::DEFAULT_SENDGRID_BASE_URL;
use crate::error::{Error, Result};
use crate::llm::{LlmProtocol, LlmSettings, Provider, provider::DEFAULT_AZURE_API_VERSION};
use clap::{Args, Parser};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;

/// Configuration flags shared by both programs.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Log output format (`compact` or `json`)
    #[arg(long, env = "LOG_FORMAT")]
    pub log_format: Option<String>,

    /// Model used for every request
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub email: EmailConfig,
    pub index: IndexConfig,
    pub agent: AgentConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub protocol: String,
    pub temperature: Option<f32>,
    pub parallel_tool_calls: Option<bool>,
    pub azure_deployment_name: Option<String>,
    pub azure_api_version: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub sendgrid_api_key: Option<String>,
    pub sendgrid_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    pub path: String,
    pub collection: String,
    pub top_k: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub max_turns: usize,
    pub max_iterations: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub format: String,
    pub filter: Option<String>,
}

/// Well-known environment variables and the keys they override.
const ENV_OVERRIDES: [(&str, &str); 10] = [
    ("LLM_API_KEY", "llm.api_key"),
    ("OPENAI_API_KEY", "llm.api_key"),
    ("LLM_BASE_URL", "llm.base_url"),
    ("LLM_MODEL", "llm.model"),
    ("LLM_PROTOCOL", "llm.protocol"),
    ("AZURE_DEPLOYMENT_NAME", "llm.azure_deployment_name"),
    ("AZURE_API_VERSION", "llm.azure_api_version"),
    ("SENDER_EMAIL", "email.sender"),
    ("RECEIVER_EMAIL", "email.recipient"),
    ("SENDGRID_API_KEY", "email.sendgrid_api_key"),
];

impl AppConfig {
    /// Parse `args` as a command line, then layer configuration as [`Self::from_args`].
    pub fn load_from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|e| Error::Config(e.to_string()))?;
        Self::from_args(&cli.config)
    }

    /// Layer defaults, file, `AGENTS_` environment, well-known variables and flags.
    ///
    /// Priority: CLI flag > well-known env var > `AGENTS_*` env var > config file > defaults.
    pub fn from_args(args: &ConfigArgs) -> Result<Self> {
        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("llm.base_url", "https://api.openai.com")?
            .set_default("llm.model", DEFAULT_MODEL)?
            .set_default("llm.protocol", "auto")?
            .set_default("email.sendgrid_base_url", DEFAULT_SENDGRID_BASE_URL)?
            .set_default("index.path", "internal_index")?
            .set_default("index.collection", "internal_docs")?
            .set_default("index.top_k", 5)?
            .set_default("agent.max_turns", 10)?
            .set_default("log.format", "compact")?;

        // 2. Config file (explicit path must exist, ./config.* is optional)
        builder = match &args.config {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // 3. Prefixed environment, e.g. AGENTS_INDEX__TOP_K=3
        builder = builder.add_source(
            Environment::with_prefix("AGENTS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. Well-known environment variables
        for (var, key) in ENV_OVERRIDES {
            if let Some(val) = env::var(var).ok().filter(|v| !v.trim().is_empty()) {
                builder = builder.set_override(key, val)?;
            }
        }
        if let Some(bool_val) = env::var("LLM_PARALLEL_TOOLS")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
        {
            builder = builder.set_override("llm.parallel_tool_calls", bool_val)?;
        }

        // 5. CLI overrides
        if let Some(model) = &args.model {
            builder = builder.set_override("llm.model", model.as_str())?;
        }
        if let Some(format) = &args.log_format {
            builder = builder.set_override("log.format", format.as_str())?;
        }

        let cfg = builder.build()?;
        Ok(cfg.try_deserialize()?)
    }
}

impl LlmConfig {
    /// Validate and convert into driver settings.
    pub fn settings(&self) -> Result<LlmSettings> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("llm.base_url cannot be empty".to_string()));
        }
        url::Url::parse(&self.base_url)?;

        if self.model.trim().is_empty() {
            return Err(Error::Config("llm.model cannot be empty".to_string()));
        }

        // Auto-detect provider from base URL
        let mut provider = Provider::detect_from_url(&self.base_url);
        if let (Provider::AzureOpenAI { .. }, Some(deployment)) =
            (&provider, &self.azure_deployment_name)
        {
            provider = Provider::AzureOpenAI {
                deployment_name: deployment.clone(),
                api_version: self
                    .azure_api_version
                    .clone()
                    .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
            };
        }

        Ok(LlmSettings {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: self.model.clone(),
            protocol: LlmProtocol::parse(&self.protocol),
            provider,
            temperature: self.temperature,
            parallel_tool_calls: self.parallel_tool_calls,
        })
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Config("Please set OPENAI_API_KEY in your environment.".to_string())
            })
    }
}

impl EmailConfig {
    /// Sender and recipient, both required.
    pub fn mailbox(&self) -> Result<Mailbox> {
        let sender = self
            .sender
            .clone()
            .ok_or_else(|| Error::Config("Missing required env var: SENDER_EMAIL".to_string()))?;
        let recipient = self
            .recipient
            .clone()
            .ok_or_else(|| Error::Config("Missing required env var: RECEIVER_EMAIL".to_string()))?;
        Ok(Mailbox { sender, recipient })
    }
}
