// ABOUTME: Entry point for the llm-council binary.
// ABOUTME: Parses CLI arguments, initializes tracing, and dispatches to debate, models, or config setup.

mod output;

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use council_core::{
    CONFIG_TEMPLATE, CouncilConfig, DebateRecord, DebateResult, ProviderKind, default_config_path,
    expand_home, resolve_api_key,
};
use council_debate::{DebateEngine, default_providers};
use council_store::HistoryLog;

use output::{ColorMode, OutputFormat, print_result};

#[derive(Parser)]
#[command(
    name = "llm-council",
    about = "Run a prompt through a council of LLMs: independent answers, rebuttals, and a moderated synthesis"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a council debate for a prompt
    Ask {
        /// Prompt to send to the council
        prompt: String,
        /// Path to config file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Disable history logging
        #[arg(long)]
        no_history: bool,
        /// Output format for results
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Colorize text output
        #[arg(long, value_enum, default_value = "always")]
        color: ColorMode,
    },
    /// Interactive council REPL
    Repl {
        /// Path to config file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Disable history logging
        #[arg(long)]
        no_history: bool,
        /// Output format for results
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Colorize text output
        #[arg(long, value_enum, default_value = "always")]
        color: ColorMode,
    },
    /// List models available from the configured providers
    Models {
        /// Path to config file
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "all")]
        provider: ProviderArg,
    },
    /// Create a starter config file
    InitConfig {
        /// Path for the config file
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderArg {
    Gemini,
    Anthropic,
    Openai,
    All,
}

impl ProviderArg {
    fn kinds(self) -> Vec<ProviderKind> {
        match self {
            ProviderArg::Gemini => vec![ProviderKind::Gemini],
            ProviderArg::Anthropic => vec![ProviderKind::Anthropic],
            ProviderArg::Openai => vec![ProviderKind::OpenAi],
            ProviderArg::All => ProviderKind::ALL.to_vec(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "llm_council=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Ask {
            prompt,
            config,
            no_history,
            format,
            color,
        } => {
            let config = CouncilConfig::load(config.as_deref()).context("loading configuration")?;
            let engine = DebateEngine::new();
            let result = engine.run(&prompt, &config).await?;
            print_result(&result, format, color);
            if !no_history {
                write_history(&result, &config);
            }
        }

        Command::Repl {
            config,
            no_history,
            format,
            color,
        } => {
            let config = CouncilConfig::load(config.as_deref()).context("loading configuration")?;
            run_repl(&config, no_history, format, color).await;
        }

        Command::Models { config, provider } => {
            let config = CouncilConfig::load(config.as_deref()).context("loading configuration")?;
            list_models(&config, provider).await;
        }

        Command::InitConfig { path, force } => {
            let path = path.unwrap_or_else(default_config_path);
            write_config(&path, force)?;
        }
    }

    Ok(())
}

async fn run_repl(config: &CouncilConfig, no_history: bool, format: OutputFormat, color: ColorMode) {
    println!("llm-council REPL. Type 'exit' or Ctrl-D to quit.");
    let engine = DebateEngine::new();
    let stdin = std::io::stdin();

    loop {
        print!("council> ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => {
                println!();
                break;
            }
            Ok(_) => {}
        }

        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if matches!(prompt.to_lowercase().as_str(), "exit" | "quit" | ":q") {
            break;
        }

        match engine.run(prompt, config).await {
            Ok(result) => {
                print_result(&result, format, color);
                if !no_history {
                    write_history(&result, config);
                }
            }
            Err(err) => println!("Configuration error: {}", err),
        }
    }
}

async fn list_models(config: &CouncilConfig, provider: ProviderArg) {
    let adapters = default_providers();
    let timeout_s = config.request.timeout_s;

    for kind in provider.kinds() {
        let provider_cfg = config.providers.get(kind);
        let Some(api_key) = resolve_api_key(provider_cfg) else {
            println!("{}: missing API key", kind);
            continue;
        };
        let Some(adapter) = adapters.get(&kind) else {
            println!("{}: no adapter registered", kind);
            continue;
        };

        match adapter
            .list_models(&api_key, &provider_cfg.base_url, timeout_s)
            .await
        {
            Ok(models) => {
                println!("{}:", kind);
                for model in models {
                    println!("  - {}", model);
                }
            }
            Err(err) => println!("{}: error listing models: {}", kind, err),
        }
    }
}

fn write_config(path: &std::path::Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        println!(
            "Config already exists at {}. Use --force to overwrite.",
            path.display()
        );
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, CONFIG_TEMPLATE)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote config to {}", path.display());
    Ok(())
}

/// Append the debate to the configured history file. History failures are
/// logged and swallowed; they never fail a completed debate.
fn write_history(result: &DebateResult, config: &CouncilConfig) {
    let path = expand_home(&config.history.path);
    let record = DebateRecord::from(result);

    let outcome = HistoryLog::open(&path).and_then(|mut log| log.append(&record));
    if let Err(err) = outcome {
        tracing::warn!(path = %path.display(), error = %err, "failed to write history");
    }
}
