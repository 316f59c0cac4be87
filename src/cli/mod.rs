use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufReader};

use crate::clients::mcp::McpServerStreamableHttp;
use crate::clients::openai::AgentClient;
use crate::infra::config::Settings;
use crate::session;

#[derive(Parser)]
#[command(name = "nimiq-mcp-agent")]
#[command(about = "Nimiq MCP Agent - chat with the Nimiq blockchain through an MCP-enabled model")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scripted example queries, then chat interactively
    Run {
        /// Skip the scripted example queries
        #[arg(long)]
        skip_scripted: bool,
        /// Exit after the scripted queries instead of reading stdin
        #[arg(long)]
        no_interactive: bool,
    },
    /// Ask the agent a single question
    Ask {
        /// Question to send
        query: String,
    },
    /// List the tools exposed by the MCP server
    Tools,
    /// Show the effective configuration
    Config {
        /// Fail if the configuration is invalid
        #[arg(long)]
        validate: bool,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    run_commands(cli.command.unwrap_or(Commands::Run {
        skip_scripted: false,
        no_interactive: false,
    }))
    .await
}

pub async fn run_commands(command: Commands) -> ExitCode {
    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Could not load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match command {
        Commands::Run { skip_scripted, no_interactive } => {
            match run_session(&settings, !skip_scripted, !no_interactive).await {
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("❌ Agent session failed: {:#}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Ask { query } => match ask(&settings, query).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ Query failed: {:#}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Tools => match list_tools(&settings).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ Tool listing failed: {:#}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Config { validate } => match show_config(&settings, validate) {
            Ok(_) => {
                if validate {
                    println!("✅ Configuration is valid");
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run_session(settings: &Settings, scripted: bool, interactive: bool) -> anyhow::Result<()> {
    settings.validate()?;
    let client = AgentClient::from_env(&settings.openai)?;
    let agent = client.create_agent(settings.agent.clone())?;
    let mut stdout = tokio::io::stdout();

    write_ready_banner(&mut stdout).await?;
    if scripted {
        session::run_scripted_queries(&agent, &settings.queries, &mut stdout).await?;
    }
    if interactive {
        let stdin = BufReader::new(tokio::io::stdin());
        session::run_interactive_loop(&agent, stdin, &mut stdout).await?;
    }
    Ok(())
}

async fn write_ready_banner<W: AsyncWrite + Unpin>(out: &mut W) -> std::io::Result<()> {
    out.write_all(format!("{}\n", session::READY_BANNER).as_bytes()).await?;
    out.flush().await
}

async fn ask(settings: &Settings, query: String) -> anyhow::Result<()> {
    settings.validate()?;
    let client = AgentClient::from_env(&settings.openai)?;
    let agent = client.create_agent(settings.agent.clone())?;
    let mut stdout = tokio::io::stdout();
    session::run_scripted_queries(&agent, &[query], &mut stdout).await?;
    Ok(())
}

async fn list_tools(settings: &Settings) -> anyhow::Result<()> {
    let connector = McpServerStreamableHttp::new(settings.primary_connector()?.clone())?;
    let tools = connector.list_tools().await?;

    println!("🔧 {} ({})", connector.config().name, connector.config().url);
    println!("🔍 Found {} tools:", tools.len());
    for (i, tool) in tools.iter().enumerate() {
        match &tool.description {
            Some(d) => println!("  {}. {} - {}", i + 1, tool.name, d),
            None => println!("  {}. {}", i + 1, tool.name),
        }
    }
    Ok(())
}

fn show_config(settings: &Settings, validate: bool) -> anyhow::Result<()> {
    if validate {
        settings.validate()?;
    }

    println!("📋 Configuration:");
    println!("  Model: {}", settings.agent.model);
    println!(
        "  Reasoning effort: {} ({})",
        settings.agent.reasoning_effort.level(),
        settings.agent.reasoning_effort.as_api_str()
    );
    println!("  API base: {}", settings.openai.base_url);
    println!(
        "  API key: {}",
        if std::env::var("OPENAI_API_KEY").map(|k| !k.is_empty()).unwrap_or(false) {
            "set"
        } else {
            "not set"
        }
    );
    for tool in &settings.agent.tools {
        println!("  MCP server: {} ({})", tool.name, tool.url);
        println!(
            "    timeout={}s cache_tools_list={} max_retry_attempts={} retry_backoff_seconds_base={}",
            tool.timeout_secs, tool.cache_tools_list, tool.max_retry_attempts, tool.retry_backoff_seconds_base
        );
    }
    println!("  Scripted queries: {}", settings.queries.len());
    println!(
        "  Log Level: {}",
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())
    );
    Ok(())
}
