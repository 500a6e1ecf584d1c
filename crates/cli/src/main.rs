use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use wayfinder_agents::ConciergeAgent;
use wayfinder_core::{ConciergeConfig, ExtractorKind, Lexicon};
use wayfinder_nlp::HeuristicExtractor;
use wayfinder_observability::{init_tracing, AppMetrics};

#[derive(Debug, Parser)]
#[command(name = "wayfinder")]
#[command(about = "Wayfinder travel concierge CLI")]
struct Cli {
    /// Overrides WAYFINDER_EXTRACTOR.
    #[arg(long, global = true)]
    extractor: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive session; `exit` or `quit` leaves.
    Chat,
    /// Answers a single message.
    Ask { text: Vec<String> },
    /// Shows what the heuristic extractor understood, without any network call.
    Extract { text: Vec<String> },
    /// Runs the HTTP API.
    Serve {
        #[arg(long, env = "WAYFINDER_BIND")]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("wayfinder_cli");
    let cli = Cli::parse();

    let mut config = ConciergeConfig::from_env();
    if let Some(value) = cli.extractor.as_deref() {
        config.extractor = ExtractorKind::parse(value)
            .with_context(|| format!("unknown extractor '{value}'"))?;
    }

    match cli.command {
        Command::Chat => run_chat(build_agent(&config)?).await?,
        Command::Ask { text } => {
            let message = join_text(&text)?;
            let reply = build_agent(&config)?.handle_message(&message).await;
            println!("{}", reply.reply_text);
        }
        Command::Extract { text } => {
            let message = join_text(&text)?;
            let lexicon = match &config.lexicon_path {
                Some(path) => Arc::new(Lexicon::from_path(path)?),
                None => Lexicon::builtin(),
            };
            let extraction = HeuristicExtractor::new(lexicon.clone()).extract_now(&message);
            let output = serde_json::json!({
                "analysis": extraction.analysis,
                "strategy": extraction.strategy,
                "lexicon_version": lexicon.version,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            wayfinder_api::serve(&config).await?;
        }
    }

    Ok(())
}

async fn run_chat(agent: ConciergeAgent) -> Result<()> {
    println!("Wayfinder chat mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let reply = agent.handle_message(message).await;
        println!("\n{}\n", reply.reply_text);
    }

    Ok(())
}

fn build_agent(config: &ConciergeConfig) -> Result<ConciergeAgent> {
    ConciergeAgent::from_config(config, AppMetrics::shared())
        .context("failed to initialize concierge agent")
}

fn join_text(words: &[String]) -> Result<String> {
    let text = words.join(" ");
    if text.trim().is_empty() {
        anyhow::bail!("no message given");
    }
    Ok(text)
}
