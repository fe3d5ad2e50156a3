//! Interactive chat over stdin with guardrails and context compaction.
//!
//! Replies come from an offline echo model, so the demo runs without network
//! access. Pass a TOML config path as the first argument (defaults to
//! `parley.toml`); `PARLEY_*` environment variables override it.
//!
//! Commands: `/type <name>` pins the next prompt type, `/stats` prints usage,
//! `/clear` forgets the conversation, `/quit` exits.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chat_adapters::ScriptedAdapter;
use chat_config::AppConfig;
use chat_kernel::{ChatSession, TurnReply};
use chat_primitives::PromptType;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("parley.toml"), PathBuf::from);
    let mut config = AppConfig::load_from(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    config.apply_env_overrides()?;
    chat_telemetry::tracing_support::init(&config.logging.filter);

    let mut session = ChatSession::from_config(&config, Arc::new(ScriptedAdapter::echo()), None)?
        .with_system_prompt("You are parley, a software development assistant.");
    info!(
        strategy = %config.context.strategy,
        guardrails = config.guardrails.enabled,
        "guarded chat ready"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pinned: Option<PromptType> = None;

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input.split_once(' ').map_or((input, ""), |(cmd, rest)| (cmd, rest.trim())) {
            ("/quit", _) => break,
            ("/clear", _) => {
                session.clear();
                println!("conversation cleared");
                continue;
            }
            ("/stats", _) => {
                print_stats(&session);
                continue;
            }
            ("/type", name) => {
                match name.parse::<PromptType>() {
                    Ok(kind) => {
                        pinned = Some(kind);
                        println!("next prompt framed as {kind}");
                    }
                    Err(err) => println!("{err}"),
                }
                continue;
            }
            _ => {}
        }

        match session.send_with_type(input, pinned.take()).await {
            TurnReply::Rejected(message) => println!("{message}"),
            TurnReply::Streaming(mut stream) => {
                while let Some(fragment) = stream.next_fragment().await {
                    print!("{fragment}");
                    std::io::stdout().flush()?;
                }
                println!();
                stream.commit();
            }
        }
    }

    print_stats(&session);
    Ok(())
}

fn print_stats(session: &ChatSession) {
    let usage = session.usage_summary();
    println!(
        "requests: {}  tokens: {} in / {} out  cost: ${:.6}",
        usage.total_requests, usage.input_tokens, usage.output_tokens, usage.total_cost
    );
    if let Some(report) = session.last_report() {
        println!(
            "last turn: {} -> {} messages via {} ({:.1}% fewer tokens)",
            report.original_messages,
            report.optimized_messages,
            report.strategy,
            report.reduction_percent
        );
    }
}
