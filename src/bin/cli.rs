//! Moonchat terminal client
//!
//! Streams a turn to stdout with reasoning framed between markers. Without
//! `--prompt` it reads one prompt per line until end of input.

use clap::Parser;
use moonchat::config::AppConfig;
use moonchat::conversation::Conversation;
use moonchat::llm::{LoggingProducer, MoonshotProducer};
use moonchat::sink::{ConsoleSink, Sink, WireSink};
use moonchat::store::ConversationSlot;
use moonchat::turn::{TurnController, TurnError, TurnReport};
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "moonchat-cli", version, about = "Chat with a reasoning model from the terminal")]
struct CliArgs {
    /// Run a single turn and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Do not print the model's reasoning
    #[arg(long)]
    hide_thinking: bool,

    /// Print server-push frames instead of rendered text
    #[arg(long)]
    raw: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    moonchat::init_cli_logging();
    let args = CliArgs::parse();
    let config = AppConfig::from_env();

    let producer = match MoonshotProducer::new(config.llm.clone()) {
        Ok(producer) => producer,
        Err(e) => {
            eprintln!("failed to start: {e}");
            return ExitCode::FAILURE;
        }
    };
    let controller = TurnController::new(
        Arc::new(LoggingProducer::new(Arc::new(producer))),
        !args.hide_thinking,
    );
    let slot = ConversationSlot::new("cli", Conversation::new(config.system_prompt));

    if let Some(prompt) = args.prompt {
        return match run_turn(&controller, &slot, &prompt, args.raw).await {
            Ok(report) if !report.outcome.errored => ExitCode::SUCCESS,
            Ok(_) => ExitCode::FAILURE,
            Err(e) => {
                eprintln!("{e}");
                ExitCode::FAILURE
            }
        };
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => break,
        };
        match line {
            Ok(Some(prompt)) if prompt.trim().is_empty() => {}
            Ok(Some(prompt)) => {
                if let Err(e) = run_turn(&controller, &slot, &prompt, args.raw).await {
                    eprintln!("{e}");
                }
            }
            Ok(None) => break,
            Err(e) => {
                eprintln!("failed to read input: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

/// One turn; Ctrl-C cancels it without leaving the session
async fn run_turn(
    controller: &TurnController,
    slot: &ConversationSlot,
    prompt: &str,
    raw: bool,
) -> Result<TurnReport, TurnError> {
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let mut sink: Box<dyn Sink> = if raw {
        Box::new(WireSink::new(io::stdout()))
    } else {
        Box::new(ConsoleSink::stdout())
    };
    let result = controller
        .run(slot, prompt, &mut [&mut *sink], &cancel)
        .await;
    watcher.abort();
    result
}
