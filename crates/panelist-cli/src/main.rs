use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use panelist_core::session::ConversationController;
use panelist_core::transcript::{MessageRole, TranscriptMessage, TranscriptStore};
use panelist_infrastructure::{MemoryTranscriptStore, TomlTranscriptStore};
use panelist_interaction::OllamaChatAgent;

#[derive(Parser)]
#[command(name = "panelist")]
#[command(about = "Interview practice chat over a locally hosted model", long_about = None)]
struct Cli {
    /// Session id backing the transcript
    #[arg(long, default_value = "default_session")]
    session: String,

    /// Keep the transcript in memory only (nothing written to disk)
    #[arg(long)]
    ephemeral: bool,

    /// Clear any stored transcript before starting
    #[arg(long)]
    fresh: bool,

    /// Abort a reply when the model stays silent this many seconds (0 = no limit)
    #[arg(long, default_value_t = 0)]
    chunk_timeout: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stored transcript for the session
    History,
    /// Delete the stored transcript for the session
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let store: Arc<dyn TranscriptStore> = if cli.ephemeral {
        Arc::new(MemoryTranscriptStore::new())
    } else {
        Arc::new(TomlTranscriptStore::default_location()?)
    };

    match cli.command {
        Some(Commands::History) => {
            for message in store.load(&cli.session).await? {
                print_message(&message);
            }
        }
        Some(Commands::Reset) => {
            store.clear(&cli.session).await?;
            println!("Transcript for '{}' cleared.", cli.session);
        }
        None => run_repl(&cli, store).await?,
    }

    Ok(())
}

async fn run_repl(cli: &Cli, store: Arc<dyn TranscriptStore>) -> Result<()> {
    let agent = Arc::new(OllamaChatAgent::from_env());
    let mut controller = ConversationController::new(store, agent);
    if cli.chunk_timeout > 0 {
        controller = controller.with_chunk_timeout(Duration::from_secs(cli.chunk_timeout));
    }

    println!(
        "{}",
        "=== MATA CORPORATION interview practice ==="
            .bright_magenta()
            .bold()
    );
    println!(
        "{}",
        "Type '/new' to restart the interview, 'quit' to exit.".bright_black()
    );
    println!();

    if cli.fresh {
        controller.start_session(&cli.session).await?;
    } else {
        // Replay the conversation so far
        for message in controller.history(&cli.session).await? {
            print_message(&message);
        }
    }

    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                if trimmed == "/new" {
                    match controller.start_session(&cli.session).await {
                        Ok(()) => println!("{}", "Interview restarted.".bright_yellow()),
                        Err(err) => eprintln!("{}", format!("Error: {err}").red()),
                    }
                    continue;
                }

                run_turn(&controller, &cli.session, trimmed).await;
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    Ok(())
}

/// Runs one turn, rendering chunks as they arrive. The conversation stays
/// usable after a failed reply.
async fn run_turn(controller: &ConversationController, session_id: &str, input: &str) {
    let mut turn = match controller.submit_turn(session_id, input).await {
        Ok(turn) => turn,
        Err(err) => {
            eprintln!("{}", format!("Error: {err}").red());
            return;
        }
    };

    println!("{}", "[interviewer]".bright_magenta());
    let mut stdout = std::io::stdout();
    while let Some(chunk) = turn.next_chunk().await {
        match chunk {
            Ok(text) => {
                print!("{}", text.bright_blue());
                let _ = stdout.flush();
            }
            Err(err) => {
                println!();
                eprintln!("{}", format!("[reply interrupted: {err}]").red());
                return;
            }
        }
    }
    println!();
    println!();
}

fn print_message(message: &TranscriptMessage) {
    match message.role {
        MessageRole::User => {
            println!("{}", format!("> {}", message.content).green());
        }
        MessageRole::Assistant => {
            println!("{}", "[interviewer]".bright_magenta());
            for line in message.content.lines() {
                println!("{}", line.bright_blue());
            }
            println!();
        }
    }
}
