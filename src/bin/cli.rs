//! CLI binary for tanjiro.

use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tanjiro::{BotConfig, Reply, Session};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Chat with Kamado Tanjiro and search for Demon Slayer memes.
#[derive(Parser)]
#[command(name = "tanjiro", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Start an interactive conversation (default).
    Chat,

    /// Search memes once and print the results.
    Meme {
        /// Topic, free text or hashtags.
        topic: Vec<String>,

        /// Maximum number of results.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show what Tanjiro thinks you are interested in.
    Interests,

    /// Show recent conversation history.
    History {
        /// Forget the stored history instead.
        #[arg(long)]
        clear: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = BotConfig::load(cli.config.as_deref())?;

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = init_tracing(&config);

    let mut session = Session::from_config(&config)?;

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => run_chat(&mut session),
        Command::Meme { topic, limit } => run_meme(&session, &topic.join(" "), limit),
        Command::Interests => {
            println!("{}", tanjiro::interests::format_interests(&session.interests()));
            Ok(())
        }
        Command::History { clear } => {
            if clear {
                session.memory_mut().clear()?;
                println!("Conversation history cleared.");
            } else {
                let entries = session.memory().recent(None);
                println!("{}", tanjiro::memory::format_history(&entries));
            }
            Ok(())
        }
    }
}

fn init_tracing(config: &BotConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    // Suppress noisy dependency logs by default; RUST_LOG overrides.
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                config
                    .logging
                    .filter
                    .as_deref()
                    .unwrap_or("tanjiro=info,meme_search=info"),
            )
        })
    };

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if config.logging.file {
        let appender = tracing_appender::rolling::daily(config.logs_dir(), "tanjiro.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::registry()
            .with(filter())
            .with(stderr_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .init();
        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(filter())
            .with(stderr_layer)
            .init();
        None
    }
}

fn print_welcome() {
    let rule = "=".repeat(50);
    println!("{rule}");
    println!("Welcome to Chat with Tanjiro!");
    println!("{rule}");
    println!("\nYou can now chat with Kamado Tanjiro from Demon Slayer!");
    println!("Type 'exit' or 'quit' to end the conversation.");
    println!("Type 'clear' to clear the screen.");
    println!("Type 'history' to see your recent conversation history.");
    println!("Type 'interests' to see what Tanjiro thinks you're interested in.");
    println!("Type 'meme <topic>' for a meme, then 'next meme' or 'previous meme'.");
    println!("Type 'add meme topic | title | source | type | url | tags' to teach Tanjiro a meme.");
    println!("{}\n", "-".repeat(50));
}

fn run_chat(session: &mut Session) -> anyhow::Result<()> {
    print_welcome();
    info!(entries = session.memory().len(), "chat started");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!("\n\nTanjiro: Oh! You're leaving? Take care!");
            return Ok(());
        };

        match session.handle(&line?) {
            Reply::Nothing => {}
            Reply::Cleared => {
                // ANSI: clear screen, cursor home.
                print!("\x1B[2J\x1B[1;1H");
                print_welcome();
            }
            Reply::Exit(farewell) => {
                println!("\nTanjiro: {farewell}");
                return Ok(());
            }
            Reply::Meme(card) => println!("\n{}", card.render()),
            Reply::Text(text) => println!("\nTanjiro: {text}"),
        }
    }
}

fn run_meme(session: &Session, topic: &str, limit: Option<usize>) -> anyhow::Result<()> {
    let searcher = session.searcher();
    let limit = limit.unwrap_or(searcher.config().default_limit);
    let memes = searcher.search_memes(topic, limit);
    if memes.is_empty() {
        println!("No memes found for **{}**.", topic.trim());
        return Ok(());
    }

    for (i, meme) in memes.iter().enumerate() {
        let (caption, url) = meme_search::format_for_display(meme);
        println!("{}. {caption}", i + 1);
        if let Some(url) = url {
            println!("   {url}");
        }
        println!("   Source: {}", meme.source);
    }
    Ok(())
}
