//! acebot: study content CLI
//!
//! Fetches notes, practice questions, audio, formula images, and tutor
//! replies through the rotating credential pool.

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use acebot::{ChatMessage, StudyService};
use acebot::config::Config;

/// Acebot study content client
#[derive(Parser)]
#[command(name = "acebot")]
#[command(version = acebot::PKG_VERSION)]
#[command(about = "Study content generator with API key rotation")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "ACEBOT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate chapter notes
    Notes {
        subject: String,
        chapter: String,
    },

    /// Generate practice questions with solutions
    Questions {
        subject: String,
        chapter: String,
    },

    /// Narrate notes as audio (base64 PCM)
    Audio {
        subject: String,
        /// Notes text (or omit to read from stdin)
        notes: Option<String>,
        /// Write the base64 payload here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Render a formula image (base64)
    Image {
        subject: String,
        description: String,
        /// Write the base64 payload here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Ask the tutor a question
    Chat {
        message: String,
        /// JSON file with earlier turns: `[{"role": "user", "text": "..."}]`
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Show credential rotation status
    Status,

    /// Remove every cached response
    ClearCache,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("acebot=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;
    let gateway = config.build_gateway()?;

    info!(version = acebot::PKG_VERSION, "acebot starting");

    match args.command {
        Command::Notes { subject, chapter } => {
            println!("{}", gateway.generate_notes(&subject, &chapter).await?);
        }
        Command::Questions { subject, chapter } => {
            println!("{}", gateway.generate_questions(&subject, &chapter).await?);
        }
        Command::Audio {
            subject,
            notes,
            out,
        } => {
            let notes = match notes {
                Some(notes) => notes,
                None => read_stdin()?,
            };
            let audio = gateway.generate_audio(&notes, &subject).await?;
            emit(&audio, out.as_deref())?;
        }
        Command::Image {
            subject,
            description,
            out,
        } => {
            let image = gateway.generate_image(&description, &subject).await?;
            emit(&image, out.as_deref())?;
        }
        Command::Chat { message, history } => {
            let history: Vec<ChatMessage> = match history {
                Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
                None => Vec::new(),
            };
            println!("{}", gateway.chat(&history, &message).await?);
        }
        Command::Status => {
            println!("{}", serde_json::to_string_pretty(&gateway.status())?);
        }
        Command::ClearCache => {
            gateway.clear_cache()?;
            println!("cache cleared");
        }
    }

    Ok(())
}

fn read_stdin() -> io::Result<String> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no notes given and stdin is a terminal",
        ));
    }
    let mut buf = String::new();
    stdin.read_to_string(&mut buf)?;
    Ok(buf)
}

fn emit(payload: &str, out: Option<&Path>) -> io::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, payload)?;
            info!(path = %path.display(), bytes = payload.len(), "wrote payload");
            Ok(())
        }
        None => {
            println!("{payload}");
            Ok(())
        }
    }
}
