//! cloudfile CLI - manual testing front end for the file controller

use anyhow::{anyhow, Context, Result};
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use cloudfile::file::DEFAULT_MIME_TYPE;
use cloudfile::{CancellationToken, ClientConfig, FileController, FileState, ProgressCallback};

/// CLI command
#[derive(Debug)]
enum Command {
    /// Upload a local file
    Upload {
        path: PathBuf,
        content_type: Option<String>,
    },
    /// Download a remote file into the cache
    Download { name: String, url: String },
    /// Delete all cached files
    Clear,
    /// Show help
    Help,
}

fn print_help() {
    eprintln!(
        r#"cloudfile - Upload, download and cache remote files

USAGE:
    cloudfile upload <path> [content_type]
    cloudfile download <name> <url>
    cloudfile clear
    cloudfile help

COMMANDS:
    upload    Upload a local file and print its server name and URL
    download  Fetch a file into the cache (served from disk if already cached)
    clear     Delete everything in the cache directory
    help      Show this help message

ENVIRONMENT:
    CLOUDFILE_SERVER_URL     REST server base URL (required)
    CLOUDFILE_APP_ID         Application ID (required)
    CLOUDFILE_CLIENT_KEY     Client key
    CLOUDFILE_SESSION_TOKEN  Session token sent with uploads
    CLOUDFILE_CACHE_DIR      Cache directory (default: platform cache dir)
    CLOUDFILE_TIMEOUT_SECS   HTTP request timeout in seconds (default: 30)
    RUST_LOG                 Log level (trace, debug, info, warn, error)

Press Ctrl+C to cancel a running upload or download.
"#
    );
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        return Ok(Command::Help);
    }

    match args[1].as_str() {
        "upload" => {
            if args.len() < 3 {
                return Err(anyhow!("Usage: cloudfile upload <path> [content_type]"));
            }
            Ok(Command::Upload {
                path: PathBuf::from(&args[2]),
                content_type: args.get(3).cloned(),
            })
        }
        "download" => {
            if args.len() < 4 {
                return Err(anyhow!("Usage: cloudfile download <name> <url>"));
            }
            Ok(Command::Download {
                name: args[2].clone(),
                url: args[3].clone(),
            })
        }
        "clear" => Ok(Command::Clear),
        "help" | "--help" | "-h" => Ok(Command::Help),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            Ok(Command::Help)
        }
    }
}

fn progress_printer(label: &'static str) -> ProgressCallback {
    Arc::new(move |percent| {
        eprint!("\r{} {:>3}%", label, percent);
        if percent == 100 {
            eprintln!();
        }
        let _ = std::io::stderr().flush();
    })
}

/// Cancel `token` when Ctrl+C is pressed
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received interrupt, cancelling...");
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let log_level = env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let command = match parse_args() {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    if let Command::Help = command {
        print_help();
        return Ok(());
    }

    let config = ClientConfig::from_env().context("Invalid configuration")?;
    let controller = FileController::from_config(&config).context("Failed to set up file controller")?;
    let session_token = config.session_token.as_deref();

    let cancellation = CancellationToken::new();
    cancel_on_ctrl_c(cancellation.clone());

    match command {
        Command::Upload { path, content_type } => {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow!("Not a file path: {}", path.display()))?;
            let state = FileState::builder(name)
                .mime_type(content_type.unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()))
                .build();

            info!(path = %path.display(), "Uploading file...");
            let progress = progress_printer("upload");
            let saved = controller
                .save_file(&state, &path, session_token, Some(&progress), Some(&cancellation))
                .await
                .context("Upload failed")?;

            println!("{}", serde_json::to_string_pretty(&saved)?);
        }
        Command::Download { name, url } => {
            let state = FileState::builder(name).url(url).build();

            let progress = progress_printer("download");
            let path = controller
                .fetch(&state, session_token, Some(&progress), Some(&cancellation))
                .await
                .context("Download failed")?;

            println!("{}", path.display());
        }
        Command::Clear => {
            controller.clear_cache();
            println!("Cleared {}", controller.cache().cache_dir().display());
        }
        Command::Help => print_help(),
    }

    Ok(())
}
