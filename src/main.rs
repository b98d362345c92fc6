use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docx_tools::{Config, DocumentOperations, EditMode, tools::TOOLS};

#[derive(Parser)]
#[command(name = "docx-tools")]
#[command(about = "Word document operations over a stdio tool protocol or HTTP")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// How mutating tools treat existing document content
    #[arg(long, value_enum, global = true)]
    edit_mode: Option<EditMode>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve tools over stdin/stdout
    Mcp,
    /// Serve tools over HTTP
    Http {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the tool descriptors as JSON
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout belongs to the protocol in stdio mode, so logs always go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docx_tools=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(mode) = cli.edit_mode {
        config.documents.edit_mode = mode;
    }

    match cli.command {
        Command::Mcp => {
            let ops = DocumentOperations::new(config.documents);
            docx_tools::mcp::serve_stdio(ops).await?;
        }
        Command::Http { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let addr = config.bind_address();
            let ops = DocumentOperations::new(config.documents);
            docx_tools::server::serve(ops, &addr).await?;
        }
        Command::Tools => {
            println!("{}", serde_json::to_string_pretty(&*TOOLS)?);
        }
    }

    Ok(())
}
