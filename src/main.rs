use clap::{Parser, Subcommand};
use ragchat::Result;
use ragchat::commands::{ingest_file, ingest_url, serve};
use ragchat::config::{Config, init_config, show_config};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(about = "Retrieval-augmented chat service with web and file ingestion")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the configuration, or write a default config file
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Crawl a site and index its pages
    IngestUrl {
        /// Page the crawl starts from
        url: String,
        /// Host to stay on; defaults to the host of the URL
        #[arg(long)]
        filter: Option<String>,
    },
    /// Index a text, markdown, PDF or archive file
    IngestFile {
        path: PathBuf,
    },
}

fn init_tracing() {
    let default_level = Config::load_default()
        .map(|config| config.server.tracing_directive())
        .unwrap_or("info");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Serve { port } => {
            serve(port).await?;
        }
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                init_config()?;
            }
        }
        Commands::IngestUrl { url, filter } => {
            ingest_url(&url, filter.as_deref()).await?;
        }
        Commands::IngestFile { path } => {
            ingest_file(&path).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn serve_command() {
        let cli = Cli::try_parse_from(["ragchat", "serve", "--port", "8080"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Serve { port } = parsed.command {
                assert_eq!(port, Some(8080));
            }
        }
    }

    #[test]
    fn ingest_url_with_filter() {
        let cli = Cli::try_parse_from([
            "ragchat",
            "ingest-url",
            "https://example.com",
            "--filter",
            "example.com",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::IngestUrl { url, filter } = parsed.command {
                assert_eq!(url, "https://example.com");
                assert_eq!(filter.as_deref(), Some("example.com"));
            }
        }
    }

    #[test]
    fn ingest_file_takes_a_path() {
        let cli = Cli::try_parse_from(["ragchat", "ingest-file", "docs.zip"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::IngestFile { path } = parsed.command {
                assert_eq!(path, PathBuf::from("docs.zip"));
            }
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["ragchat", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["ragchat", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["ragchat", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
