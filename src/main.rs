use clap::Parser;
use vq::core::config::Config;

#[derive(Parser)]
#[command(name = "vq", about = "vq: controlled-vocabulary search and hierarchy browser")]
struct Cli {
    /// Write debug logs to /tmp/vq-debug.log (tail -f to inspect).
    #[arg(long)]
    debug: bool,

    /// Base URL of the vocabulary REST API (overrides `[server] base_url`).
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Vocabulary acronym to search; repeat for several. The last one is
    /// queried first. Overrides `[search] sources`.
    #[arg(long = "vocab", value_name = "ACRONYM")]
    vocabularies: Vec<String>,

    /// Start the hierarchy at the vocabulary roots.
    #[arg(long)]
    browse_roots: bool,

    /// Open the hierarchy around the term at this repository path.
    #[arg(long, value_name = "PATH")]
    term: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("/tmp/vq-debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
        tracing::info!("vq debug log started, tail -f /tmp/vq-debug.log");
    }

    let mut config = Config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "config unreadable, using defaults");
        Config::defaults()
    });
    if let Some(base_url) = cli.base_url {
        config.server.base_url = base_url;
    }
    if !cli.vocabularies.is_empty() {
        config.search.sources = cli.vocabularies;
    }
    if cli.browse_roots {
        config.browse.roots = true;
    }

    vq::tui::run(config, cli.term.as_deref()).await
}
