use acl_search::commands::{self, search::OutputFormat};
use acl_search::config::Config;
use acl_search::error::AppError;
use acl_search::metadata::MetadataIndex;
use acl_search::query::{QueryError, QuerySettings, SearchContext};
use acl_search::retrieval::{bootstrap, HttpIndexLoader, HttpRetrievalClient};
use acl_search::server::{self, AppState, FormDefaults};
use acl_search::ui::StatusUI;
use acl_search::{blog, blog_warning};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Diagnostic log level, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "warn", value_name = "LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one query and print the matching papers
    Search {
        /// What the papers should be about
        #[clap(value_name = "QUERY")]
        query: String,

        /// Maximum number of results
        #[arg(short, long, allow_negative_numbers = true)]
        k: Option<i64>,

        /// Only papers published in this year or later
        #[arg(long, value_name = "YEAR")]
        min_year: Option<i64>,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Interactive search session
    Repl {
        /// Initial number of results
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        k: Option<u64>,

        /// Initial year filter
        #[arg(long, value_name = "YEAR")]
        min_year: Option<i64>,
    },

    /// Serve the web search form
    Serve {
        /// Address to listen on
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Open the page in the browser once listening
        #[arg(long)]
        open: bool,
    },

    /// Show corpus statistics
    Stats {
        /// Also count papers published since this year
        #[arg(long, value_name = "YEAR")]
        min_year: Option<i64>,
    },

    /// Write the corpus as JSON lines for the index builder
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Build the metadata table from the Anthology bibliography
    Prepare {
        /// Download the bibliography archive first
        #[arg(long)]
        download: bool,

        /// Archive URL (defaults to the configured source)
        #[arg(long, value_name = "URL", requires = "download")]
        source_url: Option<String>,
    },

    /// Show the effective configuration
    Config {
        /// Write a default config file
        #[arg(long)]
        init: bool,
    },
}

fn setup_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();
}

fn load_metadata(config: &Config) -> Result<MetadataIndex, AppError> {
    let path = config.metadata_path();
    let spinner = StatusUI::spinner(&format!("Loading {}", path.display()));
    let (index, report) = match MetadataIndex::load(&path, &config.corpus) {
        Ok(loaded) => loaded,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };
    StatusUI::finish_spinner_success(
        spinner,
        &format!("Loaded {} papers from {}", report.loaded, path.display()),
    );

    let skipped = report.skipped_no_abstract + report.skipped_by_filter;
    if skipped > 0 {
        blog!(
            "Skipped",
            "{} without abstract, {} outside the corpus filter",
            report.skipped_no_abstract,
            report.skipped_by_filter
        );
    }
    if report.loaded == 0 {
        blog_warning!(
            "Empty",
            "no papers in {} passed the corpus filter; every search will come back empty",
            path.display()
        );
    }
    if report.duplicates > 0 || report.shared_abstracts > 0 {
        blog_warning!(
            "Duplicates",
            "{} duplicate record(s), {} shared abstract(s); first occurrence wins",
            report.duplicates,
            report.shared_abstracts
        );
    }
    Ok(index)
}

async fn start_engine(config: &Config) -> Result<HttpRetrievalClient, AppError> {
    let loader = HttpIndexLoader::new(&config.retrieval.endpoint, config.request_timeout())?;
    let policy = config.bootstrap_policy();
    let spinner = StatusUI::spinner(&format!(
        "Opening index '{}' at {}",
        policy.index, config.retrieval.endpoint
    ));
    match bootstrap(&loader, &policy).await {
        Ok(client) => {
            let size = client
                .documents()
                .map(|n| format!(" ({} documents)", n))
                .unwrap_or_default();
            StatusUI::finish_spinner_success(spinner, &format!("Index '{}' ready{}", policy.index, size));
            Ok(client)
        }
        Err(e) => {
            spinner.finish_and_clear();
            Err(e.into())
        }
    }
}

async fn search_context(config: &Config) -> Result<SearchContext<HttpRetrievalClient>, AppError> {
    let metadata = load_metadata(config)?;
    let client = start_engine(config).await?;
    Ok(SearchContext::new(client, metadata, config.query_options()))
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let config = Config::load(Some(config_path.as_path()))?;
    let default_k = config.query.default_k as i64;
    let default_min_year = config.query.default_min_year;

    match cli.command {
        Commands::Search {
            query,
            k,
            min_year,
            format,
        } => {
            let settings = QuerySettings::new(
                query,
                k.unwrap_or(default_k),
                min_year.unwrap_or(default_min_year),
            )?;
            let ctx = search_context(&config).await?;
            commands::search::search(&ctx, &settings, format).await?;
        }

        Commands::Repl { k, min_year } => {
            let k = k.map(|k| k as usize).unwrap_or(config.query.default_k);
            if k == 0 {
                return Err(QueryError::InvalidQuery("k must be positive, got 0".to_string()).into());
            }
            let ctx = search_context(&config).await?;
            commands::repl::repl(&ctx, k, min_year.unwrap_or(default_min_year)).await?;
        }

        Commands::Serve { bind, open } => {
            let ctx = search_context(&config).await?;
            let state = AppState::new(
                ctx,
                FormDefaults {
                    k: default_k,
                    min_year: default_min_year,
                },
            )?;
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            server::serve(state, &bind, open).await?;
        }

        Commands::Stats { min_year } => {
            let metadata = load_metadata(&config)?;
            commands::stats::show_stats(&metadata, min_year.unwrap_or(default_min_year))?;
        }

        Commands::Export { output } => {
            let metadata = load_metadata(&config)?;
            commands::export::export(&metadata, output.as_deref())?;
        }

        Commands::Prepare {
            download,
            source_url,
        } => {
            let url = download.then(|| source_url.unwrap_or_else(|| config.prepare.source_url.clone()));
            commands::prepare::prepare(&config.data_dir, &config.metadata_path(), url.as_deref())
                .await?;
        }

        Commands::Config { init } => {
            if init {
                Config::init(&config_path)?;
            } else {
                commands::config::show_config(&config, &config_path)?;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    if let Err(err) = run(cli).await {
        StatusUI::error(&err.to_string());
        if err.is_fatal_startup() {
            tracing::error!(error = ?err, "startup failed");
        }
        process::exit(1);
    }
}
