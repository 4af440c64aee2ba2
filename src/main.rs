use anyhow::{bail, Context, Result};
use book_finder::config::{
    find_config_file, load_config, write_default_config, CacheConfig, Config,
};
use book_finder::models::{Page, SearchResult, SourceType};
use book_finder::search::BookFinder;
use book_finder::server::{self, AppState, BooksResponse};
use book_finder::utils::{
    books_table, format_page_footer, format_results, format_source_summary, paginate,
    CacheService,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Book Finder - Find every book by an author across public book catalogs
#[derive(Parser, Debug)]
#[command(name = "book-finder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find every book by an author across public book catalogs", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    /// Disable the result cache for this command
    #[arg(long, global = true, default_value_t = false)]
    no_cache: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find books by an author
    #[command(alias = "s")]
    Search {
        /// Author name (multiple words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        author: Vec<String>,

        /// Zero-based page to show
        #[arg(long, short, default_value_t = 0)]
        page: usize,

        /// Books per page (default from configuration)
        #[arg(long)]
        page_size: Option<usize>,

        /// Show every book on one page
        #[arg(long, conflicts_with_all = ["page", "page_size"])]
        all: bool,
    },

    /// Run the HTTP API server
    Serve {
        /// Host to bind to (default from configuration)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (default from configuration, then PORT, then 5000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// List catalogs and whether they are enabled
    #[command(alias = "ls")]
    Sources,

    /// Inspect or create configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Manage the local result cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,

    /// Write a default configuration file
    Init {
        /// Where to write the file
        #[arg(long, default_value = "book-finder.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommands {
    /// Show cache status
    Status,

    /// Remove all cached results
    Clear,
}

/// Print all available environment variables
fn print_env_vars() {
    println!("Book Finder - Environment Variables");
    println!();
    println!("API Keys:");
    println!("  GOOGLE_BOOKS_API_KEY        API key for Google Books (optional, raises quota)");
    println!();
    println!("Server:");
    println!("  PORT                        Port for `serve` (default: 5000)");
    println!();
    println!("Configuration overrides (nested keys separated by `__`):");
    println!("  BOOK_FINDER_SOURCES__ENABLED_SOURCES     Only use these catalogs (e.g. open_library)");
    println!("  BOOK_FINDER_SOURCES__DISABLED_SOURCES    Never use these catalogs (e.g. google_books)");
    println!("  BOOK_FINDER_SEARCH__SOURCE_TIMEOUT_SECS  Time allowed per catalog (default: 30)");
    println!("  BOOK_FINDER_SEARCH__TITLE_NORMALIZATION  basic | standard | folded (default: standard)");
    println!("  BOOK_FINDER_SEARCH__PAGE_SIZE            Books per page (default: 50)");
    println!("  BOOK_FINDER_RETRY__MAX_ATTEMPTS          Attempts per catalog request (default: 3)");
    println!("  BOOK_FINDER_HTTP__REQUEST_TIMEOUT_SECS   Timeout per HTTP request (default: 10)");
    println!("  BOOK_FINDER_CACHE__ENABLED               Enable the result cache (default: false)");
    println!("  BOOK_FINDER_CACHE__DIRECTORY             Custom cache directory");
    println!("  BOOK_FINDER_CACHE__TTL_SECONDS           TTL for cached results (default: 1800 = 30 min)");
    println!("  BOOK_FINDER_LOGGING__FORMAT              Set to `json` for structured logs");
    println!();
    println!("Other Settings:");
    println!("  RUST_LOG                    Rust logging level (e.g., debug, info, warn, error)");
    println!();
    println!("Example:");
    println!("  export GOOGLE_BOOKS_API_KEY=\"your-key-here\"");
    println!("  export BOOK_FINDER_CACHE__ENABLED=true");
    std::process::exit(0);
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("book_finder={}", level)),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.is_json() {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Show environment variables and exit if requested
    if cli.env {
        print_env_vars();
    }

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    let mut config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load config".to_string(),
    })?;

    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::debug!("Using config file: {}", path.display());
    }

    if cli.no_cache {
        config.cache.enabled = false;
    }

    match cli.command {
        Some(Commands::Search {
            author,
            page,
            page_size,
            all,
        }) => {
            let finder = BookFinder::from_config(&config);
            let result = finder.search_books_by_author(&author.join(" ")).await?;

            let page = if all {
                paginate(result.books(), 0, result.len().max(1))
            } else {
                let size = page_size
                    .unwrap_or(config.search.page_size)
                    .clamp(1, config.search.max_page_size.max(1));
                paginate(result.books(), page, size)
            };

            output_page(&result, page, cli.output, cli.quiet)?;
        }

        Some(Commands::Serve { host, port }) => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let addr = tokio::net::lookup_host((host.as_str(), port))
                .await
                .with_context(|| format!("Failed to resolve {}:{}", host, port))?
                .next()
                .with_context(|| format!("No address for {}:{}", host, port))?;

            let finder = BookFinder::from_config(&config);
            tracing::info!(
                sources = ?finder.registry().ids().collect::<Vec<_>>(),
                "Starting HTTP server"
            );
            server::serve(AppState::new(finder), addr)
                .await
                .context("Server error")?;
        }

        Some(Commands::Sources) => {
            let mut table = comfy_table::Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["ID", "Name", "Enabled", "Base URL"]);
            for source in SourceType::ALL {
                let enabled = config.sources.is_enabled(source);
                table.add_row(vec![
                    source.id(),
                    source.name(),
                    if enabled { "yes" } else { "no" },
                    config.sources.catalog(source).base_url.as_str(),
                ]);
            }
            println!("{table}");
        }

        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => {
                print!("{}", toml::to_string_pretty(&config.redacted())?);
            }
            ConfigCommands::Init { path, force } => {
                if path.exists() && !force {
                    bail!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
                write_default_config(&path)?;
                if !cli.quiet {
                    eprintln!("Wrote default configuration to {}", path.display());
                }
            }
        },

        Some(Commands::Cache { command }) => {
            let cache = CacheService::from_config(CacheConfig {
                enabled: true,
                ..config.cache.clone()
            });

            match command {
                CacheCommands::Status => {
                    if config.cache.enabled {
                        println!("Cache: enabled");
                    } else {
                        println!("Cache: disabled");
                        println!("To enable, set BOOK_FINDER_CACHE__ENABLED=true");
                    }
                    println!("Directory: {}", cache.cache_dir().display());
                    println!("Cached searches: {}", cache.entry_count());
                    println!("TTL: {} seconds", cache.ttl().as_secs());
                }
                CacheCommands::Clear => {
                    if !cli.quiet {
                        eprintln!("Clearing cached results...");
                    }
                    cache.clear_all()?;
                    if !cli.quiet {
                        eprintln!("Cache cleared successfully.");
                    }
                }
            }
        }

        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

fn output_page(result: &SearchResult, page: Page, format: OutputFormat, quiet: bool) -> Result<()> {
    let actual_format = if format == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    };

    let offset = page.page.saturating_mul(page.page_size);

    match actual_format {
        OutputFormat::Json => {
            let response = BooksResponse {
                author: result.author().to_string(),
                count: page.total_count,
                page: page.page,
                page_size: page.page_size,
                total_pages: page.total_pages,
                has_more: page.has_more,
                books: page.books,
                sources: result.sources().clone(),
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Plain => {
            println!(
                "{}",
                format_results(&page.books, result.author(), page.total_count, offset)
            );
            if !quiet {
                eprintln!();
                eprintln!("{}", format_page_footer(&page));
            }
        }
        OutputFormat::Table => {
            if page.books.is_empty() {
                println!("No books found for {}", result.author());
            } else {
                println!("{}", books_table(&page.books, offset));
            }
            if !quiet {
                eprintln!("{}", format_page_footer(&page));
                eprintln!("{}", format_source_summary(result));
            }
        }
        OutputFormat::Auto => unreachable!(),
    }

    if result.all_sources_failed() && !quiet {
        eprintln!("Warning: every catalog failed; results may be incomplete");
    }

    Ok(())
}
