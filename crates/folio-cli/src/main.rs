use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio artwork catalog operator CLI", long_about = None)]
struct Cli {
    /// Layered config paths in merge order. Falls back to FOLIO_CONFIG.
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Artwork ordering inspection and repair
    Order {
        #[command(subcommand)]
        cmd: OrderCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> local overrides...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    /// Connectivity + artworks table presence.
    Status,

    /// Apply embedded SQL migrations.
    Migrate,
}

#[derive(Subcommand)]
enum OrderCmd {
    /// Print the contiguity report. Exits non-zero when orders are not exactly 1..N.
    Check {
        /// Also print every (id, order) pair.
        #[arg(long, default_value_t = false)]
        verbose: bool,
    },

    /// Renumber every artwork to 1..N in one transaction, keeping the current sequence.
    Compact,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience).
    let _ = dotenvy::from_filename(".env.local");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = commands::connect(&cli.config_paths).await?;
            match cmd {
                DbCmd::Status => commands::db::status(&pool).await?,
                DbCmd::Migrate => commands::db::migrate(&pool).await?,
            }
        }

        Commands::Order { cmd } => {
            let pool = commands::connect(&cli.config_paths).await?;
            match cmd {
                OrderCmd::Check { verbose } => commands::order::check(&pool, verbose).await?,
                OrderCmd::Compact => commands::order::compact(&pool).await?,
            }
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = folio_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}
