use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "obd")]
#[command(about = "Outbound shipment-sheet reconciler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile today's orders against the inventory export and write one
    /// shipment sheet per channel plus manifest.json.
    Run {
        /// Daily order export (CSV; UTF-8, cp932, UTF-16 or windows-1252)
        #[arg(long)]
        orders: String,

        /// Inventory balance export (xlsx, xls or CSV)
        #[arg(long)]
        inventory: String,

        /// Shipping warehouse; must be one of the configured warehouses
        #[arg(long)]
        warehouse: String,

        /// Layered config paths in merge order (applied over built-in defaults)
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Output directory. Falls back to $OBD_OUT_DIR, then ./out
        #[arg(long = "out-dir")]
        out_dir: Option<String>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (applied over built-in defaults)
        paths: Vec<String>,
    },

    /// Validate layered config and report keys nothing reads
    CheckConfig {
        /// Paths in merge order (applied over built-in defaults)
        paths: Vec<String>,

        /// Fail when unused keys are present
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    // Load .env.local if present (dev convenience). Silent if missing.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Run {
            orders,
            inventory,
            warehouse,
            config_paths,
            out_dir,
        } => commands::run::run_outbound(commands::run::RunArgs {
            orders,
            inventory,
            warehouse,
            config_paths,
            out_dir,
        })?,

        Commands::ConfigHash { paths } => {
            let loaded = commands::load_config(&paths)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::CheckConfig { paths, strict } => commands::check_config(&paths, strict)?,
    }

    Ok(())
}

/// Logs go to stderr; stdout carries only `key=value` result lines.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
