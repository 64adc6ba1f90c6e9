//! hearty-store CLI
//!
//! Single-shot command surface: every invocation performs one operation
//! against the store directory and exits 0 on success, 1 on any failure
//! with one diagnostic line on stderr.
//!
//! `get` streams the raw payload to stdout and keeps its status line on
//! stderr so the bytes can be piped; log output also goes to stderr for
//! the same reason.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use hearty_store::{Config, Engine};

/// hearty-store CLI
#[derive(Parser, Debug)]
#[command(name = "hearty-store")]
#[command(about = "Fixed-capacity block stores with mirror and XOR-parity redundancy")]
#[command(version)]
struct Args {
    /// Base directory holding stores and HA groups
    #[arg(short, long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize a fresh store
    Init {
        /// The store id (non-negative)
        store_id: i32,
    },

    /// Store a file, printing the generated object id
    Put {
        /// The store to write into
        store_id: i32,

        /// Path of the payload file (at most one block)
        file: PathBuf,
    },

    /// Fetch an object's bytes to stdout
    Get {
        /// The store to read from
        store_id: i32,

        /// The object id printed by put
        object_id: String,
    },

    /// List all stores
    List,

    /// Create a mirror copy of a store
    Replicate {
        /// The store to mirror
        store_id: i32,
    },

    /// Form an HA group from two or more stores
    Ha {
        /// Member store ids; the first one names the group
        #[arg(num_args = 2.., required = true)]
        store_ids: Vec<i32>,
    },

    /// Destroy a store (and its mirror partner or HA bookkeeping)
    Destroy {
        /// The store to destroy
        store_id: i32,
    },
}

fn main() -> ExitCode {
    // Diagnostics stay on stderr; stdout belongs to command output.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match args.base_dir {
        Some(dir) => Config::builder().base_dir(dir).build(),
        None => Config::default(),
    };
    let engine = Engine::new(config);

    match run(&engine, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(engine: &Engine, command: Commands) -> hearty_store::Result<()> {
    match command {
        Commands::Init { store_id } => {
            engine.init(store_id)?;
            println!("Successfully initialized store {store_id}");
        }

        Commands::Put { store_id, file } => {
            let object_id = engine.put(store_id, &file)?;
            println!("Successfully put object id {object_id} into {store_id}");
        }

        Commands::Get { store_id, object_id } => {
            let bytes = engine.get(store_id, &object_id)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
            eprintln!("Successfully get the object {object_id}");
        }

        Commands::List => {
            let summaries = engine.list()?;
            if summaries.is_empty() {
                println!("No stores found");
            } else {
                for summary in summaries {
                    println!("{summary}");
                }
            }
        }

        Commands::Replicate { store_id } => {
            let replica_id = engine.replicate(store_id)?;
            println!("Successfully replicated store {store_id} to {replica_id}");
        }

        Commands::Ha { store_ids } => {
            let group_id = engine.create_ha_group(&store_ids)?;
            println!("Successfully created HA group with ID {group_id}");
        }

        Commands::Destroy { store_id } => {
            engine.destroy(store_id)?;
            println!("Store {store_id} destroyed successfully");
        }
    }
    Ok(())
}
