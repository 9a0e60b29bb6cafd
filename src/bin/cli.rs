//! ScarrDB CLI
//!
//! Command-line interface for a ScarrDB snapshot file.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use scarrdb::command::{parse_command, Command, Response, DEFAULT_FILL_COUNT, DEFAULT_STATS_ATTEMPTS};
use scarrdb::config::{PersistStrategy, SnapshotFormat};
use scarrdb::{Config, IndexedStore, Key};
use tracing_subscriber::{fmt, EnvFilter};

/// ScarrDB CLI
#[derive(Parser, Debug)]
#[command(name = "scarrdb")]
#[command(about = "Non-dense indexed file with overflow area and Scarr's rebuild method")]
#[command(version)]
struct Args {
    /// Snapshot file
    #[arg(short, long, default_value = "database.json")]
    file: PathBuf,

    /// Data block capacity
    #[arg(short, long, default_value = "10")]
    block_size: usize,

    /// Snapshot encoding (inferred from the file extension if omitted)
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Persist once per bulk fill instead of after every record
    #[arg(long)]
    batch: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatArg {
    Json,
    Bincode,
}

impl From<FormatArg> for SnapshotFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => SnapshotFormat::Json,
            FormatArg::Bincode => SnapshotFormat::Bincode,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for a key and report the comparisons used
    Search {
        /// The key to search for
        #[arg(allow_hyphen_values = true)]
        key: Key,
    },

    /// Insert a record (overwrites data if the key exists)
    Add {
        /// The key to add
        #[arg(allow_hyphen_values = true)]
        key: Key,

        /// The data to store
        data: String,
    },

    /// Replace the data of an existing record
    Edit {
        /// The key to edit
        #[arg(allow_hyphen_values = true)]
        key: Key,

        /// The new data
        data: String,
    },

    /// Delete a record
    Delete {
        /// The key to delete
        #[arg(allow_hyphen_values = true)]
        key: Key,
    },

    /// Insert random records
    Fill {
        /// Number of records
        #[arg(default_value_t = DEFAULT_FILL_COUNT)]
        count: usize,
    },

    /// Average comparisons over random searches
    Stats {
        /// Number of random searches
        #[arg(default_value_t = DEFAULT_STATS_ATTEMPTS)]
        attempts: usize,
    },

    /// Show record and block counts
    Info,

    /// Print the index area, data blocks and overflow area
    Dump,

    /// Read commands from stdin, one per line
    Shell,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,scarrdb=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let format = args
        .format
        .map(SnapshotFormat::from)
        .unwrap_or_else(|| SnapshotFormat::from_path(&args.file));
    let persist_strategy = if args.batch {
        PersistStrategy::OncePerBatch
    } else {
        PersistStrategy::EveryRecord
    };

    let config = Config::builder()
        .snapshot_path(&args.file)
        .snapshot_format(format)
        .block_size(args.block_size)
        .persist_strategy(persist_strategy)
        .build();

    let mut store = match IndexedStore::open(config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let command = match args.command {
        Commands::Search { key } => Command::Search { key },
        Commands::Add { key, data } => Command::Add { key, data },
        Commands::Edit { key, data } => Command::Edit { key, data },
        Commands::Delete { key } => Command::Delete { key },
        Commands::Fill { count } => Command::Fill { count },
        Commands::Stats { attempts } => Command::Stats { attempts },
        Commands::Info => Command::Info,
        Commands::Dump => {
            dump(&store);
            return ExitCode::SUCCESS;
        }
        Commands::Shell => return shell(&mut store),
    };

    match store.execute(command) {
        Ok(response) => {
            println!("{}", render(&response));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Line-oriented loop over stdin
fn shell(store: &mut IndexedStore) -> ExitCode {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("scarrdb> ");
        if stdout.flush().is_err() {
            return ExitCode::FAILURE;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => return ExitCode::SUCCESS,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }

        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "exit" => return ExitCode::SUCCESS,
            "dump" => {
                dump(store);
                continue;
            }
            _ => {}
        }

        match parse_command(line).and_then(|command| store.execute(command)) {
            Ok(response) => println!("{}", render(&response)),
            Err(e) => eprintln!("Error: {}", e),
        }
    }
}

fn render(response: &Response) -> String {
    match response {
        Response::Found {
            record,
            comparisons,
        } => format!(
            "Record found: key={} data={:?}. Comparisons: {}",
            record.key, record.data, comparisons
        ),
        Response::NotFound { comparisons } => {
            format!("Record not found. Comparisons: {}", comparisons)
        }
        Response::Done => "OK".to_string(),
        Response::Average(average) => format!("Average comparisons: {:.2}", average),
        Response::Summary(stats) => format!(
            "index entries: {}, blocks: {}, block records: {}, overflow records: {}, total: {}",
            stats.index_entries,
            stats.blocks,
            stats.block_records,
            stats.overflow_records,
            stats.total_records
        ),
    }
}

fn dump(store: &IndexedStore) {
    println!("Index area:");
    for entry in store.index_area() {
        println!("  [{}, {}] -> block {}", entry.start, entry.end, entry.block_id);
    }

    println!("Data blocks (capacity {}):", store.block_size());
    for (id, block) in store.data_blocks().iter().enumerate() {
        let keys: Vec<String> = block.iter().map(|r| r.key.to_string()).collect();
        println!("  {:>4}: [{}]", id, keys.join(", "));
    }

    println!("Overflow area:");
    let keys: Vec<String> = store.overflow_area().iter().map(|r| r.key.to_string()).collect();
    println!("  [{}]", keys.join(", "));
}
