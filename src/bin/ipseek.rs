mod cli_utils;
mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

use commands::{cmd_build, cmd_dump, cmd_inspect, cmd_ips, cmd_query, cmd_search};

#[derive(Parser)]
#[command(name = "ipseek")]
#[command(
    about = "IPv4 geolocation lookups over qqwry-style databases",
    long_about = "ipseek - Query, inspect and build offset-addressed IPv4 location databases\n\n\
    Databases use the qqwry.dat layout: a sorted index of address ranges pointing\n\
    into GBK-encoded country/area records with 24-bit redirects.\n\n\
    Examples:\n\
      ipseek query qqwry.dat 8.8.8.8 114.114.114.114\n\
      ipseek query qqwry.dat 61.164.0.1 --region --json\n\
      ipseek search qqwry.dat 杭州 --limit 20\n\
      ipseek dump qqwry.dat --format csv > ranges.csv\n\
      ipseek build ranges.csv.gz -o custom.dat"
)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up one or more IPv4 addresses
    Query {
        /// Path to the database file
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Addresses to look up
        #[arg(value_name = "IP", required = true)]
        ips: Vec<String>,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,

        /// Include the country/province/city breakdown
        #[arg(short, long)]
        region: bool,

        /// How to read the database: mmap (default), file, or memory
        #[arg(short, long, default_value = "mmap")]
        mode: String,

        /// Quiet mode - no output, only exit code (0 = all found, 1 = some unknown)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show header offsets, entry count and edition of a database
    Inspect {
        /// Path to the database file
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Find ranges whose country or area contains a text fragment
    Search {
        /// Path to the database file
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Text to look for
        #[arg(value_name = "FRAGMENT")]
        fragment: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,

        /// Print at most this many ranges
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print every range in the database
    Dump {
        /// Path to the database file
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Output format: csv (default) or json (NDJSON)
        #[arg(short, long, default_value = "csv")]
        format: String,
    },

    /// Print the end address of every data range, one per line
    Ips {
        /// Path to the database file
        #[arg(value_name = "DATABASE")]
        database: PathBuf,
    },

    /// Build a database from CSV range lists (begin,end,country,area)
    Build {
        /// Input CSV files (.gz is decompressed), or "-" for stdin
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Output database file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

/// Log level from `-v` count; without it `RUST_LOG` applies, defaulting to warn
fn init_logger(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    match verbose {
        0 if std::env::var_os("RUST_LOG").is_some() => {}
        0 => {
            builder.filter_level(LevelFilter::Warn);
        }
        1 => {
            builder.filter_level(LevelFilter::Info);
        }
        2 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    let _ = builder.try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Commands::Query {
            database,
            ips,
            json,
            region,
            mode,
            quiet,
        } => cmd_query(database, ips, json, region, mode, quiet),
        Commands::Inspect { database, json } => cmd_inspect(database, json),
        Commands::Search {
            database,
            fragment,
            json,
            limit,
        } => cmd_search(database, fragment, json, limit),
        Commands::Dump { database, format } => cmd_dump(database, format),
        Commands::Ips { database } => cmd_ips(database),
        Commands::Build { inputs, output } => cmd_build(inputs, output),
    }
}
