//! CLI module - Command-line interface definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::info;

use crate::cache::store::Cache;
use crate::cache::ttl::Ttl;
use crate::core::config::CacheConfig;
use crate::core::model::{ResultItem, ResultSet};
use crate::core::render::{OutputFormat, RenderConfig, Renderer};

/// filecache - a persistent key/value cache stored as one file per entry.
#[derive(Parser, Debug)]
#[command(name = "filecache")]
#[command(
    author,
    version,
    about,
    long_about = r#"filecache stores each entry as cache-<key>.cache inside a directory.

Expiration is kept in the file's modification time, and independent processes
can coordinate through non-blocking advisory locks on the same files.

Every command prints its results in the selected format (default: jsonl).

Examples:
    filecache --dir /tmp/cache set greeting '"hello"'
    filecache --dir /tmp/cache set numbers '[1,2,3]' --ttl 5
    filecache --dir /tmp/cache get numbers --default null
    filecache --dir /tmp/cache lock report --hold 3
    filecache --dir /tmp/cache sweep
"#
)]
pub struct Cli {
    /// Cache directory.
    #[arg(
        long,
        global = true,
        env = "FILECACHE_DIR",
        default_value = ".",
        value_name = "DIR",
        long_help = "Directory holding the cache files. It must already exist and be readable\n\
and writable; nothing is created when the check fails."
    )]
    pub dir: PathBuf,

    /// Output format (jsonl/json/md).
    #[arg(long, global = true, default_value = "jsonl", value_name = "FORMAT")]
    pub format: String,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose mode (debug logging on stderr).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Treat expired entries as absent in `has`.
    #[arg(
        long,
        global = true,
        long_help = "By default `has` only checks that the entry's file exists, while `get`\n\
also honors expiration. With this flag `has` reports expired entries as absent too."
    )]
    pub has_checks_expiration: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a cached value, or the default when missing or expired.
    Get {
        #[arg(value_name = "KEY")]
        key: String,

        /// Value printed when the entry is missing (JSON, or a plain string).
        #[arg(long, value_name = "VALUE")]
        default: Option<String>,
    },

    /// Store a value.
    #[command(long_about = "Store VALUE under KEY. VALUE is parsed as JSON; anything that is not\n\
valid JSON is stored as a plain string.\n\n\
Without --ttl (or with --ttl 0) the entry never expires.")]
    Set {
        #[arg(value_name = "KEY")]
        key: String,

        #[arg(value_name = "VALUE")]
        value: String,

        /// Time to live in seconds.
        #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
        ttl: Option<i64>,
    },

    /// Delete one or more entries.
    Delete {
        #[arg(value_name = "KEY", required = true)]
        keys: Vec<String>,
    },

    /// Check whether an entry exists.
    Has {
        #[arg(value_name = "KEY")]
        key: String,
    },

    /// Delete every cache file in the directory.
    Clear,

    /// List entries with their expiration.
    List,

    /// Delete every expired entry now.
    Sweep,

    /// Try to take an entry's advisory lock without blocking.
    #[command(long_about = "Try to take the exclusive advisory lock on KEY. Fails immediately when\n\
another process holds it.\n\n\
With --hold the lock is kept for SECS seconds before the process exits, which\n\
makes it easy to watch a second invocation fail.")]
    Lock {
        #[arg(value_name = "KEY")]
        key: String,

        /// Seconds to keep the lock before releasing it.
        #[arg(long, value_name = "SECS", default_value_t = 0)]
        hold: u64,
    },
}

/// Parse a CLI value as JSON, falling back to a plain string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let format: OutputFormat = cli.format.parse().unwrap_or_default();
    let render_config = RenderConfig::with_pretty(format, cli.pretty);

    let config = CacheConfig::default().with_has_checks_expiration(cli.has_checks_expiration);
    let mut cache = Cache::with_config(&cli.dir, config)
        .with_context(|| format!("Failed to open cache at {:?}", cli.dir))?;

    let results = match cli.command {
        Commands::Get { key, default } => {
            let default = default.as_deref().map(parse_value).unwrap_or(Value::Null);
            let value = cache.get(&key, default)?;
            ResultSet::from_iter([ResultItem::entry(key, value)])
        }

        Commands::Set { key, value, ttl } => {
            let ttl = ttl.map(Ttl::Seconds);
            let ok = cache.set(&key, &parse_value(&value), ttl)?;
            let expiration = cache.expiration(&key)?;
            ResultSet::from_iter([ResultItem::status("set", ok)
                .with_key(key)
                .with_expiration(expiration)])
        }

        Commands::Delete { keys } => {
            let mut results = ResultSet::new();
            for key in keys {
                let ok = cache.delete(&key)?;
                results.push(ResultItem::status("delete", ok).with_key(key));
            }
            results
        }

        Commands::Has { key } => {
            let present = cache.has(&key)?;
            ResultSet::from_iter([ResultItem::status("has", present).with_key(key)])
        }

        Commands::Clear => {
            let count = cache.keys().len();
            let ok = cache.clear()?;
            ResultSet::from_iter([ResultItem::status("clear", ok).with_count(count)])
        }

        Commands::List => {
            let mut results = ResultSet::new();
            for key in cache.keys() {
                let Some(expiration) = cache.expiration(&key)? else {
                    continue;
                };
                let expired = cache.is_expired(&key)?;
                results.push(ResultItem::listing(key, expiration, expired));
            }
            results
        }

        Commands::Sweep => {
            let purged = cache.purge_expired();
            ResultSet::from_iter([ResultItem::status("sweep", true).with_count(purged)])
        }

        Commands::Lock { key, hold } => {
            let acquired = cache.lock(&key)?;
            let result = ResultSet::from_iter([ResultItem::status("lock", acquired).with_key(&key)]);
            print_results(&result, render_config);

            if acquired && hold > 0 {
                info!(key = %key, seconds = hold, "holding lock");
                thread::sleep(Duration::from_secs(hold));
            }
            cache.unlock(&key)?;
            return Ok(());
        }
    };

    print_results(&results, render_config);
    Ok(())
}

fn print_results(results: &ResultSet, config: RenderConfig) {
    let output = Renderer::with_config(config).render(results);
    if !output.is_empty() {
        println!("{}", output);
    }
}
