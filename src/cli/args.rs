//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// keylatch - TTL locks and ephemeral cache over Redis
///
/// Coordinates processes that share nothing but a key-value store.
#[derive(Parser, Debug)]
#[command(name = "keylatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "KEYLATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Store URL, overriding the configured one (redis://, rediss://, memory://)
    #[arg(long, global = true, env = "KEYLATCH_STORE_URL")]
    pub store: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Acquire, inspect or release named locks
    Lock(LockArgs),

    /// Read and write cached JSON values
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the lock command
#[derive(Parser, Debug)]
pub struct LockArgs {
    /// Subcommand for lock
    #[command(subcommand)]
    pub action: LockAction,
}

/// Lock subcommands
#[derive(Subcommand, Debug)]
pub enum LockAction {
    /// Run a command while holding a lock
    Run {
        /// Lock name
        name: String,

        /// Lock TTL in seconds, refreshed while the command runs (default: from config)
        #[arg(long)]
        ttl: Option<i64>,

        /// Command and arguments to run
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },

    /// Delete a lock regardless of who holds it
    Release {
        /// Lock name
        name: String,
    },

    /// Show whether a lock is held and since when
    Inspect {
        /// Lock name
        name: String,
    },
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Print a cached value ({} on miss)
    Get {
        /// Cache key
        key: String,
    },

    /// Store a JSON object
    Set {
        /// Cache key
        key: String,

        /// JSON object to store
        #[arg(value_parser = parse_json_object)]
        value: serde_json::Map<String, serde_json::Value>,

        /// TTL in seconds, 0 to never expire (default: from config)
        #[arg(long, allow_hyphen_values = true)]
        ttl: Option<i64>,
    },

    /// Delete a cached value
    Del {
        /// Cache key
        key: String,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Parse a JSON object argument
fn parse_json_object(s: &str) -> Result<serde_json::Map<String, serde_json::Value>, String> {
    match serde_json::from_str(s) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err("value must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn parse_json_object_valid() {
        let map = parse_json_object(r#"{"a": 1}"#).unwrap();
        assert_eq!(map["a"], 1);
    }

    #[test]
    fn parse_json_object_rejects_non_objects() {
        assert!(parse_json_object("[1, 2]").is_err());
        assert!(parse_json_object("{oops").is_err());
    }

    #[test]
    fn cli_parses_lock_run() {
        let cli = Cli::parse_from([
            "keylatch", "lock", "run", "deploy", "--ttl", "30", "--", "make", "ship",
        ]);
        match cli.command {
            Commands::Lock(LockArgs {
                action: LockAction::Run { name, ttl, command },
            }) => {
                assert_eq!(name, "deploy");
                assert_eq!(ttl, Some(30));
                assert_eq!(command, vec!["make", "ship"]);
            }
            _ => panic!("expected lock run"),
        }
    }

    #[test]
    fn cli_lock_run_requires_command() {
        assert!(Cli::try_parse_from(["keylatch", "lock", "run", "deploy"]).is_err());
    }

    #[test]
    fn cli_parses_cache_set_with_ttl() {
        let cli = Cli::parse_from([
            "keylatch", "cache", "set", "k", r#"{"v":1}"#, "--ttl", "0",
        ]);
        match cli.command {
            Commands::Cache(CacheArgs {
                action: CacheAction::Set { key, value, ttl },
            }) => {
                assert_eq!(key, "k");
                assert_eq!(value["v"], 1);
                assert_eq!(ttl, Some(0));
            }
            _ => panic!("expected cache set"),
        }
    }

    #[test]
    fn cli_global_store_flag() {
        let cli = Cli::parse_from(["keylatch", "cache", "get", "k", "--store", "memory://"]);
        assert_eq!(cli.store.as_deref(), Some("memory://"));
    }

    #[test]
    #[serial]
    fn cli_store_from_environment() {
        std::env::set_var("KEYLATCH_STORE_URL", "memory://");
        let cli = Cli::parse_from(["keylatch", "cache", "get", "k"]);
        std::env::remove_var("KEYLATCH_STORE_URL");

        assert_eq!(cli.store.as_deref(), Some("memory://"));
    }

    #[test]
    #[serial]
    fn cli_store_flag_beats_environment() {
        std::env::set_var("KEYLATCH_STORE_URL", "redis://env-host:6379");
        let cli = Cli::parse_from(["keylatch", "--store", "memory://", "config", "show"]);
        std::env::remove_var("KEYLATCH_STORE_URL");

        assert_eq!(cli.store.as_deref(), Some("memory://"));
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["keylatch", "config", "path"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["keylatch", "-v", "config", "path"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["keylatch", "-vv", "config", "path"]);
        assert_eq!(cli.verbose, 2);
    }
}
