//! Cache command - get, set and delete cached JSON objects

use crate::cache::CacheManager;
use crate::cli::args::{CacheAction, CacheArgs};
use crate::config::Config;
use crate::error::KeylatchResult;
use crate::store;
use console::style;
use serde_json::{Map, Value};

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> KeylatchResult<()> {
    let store = store::connect(&config.store).await?;
    let cache = CacheManager::new(store, &config.cache);

    match args.action {
        CacheAction::Get { key } => {
            let value: Map<String, Value> = cache.get(&key).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        CacheAction::Set { key, value, ttl } => {
            let stored = match ttl {
                Some(ttl) => cache.set_with_ttl(&key, &value, ttl).await?,
                None => cache.set(&key, &value).await?,
            };
            if stored {
                println!("{} Cached {}", style("✓").green(), style(&key).cyan());
            } else {
                println!("{} Store did not accept {}", style("!").yellow(), key);
            }
        }
        CacheAction::Del { key } => {
            let removed = cache.delete(&key).await?;
            println!("{}", removed);
        }
    }

    Ok(())
}
