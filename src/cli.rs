//! Command-line interface for Zhihu Daily
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a configured [`ApiClient`] and a rendered result.

use clap::{Parser, Subcommand};
use futures::future::join_all;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::api::Operation;
use crate::cache::{CacheStore, DiskCache, MemoryCache};
use crate::client::{ApiClient, ClientConfig};
use crate::error::ApiError;
use crate::models::{LatestStories, Story};
use crate::transport::HttpTransport;

/// Error types for CLI execution
#[derive(Debug, Error)]
pub enum CliError {
    /// No home directory to derive the cache location from
    #[error("Could not determine a cache directory; pass --cache-dir or --memory-cache")]
    NoCacheDir,

    /// The API call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Clearing the cache failed
    #[error("Failed to clear cache: {0}")]
    Io(#[from] std::io::Error),

    /// Rendering the result failed
    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

/// Zhihu Daily CLI - Fetch stories with a local response cache
#[derive(Parser, Debug)]
#[command(name = "zhihu-daily")]
#[command(about = "Zhihu Daily stories with a 24-hour response cache")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Send requests to this base URL instead of the Zhihu API
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Store cached responses in this directory
    #[arg(long, global = true, value_name = "DIR", conflicts_with = "memory_cache")]
    pub cache_dir: Option<PathBuf>,

    /// Keep cached responses in memory only
    #[arg(long, global = true)]
    pub memory_cache: bool,

    /// Fail when a fetched response cannot be written to the cache
    #[arg(long, global = true)]
    pub strict_cache: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Show the latest stories
    Latest {
        /// Serve from the cache when a fresh entry exists
        #[arg(long)]
        cached: bool,

        /// Decode into the story model instead of raw JSON
        #[arg(long, conflicts_with = "cached")]
        typed: bool,
    },

    /// Show one or more stories by id
    Story {
        #[arg(required = true, value_name = "ID")]
        ids: Vec<u64>,
    },

    /// Call an operation (`latest` or `content:<id>`) and print raw JSON
    Call {
        operation: Operation,

        /// Serve from the cache when a fresh entry exists
        #[arg(long)]
        cached: bool,
    },

    /// Remove every cached response
    ClearCache,
}

impl Cli {
    /// Opens the on-disk cache selected by the arguments
    pub fn disk_cache(&self) -> Result<DiskCache, CliError> {
        match &self.cache_dir {
            Some(dir) => Ok(DiskCache::with_dir(dir.clone())),
            None => DiskCache::new().ok_or(CliError::NoCacheDir),
        }
    }

    /// Builds an API client from the arguments
    pub fn build_client(&self) -> Result<ApiClient, CliError> {
        let transport = match &self.base_url {
            Some(url) => HttpTransport::new().with_base_url(url.as_str()),
            None => HttpTransport::new(),
        };

        let cache: Arc<dyn CacheStore> = if self.memory_cache {
            Arc::new(MemoryCache::new())
        } else {
            Arc::new(self.disk_cache()?)
        };

        let config = ClientConfig {
            fail_on_cache_write: self.strict_cache,
            ..ClientConfig::default()
        };

        Ok(ApiClient::new(Arc::new(transport), cache).with_config(config))
    }
}

/// Message printed when clearing with `--memory-cache`
const NOTHING_TO_CLEAR: &str = "Nothing to clear: the memory cache only lives for a single run";

/// Removes the on-disk cache selected by the arguments
async fn clear_cache(cli: &Cli) -> Result<String, CliError> {
    if cli.memory_cache {
        return Ok(NOTHING_TO_CLEAR.to_string());
    }
    let cache = cli.disk_cache()?;
    cache.clear().await?;
    tracing::info!(dir = %cache.dir().display(), "cache cleared");
    Ok(format!("Cache cleared: {}", cache.dir().display()))
}

/// Runs the selected command and returns the text to print
pub async fn execute(cli: &Cli) -> Result<String, CliError> {
    let client = cli.build_client()?;

    let output = match &cli.command {
        Command::ClearCache => clear_cache(cli).await?,
        Command::Latest { typed: true, .. } => {
            let latest: LatestStories = client.call_one(Operation::Latest).await?;
            serde_json::to_string_pretty(&latest)?
        }
        Command::Latest { cached, .. } => {
            let map = client.call_dynamic(Operation::Latest, *cached).await?;
            serde_json::to_string_pretty(&Value::Object(map))?
        }
        Command::Story { ids } => {
            let calls = ids
                .iter()
                .map(|id| client.call_one::<Story>(Operation::Content(*id)));
            let stories = join_all(calls)
                .await
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?;
            serde_json::to_string_pretty(&stories)?
        }
        Command::Call { operation, cached } => {
            let map = client.call_dynamic(*operation, *cached).await?;
            serde_json::to_string_pretty(&Value::Object(map))?
        }
    };

    Ok(output)
}
