//! Redis cache for corpus-derived lookup results
//!
//! Only facts derived from the corpus are cached: interaction lookups keyed
//! by the sorted canonical id set, and alternative lists keyed by drug id.
//! Keys carry the corpus generation, so a reload invalidates every entry at
//! once. Query text and anything user-supplied is never written here.

use std::env;

use redis::{AsyncCommands, Client};
use serde::{Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};

use crate::model::DrugId;

// Environment variable names
const ENV_REDIS_HOST: &str = "PHARMA_INTEL_REDIS_HOST";
const ENV_REDIS_PORT: &str = "PHARMA_INTEL_REDIS_PORT";
const ENV_REDIS_PASSWORD: &str = "PHARMA_INTEL_REDIS_PASSWORD";
const ENV_REDIS_DB: &str = "PHARMA_INTEL_REDIS_DB";
const ENV_CACHE_TTL: &str = "PHARMA_INTEL_CACHE_TTL";

// Default values
const DEFAULT_REDIS_HOST: &str = "127.0.0.1";
const DEFAULT_REDIS_PORT: &str = "6379";
const DEFAULT_REDIS_DB: &str = "0";
const DEFAULT_TTL_SECONDS: u64 = 3600; // 1 hour

// Cache key prefixes
const PREFIX_INTERACTIONS: &str = "interactions:";
const PREFIX_ALTERNATIVES: &str = "alternatives:";

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cache miss for key: {0}")]
    Miss(String),
}

/// Redis-based cache for interaction and alternative-drug lookups
#[derive(Clone)]
pub struct InteractionCache {
    client: Client,
    ttl_seconds: u64,
}

impl InteractionCache {
    /// Create a new cache instance and verify connection
    ///
    /// Configuration via environment variables:
    /// - `PHARMA_INTEL_REDIS_HOST` - Redis host (default: 127.0.0.1)
    /// - `PHARMA_INTEL_REDIS_PORT` - Redis port (default: 6379)
    /// - `PHARMA_INTEL_REDIS_PASSWORD` - Redis password (default: none)
    /// - `PHARMA_INTEL_REDIS_DB` - Redis database number (default: 0)
    /// - `PHARMA_INTEL_CACHE_TTL` - Cache TTL in seconds (default: 3600)
    pub async fn new() -> Result<Self, CacheError> {
        let host = env::var(ENV_REDIS_HOST).unwrap_or_else(|_| DEFAULT_REDIS_HOST.to_string());
        let port = env::var(ENV_REDIS_PORT).unwrap_or_else(|_| DEFAULT_REDIS_PORT.to_string());
        let password = env::var(ENV_REDIS_PASSWORD).ok();
        let db = env::var(ENV_REDIS_DB).unwrap_or_else(|_| DEFAULT_REDIS_DB.to_string());

        let ttl_seconds = env::var(ENV_CACHE_TTL)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TTL_SECONDS);

        // Build Redis URL: redis://[password@]host:port/db
        let redis_url = match password {
            Some(pwd) if !pwd.is_empty() => format!("redis://:{}@{}:{}/{}", pwd, host, port, db),
            _ => format!("redis://{}:{}/{}", host, port, db),
        };

        tracing::debug!(host = %host, port = %port, db = %db, "Connecting to Redis");

        let client = Client::open(redis_url)?;

        // Test the connection by pinging Redis
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        tracing::info!(host = %host, port = %port, "Redis connection established");

        Ok(Self {
            client,
            ttl_seconds,
        })
    }

    /// Stable key for a set of canonical drug ids: corpus generation plus
    /// sha256 of the sorted id list, so the same set of drugs always hits
    /// the same entry regardless of mention order, and entries derived from
    /// a replaced corpus expire with it rather than with the TTL.
    pub fn pair_set_key(generation: u64, ids: &[DrugId]) -> String {
        let mut sorted: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut hasher = Sha256::new();
        for id in sorted {
            hasher.update(id.as_bytes());
            hasher.update(b"\n");
        }
        format!("{}:{:x}", generation, hasher.finalize())
    }

    /// Get cached interaction edges for a drug id set
    pub async fn get_interactions<T: DeserializeOwned>(
        &self,
        key_hash: &str,
    ) -> Result<T, CacheError> {
        self.get_with_prefix(PREFIX_INTERACTIONS, key_hash).await
    }

    /// Cache interaction edges for a drug id set
    pub async fn set_interactions<T: Serialize>(
        &self,
        key_hash: &str,
        data: &T,
    ) -> Result<(), CacheError> {
        self.set_with_prefix(PREFIX_INTERACTIONS, key_hash, data).await
    }

    /// Key for an alternatives lookup: corpus generation, canonical id, and
    /// the result limit.
    pub fn alternatives_key(generation: u64, drug_id: &DrugId, limit: usize) -> String {
        format!("{}:{}:{}", generation, drug_id, limit)
    }

    /// Get cached alternatives by composite key
    pub async fn get_alternatives<T: DeserializeOwned>(&self, key: &str) -> Result<T, CacheError> {
        self.get_with_prefix(PREFIX_ALTERNATIVES, key).await
    }

    /// Cache alternatives by composite key
    pub async fn set_alternatives<T: Serialize>(
        &self,
        key: &str,
        data: &T,
    ) -> Result<(), CacheError> {
        self.set_with_prefix(PREFIX_ALTERNATIVES, key, data).await
    }

    async fn get_with_prefix<T: DeserializeOwned>(
        &self,
        prefix: &str,
        key: &str,
    ) -> Result<T, CacheError> {
        let full_key = format!("{}{}", prefix, key);
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let data: Option<String> = conn.get(&full_key).await?;

        match data {
            Some(json) => {
                serde_json::from_str(&json).map_err(|e| CacheError::Serialization(e.to_string()))
            }
            None => Err(CacheError::Miss(key.to_string())),
        }
    }

    async fn set_with_prefix<T: Serialize>(
        &self,
        prefix: &str,
        key: &str,
        data: &T,
    ) -> Result<(), CacheError> {
        let full_key = format!("{}{}", prefix, key);
        let json =
            serde_json::to_string(data).map_err(|e| CacheError::Serialization(e.to_string()))?;

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(&full_key, json, self.ttl_seconds).await?;

        tracing::debug!(key = %full_key, ttl = self.ttl_seconds, "Cached data");
        Ok(())
    }
}
