//! Redis Backend
//!
//! Remote key-value engine. Payloads live under their own key as plain
//! strings, so the last write wins by construction and other clients can
//! `GET` them directly. An absent or empty string is a miss.
//!
//! Revisions live beside the payloads: a hash from key to revision, fed by
//! one counter. Each write touches payload and revision in a single `EVAL`,
//! so the two never disagree.

use ::redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use async_trait::async_trait;

use super::{BackendResult, CacheBackend, Revision, Stored};

/// Hash mapping each key to the revision of its payload.
const REVISIONS_KEY: &str = "json_cache:revisions";

/// Counter the revisions are drawn from.
const REVISION_COUNTER_KEY: &str = "json_cache:revision";

// KEYS: key, revisions hash, counter. ARGV: payload.
const UPSERT_SCRIPT: &str = r"
redis.call('SET', KEYS[1], ARGV[1])
local revision = redis.call('INCR', KEYS[3])
redis.call('HSET', KEYS[2], KEYS[1], revision)
return revision
";

// KEYS: key, revisions hash.
const FETCH_SCRIPT: &str = r"
return {redis.call('GET', KEYS[1]), redis.call('HGET', KEYS[2], KEYS[1])}
";

// KEYS: key, revisions hash, counter. ARGV: payload, revision.
// The hash entry survives eviction, so an older copy cannot come back.
const FILL_SCRIPT: &str = r"
local revision = tonumber(ARGV[2])
if revision <= tonumber(redis.call('HGET', KEYS[2], KEYS[1]) or '0') then
    return 0
end
redis.call('SET', KEYS[1], ARGV[1])
redis.call('HSET', KEYS[2], KEYS[1], revision)
if tonumber(redis.call('GET', KEYS[3]) or '0') < revision then
    redis.call('SET', KEYS[3], revision)
end
return 1
";

// == Redis Backend ==
/// Cache backend over a Redis client.
///
/// The payload is stored as-is; this backend does not check that it is JSON.
#[derive(Clone)]
pub struct RedisBackend {
    client: Client,
}

impl RedisBackend {
    /// Creates a client for the given URL (e.g. `redis://localhost:6379`).
    ///
    /// Only the URL is checked here; the connection is opened per call.
    pub fn new(url: &str) -> BackendResult<Self> {
        let client = Client::open(url)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> BackendResult<MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &str {
        "redis"
    }

    async fn upsert(&self, key: &str, payload: &str) -> BackendResult<Revision> {
        let mut conn = self.connection().await?;
        let revision = ::redis::cmd("EVAL")
            .arg(UPSERT_SCRIPT)
            .arg(3)
            .arg(key)
            .arg(REVISIONS_KEY)
            .arg(REVISION_COUNTER_KEY)
            .arg(payload)
            .query_async::<Revision>(&mut conn)
            .await?;
        Ok(revision)
    }

    async fn fetch(&self, key: &str) -> BackendResult<Option<Stored>> {
        let mut conn = self.connection().await?;
        let (payload, revision) = ::redis::cmd("EVAL")
            .arg(FETCH_SCRIPT)
            .arg(2)
            .arg(key)
            .arg(REVISIONS_KEY)
            .query_async::<(Option<String>, Option<Revision>)>(&mut conn)
            .await?;

        // Payloads written by other clients have no revision yet
        Ok(payload.filter(|p| !p.is_empty()).map(|payload| Stored {
            payload,
            revision: revision.unwrap_or(0),
        }))
    }

    async fn fill(&self, key: &str, payload: &str, revision: Revision) -> BackendResult<bool> {
        let mut conn = self.connection().await?;
        let landed = ::redis::cmd("EVAL")
            .arg(FILL_SCRIPT)
            .arg(3)
            .arg(key)
            .arg(REVISIONS_KEY)
            .arg(REVISION_COUNTER_KEY)
            .arg(payload)
            .arg(revision)
            .query_async::<i64>(&mut conn)
            .await?;
        Ok(landed == 1)
    }

    async fn evict(&self, key: &str) -> BackendResult<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn ping(&self) -> BackendResult<()> {
        let mut conn = self.connection().await?;
        ::redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await?;
        Ok(())
    }
}
