//! A real broker-backed `Queue` for the asynchronous deployment mode
//! (spec.md §1: the message broker is an external collaborator, "consumed
//! through a channel abstraction with post/receive"). `redis` is the
//! queueing crate most of the retrieval pack's non-teacher repos reach for
//! (`demml-scouter`, `CortexLM-dataforge`, `dorogao5-Picrete`); the teacher
//! itself needs no broker, so this is net-new, grounded on that pack
//! convention rather than on a teacher file.
//!
//! Each named channel is a Redis list; `post` is `RPUSH`, `receive` is a
//! blocking `BLPOP`, which is exactly spec.md §5's "the queue fans out
//! among multiple consumers at the broker level" — any number of workers
//! can `BLPOP` the same key and each delivered value goes to exactly one.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::{Queue, QueueError};

#[derive(Clone)]
pub struct RedisQueue {
    manager: ConnectionManager,
}

impl RedisQueue {
    /// Opens a connection to `url` (e.g. `redis://127.0.0.1:6379`). Callers
    /// needing the exponential back-off spec.md §4.7/§7 describe should
    /// wrap this in [`crate::open_with_backoff`].
    pub async fn connect(url: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(url)
            .map_err(|e| QueueError::OpenFailed { attempts: 1, message: e.to_string() })?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| QueueError::OpenFailed { attempts: 1, message: e.to_string() })?;
        Ok(RedisQueue { manager })
    }
}

#[async_trait]
impl Queue for RedisQueue {
    async fn post(&self, channel: &str, payload: Vec<u8>) -> Result<(), QueueError> {
        let mut conn = self.manager.clone();
        conn.rpush::<_, _, ()>(channel, payload)
            .await
            .map_err(|e| QueueError::Closed(format!("{channel}: {e}")))
    }

    async fn receive(&self, channel: &str) -> Result<Vec<u8>, QueueError> {
        let mut conn = self.manager.clone();
        // BLPOP with a 0 timeout blocks indefinitely; returns `(key, value)`.
        let (_key, value): (String, Vec<u8>) = conn
            .blpop(channel, 0.0)
            .await
            .map_err(|e| QueueError::Closed(format!("{channel}: {e}")))?;
        Ok(value)
    }
}
