//! Self-refreshing polling page back-off (spec.md §4.6, §5: "the in-memory
//! `reportTimestamp` map ... a racy last-write-wins semantic is acceptable
//! since entries are only used as hints"). Shaped like `util::ws::manager::
//! WebSocketManager`'s topic map: an `Arc<RwLock<HashMap<..>>>` guarding
//! process-wide shared state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

const ERROR_THRESHOLD: Duration = Duration::from_secs(10);
const RESET_THRESHOLD: Duration = Duration::from_secs(20);
/// Refresh delay shown on the very first poll for a submission id, before
/// any elapsed-time measurement exists yet.
const INITIAL_DELAY_MS: u64 = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Keep polling; reload after this many milliseconds.
    Waiting(u64),
    /// Past the 10s threshold: show an error page.
    TimedOut,
}

#[derive(Default)]
pub struct ReportBackoff {
    seen: RwLock<HashMap<Uuid, Instant>>,
}

impl ReportBackoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records/consults this submission id's polling history and decides
    /// what to show next (spec.md §4.6 Report retrieval).
    pub async fn poll(&self, submission_id: Uuid) -> PollState {
        let mut seen = self.seen.write().await;
        let now = Instant::now();

        match seen.get(&submission_id).copied() {
            None => {
                seen.insert(submission_id, now);
                PollState::Waiting(INITIAL_DELAY_MS)
            }
            Some(first_seen) => {
                let elapsed = now.duration_since(first_seen);
                if elapsed > RESET_THRESHOLD {
                    seen.insert(submission_id, now);
                    PollState::Waiting(INITIAL_DELAY_MS)
                } else if elapsed > ERROR_THRESHOLD {
                    PollState::TimedOut
                } else {
                    PollState::Waiting(elapsed.as_millis() as u64)
                }
            }
        }
    }

    /// Forgets a submission id once its report is ready, so a second
    /// distinct upload reusing (impossible, but hypothetically) the same id
    /// starts its own fresh cycle.
    pub async fn clear(&self, submission_id: Uuid) {
        self.seen.write().await.remove(&submission_id);
    }
}
