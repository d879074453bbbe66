use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use solana_sdk::pubkey::Pubkey;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::{
    error::VoteClientError,
    state::{fetch_vote_state, VoteState},
    transport::RpcTransport,
};

/// Floor for the poll interval. A zero interval would make the ticker panic
/// inside the spawned task.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One poll result, tagged with the vote it was read from.
#[derive(Clone, Debug, PartialEq)]
pub struct VoteSnapshot {
    pub vote: Pubkey,
    pub fetched_at: DateTime<Utc>,
    pub state: Result<VoteState, VoteClientError>,
}

/// Handle to a background poller for a single vote. Dropping it stops the
/// poller; watch another vote with a new handle.
pub struct VoteWatch {
    vote: Pubkey,
    receiver: watch::Receiver<Option<VoteSnapshot>>,
    task: JoinHandle<()>,
}

impl VoteWatch {
    /// Starts polling immediately, then every `interval` (at least
    /// [`MIN_POLL_INTERVAL`]). Must be called inside a tokio runtime.
    pub fn spawn<T: RpcTransport + ?Sized + 'static>(
        transport: Arc<T>,
        program_id: Pubkey,
        vote: Pubkey,
        decimals: u8,
        interval: Duration,
    ) -> Self {
        let (sender, receiver) = watch::channel(None);
        let interval = if interval < MIN_POLL_INTERVAL {
            warn!(?interval, min = ?MIN_POLL_INTERVAL, "poll interval too short, using minimum");
            MIN_POLL_INTERVAL
        } else {
            interval
        };

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let state = fetch_vote_state(
                    transport.as_ref(),
                    &program_id,
                    &vote,
                    decimals,
                    Utc::now().timestamp(),
                )
                .await;
                match &state {
                    Ok(state) => debug!(%vote, yes = state.yes_raw, no = state.no_raw, "polled vote"),
                    Err(err) => warn!(%vote, error = %err, "vote poll failed"),
                }

                let snapshot = VoteSnapshot {
                    vote,
                    fetched_at: Utc::now(),
                    state,
                };
                if sender.send(Some(snapshot)).is_err() {
                    break;
                }
            }
        });

        Self { vote, receiver, task }
    }

    pub fn vote(&self) -> &Pubkey {
        &self.vote
    }

    /// Most recent snapshot, `None` before the first poll completes.
    pub fn latest(&self) -> Option<VoteSnapshot> {
        self.receiver.borrow().clone()
    }

    /// Waits for the next snapshot. `None` once the poller has stopped.
    pub async fn changed(&mut self) -> Option<VoteSnapshot> {
        self.receiver.changed().await.ok()?;
        self.receiver.borrow_and_update().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<VoteSnapshot>> {
        self.receiver.clone()
    }

    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for VoteWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}
