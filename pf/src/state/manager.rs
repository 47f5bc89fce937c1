//! StateManager - actor that owns the plan store
//!
//! Processes commands via channels for thread-safe access to persistent
//! state. The store handle is constructed once at startup and injected;
//! nothing reaches for a global.

use planstore::PlanStore;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::domain::DailyPlan;

use super::messages::{PlanEvent, PlanSubscription, StateCommand, StateError, StateResponse};

/// Handle to send commands to the StateManager
#[derive(Clone)]
pub struct StateManager {
    tx: mpsc::Sender<StateCommand>,
}

impl StateManager {
    /// Spawn a new StateManager actor owning the given store
    pub fn spawn(store: impl PlanStore + 'static) -> Self {
        let (tx, rx) = mpsc::channel(64);

        // Broadcast channel for plan change notifications
        let (event_tx, _) = broadcast::channel(16);

        tokio::spawn(actor_loop(Box::new(store), rx, event_tx));
        info!("StateManager spawned");

        Self { tx }
    }

    /// Persist (or clear, with `None`) an account's plan
    pub async fn save_plan(&self, account: &str, plan: Option<DailyPlan>) -> StateResponse<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StateCommand::SavePlan {
                account: account.to_string(),
                plan,
                reply,
            })
            .await
            .map_err(|_| StateError::ChannelError)?;
        rx.await.map_err(|_| StateError::ChannelError)?
    }

    /// Load an account's plan, `None` if absent
    pub async fn load_plan(&self, account: &str) -> StateResponse<Option<DailyPlan>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StateCommand::LoadPlan {
                account: account.to_string(),
                reply,
            })
            .await
            .map_err(|_| StateError::ChannelError)?;
        rx.await.map_err(|_| StateError::ChannelError)?
    }

    /// Clear an account's plan ("start a new day")
    pub async fn reset_plan(&self, account: &str) -> StateResponse<()> {
        self.save_plan(account, None).await
    }

    /// Subscribe to an account's plan changes
    ///
    /// The reply carries the current value; subsequent changes stream
    /// through the subscription until it is dropped.
    pub async fn subscribe(&self, account: &str) -> StateResponse<PlanSubscription> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StateCommand::Subscribe {
                account: account.to_string(),
                reply,
            })
            .await
            .map_err(|_| StateError::ChannelError)?;
        rx.await.map_err(|_| StateError::ChannelError)?
    }

    /// Shut the actor down; in-flight commands are drained first
    pub async fn shutdown(&self) {
        let _ = self.tx.send(StateCommand::Shutdown).await;
    }
}

async fn actor_loop(
    mut store: Box<dyn PlanStore>,
    mut rx: mpsc::Receiver<StateCommand>,
    event_tx: broadcast::Sender<PlanEvent>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            StateCommand::SavePlan { account, plan, reply } => {
                let result = save_plan(store.as_mut(), &account, plan.as_ref());
                if result.is_ok() {
                    // Subscribers get the new snapshot; nobody listening is fine
                    let _ = event_tx.send(PlanEvent {
                        account: account.clone(),
                        plan,
                    });
                }
                let _ = reply.send(result);
            }
            StateCommand::LoadPlan { account, reply } => {
                let _ = reply.send(load_plan(store.as_mut(), &account));
            }
            StateCommand::Subscribe { account, reply } => {
                let result = load_plan(store.as_mut(), &account).map(|current| PlanSubscription {
                    account: account.clone(),
                    current,
                    rx: event_tx.subscribe(),
                });
                let _ = reply.send(result);
            }
            StateCommand::Shutdown => {
                debug!("StateManager actor shutting down");
                break;
            }
        }
    }
}

fn save_plan(store: &mut dyn PlanStore, account: &str, plan: Option<&DailyPlan>) -> StateResponse<()> {
    let doc = plan.map(DailyPlan::to_document);
    store.save(account, doc.as_ref()).map_err(|e| {
        warn!(%account, error = %e, "Failed to save plan");
        StateError::from(e)
    })
}

fn load_plan(store: &mut dyn PlanStore, account: &str) -> StateResponse<Option<DailyPlan>> {
    let doc = store.load(account)?;
    match doc {
        Some(doc) => {
            let plan = DailyPlan::from_document(&doc).map_err(|e| StateError::InvalidPlan(e.to_string()))?;
            Ok(Some(plan))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FinalizedTask;
    use planstore::MemoryStore;

    fn sample_plan() -> DailyPlan {
        DailyPlan::with_date(
            "2025-06-01T08:00:00.000Z",
            vec![FinalizedTask {
                id: "t1".to_string(),
                text: "Practice 20 min".to_string(),
                original_task: "Learn Spanish".to_string(),
            }],
        )
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let state = StateManager::spawn(MemoryStore::new());

        assert_eq!(state.load_plan("alice").await.unwrap(), None);

        state.save_plan("alice", Some(sample_plan())).await.unwrap();
        assert_eq!(state.load_plan("alice").await.unwrap(), Some(sample_plan()));
    }

    #[tokio::test]
    async fn test_reset_clears_plan() {
        let state = StateManager::spawn(MemoryStore::new());

        state.save_plan("alice", Some(sample_plan())).await.unwrap();
        state.reset_plan("alice").await.unwrap();
        assert_eq!(state.load_plan("alice").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_subscribe_delivers_current_immediately() {
        let state = StateManager::spawn(MemoryStore::new());
        state.save_plan("alice", Some(sample_plan())).await.unwrap();

        let sub = state.subscribe("alice").await.unwrap();
        assert_eq!(sub.current, Some(sample_plan()));
    }

    #[tokio::test]
    async fn test_subscribe_streams_changes() {
        let state = StateManager::spawn(MemoryStore::new());

        let mut sub = state.subscribe("alice").await.unwrap();
        assert_eq!(sub.current, None);

        state.save_plan("alice", Some(sample_plan())).await.unwrap();
        assert_eq!(sub.next().await, Some(Some(sample_plan())));

        state.reset_plan("alice").await.unwrap();
        assert_eq!(sub.next().await, Some(None));
    }

    #[tokio::test]
    async fn test_subscribe_filters_other_accounts() {
        let state = StateManager::spawn(MemoryStore::new());

        let mut sub = state.subscribe("alice").await.unwrap();

        // Bob's change must not be delivered to Alice's subscription
        state.save_plan("bob", Some(sample_plan())).await.unwrap();
        state.save_plan("alice", Some(sample_plan())).await.unwrap();

        let delivered = sub.next().await.unwrap();
        assert_eq!(delivered, Some(sample_plan()));
    }

    #[tokio::test]
    async fn test_shutdown_ends_subscriptions() {
        let state = StateManager::spawn(MemoryStore::new());
        let mut sub = state.subscribe("alice").await.unwrap();

        state.shutdown().await;
        assert_eq!(sub.next().await, None);
    }
}
