//! Listener presence: how many clients are tuned in right now.
//!
//! Each client joins one shared channel under its presence key and tracks a
//! single `{ is_listening }` meta.  The online count is the number of keys
//! with at least one listening meta.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::realtime::{backoff_with_jitter, RealtimeError, BACKOFF_MAX, BACKOFF_START};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PresenceMeta {
    #[serde(default)]
    pub is_listening: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phx_ref: Option<String>,
}

pub type PresenceMap = HashMap<String, Vec<PresenceMeta>>;

#[derive(Debug, Clone, PartialEq)]
pub enum PresenceEvent {
    /// Full snapshot, replaces everything known.
    State(PresenceMap),
    Diff {
        joins: PresenceMap,
        leaves: PresenceMap,
    },
    /// The connection dropped and came back; prior state is stale.
    Reconnected,
}

#[derive(Deserialize)]
struct WireEntry {
    #[serde(default)]
    metas: Vec<PresenceMeta>,
}

fn decode_map(value: &Value) -> PresenceMap {
    let Some(obj) = value.as_object() else {
        return PresenceMap::new();
    };
    obj.iter()
        .filter_map(|(key, entry)| {
            serde_json::from_value::<WireEntry>(entry.clone())
                .ok()
                .map(|e| (key.clone(), e.metas))
        })
        .collect()
}

impl PresenceEvent {
    /// Payload of a `presence_state` message: `{ key: { metas: [..] } }`.
    pub fn from_state_payload(payload: &Value) -> Self {
        Self::State(decode_map(payload))
    }

    /// Payload of a `presence_diff` message: `{ joins: {..}, leaves: {..} }`.
    pub fn from_diff_payload(payload: &Value) -> Self {
        Self::Diff {
            joins: decode_map(&payload["joins"]),
            leaves: decode_map(&payload["leaves"]),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PresenceState {
    entries: PresenceMap,
}

impl PresenceState {
    pub fn apply(&mut self, event: PresenceEvent) {
        match event {
            PresenceEvent::State(map) => self.entries = map,
            PresenceEvent::Diff { joins, leaves } => {
                for (key, metas) in joins {
                    let slot = self.entries.entry(key).or_default();
                    for meta in metas {
                        let dup = meta.phx_ref.is_some()
                            && slot.iter().any(|m| m.phx_ref == meta.phx_ref);
                        if !dup {
                            slot.push(meta);
                        }
                    }
                }
                for (key, metas) in leaves {
                    let Some(slot) = self.entries.get_mut(&key) else {
                        continue;
                    };
                    for meta in metas {
                        match &meta.phx_ref {
                            Some(r) => slot.retain(|m| m.phx_ref.as_ref() != Some(r)),
                            None => {
                                if let Some(i) = slot.iter().position(|m| *m == meta) {
                                    slot.remove(i);
                                }
                            }
                        }
                    }
                    if slot.is_empty() {
                        self.entries.remove(&key);
                    }
                }
            }
            PresenceEvent::Reconnected => self.entries.clear(),
        }
    }

    pub fn online_count(&self) -> usize {
        self.entries
            .values()
            .filter(|metas| metas.iter().any(|m| m.is_listening))
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `user-<id>` when signed in, a fresh `anon-<uuid>` otherwise.
pub fn presence_key(session: Option<&Session>) -> String {
    match session {
        Some(s) => format!("user-{}", s.user.id),
        None => format!("anon-{}", uuid::Uuid::new_v4()),
    }
}

#[async_trait]
pub trait PresenceTransport: Send + Sync {
    /// Join the channel under `key`; events arrive on the returned receiver
    /// until `leave` or the transport gives up.
    async fn join(&self, key: &str) -> Result<mpsc::Receiver<PresenceEvent>, RealtimeError>;
    async fn track(&self, is_listening: bool) -> Result<(), RealtimeError>;
    async fn leave(&self) -> Result<(), RealtimeError>;
}

pub struct PresenceCounter;

impl PresenceCounter {
    /// Run one presence membership until `cancel` fires.  The returned
    /// receiver carries the live online count.
    pub fn spawn(
        transport: Arc<dyn PresenceTransport>,
        key: String,
        mut listening: watch::Receiver<bool>,
        cancel: CancellationToken,
    ) -> watch::Receiver<usize> {
        let (tx, rx) = watch::channel(0usize);
        tokio::spawn(async move {
            let mut backoff = BACKOFF_START;
            let mut events = loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    joined = transport.join(&key) => match joined {
                        Ok(events) => break events,
                        Err(e) => warn!("[presence] join as {} failed: {}", key, e),
                    },
                }
                let wait = backoff_with_jitter(backoff);
                debug!("[presence] retrying join in {:?}", wait);
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(wait) => {}
                }
                backoff = (backoff * 2).min(BACKOFF_MAX);
            };
            info!("[presence] joined as {}", key);

            let mut flag = *listening.borrow_and_update();
            if let Err(e) = transport.track(flag).await {
                warn!("[presence] track failed: {}", e);
            }
            let mut state = PresenceState::default();

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = listening.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        flag = *listening.borrow_and_update();
                        debug!("[presence] is_listening -> {}", flag);
                        if let Err(e) = transport.track(flag).await {
                            warn!("[presence] track failed: {}", e);
                        }
                    }
                    event = events.recv() => {
                        let Some(event) = event else {
                            warn!("[presence] event stream closed");
                            break;
                        };
                        let retrack = matches!(event, PresenceEvent::Reconnected);
                        state.apply(event);
                        tx.send_replace(state.online_count());
                        if retrack {
                            if let Err(e) = transport.track(flag).await {
                                warn!("[presence] re-track after reconnect failed: {}", e);
                            }
                        }
                    }
                }
            }

            if let Err(e) = transport.leave().await {
                debug!("[presence] leave failed: {}", e);
            }
            info!("[presence] left as {}", key);
        });
        rx
    }
}
