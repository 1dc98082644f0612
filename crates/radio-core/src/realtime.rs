//! Phoenix (Supabase Realtime) presence transport over a WebSocket.
//!
//! One task owns the socket.  `track`/`leave` calls are queued to it over an
//! mpsc channel; presence events come back on the receiver handed out by
//! `join`.  A dropped socket is retried with jittered backoff and reported
//! as `PresenceEvent::Reconnected`.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::presence::{PresenceEvent, PresenceTransport};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
pub(crate) const BACKOFF_START: Duration = Duration::from_secs(1);
pub(crate) const BACKOFF_MAX: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, thiserror::Error)]
pub enum RealtimeError {
    #[error("websocket connect failed: {0}")]
    Connect(String),
    #[error("realtime channel closed")]
    Closed,
}

/// `https://x.supabase.co` → `wss://x.supabase.co/realtime/v1/websocket?...`
pub fn websocket_url(base_url: &str, anon_key: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!("{}/realtime/v1/websocket?apikey={}&vsn=1.0.0", base, anon_key)
}

pub fn join_message(topic: &str, key: &str, access_token: Option<&str>, msg_ref: u64) -> Value {
    let mut payload = json!({
        "config": {
            "broadcast": { "ack": false, "self": false },
            "presence": { "key": key },
            "postgres_changes": []
        }
    });
    if let Some(token) = access_token {
        payload["access_token"] = json!(token);
    }
    json!({
        "topic": topic,
        "event": "phx_join",
        "payload": payload,
        "ref": msg_ref.to_string(),
        "join_ref": msg_ref.to_string(),
    })
}

pub fn track_message(topic: &str, is_listening: bool, msg_ref: u64, join_ref: u64) -> Value {
    json!({
        "topic": topic,
        "event": "presence",
        "payload": {
            "type": "presence",
            "event": "track",
            "payload": { "is_listening": is_listening }
        },
        "ref": msg_ref.to_string(),
        "join_ref": join_ref.to_string(),
    })
}

pub fn leave_message(topic: &str, msg_ref: u64, join_ref: u64) -> Value {
    json!({
        "topic": topic,
        "event": "phx_leave",
        "payload": {},
        "ref": msg_ref.to_string(),
        "join_ref": join_ref.to_string(),
    })
}

pub fn heartbeat_message(msg_ref: u64) -> Value {
    json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": msg_ref.to_string(),
    })
}

/// Decode an inbound frame into a presence event for `topic`, if it is one.
pub fn parse_incoming(topic: &str, text: &str) -> Option<PresenceEvent> {
    let msg: Value = serde_json::from_str(text).ok()?;
    if msg.get("topic").and_then(Value::as_str) != Some(topic) {
        return None;
    }
    let payload = msg.get("payload")?;
    match msg.get("event").and_then(Value::as_str)? {
        "presence_state" => Some(PresenceEvent::from_state_payload(payload)),
        "presence_diff" => Some(PresenceEvent::from_diff_payload(payload)),
        _ => None,
    }
}

pub(crate) fn backoff_with_jitter(current: Duration) -> Duration {
    let jitter = rand::thread_rng().gen_range(0..500u64);
    current + Duration::from_millis(jitter)
}

#[derive(Debug)]
enum Outbound {
    Track(bool),
    Leave,
}

pub struct RealtimePresence {
    ws_url: String,
    topic: String,
    access_token: Option<String>,
    commands: Mutex<Option<mpsc::UnboundedSender<Outbound>>>,
}

impl RealtimePresence {
    pub fn new(base_url: &str, anon_key: &str, channel: &str, access_token: Option<String>) -> Self {
        Self {
            ws_url: websocket_url(base_url, anon_key),
            topic: format!("realtime:{}", channel),
            access_token,
            commands: Mutex::new(None),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    async fn queue(&self, cmd: Outbound) -> Result<(), RealtimeError> {
        let guard = self.commands.lock().await;
        let tx = guard.as_ref().ok_or(RealtimeError::Closed)?;
        tx.send(cmd).map_err(|_| RealtimeError::Closed)
    }
}

#[async_trait]
impl PresenceTransport for RealtimePresence {
    async fn join(&self, key: &str) -> Result<mpsc::Receiver<PresenceEvent>, RealtimeError> {
        let (ws, _) = tokio_tungstenite::connect_async(self.ws_url.as_str())
            .await
            .map_err(|e| RealtimeError::Connect(e.to_string()))?;
        info!("[realtime] connected, joining {}", self.topic);

        let (event_tx, event_rx) = mpsc::channel(64);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        *self.commands.lock().await = Some(cmd_tx);

        let session = ChannelSession {
            ws_url: self.ws_url.clone(),
            topic: self.topic.clone(),
            key: key.to_string(),
            access_token: self.access_token.clone(),
            next_ref: 0,
        };
        tokio::spawn(session.run(ws, cmd_rx, event_tx));
        Ok(event_rx)
    }

    async fn track(&self, is_listening: bool) -> Result<(), RealtimeError> {
        self.queue(Outbound::Track(is_listening)).await
    }

    async fn leave(&self) -> Result<(), RealtimeError> {
        let result = self.queue(Outbound::Leave).await;
        *self.commands.lock().await = None;
        result
    }
}

type Socket =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

enum Exit {
    Left,
    Dropped,
}

struct ChannelSession {
    ws_url: String,
    topic: String,
    key: String,
    access_token: Option<String>,
    next_ref: u64,
}

impl ChannelSession {
    fn bump(&mut self) -> u64 {
        self.next_ref += 1;
        self.next_ref
    }

    async fn run(
        mut self,
        first: Socket,
        mut commands: mpsc::UnboundedReceiver<Outbound>,
        events: mpsc::Sender<PresenceEvent>,
    ) {
        let mut socket = Some(first);
        let mut backoff = BACKOFF_START;
        loop {
            let ws = match socket.take() {
                Some(ws) => ws,
                None => {
                    let wait = backoff_with_jitter(backoff);
                    debug!("[realtime] reconnecting in {:?}", wait);
                    tokio::time::sleep(wait).await;
                    match tokio_tungstenite::connect_async(self.ws_url.as_str()).await {
                        Ok((ws, _)) => {
                            backoff = BACKOFF_START;
                            if events.send(PresenceEvent::Reconnected).await.is_err() {
                                return;
                            }
                            ws
                        }
                        Err(e) => {
                            warn!("[realtime] reconnect failed: {}", e);
                            backoff = (backoff * 2).min(BACKOFF_MAX);
                            continue;
                        }
                    }
                }
            };

            match self.drive(ws, &mut commands, &events).await {
                Exit::Left => {
                    info!("[realtime] left {}", self.topic);
                    return;
                }
                Exit::Dropped => warn!("[realtime] connection to {} dropped", self.topic),
            }
        }
    }

    /// Join on `ws` and pump frames until the socket drops or we leave.
    async fn drive(
        &mut self,
        ws: Socket,
        commands: &mut mpsc::UnboundedReceiver<Outbound>,
        events: &mpsc::Sender<PresenceEvent>,
    ) -> Exit {
        let (mut write, mut read) = ws.split();
        let join_ref = self.bump();
        let join = join_message(&self.topic, &self.key, self.access_token.as_deref(), join_ref);
        if write.send(Message::Text(join.to_string())).await.is_err() {
            return Exit::Dropped;
        }

        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;

        loop {
            tokio::select! {
                frame = read.next() => {
                    let text = match frame {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(_))) | None => return Exit::Dropped,
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            debug!("[realtime] read error: {}", e);
                            return Exit::Dropped;
                        }
                    };
                    if let Some(event) = parse_incoming(&self.topic, &text) {
                        if events.send(event).await.is_err() {
                            return Exit::Left;
                        }
                    }
                }
                _ = heartbeat.tick() => {
                    let hb = heartbeat_message(self.bump());
                    if write.send(Message::Text(hb.to_string())).await.is_err() {
                        return Exit::Dropped;
                    }
                }
                cmd = commands.recv() => {
                    match cmd {
                        Some(Outbound::Track(flag)) => {
                            let msg_ref = self.bump();
                            let msg = track_message(&self.topic, flag, msg_ref, join_ref);
                            if write.send(Message::Text(msg.to_string())).await.is_err() {
                                return Exit::Dropped;
                            }
                        }
                        Some(Outbound::Leave) | None => {
                            let msg_ref = self.bump();
                            let msg = leave_message(&self.topic, msg_ref, join_ref);
                            let _ = write.send(Message::Text(msg.to_string())).await;
                            let _ = write.close().await;
                            return Exit::Left;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_url_scheme() {
        assert_eq!(
            websocket_url("https://abc.supabase.co/", "k"),
            "wss://abc.supabase.co/realtime/v1/websocket?apikey=k&vsn=1.0.0"
        );
        assert!(websocket_url("http://127.0.0.1:54321", "k").starts_with("ws://127.0.0.1:54321/"));
    }

    #[test]
    fn test_join_carries_presence_key() {
        let msg = join_message("realtime:radio", "user-7", Some("tok"), 1);
        assert_eq!(msg["event"], "phx_join");
        assert_eq!(msg["payload"]["config"]["presence"]["key"], "user-7");
        assert_eq!(msg["payload"]["access_token"], "tok");
        assert!(join_message("realtime:radio", "anon-1", None, 1)["payload"]
            .get("access_token")
            .is_none());
    }

    #[test]
    fn test_track_payload() {
        let msg = track_message("realtime:radio", true, 3, 1);
        assert_eq!(msg["payload"]["event"], "track");
        assert_eq!(msg["payload"]["payload"]["is_listening"], true);
        assert_eq!(msg["join_ref"], "1");
    }

    #[test]
    fn test_parse_incoming_filters_topic() {
        let frame = r#"{"topic":"realtime:radio","event":"presence_state","payload":{"a":{"metas":[{"phx_ref":"1","is_listening":true}]}},"ref":null}"#;
        assert!(matches!(
            parse_incoming("realtime:radio", frame),
            Some(PresenceEvent::State(_))
        ));
        assert!(parse_incoming("realtime:other", frame).is_none());
        let reply = r#"{"topic":"phoenix","event":"phx_reply","payload":{"status":"ok"},"ref":"2"}"#;
        assert!(parse_incoming("realtime:radio", reply).is_none());
    }

    #[test]
    fn test_backoff_jitter_bounded() {
        let d = backoff_with_jitter(Duration::from_secs(2));
        assert!(d >= Duration::from_secs(2) && d < Duration::from_millis(2500));
    }

    #[tokio::test]
    async fn test_track_before_join_is_closed() {
        let rt = RealtimePresence::new("http://127.0.0.1:1", "k", "radio", None);
        assert_eq!(rt.topic(), "realtime:radio");
        assert!(matches!(rt.track(true).await, Err(RealtimeError::Closed)));
    }
}
