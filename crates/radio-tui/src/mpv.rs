/// mpv IPC backend for station playback.
///
/// ```text
///   MpvDriver::spawn_and_connect()
///         │
///         ├── writer_task   ← MpvRequest via mpsc, serialised → socket
///         └── reader_task   ← JSON lines from socket
///                                ├── response (has request_id) → matched oneshot::Sender
///                                └── event / property-change   → event_tx channel
///
///   AudioOutput::spawn(handle)
///         └── command_task  ← AudioCommand batches, executed in order
/// ```
///
/// Unix uses a domain socket, Windows a named pipe `\\.\pipe\<name>`.
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use radio_core::playback::AudioCommand;
use radio_core::platform;

#[cfg(unix)]
use tokio::net::UnixStream;

#[cfg(windows)]
use tokio::net::windows::named_pipe::ClientOptions;

static NEXT_REQ_ID: AtomicU64 = AtomicU64::new(1);

/// observe_property ids, matched in property-change events.
pub const OBS_CORE_IDLE: u64 = 1;
pub const OBS_PAUSE: u64 = 2;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<anyhow::Result<Value>>>>>;

struct PendingRequest {
    req_id: u64,
    payload: String,
    reply: oneshot::Sender<anyhow::Result<Value>>,
}

/// An event or property-change that arrived without a request_id.
#[derive(Debug, Clone)]
pub struct MpvEvent {
    pub raw: Value,
}

impl MpvEvent {
    /// `Some((obs_id, data))` for property-change events.
    pub fn as_property_change(&self) -> Option<(u64, &Value)> {
        if self.raw.get("event")?.as_str()? == "property-change" {
            let id = self.raw.get("id")?.as_u64()?;
            let data = self.raw.get("data").unwrap_or(&Value::Null);
            Some((id, data))
        } else {
            None
        }
    }

    pub fn event_name(&self) -> Option<&str> {
        self.raw.get("event")?.as_str()
    }

    /// The stream could not be opened or broke off: `end-file` with
    /// reason `error`.
    pub fn is_playback_error(&self) -> bool {
        self.event_name() == Some("end-file")
            && self.raw.get("reason").and_then(Value::as_str) == Some("error")
    }
}

/// Cloneable handle to the writer task.
#[derive(Clone)]
pub struct MpvHandle {
    tx: mpsc::Sender<PendingRequest>,
}

impl MpvHandle {
    pub async fn send(&self, command: Value) -> anyhow::Result<Value> {
        let req_id = NEXT_REQ_ID.fetch_add(1, Ordering::Relaxed);
        let msg = json!({ "command": command, "request_id": req_id });
        let mut raw = serde_json::to_string(&msg)?;
        raw.push('\n');

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PendingRequest {
                req_id,
                payload: raw,
                reply: reply_tx,
            })
            .await
            .map_err(|_| anyhow::anyhow!("mpv writer task gone"))?;

        tokio::time::timeout(tokio::time::Duration::from_secs(5), reply_rx)
            .await
            .map_err(|_| anyhow::anyhow!("mpv IPC timeout for req={}", req_id))?
            .map_err(|_| anyhow::anyhow!("mpv reply channel dropped req={}", req_id))?
    }

    pub async fn load_stream(&self, url: &str) -> anyhow::Result<()> {
        debug!("mpv: loadfile {}", url);
        self.send(json!(["loadfile", url, "replace"])).await?;
        self.set_pause(false).await
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        self.send(json!(["stop"])).await?;
        Ok(())
    }

    pub async fn set_volume(&self, vol: f32) -> anyhow::Result<()> {
        let vol_pct = (vol * 100.0).clamp(0.0, 100.0);
        self.send(json!(["set_property", "volume", vol_pct])).await?;
        Ok(())
    }

    pub async fn set_pause(&self, paused: bool) -> anyhow::Result<()> {
        self.send(json!(["set_property", "pause", paused])).await?;
        Ok(())
    }

    /// Must be called after every fresh connection.
    pub async fn observe_all_properties(&self) {
        let props = [(OBS_CORE_IDLE, "core-idle"), (OBS_PAUSE, "pause")];
        for (id, name) in &props {
            match self.send(json!(["observe_property", id, name])).await {
                Ok(_) => debug!("mpv: observe_property id={} name={}", id, name),
                Err(e) => warn!("mpv: observe_property {} failed: {}", name, e),
            }
        }
    }

    pub async fn execute(&self, cmd: &AudioCommand) -> anyhow::Result<()> {
        match cmd {
            AudioCommand::Load { url } => self.load_stream(url).await,
            AudioCommand::Pause => self.set_pause(true).await,
            AudioCommand::Resume => self.set_pause(false).await,
            AudioCommand::Stop => self.stop().await,
            AudioCommand::SetVolume(v) => self.set_volume(*v).await,
        }
    }
}

/// Owns the mpv child process.
pub struct MpvDriver {
    pub socket_name: String,
    process: Option<tokio::process::Child>,
    pub initial_volume: f32,
}

impl MpvDriver {
    pub fn new(initial_volume: f32) -> Self {
        Self {
            socket_name: platform::mpv_socket_name(),
            process: None,
            initial_volume,
        }
    }

    pub async fn kill(&mut self) {
        if let Some(mut p) = self.process.take() {
            let _ = p.kill().await;
        }
    }

    fn spawn_process(&mut self) -> anyhow::Result<()> {
        let mpv_binary =
            platform::find_mpv_binary().ok_or_else(|| anyhow::anyhow!("mpv binary not found"))?;

        let vol_arg = format!(
            "--volume={}",
            (self.initial_volume * 100.0).clamp(0.0, 100.0).round() as i64
        );

        let stderr_path = platform::data_dir().join("mpv-stderr.log");
        let stderr_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&stderr_path)?;

        info!("mpv: spawning {:?}, stderr to {:?}", mpv_binary, stderr_path);
        let child = tokio::process::Command::new(&mpv_binary)
            .arg("--no-video")
            .arg("--idle=yes")
            .arg("--quiet")
            .arg(platform::mpv_socket_arg())
            .arg(vol_arg)
            .stdout(std::process::Stdio::null())
            .stderr(stderr_file)
            .kill_on_drop(true)
            .spawn()?;
        info!("mpv: pid {:?}", child.id());
        self.process = Some(child);
        Ok(())
    }

    #[cfg(unix)]
    pub async fn spawn_and_connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.kill().await;

        let socket_path = std::path::PathBuf::from(&self.socket_name);
        let _ = tokio::fs::remove_file(&socket_path).await;

        self.spawn_process()?;

        for _ in 0..50 {
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            if socket_path.exists() {
                break;
            }
        }
        if !socket_path.exists() {
            anyhow::bail!("mpv IPC socket did not appear");
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

        let stream = UnixStream::connect(&socket_path).await?;
        info!("mpv: connected to IPC socket");
        let (read_half, write_half) = stream.into_split();
        Ok(start_io_tasks(read_half, write_half, event_tx))
    }

    #[cfg(windows)]
    pub async fn spawn_and_connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.kill().await;
        self.spawn_process()?;

        let pipe_path = format!(r"\\.\pipe\{}", self.socket_name);
        for _ in 0..50 {
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            if let Ok(client) = ClientOptions::new().open(&pipe_path) {
                info!("mpv: connected to named pipe");
                let (read_half, write_half) = tokio::io::split(client);
                return Ok(start_io_tasks(read_half, write_half, event_tx));
            }
        }
        anyhow::bail!("mpv named pipe did not appear")
    }
}

fn start_io_tasks<R, W>(read_half: R, write_half: W, event_tx: mpsc::Sender<MpvEvent>) -> MpvHandle
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
    W: tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
    let (cmd_tx, cmd_rx) = mpsc::channel::<PendingRequest>(64);

    tokio::spawn(writer_task(write_half, cmd_rx, pending.clone()));
    tokio::spawn(reader_task(BufReader::new(read_half), pending, event_tx));

    MpvHandle { tx: cmd_tx }
}

async fn reader_task<R>(mut reader: BufReader<R>, pending: PendingMap, event_tx: mpsc::Sender<MpvEvent>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("mpv reader: connection closed");
                let mut map = pending.lock().await;
                for (_, tx) in map.drain() {
                    let _ = tx.send(Err(anyhow::anyhow!("mpv IPC connection closed")));
                }
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let val: Value = match serde_json::from_str(trimmed) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!("mpv reader: invalid json '{}': {}", trimmed, e);
                        continue;
                    }
                };

                if let Some(req_id) = val.get("request_id").and_then(|v| v.as_u64()) {
                    let mut map = pending.lock().await;
                    if let Some(tx) = map.remove(&req_id) {
                        let result = if val["error"].as_str() == Some("success") {
                            Ok(val)
                        } else {
                            let err = val["error"].as_str().unwrap_or("unknown error").to_string();
                            debug!("mpv reader: req={} err={}", req_id, err);
                            Err(anyhow::anyhow!("mpv error: {}", err))
                        };
                        let _ = tx.send(result);
                    }
                } else {
                    debug!("mpv reader: event {}", trimmed);
                    if event_tx.send(MpvEvent { raw: val }).await.is_err() {
                        break;
                    }
                }
            }
            Err(e) => {
                warn!("mpv reader: read error: {}", e);
                let mut map = pending.lock().await;
                for (_, tx) in map.drain() {
                    let _ = tx.send(Err(anyhow::anyhow!("mpv IPC read error: {}", e)));
                }
                break;
            }
        }
    }
}

async fn writer_task<W>(mut writer: W, mut rx: mpsc::Receiver<PendingRequest>, pending: PendingMap)
where
    W: tokio::io::AsyncWrite + Unpin,
{
    while let Some(req) = rx.recv().await {
        // Register before writing so the reader can match the reply.
        pending.lock().await.insert(req.req_id, req.reply);
        if let Err(e) = writer.write_all(req.payload.as_bytes()).await {
            warn!("mpv writer: write error: {}", e);
            if let Some(tx) = pending.lock().await.remove(&req.req_id) {
                let _ = tx.send(Err(anyhow::anyhow!("mpv write error: {}", e)));
            }
            break;
        }
    }
    debug!("mpv writer: task exiting");
}

/// Serialises playback transitions onto mpv.  Batches run in the order they
/// were submitted; a failed command is reported and the rest of its batch is
/// dropped.
#[derive(Clone)]
pub struct AudioOutput {
    tx: mpsc::UnboundedSender<Vec<AudioCommand>>,
}

impl AudioOutput {
    pub fn spawn(handle: MpvHandle, failures: mpsc::UnboundedSender<String>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<AudioCommand>>();
        tokio::spawn(async move {
            while let Some(batch) = rx.recv().await {
                for cmd in &batch {
                    if let Err(e) = handle.execute(cmd).await {
                        warn!("mpv: {:?} failed: {}", cmd, e);
                        let _ = failures.send(e.to_string());
                        break;
                    }
                }
            }
            debug!("audio output: task exiting");
        });
        Self { tx }
    }

    pub fn submit(&self, batch: Vec<AudioCommand>) {
        if batch.is_empty() {
            return;
        }
        if self.tx.send(batch).is_err() {
            warn!("audio output: command task gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_file_error_is_playback_error() {
        let ev = MpvEvent {
            raw: json!({ "event": "end-file", "reason": "error", "file_error": "loading failed" }),
        };
        assert!(ev.is_playback_error());

        let ev = MpvEvent {
            raw: json!({ "event": "end-file", "reason": "stop" }),
        };
        assert!(!ev.is_playback_error());
    }

    #[test]
    fn test_property_change_parts() {
        let ev = MpvEvent {
            raw: json!({ "event": "property-change", "id": OBS_PAUSE, "name": "pause", "data": true }),
        };
        let (id, data) = ev.as_property_change().unwrap();
        assert_eq!(id, OBS_PAUSE);
        assert_eq!(data, &json!(true));
        assert_eq!(ev.event_name(), Some("property-change"));
    }

    #[tokio::test]
    async fn test_reader_routes_replies_and_events() {
        let (client, server) = tokio::io::duplex(4096);
        let (event_tx, mut event_rx) = mpsc::channel(8);
        let (read_half, write_half) = tokio::io::split(client);
        let handle = start_io_tasks(read_half, write_half, event_tx);

        // Fake mpv: answer the first request, then push an event.
        tokio::spawn(async move {
            let (srv_read, mut srv_write) = tokio::io::split(server);
            let mut lines = BufReader::new(srv_read).lines();
            if let Ok(Some(line)) = lines.next_line().await {
                let req: Value = serde_json::from_str(&line).unwrap();
                let reply = json!({ "request_id": req["request_id"], "error": "success", "data": null });
                let mut out = reply.to_string();
                out.push('\n');
                out.push_str("{\"event\":\"end-file\",\"reason\":\"error\"}\n");
                srv_write.write_all(out.as_bytes()).await.unwrap();
            }
        });

        handle.execute(&AudioCommand::Stop).await.unwrap();
        let ev = event_rx.recv().await.unwrap();
        assert!(ev.is_playback_error());
    }
}
