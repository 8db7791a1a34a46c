use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use kerntune_ipc::{
    ClientHello, HelloAck, RequestEnvelope, ResponseBody, ResponseEnvelope, WireError, MAX_FRAME,
    PROTOCOL_VERSION,
};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::auth;
use crate::dispatch;
use crate::framing::{read_frame, write_frame};
use crate::state::DaemonState;

/// Bind the daemon socket, replacing a stale one from a previous run.
pub fn bind(path: &Path) -> Result<UnixListener> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed stale socket"),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("removing stale socket {}", path.display()))
        }
    }
    UnixListener::bind(path).with_context(|| format!("binding {}", path.display()))
}

pub async fn run(listener: UnixListener, state: Arc<DaemonState>, shutdown: Arc<Notify>) {
    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, state).await {
                            debug!("connection closed: {err}");
                        }
                    });
                }
                Err(err) => warn!("accept failed: {err}"),
            },
        }
    }
    info!("listener stopped");
}

async fn handle_connection(mut stream: UnixStream, state: Arc<DaemonState>) -> Result<()> {
    let peer = auth::peer_cred(&stream);

    let hello_bytes = read_frame(&mut stream, MAX_FRAME).await?;
    let hello: ClientHello = serde_json::from_slice(&hello_bytes).context("invalid hello")?;
    debug!(
        client = %hello.client_name,
        version = %hello.client_version,
        uid = ?peer.uid,
        "client connected"
    );

    let ack = HelloAck {
        protocol_version: PROTOCOL_VERSION,
        daemon_version: state.version.clone(),
        max_frame: MAX_FRAME,
    };
    write_frame(&mut stream, &serde_json::to_vec(&ack)?, MAX_FRAME).await?;

    if hello.protocol_version != PROTOCOL_VERSION {
        warn!(
            client = hello.protocol_version,
            daemon = PROTOCOL_VERSION,
            "protocol mismatch, dropping connection"
        );
        return Ok(());
    }

    loop {
        let frame = match read_frame(&mut stream, MAX_FRAME).await {
            Ok(frame) => frame,
            Err(err) => {
                debug!("read ended: {err}");
                break;
            }
        };

        let response = match serde_json::from_slice::<RequestEnvelope>(&frame) {
            Ok(envelope) => dispatch::handle_request(&state, envelope, peer).await,
            Err(err) => malformed_request(&frame, err),
        };

        let payload = serde_json::to_vec(&response)?;
        if let Err(err) = write_frame(&mut stream, &payload, MAX_FRAME).await {
            warn!(request_id = response.request_id, "reply write failed: {err}");
            break;
        }
    }

    Ok(())
}

/// A frame that is valid JSON but not a valid request still gets a reply,
/// echoing the request_id when one can be salvaged.
fn malformed_request(frame: &[u8], err: serde_json::Error) -> ResponseEnvelope {
    let request_id = serde_json::from_slice::<serde_json::Value>(frame)
        .ok()
        .and_then(|value| value.get("request_id").and_then(|id| id.as_u64()))
        .unwrap_or(0);
    ResponseEnvelope {
        v: PROTOCOL_VERSION,
        request_id,
        body: ResponseBody::Err(WireError::bad_request(format!("Invalid request: {err}"))),
    }
}
