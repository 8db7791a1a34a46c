//! Profile operations are owned by the application manager; the daemon only
//! relays them. One request frame goes out, one reply frame comes back, and
//! the reply object is passed through to the caller untouched.

use std::path::Path;

use kerntune_ipc::{ErrorCode, WireError, MAX_FRAME};
use serde_json::{json, Value};
use tokio::net::UnixStream;
use tracing::debug;

const LAUNCH_ID: &str = "com.kerntune.profiles";

pub async fn get_profiles(socket: &Path, returnid: &str) -> Result<Value, WireError> {
    launch(socket, json!({ "type": "get-profiles", "returnid": returnid })).await
}

pub async fn set_profile(socket: &Path, profileid: i64) -> Result<Value, WireError> {
    launch(socket, json!({ "type": "set-profile", "profileid": profileid })).await
}

async fn launch(socket: &Path, params: Value) -> Result<Value, WireError> {
    let payload = json!({ "id": LAUNCH_ID, "params": params });
    debug!(socket = %socket.display(), "relaying to application manager");

    let mut stream = UnixStream::connect(socket).await.map_err(|err| {
        delegate_error(format!("Unable to reach application manager: {err}"))
    })?;

    let bytes = serde_json::to_vec(&payload)
        .map_err(|err| WireError::new(ErrorCode::Internal, err.to_string()))?;
    crate::framing::write_frame(&mut stream, &bytes, MAX_FRAME)
        .await
        .map_err(|err| delegate_error(format!("Application manager request failed: {err}")))?;

    let reply = crate::framing::read_frame(&mut stream, MAX_FRAME)
        .await
        .map_err(|err| delegate_error(format!("Application manager request failed: {err}")))?;
    serde_json::from_slice(&reply)
        .map_err(|err| delegate_error(format!("Invalid application manager reply: {err}")))
}

fn delegate_error(text: String) -> WireError {
    WireError::new(ErrorCode::Delegate, text)
}
