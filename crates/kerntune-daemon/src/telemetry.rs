use kerntune_ipc::ResponseBody;
use tracing::{info, warn};

use crate::auth::PeerCred;

pub fn log_request(
    request_id: u64,
    method: &str,
    peer: PeerCred,
    duration_ms: u64,
    body: &ResponseBody,
) {
    match body {
        ResponseBody::Ok(_) => {
            info!(request_id, method, uid = ?peer.uid, duration_ms, "request ok");
        }
        ResponseBody::Err(err) => {
            warn!(
                request_id,
                method,
                uid = ?peer.uid,
                duration_ms,
                code = ?err.code,
                error = %err.text,
                "request failed"
            );
        }
    }
}
