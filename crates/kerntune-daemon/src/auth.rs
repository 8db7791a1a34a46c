use tokio::net::UnixStream;

/// Peer identity for telemetry. Writes to kernel tunables are gated by the
/// socket's filesystem permissions, not per-request checks.
#[derive(Debug, Clone, Copy)]
pub struct PeerCred {
    pub uid: Option<u32>,
}

pub fn peer_cred(stream: &UnixStream) -> PeerCred {
    PeerCred {
        uid: stream.peer_cred().ok().map(|cred| cred.uid()),
    }
}
