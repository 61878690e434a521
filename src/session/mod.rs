//! LoRaWAN session collaborator
//!
//! The MAC layer itself (join crypto, frame counters, MIC) lives behind this
//! trait. The supervisor drives `join`, the scheduler drives `send_uplink`;
//! both reach the session through one `SharedSession`.

pub mod simulated;

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{JoinError, SendError};
use crate::identity::SessionIdentity;

pub trait NetworkSession: Send + 'static {
    /// One join handshake. May take several seconds.
    fn join(
        &mut self,
        identity: &SessionIdentity,
    ) -> impl Future<Output = Result<(), JoinError>> + Send;

    /// Transmit one application payload over the established session
    fn send_uplink(&mut self, payload: &[u8]) -> impl Future<Output = Result<(), SendError>> + Send;

    /// Whether the session is still usable. Sessions that cannot tell
    /// keep the default.
    fn session_active(&self) -> bool {
        true
    }
}

pub type SharedSession<S> = Arc<Mutex<S>>;

pub fn shared<S: NetworkSession>(session: S) -> SharedSession<S> {
    Arc::new(Mutex::new(session))
}
