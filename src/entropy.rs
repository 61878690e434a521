//! Random 16-bit values for the join DevNonce

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::NodeError;

/// Draws DevNonce bytes from a cryptographically secure source.
///
/// Production uses the OS generator. There is no fallback: a predictable
/// nonce is worse than no join at all, so a failing source is fatal.
pub struct RandomIdProvider<R: RngCore = OsRng> {
    source: R,
}

impl RandomIdProvider<OsRng> {
    pub fn new() -> Self {
        Self { source: OsRng }
    }
}

impl Default for RandomIdProvider<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore> RandomIdProvider<R> {
    pub fn with_source(source: R) -> Self {
        Self { source }
    }

    /// Return exactly two independent random bytes
    pub fn rand16(&mut self) -> Result<[u8; 2], NodeError> {
        let mut buf = [0u8; 2];
        self.source
            .try_fill_bytes(&mut buf)
            .map_err(|e| NodeError::EntropyUnavailable(e.to_string()))?;
        Ok(buf)
    }
}
