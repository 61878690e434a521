//! Radio interrupt line
//!
//! The handler side only raises a driver-owned event. The driver decides
//! what the interrupt means from its own state.

use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Clone, Default)]
pub struct RadioIrq {
    event: Arc<Notify>,
}

impl RadioIrq {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interrupt handler body (DIO1 / IRQ_Radio_IRQ_Busy)
    pub fn raise(&self) {
        self.event.notify_one();
    }

    /// Wait for the next interrupt. An interrupt raised before the wait
    /// starts is not lost.
    pub async fn wait(&self) {
        self.event.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_raise_before_wait_is_kept() {
        let irq = RadioIrq::new();
        irq.raise();
        tokio::time::timeout(Duration::from_secs(1), irq.wait())
            .await
            .expect("pending interrupt should be delivered");
    }

    #[tokio::test]
    async fn test_raise_from_other_task() {
        let irq = RadioIrq::new();
        let handler = irq.clone();
        tokio::spawn(async move { handler.raise() });
        tokio::time::timeout(Duration::from_secs(1), irq.wait())
            .await
            .expect("interrupt should wake the driver");
    }
}
