//! Status LED

use std::time::Duration;
use tracing::debug;

use crate::clock::Clock;

pub trait Indicator: Send + 'static {
    fn configure(&mut self);
    fn set_high(&mut self);
    fn set_low(&mut self);
    fn toggle(&mut self);
}

/// Host LED: level kept in memory, changes logged at debug
#[derive(Debug, Default)]
pub struct LogIndicator {
    lit: bool,
    toggles: u64,
}

impl LogIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

impl Indicator for LogIndicator {
    fn configure(&mut self) {
        debug!("led: configured as output");
    }

    fn set_high(&mut self) {
        self.lit = true;
        debug!("led: on");
    }

    fn set_low(&mut self) {
        self.lit = false;
        debug!("led: off");
    }

    fn toggle(&mut self) {
        self.lit = !self.lit;
        self.toggles += 1;
        debug!("led: {} (toggle #{})", if self.lit { "on" } else { "off" }, self.toggles);
    }
}

/// Configure the LED, flash it `blinks` times, and leave it lit
pub async fn startup_blink<I: Indicator, C: Clock>(
    indicator: &mut I,
    clock: &C,
    blinks: u32,
    period: Duration,
) {
    indicator.configure();
    for _ in 0..blinks {
        indicator.set_high();
        clock.sleep(period / 2).await;
        indicator.set_low();
        clock.sleep(period / 2).await;
    }
    indicator.set_high();
}
