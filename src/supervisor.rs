//! Keeps the node joined to the network.
//!
//! Runs as its own task for the whole process lifetime. While disconnected
//! it attempts a join, backing off after every failure; while connected it
//! blinks the status LED and waits. The supervisor is the only writer of
//! the connection state.

use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::{pause, Clock};
use crate::config::Config;
use crate::identity::SessionIdentity;
use crate::indicator::Indicator;
use crate::session::{NetworkSession, SharedSession};
use crate::state::{ConnectionPublisher, ConnectionState};

/// What to do when a joined session stops reporting itself active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionLossPolicy {
    /// Stay Connected; a join is never repeated once it succeeded
    #[default]
    Ignore,
    /// Go back to Disconnected and join again
    Rejoin,
}

#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub join_backoff: Duration,
    pub connected_poll: Duration,
    pub session_loss: SessionLossPolicy,
}

impl SupervisorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            join_backoff: config.timing.join_backoff(),
            connected_poll: config.timing.connected_poll(),
            session_loss: config.node.session_loss,
        }
    }
}

/// Counters reported when the supervisor stops
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorStats {
    pub join_attempts: u64,
    pub connections: u64,
}

pub struct ConnectivitySupervisor<S, I, C> {
    session: SharedSession<S>,
    identity: SessionIdentity,
    indicator: I,
    publisher: ConnectionPublisher,
    clock: C,
    settings: SupervisorSettings,
}

impl<S, I, C> ConnectivitySupervisor<S, I, C>
where
    S: NetworkSession,
    I: Indicator,
    C: Clock,
{
    pub fn new(
        session: SharedSession<S>,
        identity: SessionIdentity,
        indicator: I,
        publisher: ConnectionPublisher,
        clock: C,
        settings: SupervisorSettings,
    ) -> Self {
        Self {
            session,
            identity,
            indicator,
            publisher,
            clock,
            settings,
        }
    }

    /// Supervise until `cancel` fires
    pub async fn run(mut self, cancel: CancellationToken) -> SupervisorStats {
        let mut stats = SupervisorStats::default();
        let mut failed_since_connect = 0u64;

        info!(
            "Supervisor started (backoff {}s, poll {}s, on session loss: {:?})",
            self.settings.join_backoff.as_secs(),
            self.settings.connected_poll.as_secs(),
            self.settings.session_loss
        );

        while !cancel.is_cancelled() {
            if self.publisher.current().is_connected() {
                debug!("LoRaWAN connected");
                self.indicator.toggle();

                if self.settings.session_loss == SessionLossPolicy::Rejoin
                    && !self.session.lock().await.session_active()
                {
                    warn!("LoRaWAN session lost, rejoining");
                    self.publisher.publish(ConnectionState::Disconnected);
                    continue;
                }

                if !pause(&self.clock, self.settings.connected_poll, &cancel).await {
                    break;
                }
                continue;
            }

            self.publisher.publish(ConnectionState::Joining);
            stats.join_attempts += 1;
            info!("LoRaWAN join attempt #{}", stats.join_attempts);

            let result = self.session.lock().await.join(&self.identity).await;
            match result {
                Ok(()) => {
                    self.publisher.publish(ConnectionState::Connected);
                    stats.connections += 1;
                    info!(
                        "LoRaWAN joined after {} failed attempt(s)",
                        failed_since_connect
                    );
                    failed_since_connect = 0;
                }
                Err(e) => {
                    self.publisher.publish(ConnectionState::Disconnected);
                    failed_since_connect += 1;
                    warn!(
                        "Error joining LoRaWAN: {}, retry in {}s",
                        e,
                        self.settings.join_backoff.as_secs()
                    );
                    if !pause(&self.clock, self.settings.join_backoff, &cancel).await {
                        break;
                    }
                }
            }
        }

        info!(
            "Supervisor stopped after {} join attempt(s), {} connection(s)",
            stats.join_attempts, stats.connections
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ProviderProfile;
    use crate::session;
    use crate::testing::{RecordingClock, RecordingIndicator, ScriptedSession};

    fn settings(session_loss: SessionLossPolicy) -> SupervisorSettings {
        SupervisorSettings {
            join_backoff: Duration::from_secs(300),
            connected_poll: Duration::from_secs(3),
            session_loss,
        }
    }

    struct Harness {
        stats: SupervisorStats,
        state: ConnectionState,
        sleeps: Vec<Duration>,
        led: RecordingIndicator,
        join_calls: u32,
    }

    async fn supervise(
        session: ScriptedSession,
        policy: SessionLossPolicy,
        stop_after: usize,
    ) -> Harness {
        let cancel = CancellationToken::new();
        let clock = RecordingClock::new(cancel.clone(), stop_after);
        let led = RecordingIndicator::default();
        let log = session.log();
        let (publisher, rx) = ConnectionPublisher::new();

        let supervisor = ConnectivitySupervisor::new(
            session::shared(session),
            SessionIdentity::new(ProviderProfile::Orange, [0x00, 0x01]),
            led.clone(),
            publisher,
            clock.clone(),
            settings(policy),
        );
        let stats = supervisor.run(cancel).await;
        let join_calls = log.lock().unwrap().join_calls;
        let state = *rx.borrow();

        Harness {
            stats,
            state,
            sleeps: clock.sleeps(),
            led,
            join_calls,
        }
    }

    #[tokio::test]
    async fn test_failing_join_never_connects() {
        let h = supervise(ScriptedSession::never_joins(), SessionLossPolicy::Ignore, 5).await;

        assert_eq!(h.stats.join_attempts, 5);
        assert_eq!(h.stats.connections, 0);
        assert_eq!(h.join_calls, 5);
        assert_eq!(h.state, ConnectionState::Disconnected);
        assert_eq!(h.sleeps, vec![Duration::from_secs(300); 5]);
        assert_eq!(h.led.toggles(), 0);
    }

    #[tokio::test]
    async fn test_connects_once_after_failures() {
        let h = supervise(ScriptedSession::new(2), SessionLossPolicy::Ignore, 6).await;

        assert_eq!(h.stats.join_attempts, 3);
        assert_eq!(h.stats.connections, 1);
        assert_eq!(h.state, ConnectionState::Connected);
        assert_eq!(
            h.sleeps,
            vec![
                Duration::from_secs(300),
                Duration::from_secs(300),
                Duration::from_secs(3),
                Duration::from_secs(3),
                Duration::from_secs(3),
                Duration::from_secs(3),
            ]
        );
        assert_eq!(h.led.toggles(), 4);
    }

    #[tokio::test]
    async fn test_session_loss_ignored_by_default() {
        let session = ScriptedSession::new(0).losing_after_checks(2);
        let h = supervise(session, SessionLossPolicy::Ignore, 4).await;

        assert_eq!(h.stats.join_attempts, 1);
        assert_eq!(h.state, ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_session_loss_triggers_rejoin() {
        let session = ScriptedSession::new(0).losing_after_checks(2);
        let h = supervise(session, SessionLossPolicy::Rejoin, 2).await;

        // join, poll, loss detected, join again, poll
        assert_eq!(h.stats.join_attempts, 2);
        assert_eq!(h.stats.connections, 2);
        assert_eq!(h.sleeps, vec![Duration::from_secs(3); 2]);
        assert_eq!(h.state, ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (publisher, _rx) = ConnectionPublisher::new();
        let supervisor = ConnectivitySupervisor::new(
            session::shared(ScriptedSession::new(0)),
            SessionIdentity::new(ProviderProfile::Ttn, [0x00, 0x02]),
            RecordingIndicator::default(),
            publisher,
            RecordingClock::new(cancel.clone(), usize::MAX),
            settings(SessionLossPolicy::Ignore),
        );

        assert_eq!(supervisor.run(cancel).await, SupervisorStats::default());
    }

    #[test]
    fn test_policy_from_toml() {
        #[derive(Deserialize)]
        struct Doc {
            policy: SessionLossPolicy,
        }
        let doc: Doc = toml::from_str("policy = \"rejoin\"").unwrap();
        assert_eq!(doc.policy, SessionLossPolicy::Rejoin);
    }
}
