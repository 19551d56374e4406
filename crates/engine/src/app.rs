//! Application composition.

use std::sync::Arc;

use crate::infrastructure::{
    clock::SystemClock,
    config::AppConfig,
    game_client::GameClient,
    notifier::{FanoutNotifier, TracingNotifier},
    ports::{ClockPort, NotificationPort, TransportPort},
};
use crate::stores::SessionController;
use crate::use_cases::ScriptEngine;

/// One logged-in session and everything that drives it.
pub struct App {
    pub config: AppConfig,
    pub session: Arc<SessionController>,
    pub scripts: ScriptEngine,
}

impl App {
    /// Wire the real game client and log notifier.
    pub fn new(config: AppConfig) -> Self {
        let transport: Arc<dyn TransportPort> = Arc::new(GameClient::from_config(&config));
        let notifier: Arc<dyn NotificationPort> =
            Arc::new(FanoutNotifier::new().with(Arc::new(TracingNotifier)));
        Self::with_ports(config, transport, notifier, Arc::new(SystemClock::new()))
    }

    /// Wire explicit ports, e.g. a recorded transport or a GUI notifier.
    pub fn with_ports(
        config: AppConfig,
        transport: Arc<dyn TransportPort>,
        notifier: Arc<dyn NotificationPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        let session = Arc::new(SessionController::new(
            transport,
            notifier,
            config.login.initial_state(),
        ));
        let scripts = ScriptEngine::new(session.clone(), clock);
        Self {
            config,
            session,
            scripts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::config::LoginConfig;
    use crate::infrastructure::ports::{
        MockNotificationPort, MockTransportPort, TransportResponse,
    };
    use crate::use_cases::SequenceStatus;
    use chrono::Utc;

    #[test]
    fn session_starts_from_login_config() {
        let config = AppConfig {
            login: LoginConfig {
                character_name: "camper".to_string(),
                adventures: Some(12),
                ..LoginConfig::default()
            },
            ..AppConfig::default()
        };

        let app = App::with_ports(
            config,
            Arc::new(MockTransportPort::new()),
            Arc::new(MockNotificationPort::new()),
            Arc::new(FixedClock(Utc::now())),
        );

        let state = app.session.snapshot();
        assert_eq!(state.name(), "camper");
        assert_eq!(state.adventures_left(), Some(12));
        assert!(!app.scripts.is_running());
    }

    #[tokio::test]
    async fn default_login_can_rest_and_relax() {
        let mut transport = MockTransportPort::new();
        transport
            .expect_send()
            .times(2)
            .returning(|_| Ok(TransportResponse::ok("You sleep. You relax.")));
        let mut notifier = MockNotificationPort::new();
        notifier.expect_notify().return_const(());

        let app = App::with_ports(
            AppConfig::default(),
            Arc::new(transport),
            Arc::new(notifier),
            Arc::new(FixedClock(Utc::now())),
        );

        let relaxed = app.scripts.run_command("relax").await.unwrap();
        let rested = app.scripts.run_command("rest").await.unwrap();

        assert_eq!(relaxed.status, SequenceStatus::Completed);
        assert_eq!(relaxed.dispatched(), 1);
        assert_eq!(rested.status, SequenceStatus::Completed);
        assert_eq!(rested.dispatched(), 1);
    }
}
