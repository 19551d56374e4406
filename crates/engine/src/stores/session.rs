//! Session controller: the single live character and the dispatch gate.
//!
//! Every action request flows through [`SessionController::dispatch`]. The
//! dispatch gate is held across precondition, transport, classification,
//! state mutation and notification, so two requests can never interleave
//! their deltas. Listeners get read-only snapshots through a watch channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use campbot_domain::{CharacterState, FailureReason, Outcome};
use tokio::sync::{watch, Mutex};

use crate::infrastructure::ports::{
    DisplayState, NotificationPort, TransportPort, TransportRequest,
};
use crate::requests::{ActionExecution, ActionRequest, RequestError, RequestPhase};

/// What happened to one dispatched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub action: &'static str,
    pub outcome: Outcome,
    pub adventures_used: u32,
    pub phase: RequestPhase,
    /// The submission sent over the wire; `None` if nothing was sent
    pub sent: Option<TransportRequest>,
    /// Local precondition that stopped the request before sending
    pub rejection: Option<&'static str>,
}

impl DispatchReport {
    fn from_execution(exec: &ActionExecution, outcome: Outcome, adventures_used: u32) -> Self {
        Self {
            action: exec.action_id(),
            outcome,
            adventures_used,
            phase: exec.phase(),
            sent: exec.sent_request().cloned(),
            rejection: exec.rejection_reason(),
        }
    }

    fn cancelled(action: &'static str) -> Self {
        Self {
            action,
            outcome: Outcome::failure(FailureReason::SessionCancelled),
            adventures_used: 0,
            phase: RequestPhase::Created,
            sent: None,
            rejection: None,
        }
    }

    /// True when a transport round trip actually happened.
    pub fn was_sent(&self) -> bool {
        self.sent.is_some()
    }
}

/// Owns one session's character, cancellation flag and display sink.
pub struct SessionController {
    transport: Arc<dyn TransportPort>,
    notifier: Arc<dyn NotificationPort>,
    character: watch::Sender<CharacterState>,
    dispatch_gate: Mutex<()>,
    cancelled: AtomicBool,
    script_running: AtomicBool,
}

impl SessionController {
    /// Start a session (login) with the character as currently known.
    pub fn new(
        transport: Arc<dyn TransportPort>,
        notifier: Arc<dyn NotificationPort>,
        character: CharacterState,
    ) -> Self {
        tracing::info!(character = character.name(), "Session started");
        let (tx, _rx) = watch::channel(character);
        Self {
            transport,
            notifier,
            character: tx,
            dispatch_gate: Mutex::new(()),
            cancelled: AtomicBool::new(false),
            script_running: AtomicBool::new(false),
        }
    }

    /// The single chokepoint every action request goes through.
    ///
    /// Game-logic failures come back as `Ok` with a failing outcome. `Err`
    /// means the request itself was driven through an illegal lifecycle
    /// transition; only that request is lost.
    pub async fn dispatch(
        &self,
        request: Box<dyn ActionRequest>,
    ) -> Result<DispatchReport, RequestError> {
        let _gate = self.dispatch_gate.lock().await;
        let action = request.action_id();

        if self.is_cancelled() {
            tracing::debug!(action, "Dispatch rejected, session cancelled");
            return Ok(DispatchReport::cancelled(action));
        }

        let mut exec = ActionExecution::new(request);
        let before = self.character.borrow().clone();

        let rejected = exec
            .check_precondition(&before)
            .map_err(|e| self.request_fault(e))?;
        if let Some(outcome) = rejected {
            return Ok(DispatchReport::from_execution(&exec, outcome, 0));
        }

        tracing::debug!(action, "Dispatching");
        let outcome = exec
            .execute(self.transport.as_ref())
            .await
            .map_err(|e| self.request_fault(e))?;

        if exec.phase() == RequestPhase::TransportError {
            self.notify(DisplayState::Error, &exec.request().failure_message());
            return Ok(DispatchReport::from_execution(&exec, outcome, 0));
        }

        // Apply to a copy so the live record changes all at once or not at all
        let mut next = self.character.borrow().clone();
        let applied = exec
            .apply_outcome(&outcome, &mut next)
            .map_err(|e| self.request_fault(e))?;

        if outcome.is_success() {
            self.character.send_replace(next);
        }
        if let Some(message) = &applied.diagnostic {
            self.notify(DisplayState::Error, message);
        }
        if applied.cancel_sequence {
            self.cancel();
        }

        tracing::info!(
            action,
            outcome = %outcome,
            adventures_used = applied.adventures_used,
            "Request complete"
        );
        Ok(DispatchReport::from_execution(
            &exec,
            outcome,
            applied.adventures_used,
        ))
    }

    fn request_fault(&self, error: RequestError) -> RequestError {
        tracing::error!(error = %error, "Request aborted");
        self.notify(DisplayState::Error, &format!("Internal error: {}", error));
        error
    }

    /// Raise the sticky cancellation flag. Idempotent.
    ///
    /// Already-applied mutations stay committed; the flag only stops the
    /// next dispatch from starting.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            tracing::info!("Session cancellation requested");
        }
    }

    /// Clear the flag at the start of a new top-level command.
    pub fn clear_cancellation(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn permits_continue(&self) -> bool {
        !self.is_cancelled()
    }

    /// Forward a message to the display. Never fails the caller.
    ///
    /// While a script runs, anything but an error is shown as disabled.
    pub fn notify(&self, state: DisplayState, message: &str) {
        let state = if self.is_script_running() && state != DisplayState::Error {
            DisplayState::Disabled
        } else {
            state
        };
        self.notifier.notify(state, message);
    }

    pub(crate) fn set_script_running(&self, running: bool) {
        self.script_running.store(running, Ordering::SeqCst);
    }

    pub fn is_script_running(&self) -> bool {
        self.script_running.load(Ordering::SeqCst)
    }

    /// A read-only copy of the live character.
    pub fn snapshot(&self) -> CharacterState {
        self.character.borrow().clone()
    }

    /// Receive a fresh snapshot after every change to the character.
    pub fn subscribe(&self) -> watch::Receiver<CharacterState> {
        self.character.subscribe()
    }

    /// Apply an explicit refresh (for example a status page scrape).
    ///
    /// Takes the dispatch gate, so it never lands between a request's
    /// classification and its application.
    pub async fn refresh_character<F>(&self, refresh: F)
    where
        F: FnOnce(&mut CharacterState),
    {
        let _gate = self.dispatch_gate.lock().await;
        self.character.send_modify(refresh);
    }
}
