//! Script engine: runs command sequences against a session.
//!
//! Sequences run on a background task so the caller stays free to issue
//! single commands. At most one sequence runs at a time, recording and
//! replay exclude each other, and cancellation is polled before every
//! request boundary.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use campbot_domain::FailureReason;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::infrastructure::ports::{ClockPort, DisplayState, TransportRequest};
use crate::stores::{DispatchReport, SessionController};

use super::command::{parse_line, parse_script, ScriptCommand};
use super::error::{MacroError, ScriptError};
use super::macro_log::{load_replay, MacroRecorder};

pub const COMPLETED_MESSAGE: &str = "Script completed successfully.";

/// How a sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStatus {
    Completed,
    Cancelled,
    Failed,
}

impl std::fmt::Display for SequenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SequenceReport {
    pub id: Uuid,
    pub name: String,
    pub status: SequenceStatus,
    /// Every dispatch attempt, in order
    pub steps: Vec<DispatchReport>,
    pub adventures_used: u32,
    /// Why the sequence stopped early, if it did
    pub stopped_because: Option<String>,
}

impl SequenceReport {
    /// Requests that actually reached the transport.
    pub fn dispatched(&self) -> usize {
        self.steps.iter().filter(|s| s.was_sent()).count()
    }
}

/// Join point for a background sequence.
pub struct SequenceHandle {
    id: Uuid,
    session: Arc<SessionController>,
    task: JoinHandle<SequenceReport>,
}

impl SequenceHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Stop the sequence before its next request. The in-flight one finishes.
    pub fn cancel(&self) {
        self.session.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) -> Result<SequenceReport, ScriptError> {
        self.task
            .await
            .map_err(|e| ScriptError::Aborted(e.to_string()))
    }
}

/// Clears the engine's busy flags when a sequence task ends, however it ends.
struct RunningGuard {
    session: Arc<SessionController>,
    running: Arc<AtomicBool>,
    replaying: Option<Arc<AtomicBool>>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.session.set_script_running(false);
        if let Some(replaying) = &self.replaying {
            replaying.store(false, Ordering::SeqCst);
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

type SharedRecorder = Arc<Mutex<Option<MacroRecorder>>>;

pub struct ScriptEngine {
    session: Arc<SessionController>,
    clock: Arc<dyn ClockPort>,
    recorder: SharedRecorder,
    running: Arc<AtomicBool>,
    replaying: Arc<AtomicBool>,
}

impl ScriptEngine {
    pub fn new(session: Arc<SessionController>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            session,
            clock,
            recorder: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            replaying: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session(&self) -> &Arc<SessionController> {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying.load(Ordering::SeqCst)
    }

    pub async fn is_recording(&self) -> bool {
        self.recorder.lock().await.is_some()
    }

    /// Start appending dispatched requests to a macro log.
    pub async fn start_recording(&self, path: &Path) -> Result<(), ScriptError> {
        let mut recorder = self.recorder.lock().await;
        if self.is_replaying() {
            return Err(ScriptError::usage("cannot record while a macro is replaying"));
        }
        if recorder.is_some() {
            return Err(ScriptError::usage("already recording"));
        }
        *recorder = Some(MacroRecorder::create(path, self.clock.clone())?);
        Ok(())
    }

    /// Stop recording. Returns the number of entries written, if recording.
    pub async fn stop_recording(&self) -> Option<u64> {
        let recorder = self.recorder.lock().await.take()?;
        tracing::info!(
            path = %recorder.path().display(),
            entries = recorder.entries_written(),
            "Macro recording stopped"
        );
        Some(recorder.entries_written())
    }

    /// Run one command on the caller, waiting for every repetition.
    pub async fn run_command(&self, text: &str) -> Result<SequenceReport, ScriptError> {
        let command = parse_line(1, text)?
            .ok_or_else(|| ScriptError::usage("empty command"))?;

        // A running sequence owns the cancellation flag
        if !self.is_running() {
            self.session.clear_cancellation();
        }

        let runner = SequenceRunner {
            session: self.session.clone(),
            recorder: self.recorder.clone(),
        };
        Ok(runner.run(Uuid::new_v4(), text.trim().to_string(), vec![command]).await)
    }

    /// Parse a whole script and run it in the background.
    pub fn run_script(&self, name: &str, source: &str) -> Result<SequenceHandle, ScriptError> {
        let commands = parse_script(source)?;
        self.run_sequence(name, commands)
    }

    pub async fn run_script_file(&self, path: &Path) -> Result<SequenceHandle, ScriptError> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ScriptError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.run_script(&name, &source)
    }

    /// Run already-parsed commands on a background task.
    pub fn run_sequence(
        &self,
        name: &str,
        commands: Vec<ScriptCommand>,
    ) -> Result<SequenceHandle, ScriptError> {
        self.spawn(name, commands, None)
    }

    /// Replay a macro log in recorded order on a background task.
    pub async fn replay(&self, path: &Path) -> Result<SequenceHandle, ScriptError> {
        let commands = load_replay(path)?;
        {
            let recorder = self.recorder.lock().await;
            if recorder.is_some() {
                return Err(ScriptError::usage("cannot replay while recording"));
            }
            if self
                .replaying
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return Err(ScriptError::usage("a macro is already replaying"));
            }
        }
        let name = path.display().to_string();
        let spawned = self.spawn(&name, commands, Some(self.replaying.clone()));
        if spawned.is_err() {
            self.replaying.store(false, Ordering::SeqCst);
        }
        spawned
    }

    fn spawn(
        &self,
        name: &str,
        commands: Vec<ScriptCommand>,
        replaying: Option<Arc<AtomicBool>>,
    ) -> Result<SequenceHandle, ScriptError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ScriptError::AlreadyRunning);
        }

        let guard = RunningGuard {
            session: self.session.clone(),
            running: self.running.clone(),
            replaying,
        };
        self.session.clear_cancellation();
        self.session.set_script_running(true);

        let id = Uuid::new_v4();
        let name = name.to_string();
        tracing::info!(sequence_id = %id, name = %name, commands = commands.len(), "Sequence started");

        let runner = SequenceRunner {
            session: self.session.clone(),
            recorder: self.recorder.clone(),
        };
        let task = tokio::spawn(async move {
            let report = runner.run(id, name, commands).await;
            drop(guard);
            runner.announce(&report);
            report
        });

        Ok(SequenceHandle {
            id,
            session: self.session.clone(),
            task,
        })
    }
}

/// The loop shared by foreground commands and background sequences.
struct SequenceRunner {
    session: Arc<SessionController>,
    recorder: SharedRecorder,
}

impl SequenceRunner {
    async fn run(&self, id: Uuid, name: String, commands: Vec<ScriptCommand>) -> SequenceReport {
        let mut report = SequenceReport {
            id,
            name,
            status: SequenceStatus::Completed,
            steps: Vec::new(),
            adventures_used: 0,
            stopped_because: None,
        };

        'commands: for command in &commands {
            for _ in 0..command.count {
                if !self.session.permits_continue() {
                    report.status = SequenceStatus::Cancelled;
                    report.stopped_because =
                        Some(format!("cancelled before line {}", command.line));
                    break 'commands;
                }

                let step = match self.session.dispatch(command.create_request()).await {
                    Ok(step) => step,
                    Err(e) => {
                        report.status = SequenceStatus::Failed;
                        report.stopped_because = Some(format!("line {}: {}", command.line, e));
                        break 'commands;
                    }
                };

                if let Some(sent) = &step.sent {
                    if let Err(e) = self.record(step.action, sent, command.abort_on_failure).await {
                        tracing::error!(sequence_id = %id, error = %e, "Macro recording failed");
                        self.session
                            .notify(DisplayState::Error, &format!("Recording stopped: {}", e));
                        self.recorder.lock().await.take();
                    }
                }

                report.adventures_used += step.adventures_used;
                let failed = step.outcome.is_failure();
                let rejection = step.rejection;
                let cancelled =
                    step.outcome.failure_reason() == Some(&FailureReason::SessionCancelled);
                report.steps.push(step);

                if cancelled {
                    report.status = SequenceStatus::Cancelled;
                    report.stopped_because = Some(format!("cancelled at line {}", command.line));
                    break 'commands;
                }
                if failed {
                    if command.abort_on_failure {
                        report.status = SequenceStatus::Failed;
                        let mut reason =
                            format!("line {}: {} failed", command.line, command.action_id());
                        if let Some(why) = rejection {
                            reason.push_str(&format!(" ({})", why));
                        }
                        report.stopped_because = Some(reason);
                        break 'commands;
                    }
                    // `try`: skip the remaining repetitions of this command
                    continue 'commands;
                }
            }
        }

        tracing::info!(
            sequence_id = %report.id,
            status = %report.status,
            steps = report.steps.len(),
            adventures_used = report.adventures_used,
            "Sequence finished"
        );
        report
    }

    async fn record(
        &self,
        action: &str,
        sent: &TransportRequest,
        abort_on_failure: bool,
    ) -> Result<(), MacroError> {
        match self.recorder.lock().await.as_mut() {
            Some(recorder) => recorder.record(action, sent, abort_on_failure),
            None => Ok(()),
        }
    }

    fn announce(&self, report: &SequenceReport) {
        if report.status == SequenceStatus::Completed && self.session.permits_continue() {
            self.session.notify(DisplayState::Normal, COMPLETED_MESSAGE);
        } else {
            self.session.notify(
                DisplayState::Error,
                &format!("Script {} encountered an error.", report.name),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use campbot_domain::CharacterState;
    use chrono::{TimeZone, Utc};
    use tokio::sync::Semaphore;

    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::notifier::{ChannelNotifier, Notification};
    use crate::infrastructure::ports::{
        MockTransportPort, TransportError, TransportPort, TransportResponse,
    };
    use crate::use_cases::script::read_macro;

    fn character() -> CharacterState {
        CharacterState::new("tester")
            .with_hp(10, 100)
            .with_mp(5, 20)
            .with_adventures(10)
    }

    fn clock() -> Arc<dyn ClockPort> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()))
    }

    fn engine_with(
        transport: Arc<dyn TransportPort>,
    ) -> (ScriptEngine, tokio::sync::mpsc::UnboundedReceiver<Notification>) {
        let (notifier, rx) = ChannelNotifier::new();
        let session = Arc::new(SessionController::new(
            transport,
            Arc::new(notifier),
            character(),
        ));
        (ScriptEngine::new(session, clock()), rx)
    }

    /// Answers every request with a meat gain, one permit per response.
    struct GatedTransport {
        permits: Semaphore,
        calls: AtomicUsize,
    }

    impl GatedTransport {
        fn new(permits: usize) -> Arc<Self> {
            Arc::new(Self {
                permits: Semaphore::new(permits),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TransportPort for GatedTransport {
        async fn send(&self, _request: &TransportRequest) -> Result<TransportResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.permits
                .acquire()
                .await
                .map_err(|e| TransportError::request_failed("campground.php", e.to_string()))?
                .forget();
            Ok(TransportResponse::ok("You gain 10 Meat."))
        }
    }

    async fn wait_for_calls(transport: &GatedTransport, calls: usize) {
        while transport.calls() < calls {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn cancel_mid_sequence_stops_remaining_commands() {
        let transport = GatedTransport::new(2);
        let (engine, _rx) = engine_with(transport.clone());

        let handle = engine
            .run_script("five", "campground\ncampground\ncampground\ncampground\ncampground")
            .unwrap();

        // Third request is in flight when the cancel lands
        wait_for_calls(&transport, 3).await;
        handle.cancel();
        transport.permits.add_permits(1);
        let report = handle.join().await.unwrap();

        assert_eq!(report.status, SequenceStatus::Cancelled);
        assert_eq!(transport.calls(), 3);
        assert_eq!(report.dispatched(), 3);
        assert_eq!(engine.session().snapshot().meat(), 30);
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn request_raised_cancel_stops_sequence_even_under_try() {
        let mut transport = MockTransportPort::new();
        let mut seq = mockall::Sequence::new();
        for body in ["You gain 5 Meat.", "You gain 7 Meat.", "<html>nothing</html>"] {
            transport
                .expect_send()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| Ok(TransportResponse::ok(body)));
        }
        let (engine, mut rx) = engine_with(Arc::new(transport));

        let report = engine
            .run_script("toast", "campground\ncampground\ntry toast\ncampground\nrest")
            .unwrap()
            .join()
            .await
            .unwrap();

        assert_eq!(report.status, SequenceStatus::Cancelled);
        assert_eq!(report.steps.len(), 3);
        assert_eq!(engine.session().snapshot().meat(), 12);

        let mut last = None;
        while let Ok(note) = rx.try_recv() {
            last = Some(note);
        }
        let last = last.unwrap();
        assert_eq!(last.state, DisplayState::Error);
        assert_eq!(last.message, "Script toast encountered an error.");
    }

    #[tokio::test]
    async fn failing_command_aborts_by_default_and_try_continues() {
        let mut transport = MockTransportPort::new();
        transport
            .expect_send()
            .times(2)
            .returning(|_| Err(TransportError::timeout("campground.php")));
        let (engine, _rx) = engine_with(Arc::new(transport));

        let tolerant = engine
            .run_script("tolerant", "try campground 3\ncampground\nrest")
            .unwrap()
            .join()
            .await
            .unwrap();

        assert_eq!(tolerant.status, SequenceStatus::Failed);
        assert_eq!(tolerant.steps.len(), 2);
        assert_eq!(tolerant.adventures_used, 0);
        assert!(tolerant.stopped_because.unwrap().contains("line 2"));
    }

    #[tokio::test]
    async fn completed_sequence_announces_success() {
        let mut transport = MockTransportPort::new();
        transport
            .expect_send()
            .times(3)
            .returning(|_| Ok(TransportResponse::ok("You relax. You sleep.")));
        let (engine, mut rx) = engine_with(Arc::new(transport));

        let report = engine
            .run_script("daily", "rest 2\nrelax")
            .unwrap()
            .join()
            .await
            .unwrap();

        assert_eq!(report.status, SequenceStatus::Completed);
        assert_eq!(report.adventures_used, 3);
        assert_eq!(engine.session().snapshot().adventures_left(), Some(7));
        let note = rx.recv().await.unwrap();
        assert_eq!(note.state, DisplayState::Normal);
        assert_eq!(note.message, COMPLETED_MESSAGE);
        assert!(!engine.session().is_script_running());
    }

    #[tokio::test]
    async fn syntax_error_dispatches_nothing() {
        let mut transport = MockTransportPort::new();
        transport.expect_send().times(0);
        let (engine, _rx) = engine_with(Arc::new(transport));

        let err = engine.run_script("typo", "rest\nresst\n").err().unwrap();

        assert!(matches!(err, ScriptError::Syntax { line: 2, .. }));
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn second_sequence_is_rejected_while_one_runs() {
        let transport = GatedTransport::new(0);
        let (engine, _rx) = engine_with(transport.clone());

        let first = engine.run_script("first", "campground\ncampground").unwrap();
        wait_for_calls(&transport, 1).await;

        let second = engine.run_script("second", "campground");
        assert!(matches!(second, Err(ScriptError::AlreadyRunning)));

        first.cancel();
        transport.permits.add_permits(1);
        first.join().await.unwrap();
        assert!(engine.run_script("third", "").is_ok());
    }

    #[tokio::test]
    async fn foreground_command_clears_cancellation_when_idle() {
        let mut transport = MockTransportPort::new();
        transport
            .expect_send()
            .times(2)
            .returning(|_| Ok(TransportResponse::ok("You sleep.")));
        let (engine, _rx) = engine_with(Arc::new(transport));
        engine.session().cancel();

        let report = engine.run_command("rest 2").await.unwrap();

        assert_eq!(report.status, SequenceStatus::Completed);
        assert_eq!(report.adventures_used, 2);
    }

    #[tokio::test]
    async fn recorded_sequence_replays_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily.jsonl");

        let mut transport = MockTransportPort::new();
        transport
            .expect_send()
            .times(3)
            .returning(|_| Ok(TransportResponse::ok("You sleep. You relax. You acquire an item: <b>toast</b>")));
        let (engine, _rx) = engine_with(Arc::new(transport));

        engine.start_recording(&path).await.unwrap();
        assert!(engine.replay(&path).await.is_err());
        engine
            .run_script("daily", "rest\nrelax\ntoast")
            .unwrap()
            .join()
            .await
            .unwrap();
        assert_eq!(engine.stop_recording().await, Some(3));

        let recorded: Vec<_> = read_macro(&path)
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(recorded, vec!["rest", "relax", "toast"]);

        let mut replay_transport = MockTransportPort::new();
        let mut seq = mockall::Sequence::new();
        for action in ["rest", "relax", "toast"] {
            replay_transport
                .expect_send()
                .withf(move |r| r.field("action") == Some(action))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(TransportResponse::ok("You sleep. You relax. acquire")));
        }
        let (replayer, _rx) = engine_with(Arc::new(replay_transport));

        let report = replayer.replay(&path).await.unwrap().join().await.unwrap();

        assert_eq!(report.status, SequenceStatus::Completed);
        assert_eq!(report.dispatched(), 3);
        assert!(!replayer.is_replaying());
    }

    #[tokio::test]
    async fn replay_keeps_try_policy_of_recorded_steps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tolerant.jsonl");

        fn flaky_then_rest() -> MockTransportPort {
            let mut transport = MockTransportPort::new();
            transport
                .expect_send()
                .withf(|r| r.field("action").is_none())
                .times(1)
                .returning(|_| Ok(TransportResponse::new(500, "busy")));
            transport
                .expect_send()
                .withf(|r| r.field("action") == Some("rest"))
                .times(1)
                .returning(|_| Ok(TransportResponse::ok("You sleep.")));
            transport
        }

        let (engine, _rx) = engine_with(Arc::new(flaky_then_rest()));
        engine.start_recording(&path).await.unwrap();
        let recorded = engine
            .run_script("tolerant", "try campground\nrest")
            .unwrap()
            .join()
            .await
            .unwrap();
        engine.stop_recording().await;

        let (replayer, _rx) = engine_with(Arc::new(flaky_then_rest()));
        let replayed = replayer.replay(&path).await.unwrap().join().await.unwrap();

        assert_eq!(recorded.status, SequenceStatus::Completed);
        assert_eq!(replayed.status, recorded.status);
        assert_eq!(replayed.dispatched(), recorded.dispatched());
        assert_eq!(replayed.dispatched(), 2);
    }

    #[tokio::test]
    async fn fresh_login_reaches_the_server_and_rejections_explain_themselves() {
        let mut transport = MockTransportPort::new();
        transport
            .expect_send()
            .times(2)
            .returning(|_| Ok(TransportResponse::ok("You sleep. You relax.")));
        let (notifier, _rx) = ChannelNotifier::new();
        let session = Arc::new(SessionController::new(
            Arc::new(transport),
            Arc::new(notifier),
            CharacterState::new("fresh"),
        ));
        let engine = ScriptEngine::new(session, clock());

        assert_eq!(engine.run_command("relax").await.unwrap().dispatched(), 1);
        assert_eq!(engine.run_command("rest").await.unwrap().dispatched(), 1);

        engine
            .session()
            .refresh_character(|c| c.set_adventures(0))
            .await;
        let refused = engine.run_command("rest").await.unwrap();
        assert_eq!(refused.status, SequenceStatus::Failed);
        assert_eq!(
            refused.stopped_because.as_deref(),
            Some("line 1: rest failed (no adventures remaining)")
        );
    }

    #[tokio::test]
    async fn cannot_record_while_replaying() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.jsonl");
        {
            let (engine, _rx) = engine_with(GatedTransport::new(1));
            engine.start_recording(&path).await.unwrap();
            engine.run_command("campground").await.unwrap();
            engine.stop_recording().await;
        }

        let transport = GatedTransport::new(0);
        let (engine, _rx) = engine_with(transport.clone());
        let handle = engine.replay(&path).await.unwrap();
        wait_for_calls(&transport, 1).await;

        let err = engine
            .start_recording(&dir.path().join("two.jsonl"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScriptError::Usage(_)));

        transport.permits.add_permits(1);
        handle.join().await.unwrap();
        assert!(engine.start_recording(&dir.path().join("two.jsonl")).await.is_ok());
    }
}
