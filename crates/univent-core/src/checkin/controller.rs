// ── Check-in controller ──
//
// Drives one check-in session: camera (scanner) and manual input paths,
// one validation at a time, explicit reset between attendees. All state
// sits behind a single async mutex; observers follow the published
// `ScanSnapshot` through a watch channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::state::{
    CameraPermission, CheckInResult, ReaderStatus, RequestId, ScanMode, ScanSnapshot, ScanStatus,
    SubmitOutcome,
};
use crate::error::CoreError;
use crate::notify::{Notice, Notifier};
use crate::scanner::{ScanConstraints, ScannerBackend, ScannerEvent, TICKET_SYMBOLOGIES};
use crate::session::{Actor, SessionContext};
use crate::validator::TicketValidator;

/// Verdicts buffered per subscriber before it starts lagging.
const VERDICT_CAPACITY: usize = 64;

// ── Construction inputs ──────────────────────────────────────────

/// External collaborators a session talks to.
#[derive(Clone)]
pub struct CheckInDeps {
    pub scanner: Arc<dyn ScannerBackend>,
    pub validator: Arc<dyn TicketValidator>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Clone, Default)]
pub struct CheckInOptions {
    /// Capture device to start; the backend's first device when unset.
    pub device: Option<String>,
}

// ── Session internals ────────────────────────────────────────────

struct Reader {
    id: u64,
    cancel: CancellationToken,
    paused: bool,
}

struct ScanSession {
    status: ScanStatus,
    mode: ScanMode,
    permission: CameraPermission,
    manual_input: String,
    reader: Option<Reader>,
    readers_started: u64,
    /// Bumped whenever an in-flight answer must no longer land.
    epoch: u64,
    closed: bool,
}

impl ScanSession {
    fn new() -> Self {
        Self {
            status: ScanStatus::Idle,
            mode: ScanMode::Camera,
            permission: CameraPermission::Unknown,
            manual_input: String::new(),
            reader: None,
            readers_started: 0,
            epoch: 0,
            closed: false,
        }
    }

    fn snapshot(&self) -> ScanSnapshot {
        let reader = match &self.reader {
            None => ReaderStatus::Stopped,
            Some(r) if r.paused => ReaderStatus::Paused,
            Some(_) => ReaderStatus::Running,
        };
        ScanSnapshot {
            status: self.status.clone(),
            mode: self.mode,
            permission: self.permission,
            reader,
            manual_input: self.manual_input.clone(),
            closed: self.closed,
        }
    }
}

/// Where a submission came from.
#[derive(Debug, Clone, Copy)]
enum Source {
    Reader(u64),
    Direct,
}

/// A submission admitted into `Processing`.
struct Ticket {
    request: RequestId,
    epoch: u64,
    code: String,
}

enum Admission {
    Admitted(Ticket),
    Rejected(SubmitOutcome),
}

// ── Controller ───────────────────────────────────────────────────

/// Check-in session for one event.
///
/// Cheaply cloneable; clones share the session. Dropping every clone
/// without `close()` leaves the scanner to its own teardown.
#[derive(Clone)]
pub struct CheckInController {
    inner: Arc<Inner>,
}

struct Inner {
    event_id: String,
    actor: Actor,
    device: Option<String>,
    deps: CheckInDeps,
    session: Mutex<ScanSession>,
    snapshot: watch::Sender<ScanSnapshot>,
    verdicts: broadcast::Sender<CheckInResult>,
    requests: AtomicU64,
}

impl CheckInController {
    /// Open a session for `event_id`.
    ///
    /// Fails with `AccessDenied` for actors that may not check attendees
    /// in, and with `MissingEvent` when no event is given. The session
    /// starts `Idle` in camera mode with camera access unresolved.
    pub fn open(
        ctx: &SessionContext,
        event_id: impl Into<String>,
        deps: CheckInDeps,
        options: CheckInOptions,
    ) -> Result<Self, CoreError> {
        ctx.authorize_check_in()?;

        let event_id: String = event_id.into();
        let event_id = event_id.trim();
        if event_id.is_empty() {
            return Err(CoreError::MissingEvent);
        }

        let session = ScanSession::new();
        let (snapshot, _) = watch::channel(session.snapshot());
        let (verdicts, _) = broadcast::channel(VERDICT_CAPACITY);
        info!(event = event_id, actor = %ctx.actor().email, "check-in session opened");

        Ok(Self {
            inner: Arc::new(Inner {
                event_id: event_id.to_owned(),
                actor: ctx.actor().clone(),
                device: options.device,
                deps,
                session: Mutex::new(session),
                snapshot,
                verdicts,
                requests: AtomicU64::new(0),
            }),
        })
    }

    pub fn event_id(&self) -> &str {
        &self.inner.event_id
    }

    pub fn actor(&self) -> &Actor {
        &self.inner.actor
    }

    /// Latest published state.
    pub fn snapshot(&self) -> ScanSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> watch::Receiver<ScanSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Every verdict in order, including one already cleared from the
    /// snapshot by a quick `reset()`. Only verdicts completed after the
    /// call are delivered.
    pub fn verdicts(&self) -> broadcast::Receiver<CheckInResult> {
        self.inner.verdicts.subscribe()
    }

    fn publish(&self, session: &ScanSession) {
        self.inner.snapshot.send_replace(session.snapshot());
    }

    // ── Camera path ──────────────────────────────────────────────

    /// Ask the scanner backend for capture devices.
    ///
    /// At least one device grants access; none, or an enumeration
    /// failure, denies it. Never retried automatically.
    pub async fn request_camera_access(&self) -> CameraPermission {
        let mut session = self.inner.session.lock().await;
        self.resolve_permission(&mut session).await;
        self.publish(&session);
        session.permission
    }

    /// Resolve permission if needed and start the reader.
    ///
    /// Returns whether a reader is running afterwards.
    pub async fn activate_camera(&self) -> Result<bool, CoreError> {
        let mut session = self.inner.session.lock().await;
        ensure_open(&session, "activate the camera")?;
        if session.mode != ScanMode::Camera {
            return Err(invalid("activate the camera", "in manual mode"));
        }
        if session.reader.is_some() {
            return Ok(true);
        }
        if session.status.is_terminal() || session.status.is_processing() {
            return Err(invalid("activate the camera", &session.status.to_string()));
        }

        let running = self.activate_locked(&mut session).await;
        self.publish(&session);
        Ok(running)
    }

    /// Start the reader.
    ///
    /// Requires granted access, camera mode, no reader already holding
    /// the device, and nothing on display. A backend start failure is not
    /// an error: it marks access denied and returns `Ok(false)`.
    pub async fn start_camera_scan(&self) -> Result<bool, CoreError> {
        let mut session = self.inner.session.lock().await;
        ensure_open(&session, "start the camera")?;
        if session.mode != ScanMode::Camera {
            return Err(invalid("start the camera", "in manual mode"));
        }
        if session.permission != CameraPermission::Granted {
            return Err(CoreError::CameraUnavailable {
                reason: format!("camera access is {}", session.permission),
            });
        }
        if session.reader.is_some() {
            return Err(invalid("start the camera", "a reader is already running"));
        }
        if session.status.is_terminal() || session.status.is_processing() {
            return Err(invalid("start the camera", &session.status.to_string()));
        }

        let started = self.start_locked(&mut session).await;
        self.publish(&session);
        Ok(started)
    }

    /// Release the capture device. Safe to call at any time.
    pub async fn stop_camera_scan(&self) {
        let mut session = self.inner.session.lock().await;
        self.stop_locked(&mut session).await;
        if session.mode == ScanMode::Camera && session.status == ScanStatus::Scanning {
            session.status = ScanStatus::Idle;
        }
        self.publish(&session);
    }

    async fn resolve_permission(&self, session: &mut ScanSession) {
        session.permission = match self.inner.deps.scanner.list_devices().await {
            Ok(devices) if !devices.is_empty() => {
                debug!(count = devices.len(), "capture devices available");
                CameraPermission::Granted
            }
            Ok(_) => {
                info!("no capture device available");
                CameraPermission::Denied
            }
            Err(e) => {
                warn!(error = %e, "capture device enumeration failed");
                CameraPermission::Denied
            }
        };
    }

    async fn activate_locked(&self, session: &mut ScanSession) -> bool {
        if session.permission == CameraPermission::Unknown {
            self.resolve_permission(session).await;
        }
        if session.permission == CameraPermission::Granted {
            self.start_locked(session).await
        } else {
            session.status = ScanStatus::Idle;
            false
        }
    }

    async fn start_locked(&self, session: &mut ScanSession) -> bool {
        let (tx, rx) = mpsc::unbounded_channel();
        let constraints = ScanConstraints {
            symbologies: TICKET_SYMBOLOGIES.to_vec(),
            device: self.inner.device.clone(),
        };

        if let Err(e) = self.inner.deps.scanner.start(constraints, tx).await {
            warn!(error = %e, "camera failed to start");
            if let Err(e) = self.inner.deps.scanner.clear().await {
                debug!(error = %e, "scanner clear failed");
            }
            session.permission = CameraPermission::Denied;
            session.status = ScanStatus::Idle;
            return false;
        }

        session.readers_started += 1;
        let id = session.readers_started;
        let cancel = CancellationToken::new();
        tokio::spawn(listen(
            Arc::downgrade(&self.inner),
            id,
            cancel.clone(),
            rx,
        ));
        session.reader = Some(Reader {
            id,
            cancel,
            paused: false,
        });
        session.status = ScanStatus::Scanning;
        info!(reader = id, "camera scanning");
        true
    }

    async fn stop_locked(&self, session: &mut ScanSession) {
        if let Some(reader) = session.reader.take() {
            reader.cancel.cancel();
            debug!(reader = reader.id, "camera reader released");
        }
        if let Err(e) = self.inner.deps.scanner.stop().await {
            warn!(error = %e, "scanner stop failed");
        }
        if let Err(e) = self.inner.deps.scanner.clear().await {
            debug!(error = %e, "scanner clear failed");
        }
    }

    // ── Submission ───────────────────────────────────────────────

    /// Validate `code` against the session's event.
    ///
    /// Never fails: transport problems end in `Error` with the generic
    /// failure message, and refused submissions are reported through the
    /// returned outcome without touching state.
    pub async fn submit_code(&self, code: &str) -> SubmitOutcome {
        match self.admit(code, Source::Direct).await {
            Admission::Admitted(ticket) => self.complete(ticket).await,
            Admission::Rejected(outcome) => outcome,
        }
    }

    /// `submit_code` for typed input. Blank input is ignored.
    pub async fn submit_manual_code(&self, text: &str) -> SubmitOutcome {
        let code = text.trim();
        if code.is_empty() {
            trace!("blank manual input ignored");
            return SubmitOutcome::EmptyInput;
        }
        self.submit_code(code).await
    }

    /// Replace the manual entry buffer.
    pub async fn set_manual_input(&self, text: impl Into<String>) {
        let mut session = self.inner.session.lock().await;
        session.manual_input = text.into();
        self.publish(&session);
    }

    pub async fn manual_input(&self) -> String {
        self.inner.session.lock().await.manual_input.clone()
    }

    /// Submit whatever is in the manual entry buffer.
    pub async fn submit_manual_input(&self) -> SubmitOutcome {
        let text = self.manual_input().await;
        self.submit_manual_code(&text).await
    }

    async fn admit(&self, code: &str, source: Source) -> Admission {
        let mut session = self.inner.session.lock().await;

        if session.closed {
            return Admission::Rejected(SubmitOutcome::Closed);
        }
        if code.is_empty() {
            return Admission::Rejected(SubmitOutcome::EmptyInput);
        }
        match session.status {
            ScanStatus::Processing { .. } => return Admission::Rejected(SubmitOutcome::Busy),
            ScanStatus::Success(_) | ScanStatus::Error(_) => {
                return Admission::Rejected(SubmitOutcome::AwaitingReset);
            }
            ScanStatus::Idle | ScanStatus::Scanning => {}
        }
        if let Source::Reader(id) = source {
            let current = session.reader.as_ref().map(|r| r.id);
            if session.mode != ScanMode::Camera || current != Some(id) {
                return Admission::Rejected(SubmitOutcome::Stale);
            }
        }

        let request = self.inner.requests.fetch_add(1, Ordering::SeqCst) + 1;
        session.status = ScanStatus::Processing { request };

        if let Some(reader) = session.reader.as_mut().filter(|r| !r.paused) {
            match self.inner.deps.scanner.pause().await {
                Ok(()) => reader.paused = true,
                Err(e) => debug!(error = %e, "scanner pause failed"),
            }
        }

        info!(request, ?source, "validating ticket");
        self.publish(&session);
        Admission::Admitted(Ticket {
            request,
            epoch: session.epoch,
            code: code.to_owned(),
        })
    }

    async fn complete(&self, ticket: Ticket) -> SubmitOutcome {
        let result = match self
            .inner
            .deps
            .validator
            .validate(&ticket.code, &self.inner.event_id)
            .await
        {
            Ok(verdict) => CheckInResult::from_verdict(verdict),
            Err(e) => {
                warn!(request = ticket.request, error = %e, "ticket validation failed");
                CheckInResult::failure()
            }
        };

        {
            let mut session = self.inner.session.lock().await;
            let current = session.status == ScanStatus::Processing {
                request: ticket.request,
            };
            if session.closed || session.epoch != ticket.epoch || !current {
                debug!(request = ticket.request, "discarding stale validation result");
                return SubmitOutcome::Stale;
            }

            session.status = if result.valid {
                ScanStatus::Success(result.clone())
            } else {
                ScanStatus::Error(result.clone())
            };
            info!(
                request = ticket.request,
                valid = result.valid,
                subject = result.subject_name.as_deref().unwrap_or(""),
                "ticket verdict"
            );

            let notice = if result.valid {
                Notice::success(&result.message)
            } else {
                Notice::error(&result.message)
            };
            self.inner.deps.notifier.notify(notice);
            let _ = self.inner.verdicts.send(result.clone());
            self.publish(&session);
        }

        SubmitOutcome::Completed(result)
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Clear the displayed verdict and get ready for the next attendee.
    ///
    /// Only valid while a verdict is on display. In camera mode the paused
    /// reader resumes, or a fresh one is started if it cannot.
    pub async fn reset(&self) -> Result<(), CoreError> {
        let mut session = self.inner.session.lock().await;
        ensure_open(&session, "reset")?;
        if !session.status.is_terminal() {
            return Err(invalid("reset", &session.status.to_string()));
        }

        session.status = ScanStatus::Scanning;
        match session.mode {
            ScanMode::Manual => session.manual_input.clear(),
            ScanMode::Camera => {
                let resumed = match session.reader.as_mut() {
                    Some(reader) if reader.paused => {
                        match self.inner.deps.scanner.resume().await {
                            Ok(()) => {
                                reader.paused = false;
                                true
                            }
                            Err(e) => {
                                warn!(error = %e, "scanner resume failed, restarting");
                                false
                            }
                        }
                    }
                    Some(_) => true,
                    None => false,
                };
                if !resumed {
                    self.stop_locked(&mut session).await;
                    self.activate_locked(&mut session).await;
                }
            }
        }

        info!(mode = %session.mode, status = %session.status, "session reset");
        self.publish(&session);
        Ok(())
    }

    /// Change input method.
    ///
    /// Leaving camera mode releases the device before the mode changes.
    /// Any in-flight validation is abandoned. A displayed verdict survives
    /// the switch and still needs `reset()`.
    pub async fn switch_mode(&self, mode: ScanMode) -> Result<(), CoreError> {
        let mut session = self.inner.session.lock().await;
        ensure_open(&session, "switch mode")?;
        if session.mode == mode {
            return Ok(());
        }

        let previous = session.mode;
        if previous == ScanMode::Camera {
            self.stop_locked(&mut session).await;
        }
        session.mode = mode;
        session.epoch += 1;

        if session.status.is_processing() {
            session.status = ScanStatus::Scanning;
        }
        if mode == ScanMode::Camera && !session.status.is_terminal() {
            session.status = ScanStatus::Scanning;
            self.activate_locked(&mut session).await;
        }

        info!(from = %previous, to = %mode, status = %session.status, "input mode switched");
        self.publish(&session);
        Ok(())
    }

    /// Tear the session down: release the device and drop any in-flight
    /// answer. Further operations are refused.
    pub async fn close(&self) {
        let mut session = self.inner.session.lock().await;
        if session.closed {
            return;
        }
        self.stop_locked(&mut session).await;
        session.closed = true;
        session.epoch += 1;
        info!(event = %self.inner.event_id, "check-in session closed");
        self.publish(&session);
    }
}

fn ensure_open(session: &ScanSession, operation: &'static str) -> Result<(), CoreError> {
    if session.closed {
        Err(invalid(operation, "closed"))
    } else {
        Ok(())
    }
}

fn invalid(operation: &'static str, state: &str) -> CoreError {
    CoreError::InvalidState {
        operation,
        state: state.to_owned(),
    }
}

// ── Scanner listener ─────────────────────────────────────────────

/// Forward decodes from one reader into submissions until the reader is
/// cancelled, its sink closes, or the controller goes away.
async fn listen(
    inner: Weak<Inner>,
    reader: u64,
    cancel: CancellationToken,
    mut events: mpsc::UnboundedReceiver<ScannerEvent>,
) {
    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        let Some(inner) = inner.upgrade() else { break };
        match event {
            ScannerEvent::Failed(reason) => trace!(reader, %reason, "frame not decoded"),
            ScannerEvent::Decoded(code) => {
                let controller = CheckInController { inner };
                match controller.admit(code.trim(), Source::Reader(reader)).await {
                    Admission::Admitted(ticket) => {
                        tokio::spawn(async move {
                            controller.complete(ticket).await;
                        });
                    }
                    Admission::Rejected(outcome) => {
                        debug!(reader, ?outcome, "decode not submitted");
                    }
                }
            }
        }
    }
    trace!(reader, "scanner listener finished");
}
