//! Check-in domain layer between `univent-api` and the `univent` CLI.
//!
//! - **[`CheckInController`]**: One check-in session for one event: camera
//!   and manual input paths, a single in-flight validation, and an explicit
//!   [`reset()`](CheckInController::reset) between attendees. State is
//!   observable through [`ScanSnapshot`] on a `tokio::sync::watch` channel.
//!
//! - **[`SessionContext`]**: The authenticated actor, resolved once and
//!   handed to controllers read-only. [`authorize`] is the client-side
//!   capability check for the check-in station.
//!
//! - **Seams**: [`ScannerBackend`] (capture hardware, with [`LineScanner`]
//!   for line-mode barcode scanners), [`TicketValidator`] (implemented for
//!   `univent_api::ApiClient`), and [`Notifier`] (operator toasts).

pub mod checkin;
pub mod config;
pub mod error;
pub mod notify;
pub mod scanner;
pub mod session;
pub mod validator;

// ── Primary re-exports ──────────────────────────────────────────────
pub use checkin::{
    CameraPermission, CheckInController, CheckInDeps, CheckInOptions, CheckInResult,
    GENERIC_FAILURE_MESSAGE, ReaderStatus, ScanMode, ScanSnapshot, ScanStatus, SubmitOutcome,
};
pub use config::{ApiConfig, AuthCredentials, TlsVerification};
pub use error::CoreError;
pub use notify::{Notice, NoticeLevel, Notifier, TracingNotifier};
pub use scanner::{
    CaptureDevice, LineScanner, ScanConstraints, ScannerBackend, ScannerEvent, ScannerSink,
    Symbology, TICKET_SYMBOLOGIES,
};
pub use session::{Actor, Role, SessionContext, authorize};
pub use validator::{TicketValidator, TicketVerdict};
