// ── Check-in session ──

mod controller;
mod state;

pub use controller::{CheckInController, CheckInDeps, CheckInOptions};
pub use state::{
    CameraPermission, CheckInResult, GENERIC_FAILURE_MESSAGE, ReaderStatus, RequestId, ScanMode,
    ScanSnapshot, ScanStatus, SubmitOutcome,
};
