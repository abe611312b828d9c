// ── Check-in session state ──
//
// Observable state of one check-in session. The verdict of the last
// validation lives inside the `Success`/`Error` variants, so a result can
// only exist while one is on display.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;

use crate::validator::TicketVerdict;

/// Text shown when a validation could not be completed.
pub const GENERIC_FAILURE_MESSAGE: &str = "Ticket validation failed, please try again";

/// Monotonic identifier of one submission within a controller.
pub type RequestId = u64;

/// Outcome of one validation, as displayed to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckInResult {
    pub valid: bool,
    pub message: String,
    pub subject_name: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl CheckInResult {
    pub fn from_verdict(verdict: TicketVerdict) -> Self {
        Self {
            valid: verdict.valid,
            message: verdict.message,
            subject_name: verdict.subject_name,
            observed_at: Utc::now(),
        }
    }

    /// Result recorded when the backend could not be asked or answered
    /// with something unusable.
    pub fn failure() -> Self {
        Self {
            valid: false,
            message: GENERIC_FAILURE_MESSAGE.to_owned(),
            subject_name: None,
            observed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "result", rename_all = "lowercase")]
pub enum ScanStatus {
    /// Waiting for the camera to be resolved or for a mode choice.
    Idle,
    /// Ready for the next code.
    Scanning,
    /// A validation is in flight.
    Processing {
        #[serde(skip)]
        request: RequestId,
    },
    Success(CheckInResult),
    Error(CheckInResult),
}

impl ScanStatus {
    pub fn last_result(&self) -> Option<&CheckInResult> {
        match self {
            Self::Success(result) | Self::Error(result) => Some(result),
            Self::Idle | Self::Scanning | Self::Processing { .. } => None,
        }
    }

    /// Whether a verdict is on display and `reset()` is required.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Error(_))
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, Self::Processing { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Processing { .. } => "processing",
            Self::Success(_) => "success",
            Self::Error(_) => "error",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Camera,
    Manual,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CameraPermission {
    #[default]
    Unknown,
    Granted,
    Denied,
}

/// Whether the capture device is held, and if so whether it is delivering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReaderStatus {
    Stopped,
    Running,
    Paused,
}

/// Point-in-time copy of a session, published after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanSnapshot {
    pub status: ScanStatus,
    pub mode: ScanMode,
    pub permission: CameraPermission,
    pub reader: ReaderStatus,
    pub manual_input: String,
    pub closed: bool,
}

impl ScanSnapshot {
    pub fn last_result(&self) -> Option<&CheckInResult> {
        self.status.last_result()
    }

    /// Camera mode with no usable device: the operator should be offered
    /// manual entry.
    ///
    /// This is the blocked sub-state of scanning. The status stays `Idle`
    /// while blocked, so `Scanning` always means a reader holds the device.
    pub fn camera_blocked(&self) -> bool {
        self.mode == ScanMode::Camera && self.permission == CameraPermission::Denied
    }
}

/// What happened to one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The backend was asked and the verdict is now on display.
    Completed(CheckInResult),
    /// Another validation is in flight.
    Busy,
    /// A verdict is on display; `reset()` first.
    AwaitingReset,
    /// Nothing to submit.
    EmptyInput,
    /// The session moved on before the answer arrived; it was discarded.
    Stale,
    /// The session has been closed.
    Closed,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn only_terminal_states_carry_a_result() {
        assert!(ScanStatus::Idle.last_result().is_none());
        assert!(ScanStatus::Processing { request: 1 }.last_result().is_none());

        let failed = ScanStatus::Error(CheckInResult::failure());
        assert!(failed.is_terminal());
        assert_eq!(
            failed.last_result().map(|r| r.message.as_str()),
            Some(GENERIC_FAILURE_MESSAGE)
        );
    }

    #[test]
    fn verdict_maps_verbatim() {
        let result = CheckInResult::from_verdict(TicketVerdict {
            valid: true,
            message: "Acces permis".into(),
            subject_name: Some("Ana Pop".into()),
        });
        assert!(result.valid);
        assert_eq!(result.message, "Acces permis");
        assert_eq!(result.subject_name.as_deref(), Some("Ana Pop"));
    }

    #[test]
    fn status_serializes_with_state_tag() {
        let value = serde_json::to_value(ScanStatus::Scanning).unwrap_or_default();
        assert_eq!(value, json!({ "state": "scanning" }));
        let value = serde_json::to_value(ScanStatus::Processing { request: 3 }).unwrap_or_default();
        assert_eq!(value["state"], "processing");
        assert_eq!(ScanStatus::Scanning.to_string(), "scanning");
    }
}
