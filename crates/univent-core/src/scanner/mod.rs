// ── Scanner seam ──
//
// The check-in controller never talks to capture hardware directly. A
// `ScannerBackend` enumerates devices and, once started, pushes decode
// results into a `ScannerSink`; the controller subscribes to that channel.
// Tests drive the controller by sending synthetic events into the sink.

mod line;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::CoreError;

pub use line::LineScanner;

/// Barcode symbologies the check-in flow asks the decoder for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Symbology {
    Qr,
    Code128,
}

/// Symbologies requested for ticket scanning.
pub const TICKET_SYMBOLOGIES: [Symbology; 2] = [Symbology::Qr, Symbology::Code128];

/// A capture device reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureDevice {
    pub id: String,
    pub label: String,
}

impl fmt::Display for CaptureDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label == self.id {
            f.write_str(&self.id)
        } else {
            write!(f, "{} ({})", self.label, self.id)
        }
    }
}

/// What to start decoding with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConstraints {
    pub symbologies: Vec<Symbology>,
    /// Preferred device; `None` lets the backend pick its first device.
    pub device: Option<String>,
}

impl Default for ScanConstraints {
    fn default() -> Self {
        Self {
            symbologies: TICKET_SYMBOLOGIES.to_vec(),
            device: None,
        }
    }
}

/// Event emitted by a running scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannerEvent {
    /// A frame decoded to this text.
    Decoded(String),
    /// Per-frame decode or read failure. Informational only.
    Failed(String),
}

/// Channel a running backend publishes into.
pub type ScannerSink = mpsc::UnboundedSender<ScannerEvent>;

/// Capture hardware driving the camera path of a check-in session.
///
/// Only one reader holds the device at a time: callers stop a running
/// reader before starting another. `stop` and `clear` must be idempotent.
#[async_trait]
pub trait ScannerBackend: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<CaptureDevice>, CoreError>;

    async fn start(&self, constraints: ScanConstraints, sink: ScannerSink) -> Result<(), CoreError>;

    /// Stop delivering decodes without releasing the device.
    async fn pause(&self) -> Result<(), CoreError>;

    async fn resume(&self) -> Result<(), CoreError>;

    /// Release the device.
    async fn stop(&self) -> Result<(), CoreError>;

    /// Drop any rendering surface associated with the reader.
    async fn clear(&self) -> Result<(), CoreError>;
}
