// Line-mode barcode scanners.
//
// Handheld scanners in keyboard-wedge or USB CDC/serial mode emit each
// decoded symbol as one newline-terminated line on a character device.
// `LineScanner` treats each configured path as a capture device; the
// symbology set is programmed on the scanner itself.
//
// Devices are read through a non-blocking, reactor-registered fd. `stop`
// returns only after the reader task has dropped it, so a restarted reader
// is the sole holder of the device.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::unix::pipe;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::{CaptureDevice, ScanConstraints, ScannerBackend, ScannerEvent, ScannerSink};
use crate::error::CoreError;

struct Running {
    device: String,
    cancel: CancellationToken,
    paused: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Scanner backend reading decoded symbols line by line from device files.
pub struct LineScanner {
    paths: Vec<PathBuf>,
    running: Mutex<Option<Running>>,
}

impl LineScanner {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
            running: Mutex::new(None),
        }
    }

    /// Device currently held by the reader, if any.
    pub async fn active_device(&self) -> Option<String> {
        self.running.lock().await.as_ref().map(|r| r.device.clone())
    }
}

/// Open a scanner device (serial tty or FIFO) for non-blocking reads.
///
/// Regular files cannot be polled and are refused.
fn open_device(device: &str) -> io::Result<pipe::Receiver> {
    let mut options = pipe::OpenOptions::new();
    options.unchecked(true);
    // Holding a write end keeps a FIFO from reporting EOF between writers.
    #[cfg(any(target_os = "linux", target_os = "android"))]
    options.read_write(true);
    options.open_receiver(device)
}

fn device_for(path: &Path) -> CaptureDevice {
    let id = path.display().to_string();
    let label = path
        .file_name()
        .map_or_else(|| id.clone(), |n| n.to_string_lossy().into_owned());
    CaptureDevice { id, label }
}

#[async_trait]
impl ScannerBackend for LineScanner {
    async fn list_devices(&self) -> Result<Vec<CaptureDevice>, CoreError> {
        let mut devices = Vec::new();
        for path in &self.paths {
            match tokio::fs::metadata(path).await {
                Ok(_) => devices.push(device_for(path)),
                Err(e) => debug!(path = %path.display(), error = %e, "scanner device not present"),
            }
        }
        Ok(devices)
    }

    async fn start(&self, constraints: ScanConstraints, sink: ScannerSink) -> Result<(), CoreError> {
        let mut running = self.running.lock().await;
        if let Some(active) = running.as_ref() {
            return Err(CoreError::Scanner {
                message: format!("device {} is already in use", active.device),
            });
        }

        let device = match constraints.device {
            Some(device) => device,
            None => self
                .list_devices()
                .await?
                .into_iter()
                .next()
                .map(|d| d.id)
                .ok_or_else(|| CoreError::CameraUnavailable {
                    reason: "no scanner device present".into(),
                })?,
        };

        let receiver = open_device(&device).map_err(|e| CoreError::Scanner {
            message: format!("cannot open {device}: {e}"),
        })?;
        debug!(%device, symbologies = ?constraints.symbologies, "scanner started");

        let cancel = CancellationToken::new();
        let paused = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(read_lines(
            receiver,
            sink,
            cancel.clone(),
            Arc::clone(&paused),
        ));

        *running = Some(Running {
            device,
            cancel,
            paused,
            task,
        });
        Ok(())
    }

    async fn pause(&self) -> Result<(), CoreError> {
        let running = self.running.lock().await;
        let active = running.as_ref().ok_or_else(|| CoreError::Scanner {
            message: "scanner is not running".into(),
        })?;
        active.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn resume(&self) -> Result<(), CoreError> {
        let running = self.running.lock().await;
        let active = running.as_ref().ok_or_else(|| CoreError::Scanner {
            message: "scanner is not running".into(),
        })?;
        active.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Cancel the reader and wait for it to drop the device.
    async fn stop(&self) -> Result<(), CoreError> {
        let Some(active) = self.running.lock().await.take() else {
            return Ok(());
        };
        active.cancel.cancel();
        if let Err(e) = active.task.await {
            warn!(device = %active.device, error = %e, "scanner reader task failed");
        }
        debug!(device = %active.device, "scanner stopped");
        Ok(())
    }

    async fn clear(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

async fn read_lines(
    receiver: pipe::Receiver,
    sink: ScannerSink,
    cancel: CancellationToken,
    paused: Arc<AtomicBool>,
) {
    let mut lines = BufReader::new(receiver).lines();
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = lines.next_line() => next,
        };

        match next {
            Ok(Some(line)) => {
                let code = line.trim();
                if code.is_empty() {
                    continue;
                }
                if paused.load(Ordering::SeqCst) {
                    trace!("dropping decode while paused");
                    continue;
                }
                if sink.send(ScannerEvent::Decoded(code.to_owned())).is_err() {
                    break;
                }
            }
            Ok(None) => {
                debug!("scanner device reached end of input");
                break;
            }
            Err(e) => {
                warn!(error = %e, "scanner read failed");
                let _ = sink.send(ScannerEvent::Failed(e.to_string()));
                break;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;

    /// A named pipe standing in for a scanner's character device.
    fn fifo(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        let status = std::process::Command::new("mkfifo")
            .arg(&path)
            .status()
            .unwrap();
        assert!(status.success());
        path
    }

    /// Write to the device the way a scanner would. The reader holds the
    /// pipe open, so opening for write does not block.
    fn scan(path: &Path, text: &str) {
        let mut device = std::fs::OpenOptions::new().write(true).open(path).unwrap();
        device.write_all(text.as_bytes()).unwrap();
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<ScannerEvent>) -> Option<ScannerEvent> {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn lists_only_present_devices() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let scanner = LineScanner::new([
            file.path().to_path_buf(),
            PathBuf::from("/nonexistent/ttyACM9"),
        ]);

        let devices = scanner.list_devices().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, file.path().display().to_string());
    }

    #[tokio::test]
    async fn emits_one_event_per_non_empty_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = fifo(&dir, "ttyACM0");
        let scanner = LineScanner::new([path.clone()]);

        let (tx, mut rx) = mpsc::unbounded_channel();
        scanner.start(ScanConstraints::default(), tx).await.unwrap();
        scan(&path, "TICKET-001\n\n  TICKET-002  \n");

        assert_eq!(
            next_event(&mut rx).await,
            Some(ScannerEvent::Decoded("TICKET-001".into()))
        );
        assert_eq!(
            next_event(&mut rx).await,
            Some(ScannerEvent::Decoded("TICKET-002".into()))
        );

        scanner.stop().await.unwrap();
        assert!(scanner.active_device().await.is_none());
    }

    #[tokio::test]
    async fn restarted_reader_receives_the_next_scan() {
        let dir = tempfile::tempdir().unwrap();
        let path = fifo(&dir, "ttyACM0");
        let scanner = LineScanner::new([path.clone()]);

        let (first_tx, mut first_rx) = mpsc::unbounded_channel();
        scanner.start(ScanConstraints::default(), first_tx).await.unwrap();
        scanner.stop().await.unwrap();
        assert_eq!(first_rx.recv().await, None);

        let (tx, mut rx) = mpsc::unbounded_channel();
        scanner.start(ScanConstraints::default(), tx).await.unwrap();
        scan(&path, "TICKET-009\n");

        assert_eq!(
            next_event(&mut rx).await,
            Some(ScannerEvent::Decoded("TICKET-009".into()))
        );
        scanner.stop().await.unwrap();
    }

    #[tokio::test]
    async fn lines_are_dropped_while_paused() {
        let dir = tempfile::tempdir().unwrap();
        let path = fifo(&dir, "ttyACM0");
        let scanner = LineScanner::new([path.clone()]);

        let (tx, mut rx) = mpsc::unbounded_channel();
        scanner.start(ScanConstraints::default(), tx).await.unwrap();
        scanner.pause().await.unwrap();
        scan(&path, "TICKET-001\n");
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());

        scanner.resume().await.unwrap();
        scan(&path, "TICKET-002\n");
        assert_eq!(
            next_event(&mut rx).await,
            Some(ScannerEvent::Decoded("TICKET-002".into()))
        );
        scanner.stop().await.unwrap();
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = fifo(&dir, "ttyACM0");
        let scanner = LineScanner::new([path]);

        let (tx, _rx) = mpsc::unbounded_channel();
        scanner.start(ScanConstraints::default(), tx.clone()).await.unwrap();
        let err = scanner.start(ScanConstraints::default(), tx).await.unwrap_err();
        assert!(matches!(err, CoreError::Scanner { .. }));

        scanner.stop().await.unwrap();
        scanner.stop().await.unwrap();
    }

    #[tokio::test]
    async fn start_without_devices_is_unavailable() {
        let scanner = LineScanner::new([PathBuf::from("/nonexistent/ttyACM9")]);
        let (tx, _rx) = mpsc::unbounded_channel();
        let err = scanner.start(ScanConstraints::default(), tx).await.unwrap_err();
        assert!(matches!(err, CoreError::CameraUnavailable { .. }));
    }

    #[tokio::test]
    async fn pause_requires_running_reader() {
        let scanner = LineScanner::new(Vec::new());
        assert!(scanner.pause().await.is_err());
        assert!(scanner.resume().await.is_err());
    }
}
