//! Record a voice memo and upload it.
//!
//! Runs the recording screen: the idle view starts a capture, the recording
//! view shows the elapsed time and stops it. On stop the clip is saved
//! locally for replay, then POSTed to the configured server. Supports an
//! external stop trigger via SIGUSR1.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::VmemoConfig;
use crate::recording::{
    CaptureSource, ElapsedTimer, MicCapture, RecordTui, RecordingController, RecordingStore,
    SessionState, UiCommand,
};
use crate::ui::ErrorScreen;
use crate::upload::{UploadClient, UploadOutcome, Uploader};

/// Handles the record command.
///
/// The upload outcome is surfaced after the TUI closes: on success the
/// command exits, printing the server confirmation and the local copy's
/// path; on upload failure it logs the error and returns to the idle view
/// so the user can record again. The local copy survives either way.
pub async fn handle_record() -> Result<(), anyhow::Error> {
    tracing::info!("=== vmemo recorder started ===");

    let config = match VmemoConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            let mut error_screen = ErrorScreen::new()?;
            error_screen.show_error(&format!(
                "Configuration error:\n\n{err}\n\nCheck your ~/.config/vmemo/vmemo.toml and try again."
            ))?;
            error_screen.cleanup()?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz, upload={}{}",
        config.audio.device,
        config.audio.sample_rate,
        config.upload.server,
        config.upload.endpoint
    );

    let capture = MicCapture::new(config.audio.device.clone(), config.audio.sample_rate);
    let mut controller = RecordingController::new(capture);
    let store = RecordingStore::new(&RecordingStore::default_data_dir()?)?;
    let uploader = UploadClient::new(&config.upload.server, &config.upload.endpoint);

    // External stop trigger, useful for scripted recordings
    let stop_signal = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&stop_signal))
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let mut tui = RecordTui::new()?;
    let mut timer: Option<ElapsedTimer> = None;
    let mut uploaded: Option<(UploadOutcome, PathBuf)> = None;

    loop {
        let mut command = tui.handle_input(controller.state())?;

        if stop_signal.swap(false, Ordering::Relaxed)
            && controller.state() == SessionState::Recording
        {
            tracing::info!("Received SIGUSR1: stopping via external trigger");
            command = UiCommand::StopRecording;
        }

        match command {
            UiCommand::Continue => {}
            UiCommand::StartRecording => match controller.start() {
                Ok(()) => {
                    timer = controller.started_at().map(ElapsedTimer::new);
                }
                Err(e) => {
                    tracing::error!("Error accessing microphone: {e}");
                    tui.cleanup().ok();
                    {
                        let mut error_screen = ErrorScreen::new()?;
                        error_screen.show_error(&format!(
                            "Microphone unavailable:\n\n{e}\n\nGrant microphone access or pick another device with 'vmemo list-devices'."
                        ))?;
                        error_screen.cleanup()?;
                    }
                    // Back to the idle view; the user may retry.
                    tui = RecordTui::new()?;
                }
            },
            UiCommand::StopRecording => {
                let result = stop_and_upload(
                    || {
                        if let Some(timer) = timer.as_mut() {
                            timer.freeze();
                        }
                    },
                    &mut controller,
                    &store,
                    &uploader,
                )
                .await?;

                match result {
                    Some(success) => {
                        uploaded = Some(success);
                        break;
                    }
                    None => {
                        timer = None;
                    }
                }
            }
            UiCommand::Quit => {
                if controller.state() == SessionState::Recording {
                    tracing::info!("Recording cancelled; discarding capture");
                    let _ = controller.stop()?;
                }
                break;
            }
        }

        let elapsed = timer.as_ref().map(|t| t.display()).unwrap_or_default();
        tui.render(controller.state(), &elapsed)?;
    }

    tui.cleanup()?;

    if let Some((outcome, audio_path)) = uploaded {
        println!("Recording uploaded (HTTP {}).", outcome.status);
        println!(
            "Local copy: {} (replay with 'vmemo replay')",
            audio_path.display()
        );
    }

    tracing::info!("=== vmemo recorder exited ===");
    Ok(())
}

/// Stop sequence shared by the stop key and the external trigger.
///
/// Ordering: the elapsed display is frozen at the true recording duration
/// first, strictly before the capture is finalized and any payload or
/// upload work begins. The payload is saved locally before the POST so the
/// clip stays replayable when the upload fails.
///
/// Returns the outcome and local path on upload success, `None` when no
/// recording was active or the upload failed (logged, never alerted).
async fn stop_and_upload<S, U>(
    freeze_display: impl FnOnce(),
    controller: &mut RecordingController<S>,
    store: &RecordingStore,
    uploader: &U,
) -> Result<Option<(UploadOutcome, PathBuf)>, anyhow::Error>
where
    S: CaptureSource,
    U: Uploader,
{
    freeze_display();

    let Some(payload) = controller.stop()? else {
        return Ok(None);
    };

    let mut stored = store.save(&payload)?;

    match uploader.upload(&payload).await {
        Ok(outcome) => {
            store.mark_uploaded(&mut stored)?;
            Ok(Some((outcome, stored.audio_path)))
        }
        Err(e) => {
            // Diagnostic only: no alert, no retry. The local copy stays
            // replayable.
            tracing::error!("Error uploading audio: {e}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::capture::CaptureObserver;
    use crate::upload::UploadPayload;
    use anyhow::Result;
    use std::sync::Mutex;
    use std::time::Instant;
    use tempfile::TempDir;

    /// Shared ordered log of the collaborators touched during a stop.
    #[derive(Clone)]
    struct EventLog(Arc<Mutex<Vec<&'static str>>>);

    impl EventLog {
        fn new() -> Self {
            Self(Arc::new(Mutex::new(Vec::new())))
        }

        fn push(&self, event: &'static str) {
            self.0.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().clone()
        }
    }

    struct ScriptedCapture {
        fragments: Vec<Vec<u8>>,
        log: EventLog,
    }

    impl CaptureSource for ScriptedCapture {
        fn start(&mut self) -> Result<()> {
            Ok(())
        }

        fn stop(&mut self, observer: &mut dyn CaptureObserver) -> Result<()> {
            self.log.push("capture_finalized");
            for fragment in self.fragments.drain(..) {
                observer.on_fragment(fragment);
            }
            observer.on_finalized();
            Ok(())
        }
    }

    struct StubUploader {
        log: EventLog,
        sent: Arc<Mutex<Vec<Vec<u8>>>>,
        fail: bool,
    }

    impl StubUploader {
        fn new(log: EventLog, fail: bool) -> Self {
            Self {
                log,
                sent: Arc::new(Mutex::new(Vec::new())),
                fail,
            }
        }
    }

    impl Uploader for StubUploader {
        async fn upload(&self, payload: &UploadPayload) -> Result<UploadOutcome> {
            self.log.push("upload");
            self.sent.lock().unwrap().push(payload.bytes().to_vec());
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(UploadOutcome { status: 200 })
        }
    }

    #[tokio::test]
    async fn display_freezes_before_capture_finalize_and_upload() {
        let log = EventLog::new();
        let dir = TempDir::new().unwrap();
        let store = RecordingStore::new(dir.path()).unwrap();
        let uploader = StubUploader::new(log.clone(), false);

        let mut controller = RecordingController::new(ScriptedCapture {
            fragments: vec![vec![1, 2], vec![3]],
            log: log.clone(),
        });
        controller.start().unwrap();
        let mut timer = ElapsedTimer::new(Instant::now());

        let result = stop_and_upload(
            || {
                log.push("freeze");
                timer.freeze();
            },
            &mut controller,
            &store,
            &uploader,
        )
        .await
        .unwrap();

        // The display must be pinned before any payload or upload work.
        assert!(timer.is_frozen());
        assert_eq!(log.events(), vec!["freeze", "capture_finalized", "upload"]);

        let (outcome, audio_path) = result.unwrap();
        assert_eq!(outcome.status, 200);
        assert!(audio_path.exists());
        assert_eq!(uploader.sent.lock().unwrap()[0], vec![1, 2, 3]);
        assert!(store.all().unwrap()[0].uploaded);
    }

    #[tokio::test]
    async fn idle_stop_neither_saves_nor_uploads() {
        let log = EventLog::new();
        let dir = TempDir::new().unwrap();
        let store = RecordingStore::new(dir.path()).unwrap();
        let uploader = StubUploader::new(log.clone(), false);

        let mut controller = RecordingController::new(ScriptedCapture {
            fragments: vec![vec![9]],
            log: log.clone(),
        });

        let result = stop_and_upload(
            || log.push("freeze"),
            &mut controller,
            &store,
            &uploader,
        )
        .await
        .unwrap();

        assert!(result.is_none());
        // No device signal, no local file, no POST.
        assert_eq!(log.events(), vec!["freeze"]);
        assert!(store.all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_upload_keeps_local_copy_without_success() {
        let log = EventLog::new();
        let dir = TempDir::new().unwrap();
        let store = RecordingStore::new(dir.path()).unwrap();
        let uploader = StubUploader::new(log.clone(), true);

        let mut controller = RecordingController::new(ScriptedCapture {
            fragments: vec![vec![7, 8]],
            log: log.clone(),
        });
        controller.start().unwrap();

        let result = stop_and_upload(
            || log.push("freeze"),
            &mut controller,
            &store,
            &uploader,
        )
        .await
        .unwrap();

        assert!(result.is_none());

        let recordings = store.all().unwrap();
        assert_eq!(recordings.len(), 1);
        assert!(!recordings[0].uploaded);
        assert!(recordings[0].audio_path.exists());
    }
}
