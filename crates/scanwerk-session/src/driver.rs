// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Async driver for one capture cycle.
//
// Runs the effects the state machine asks for: permission prompts and camera
// launches go through the platform bridge and are awaited on single-shot
// channels; decode and detection run on a blocking worker. The driver task
// itself never blocks.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use scanwerk_bridge::traits::PlatformBridge;
use scanwerk_core::classify::ClassifiedRecord;
use scanwerk_core::config::ScannerConfig;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::{
    CaptureCompletion, CaptureOutcome, CaptureRequest, ImageReference, Phase, RequestId,
};
use scanwerk_detect::Detector;
use scanwerk_image::{FileSource, ImageSource};
use tokio::sync::oneshot;
use tracing::{info, instrument, warn};

use crate::machine::{CaptureSession, Effect};
use crate::persist::SavedSession;
use crate::pipeline::ScanPipeline;

/// Aborts an outstanding capture wait, e.g. when the user navigates away.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    slot: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl CancelHandle {
    /// Cancel the capture currently being awaited. Returns `false` if no
    /// capture was outstanding.
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    fn arm(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        *self.lock() = Some(tx);
        rx
    }

    fn disarm(&self) {
        self.lock().take();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<oneshot::Sender<()>>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A capture session wired to a bridge and a scan pipeline.
pub struct Scanner<D, S = FileSource> {
    bridge: Arc<dyn PlatformBridge>,
    pipeline: Arc<ScanPipeline<D, S>>,
    session: CaptureSession,
    cancel: CancelHandle,
    last_records: Vec<ClassifiedRecord>,
}

impl<D, S> Scanner<D, S>
where
    D: Detector + 'static,
    S: ImageSource + Send + Sync + 'static,
{
    pub fn new(
        bridge: Arc<dyn PlatformBridge>,
        pipeline: ScanPipeline<D, S>,
        config: &ScannerConfig,
        capture_target: ImageReference,
    ) -> Self {
        let session = CaptureSession::new(config, capture_target, pipeline.detector_operational());
        Self::with_session(bridge, pipeline, session)
    }

    /// Rebuild from a suspended snapshot without re-running anything.
    pub fn resume(
        bridge: Arc<dyn PlatformBridge>,
        pipeline: ScanPipeline<D, S>,
        config: &ScannerConfig,
        capture_target: ImageReference,
        saved: SavedSession,
    ) -> Self {
        let session = CaptureSession::resume(
            config,
            capture_target,
            pipeline.detector_operational(),
            saved,
        );
        Self::with_session(bridge, pipeline, session)
    }

    fn with_session(
        bridge: Arc<dyn PlatformBridge>,
        pipeline: ScanPipeline<D, S>,
        session: CaptureSession,
    ) -> Self {
        Self {
            bridge,
            pipeline: Arc::new(pipeline),
            session,
            cancel: CancelHandle::default(),
            last_records: Vec::new(),
        }
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Records classified by the most recent successful decode.
    pub fn last_records(&self) -> &[ClassifiedRecord] {
        &self.last_records
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn suspend(&self) -> SavedSession {
        self.session.suspend()
    }

    pub fn reset(&mut self) -> Result<()> {
        self.last_records.clear();
        self.session.reset().map(|_| ())
    }

    /// Run one capture cycle to completion and return the phase it ended in.
    ///
    /// User-level outcomes (denial, cancellation, unreadable photo, nothing
    /// found) end the cycle normally. Errors are reserved for requests the
    /// session cannot accept and for a bridge that loses a reply.
    #[instrument(skip(self), fields(platform = self.bridge.platform_name()))]
    pub async fn run_cycle(&mut self) -> Result<Phase> {
        self.session
            .set_detector_operational(self.pipeline.detector_operational());
        let mut queue: VecDeque<Effect> = self.session.request_capture()?.into();

        while let Some(effect) = queue.pop_front() {
            let next = match effect {
                Effect::RequestPermission => self.ask_permission().await?,
                Effect::LaunchCapture(request) => self.await_capture(request).await?,
                Effect::Decode(reference) => self.decode(reference).await?,
                Effect::Notify(notice) => {
                    self.bridge.notify(notice);
                    Vec::new()
                }
            };
            queue.extend(next);
        }

        let phase = self.session.phase();
        info!(%phase, result = self.session.result_text(), "capture cycle finished");
        Ok(phase)
    }

    async fn ask_permission(&mut self) -> Result<Vec<Effect>> {
        let (tx, rx) = oneshot::channel();
        self.bridge.request_capture_permission(tx);
        let outcome = match rx.await {
            Ok(outcome) => outcome,
            Err(_) => {
                self.session.cancel_capture()?;
                return Err(ScanwerkError::Bridge("permission prompt never answered".into()));
            }
        };

        let mut effects = self.session.permission_result(outcome)?;
        if self.session.phase() == Phase::PermissionGranted {
            effects.extend(self.session.launch_external_capture()?);
        }
        Ok(effects)
    }

    async fn await_capture(&mut self, request: CaptureRequest) -> Result<Vec<Effect>> {
        let id: RequestId = request.id;
        let (tx, rx) = oneshot::channel();
        let cancelled = self.cancel.arm();

        if let Err(e) = self.bridge.launch_capture(request, tx) {
            self.cancel.disarm();
            warn!(error = %e, "camera could not be launched");
            return self.session.capture_returned(CaptureCompletion {
                id,
                outcome: CaptureOutcome::Failed(e.to_string()),
            });
        }

        let completion = tokio::select! {
            reply = rx => Some(reply.unwrap_or_else(|_| CaptureCompletion {
                id,
                outcome: CaptureOutcome::Failed("camera dropped the request".into()),
            })),
            _ = cancelled => None,
        };
        self.cancel.disarm();

        match completion {
            Some(completion) => self.session.capture_returned(completion),
            None => self.session.cancel_capture(),
        }
    }

    async fn decode(&mut self, reference: ImageReference) -> Result<Vec<Effect>> {
        self.session.begin_decode()?;
        let pipeline = Arc::clone(&self.pipeline);
        let result = tokio::task::spawn_blocking(move || pipeline.scan(&reference))
            .await
            .unwrap_or_else(|e| Err(ScanwerkError::DecodeFailed(format!("decode worker failed: {e}"))));

        if let Ok(outcome) = &result {
            self.last_records = outcome.records.clone();
        }
        self.session.finish_decode(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use scanwerk_bridge::traits::{NativeCamera, NativeNotifier, NativePermissions, Reply};
    use scanwerk_core::classify::{DETECTOR_UNAVAILABLE_TEXT, NOTHING_FOUND_TEXT};
    use scanwerk_core::human_errors::Notice;
    use scanwerk_core::types::{FailureKind, PermissionOutcome};

    use crate::pipeline::tests::{FakeDetector, url_detection, write_png};

    enum Camera {
        CopyFrom(PathBuf),
        Cancel,
        /// Keep the reply open until the cycle is cancelled.
        Hold,
    }

    struct RecordingBridge {
        permission: PermissionOutcome,
        camera: Camera,
        launches: AtomicUsize,
        held: Mutex<Option<Reply<CaptureCompletion>>>,
        notices: Mutex<Vec<Notice>>,
    }

    impl RecordingBridge {
        fn new(permission: PermissionOutcome, camera: Camera) -> Arc<Self> {
            Arc::new(Self {
                permission,
                camera,
                launches: AtomicUsize::new(0),
                held: Mutex::new(None),
                notices: Mutex::new(Vec::new()),
            })
        }

        fn notices(&self) -> Vec<Notice> {
            self.notices.lock().unwrap().clone()
        }
    }

    impl PlatformBridge for RecordingBridge {
        fn platform_name(&self) -> &str {
            "Test"
        }
    }

    impl NativePermissions for RecordingBridge {
        fn request_capture_permission(&self, reply: Reply<PermissionOutcome>) {
            reply.send(self.permission).unwrap();
        }
    }

    impl NativeCamera for RecordingBridge {
        fn launch_capture(&self, request: CaptureRequest, reply: Reply<CaptureCompletion>) -> Result<()> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            let outcome = match &self.camera {
                Camera::CopyFrom(photo) => {
                    std::fs::copy(photo, request.reference.to_path())?;
                    CaptureOutcome::Saved
                }
                Camera::Cancel => CaptureOutcome::Cancelled,
                Camera::Hold => {
                    *self.held.lock().unwrap() = Some(reply);
                    return Ok(());
                }
            };
            reply
                .send(CaptureCompletion {
                    id: request.id,
                    outcome,
                })
                .unwrap();
            Ok(())
        }
    }

    impl NativeNotifier for RecordingBridge {
        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn photo(&self) -> PathBuf {
            let path = self.dir.path().join("source.png");
            write_png(&path, 1600, 1200);
            path
        }

        fn target(&self) -> ImageReference {
            ImageReference::from_path(self.dir.path().join("picture.jpg"))
        }

        fn scanner(
            &self,
            bridge: Arc<RecordingBridge>,
            detector: FakeDetector,
            saved: SavedSession,
        ) -> Scanner<FakeDetector> {
            let config = ScannerConfig::default();
            Scanner::resume(
                bridge,
                ScanPipeline::from_config(&config, detector),
                &config,
                self.target(),
                saved,
            )
        }
    }

    #[tokio::test]
    async fn url_scenario_appends_to_prior_text() {
        let fx = Fixture::new();
        let bridge = RecordingBridge::new(PermissionOutcome::Granted, Camera::CopyFrom(fx.photo()));
        let saved = SavedSession {
            result: Some("prior".into()),
            ..SavedSession::default()
        };
        let mut scanner = fx.scanner(
            Arc::clone(&bridge),
            FakeDetector::returning(vec![url_detection()]),
            saved,
        );

        let phase = scanner.run_cycle().await.unwrap();
        assert_eq!(phase, Phase::ResultsReady);
        assert_eq!(scanner.session().result_text(), "prior http://example.com");
        assert_eq!(scanner.session().image_reference(), Some(&fx.target()));
        assert!(matches!(
            scanner.last_records(),
            [ClassifiedRecord::Url { url, .. }] if url == "http://example.com"
        ));
        assert!(bridge.notices().is_empty());
    }

    #[tokio::test]
    async fn permission_denied_never_launches_camera() {
        let fx = Fixture::new();
        let bridge = RecordingBridge::new(PermissionOutcome::Denied, Camera::CopyFrom(fx.photo()));
        let detector = FakeDetector::returning(vec![url_detection()]);
        let calls = Arc::clone(&detector.calls);
        let mut scanner = fx.scanner(Arc::clone(&bridge), detector, SavedSession::default());

        let phase = scanner.run_cycle().await.unwrap();
        assert_eq!(phase, Phase::PermissionDenied);
        assert_eq!(bridge.notices(), vec![Notice::PermissionDenied]);
        assert_eq!(bridge.launches.load(Ordering::SeqCst), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(phase.is_idle_equivalent());
    }

    #[tokio::test]
    async fn broken_detector_is_never_asked_to_detect() {
        let fx = Fixture::new();
        let bridge = RecordingBridge::new(PermissionOutcome::Granted, Camera::CopyFrom(fx.photo()));
        let detector = FakeDetector::broken();
        let calls = Arc::clone(&detector.calls);
        let config = ScannerConfig::default();
        let mut scanner = Scanner::new(
            Arc::clone(&bridge) as Arc<dyn PlatformBridge>,
            ScanPipeline::from_config(&config, detector),
            &config,
            fx.target(),
        );
        assert_eq!(scanner.session().result_text(), DETECTOR_UNAVAILABLE_TEXT);

        let phase = scanner.run_cycle().await.unwrap();
        assert_eq!(phase, Phase::Error(FailureKind::DetectorUnavailable));
        assert_eq!(scanner.session().result_text(), DETECTOR_UNAVAILABLE_TEXT);
        assert_eq!(bridge.launches.load(Ordering::SeqCst), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(bridge.notices(), vec![Notice::DetectorUnavailable]);
    }

    #[tokio::test]
    async fn nothing_found_overwrites_text() {
        let fx = Fixture::new();
        let bridge = RecordingBridge::new(PermissionOutcome::Granted, Camera::CopyFrom(fx.photo()));
        let saved = SavedSession {
            result: Some("old".into()),
            ..SavedSession::default()
        };
        let mut scanner = fx.scanner(Arc::clone(&bridge), FakeDetector::returning(Vec::new()), saved);

        let phase = scanner.run_cycle().await.unwrap();
        assert_eq!(phase, Phase::ClassificationEmpty);
        assert_eq!(scanner.session().result_text(), NOTHING_FOUND_TEXT);
        assert_eq!(bridge.notices(), vec![Notice::NothingFound]);
    }

    #[tokio::test]
    async fn unreadable_photo_raises_load_notice() {
        let fx = Fixture::new();
        let garbage = fx.dir.path().join("garbage.jpg");
        std::fs::write(&garbage, b"definitely not an image").unwrap();
        let bridge = RecordingBridge::new(PermissionOutcome::Granted, Camera::CopyFrom(garbage));
        let mut scanner = fx.scanner(
            Arc::clone(&bridge),
            FakeDetector::returning(vec![url_detection()]),
            SavedSession::default(),
        );

        let phase = scanner.run_cycle().await.unwrap();
        assert!(matches!(phase, Phase::Error(_)));
        assert_eq!(bridge.notices(), vec![Notice::ImageLoadFailed]);
        assert!(scanner.last_records().is_empty());
    }

    #[tokio::test]
    async fn user_cancel_returns_to_idle() {
        let fx = Fixture::new();
        let bridge = RecordingBridge::new(PermissionOutcome::Granted, Camera::Cancel);
        let mut scanner = fx.scanner(
            Arc::clone(&bridge),
            FakeDetector::returning(vec![url_detection()]),
            SavedSession::default(),
        );

        assert_eq!(scanner.run_cycle().await.unwrap(), Phase::Idle);
        assert_eq!(bridge.launches.load(Ordering::SeqCst), 1);
        assert!(bridge.notices().is_empty());
    }

    #[tokio::test]
    async fn cancel_handle_aborts_outstanding_capture() {
        let fx = Fixture::new();
        let bridge = RecordingBridge::new(PermissionOutcome::Granted, Camera::Hold);
        let mut scanner = fx.scanner(
            Arc::clone(&bridge),
            FakeDetector::returning(vec![url_detection()]),
            SavedSession::default(),
        );
        let handle = scanner.cancel_handle();
        assert!(!handle.cancel());

        let (phase, ()) = tokio::join!(scanner.run_cycle(), async {
            while !handle.cancel() {
                tokio::task::yield_now().await;
            }
        });
        assert_eq!(phase.unwrap(), Phase::Idle);
        assert!(bridge.held.lock().unwrap().is_some());

        // A fresh cycle can start after the cancel.
        assert!(scanner.session().phase().is_idle_equivalent());
    }

    #[tokio::test]
    async fn suspend_mid_results_then_resume() {
        let fx = Fixture::new();
        let bridge = RecordingBridge::new(PermissionOutcome::Granted, Camera::CopyFrom(fx.photo()));
        let mut scanner = fx.scanner(
            Arc::clone(&bridge),
            FakeDetector::returning(vec![url_detection()]),
            SavedSession::default(),
        );
        scanner.run_cycle().await.unwrap();
        let saved = scanner.suspend();

        let restored = fx.scanner(bridge, FakeDetector::returning(Vec::new()), saved);
        assert_eq!(restored.session().result_text(), " http://example.com");
        assert_eq!(restored.session().phase(), Phase::ResultsReady);
        assert_eq!(restored.session().image_reference(), Some(&fx.target()));
    }
}
