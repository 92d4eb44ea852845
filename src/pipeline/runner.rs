//! Pipeline orchestrator — drives the photo → caption → translate → speak loop.
//!
//! [`CaptureOrchestrator`] owns the [`SharedState`] and responds to
//! [`CaptureCommand`]s received over a `tokio::sync::mpsc` channel, emitting
//! [`CaptureEvent`]s back to the UI.
//!
//! # Failure policy
//!
//! Every asynchronous step catches and reports its own errors; no step
//! retries and no step rolls back a prior step — a photo that reached the
//! gallery stays there even when the upload after it fails.  A failed step
//! never advances the state machine, so a capture error leaves the camera
//! live and a captioning error leaves the photo captured with no caption.
//! Translation is the one soft step: its failure degrades to speaking the
//! original caption.

use std::sync::Arc;

use base64::Engine as _;
use tokio::sync::mpsc;

use crate::app::{CaptureCommand, CaptureEvent};
use crate::config::SettingsStore;
use crate::device::{CameraDevice, MediaLibrary};
use crate::net::{Captioner, ConnectivityProbe, Translator};
use crate::speech::{Speaker, SpeechError};

use super::state::{BlockReason, CaptureState, SharedState};

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// The external collaborators the pipeline drives, all behind trait objects
/// so tests can script every one of them.
pub struct Collaborators {
    /// Capture device.
    pub camera: Arc<dyn CameraDevice>,
    /// Device media library the captured photo is persisted to.
    pub gallery: Arc<dyn MediaLibrary>,
    /// Image-captioning backend client.
    pub captioner: Arc<dyn Captioner>,
    /// Caption translation client.
    pub translator: Arc<dyn Translator>,
    /// Text-to-speech engine.
    pub speaker: Arc<dyn Speaker>,
}

// ---------------------------------------------------------------------------
// CaptureOrchestrator
// ---------------------------------------------------------------------------

/// Drives the complete capture pipeline.
///
/// Create with [`CaptureOrchestrator::new`], then call [`run`](Self::run)
/// inside a tokio task.
pub struct CaptureOrchestrator {
    state: SharedState,
    store: SettingsStore,
    collab: Collaborators,
    probe: ConnectivityProbe,
    event_tx: mpsc::Sender<CaptureEvent>,
    /// Caption value most recently handed to the translator; the explicit
    /// caption-set event is de-duplicated against this.
    last_translated: Option<String>,
}

impl CaptureOrchestrator {
    /// Create a new orchestrator.
    ///
    /// # Arguments
    ///
    /// * `state`    — shared application state (also read by the UI).
    /// * `store`    — settings store, re-read on `ReloadSettings`.
    /// * `collab`   — camera, gallery, captioner, translator, speaker.
    /// * `event_tx` — channel the UI drains for progress/errors.
    pub fn new(
        state: SharedState,
        store: SettingsStore,
        collab: Collaborators,
        event_tx: mpsc::Sender<CaptureEvent>,
    ) -> Self {
        Self {
            state,
            store,
            collab,
            probe: ConnectivityProbe::new(),
            event_tx,
            last_translated: None,
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the orchestrator until `command_rx` is closed.
    ///
    /// Commands are handled strictly one at a time — each pipeline stage
    /// completes (successfully or with a caught failure) before the next
    /// command is looked at.  There is no parallel fan-out.
    pub async fn run(mut self, mut command_rx: mpsc::Receiver<CaptureCommand>) {
        while let Some(command) = command_rx.recv().await {
            self.handle(command).await;
        }

        log::info!("pipeline: command channel closed, orchestrator shutting down");
    }

    async fn handle(&mut self, command: CaptureCommand) {
        match command {
            CaptureCommand::ActivateCamera => self.handle_activate().await,
            CaptureCommand::TakePhoto => self.handle_take_photo().await,
            CaptureCommand::Reset => self.handle_reset().await,
            CaptureCommand::ReloadSettings => self.handle_reload_settings().await,
            CaptureCommand::CheckConnectivity { host, port } => {
                let ok = self.probe.check(&host, &port).await;
                self.emit(CaptureEvent::ConnectivityResult { ok }).await;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Command handlers
    // -----------------------------------------------------------------------

    /// `Idle → CameraActive`, gated on the three preconditions.
    ///
    /// Guard order matches the capture screen: permission, then device,
    /// then configuration — the first failing guard wins and its terminal
    /// explanation is shown.
    async fn handle_activate(&mut self) {
        let settings = {
            let st = self.state.lock().unwrap();
            st.settings.clone()
        };

        let reason = if !self.collab.camera.has_permission() {
            Some(BlockReason::PermissionDenied)
        } else if !self.collab.camera.is_available() {
            Some(BlockReason::NoCamera)
        } else if !settings.is_complete() {
            Some(BlockReason::MissingConfig)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                log::warn!("pipeline: camera activation blocked: {}", reason.message());
                {
                    let mut st = self.state.lock().unwrap();
                    st.state = CaptureState::Blocked(reason);
                    st.session.camera_active = false;
                }
                self.emit(CaptureEvent::StartBlocked { reason }).await;
            }
            None => {
                log::debug!("pipeline: ActivateCamera → CameraActive");
                {
                    let mut st = self.state.lock().unwrap();
                    st.state = CaptureState::CameraActive;
                    st.session.camera_active = true;
                    st.error_message = None;
                }
                self.emit(CaptureEvent::CameraActivated).await;
            }
        }
    }

    /// `CameraActive → PhotoCaptured → CaptionReceived`:
    /// capture → gallery save → re-read → encode → upload → caption set.
    async fn handle_take_photo(&mut self) {
        let current = self.state.lock().unwrap().state;
        if !current.accepts_capture() {
            // Includes the Blocked terminal views and the inert button after
            // a caption has already been received.
            log::debug!("pipeline: TakePhoto ignored in state {current:?}");
            return;
        }

        // ── 1. Capture (blocking device call → thread pool) ──────────────
        let camera = Arc::clone(&self.collab.camera);
        let captured = match tokio::task::spawn_blocking(move || camera.capture()).await {
            Ok(Ok(photo)) => photo,
            Ok(Err(e)) => {
                self.report_error(format!("Failed to take photo: {e}")).await;
                return;
            }
            Err(e) => {
                self.report_error(format!("Internal error: {e}")).await;
                return;
            }
        };

        // ── 2. Persist to the media library (capability re-check inside) ─
        let gallery = Arc::clone(&self.collab.gallery);
        let photo_for_save = captured.clone();
        let saved = match tokio::task::spawn_blocking(move || gallery.save(&photo_for_save)).await
        {
            Ok(Ok(path)) => path,
            Ok(Err(e)) => {
                self.report_error(format!("Failed to save photo: {e}")).await;
                return;
            }
            Err(e) => {
                self.report_error(format!("Internal error: {e}")).await;
                return;
            }
        };

        // ── 3. Re-read the saved file and encode ─────────────────────────
        let bytes = match tokio::fs::read(&saved).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.report_error(format!("Failed to read saved photo: {e}"))
                    .await;
                return;
            }
        };
        let image_b64 = base64::engine::general_purpose::STANDARD.encode(&bytes);

        {
            let mut st = self.state.lock().unwrap();
            st.state = CaptureState::PhotoCaptured;
            st.session.captured_photo = Some(saved.clone());
        }
        self.emit(CaptureEvent::PhotoCaptured { path: saved }).await;

        // ── 4. Upload for captioning ─────────────────────────────────────
        let caption = match self.collab.captioner.caption(&image_b64).await {
            Ok(caption) => caption,
            Err(e) => {
                // Hard failure for this attempt: no caption surfaces and
                // translation is never attempted.
                self.report_error(format!("Captioning failed: {e}")).await;
                return;
            }
        };

        if caption.is_empty() {
            self.report_error("Captioning returned no text".into()).await;
            return;
        }

        // ── 5. Explicit caption-set event ────────────────────────────────
        self.apply_caption(caption).await;
    }

    /// The caption-set edge: record the caption, then translate and speak.
    ///
    /// Re-invoked any time the caption value changes to non-empty, but
    /// de-duplicated by value — the same caption is translated at most once
    /// per session, whatever the translation outcome was.
    async fn apply_caption(&mut self, caption: String) {
        log::debug!("pipeline: caption = {caption:?}");
        {
            let mut st = self.state.lock().unwrap();
            st.session.caption = caption.clone();
            st.state = CaptureState::CaptionReceived;
        }
        self.emit(CaptureEvent::CaptionReceived {
            caption: caption.clone(),
        })
        .await;

        if self.last_translated.as_deref() == Some(caption.as_str()) {
            log::debug!("pipeline: caption unchanged, skipping translation");
            return;
        }

        let pair = {
            let st = self.state.lock().unwrap();
            st.settings.language_pair()
        };

        let spoken_text = match pair {
            Ok((src, dst)) => {
                match self.collab.translator.translate(&caption, src, dst).await {
                    Ok(translated) => {
                        log::debug!("pipeline: translated = {translated:?}");
                        let mut st = self.state.lock().unwrap();
                        st.session.translated_caption = translated.clone();
                        translated
                    }
                    Err(e) => {
                        // Graceful degradation: speak the original caption.
                        log::warn!("pipeline: translation failed ({e}), using original caption");
                        caption.clone()
                    }
                }
            }
            Err(e) => {
                log::warn!("pipeline: no language pair ({e}), using original caption");
                caption.clone()
            }
        };

        self.last_translated = Some(caption);
        self.emit(CaptureEvent::TranslationComplete {
            text: spoken_text.clone(),
        })
        .await;

        // ── Speak (blocking engine call → thread pool) ───────────────────
        let speaker = Arc::clone(&self.collab.speaker);
        let text = spoken_text.clone();
        let spoken = tokio::task::spawn_blocking(move || speaker.speak(&text)).await;

        match spoken {
            Ok(Ok(())) => log::debug!("pipeline: spoke {} chars", spoken_text.len()),
            Ok(Err(SpeechError::NoEngine)) => {
                log::warn!("pipeline: no speech engine, requesting installation");
                self.collab.speaker.request_engine_install();
            }
            // Speech failure is non-fatal — the caption is still displayed.
            Ok(Err(e)) => log::warn!("pipeline: speech failed: {e}"),
            Err(e) => log::warn!("pipeline: speech task panicked: {e}"),
        }
    }

    /// Reset to `Idle`.  Always succeeds, never blocked on network state.
    async fn handle_reset(&mut self) {
        log::debug!("pipeline: reset");
        {
            let mut st = self.state.lock().unwrap();
            st.session.reset();
            st.state = CaptureState::Idle;
            st.error_message = None;
        }
        // A fresh session may legitimately re-translate an identical caption.
        self.last_translated = None;
        self.emit(CaptureEvent::ResetComplete).await;
    }

    /// Re-read the settings blob and point the captioner at the new backend.
    ///
    /// A terminal precondition view must not outlive the condition itself:
    /// a settings change drops `Blocked` back to `Idle` so the gate
    /// re-evaluates on the next activation.
    async fn handle_reload_settings(&mut self) {
        let settings = self.store.load();
        self.collab
            .captioner
            .retarget(&settings.host, &settings.port);
        let mut st = self.state.lock().unwrap();
        st.settings = settings;
        if st.state.is_blocked() {
            st.state = CaptureState::Idle;
            st.error_message = None;
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn emit(&self, event: CaptureEvent) {
        let _ = self.event_tx.send(event).await;
    }

    /// Log a step failure and surface it, leaving the state machine where
    /// it was.
    async fn report_error(&self, message: String) {
        log::error!("pipeline error: {message}");
        {
            let mut st = self.state.lock().unwrap();
            st.error_message = Some(message.clone());
        }
        self.emit(CaptureEvent::Error { message }).await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LanguageCode, Settings};
    use crate::device::{CapturedPhoto, MockCameraDevice, MockMediaLibrary};
    use crate::net::{CaptionError, TranslateError};
    use crate::pipeline::state::new_shared_state;
    use crate::speech::MockSpeaker;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Scripted captioner that counts calls and records the uploaded body.
    struct MockCaptioner {
        response: Result<&'static str, u16>,
        calls: AtomicUsize,
        uploads: Mutex<Vec<String>>,
    }

    impl MockCaptioner {
        fn ok(caption: &'static str) -> Self {
            Self {
                response: Ok(caption),
                calls: AtomicUsize::new(0),
                uploads: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                response: Err(status),
                calls: AtomicUsize::new(0),
                uploads: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Captioner for MockCaptioner {
        async fn caption(&self, image_b64: &str) -> Result<String, CaptionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.uploads.lock().unwrap().push(image_b64.to_string());
            match self.response {
                Ok(caption) => Ok(caption.to_string()),
                Err(status) => Err(CaptionError::Status(status)),
            }
        }
    }

    /// Scripted translator that records `(text, src, dst)` per call.
    struct MockTranslator {
        response: Result<&'static str, ()>,
        calls: Mutex<Vec<(String, LanguageCode, LanguageCode)>>,
    }

    impl MockTranslator {
        fn ok(translated: &'static str) -> Self {
            Self {
                response: Ok(translated),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err(()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, LanguageCode, LanguageCode)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Translator for MockTranslator {
        async fn translate(
            &self,
            text: &str,
            src: LanguageCode,
            dst: LanguageCode,
        ) -> Result<String, TranslateError> {
            self.calls.lock().unwrap().push((text.to_string(), src, dst));
            match self.response {
                Ok(translated) => Ok(translated.to_string()),
                Err(()) => Err(TranslateError::Timeout),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Harness
    // -----------------------------------------------------------------------

    fn valid_settings() -> Settings {
        Settings {
            host: "192.168.1.5".into(),
            port: "8000".into(),
            model_language: "ID".into(),
            voice_language: "EN".into(),
        }
    }

    struct Harness {
        state: SharedState,
        captioner: Arc<MockCaptioner>,
        translator: Arc<MockTranslator>,
        speaker: Arc<MockSpeaker>,
        gallery: Arc<MockMediaLibrary>,
        event_rx: mpsc::Receiver<CaptureEvent>,
        orchestrator: CaptureOrchestrator,
        _store_dir: tempfile::TempDir,
    }

    impl Harness {
        fn new(
            settings: Settings,
            camera: MockCameraDevice,
            captioner: MockCaptioner,
            translator: MockTranslator,
        ) -> Self {
            let state = new_shared_state(settings);
            let captioner = Arc::new(captioner);
            let translator = Arc::new(translator);
            let speaker = Arc::new(MockSpeaker::working());
            let gallery = Arc::new(MockMediaLibrary::granting());

            let store_dir = tempfile::tempdir().expect("temp dir");
            let store = SettingsStore::at(store_dir.path().join("vsynth-config.json"));

            let (event_tx, event_rx) = mpsc::channel(64);

            let collab = Collaborators {
                camera: Arc::new(camera),
                gallery: Arc::clone(&gallery) as Arc<dyn MediaLibrary>,
                captioner: Arc::clone(&captioner) as Arc<dyn Captioner>,
                translator: Arc::clone(&translator) as Arc<dyn Translator>,
                speaker: Arc::clone(&speaker) as Arc<dyn Speaker>,
            };

            let orchestrator =
                CaptureOrchestrator::new(Arc::clone(&state), store, collab, event_tx);

            Self {
                state,
                captioner,
                translator,
                speaker,
                gallery,
                event_rx,
                orchestrator,
                _store_dir: store_dir,
            }
        }

        /// Feed `commands` through the orchestrator, in order.
        async fn run(mut self, commands: &[CaptureCommand]) -> Self {
            for command in commands {
                self.orchestrator.handle(command.clone()).await;
            }
            self
        }

        fn drained_events(&mut self) -> Vec<CaptureEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.event_rx.try_recv() {
                events.push(event);
            }
            events
        }
    }

    /// A real photo file the capture/save/re-read path can chew through.
    fn spooled_photo(dir: &std::path::Path, bytes: &[u8]) -> CapturedPhoto {
        let path = dir.join("shot.png");
        std::fs::write(&path, bytes).unwrap();
        CapturedPhoto { path }
    }

    // -----------------------------------------------------------------------
    // Precondition gate
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn denied_permission_blocks_and_stays_blocked() {
        let h = Harness::new(
            valid_settings(),
            MockCameraDevice::denied(),
            MockCaptioner::ok("x"),
            MockTranslator::ok("y"),
        );

        let mut h = h
            .run(&[
                CaptureCommand::ActivateCamera,
                CaptureCommand::TakePhoto,
                CaptureCommand::TakePhoto,
            ])
            .await;

        let st = h.state.lock().unwrap();
        assert_eq!(
            st.state,
            CaptureState::Blocked(BlockReason::PermissionDenied)
        );
        assert!(!st.session.camera_active);
        drop(st);

        // No capture attempt ever reached the backend.
        assert_eq!(h.captioner.call_count(), 0);
        assert!(matches!(
            h.drained_events()[0],
            CaptureEvent::StartBlocked {
                reason: BlockReason::PermissionDenied
            }
        ));
    }

    #[tokio::test]
    async fn missing_device_blocks_with_no_camera() {
        let h = Harness::new(
            valid_settings(),
            MockCameraDevice::absent(),
            MockCaptioner::ok("x"),
            MockTranslator::ok("y"),
        );
        let h = h.run(&[CaptureCommand::ActivateCamera]).await;

        let st = h.state.lock().unwrap();
        assert_eq!(st.state, CaptureState::Blocked(BlockReason::NoCamera));
    }

    #[tokio::test]
    async fn incomplete_settings_block_with_missing_config() {
        let spool = tempfile::tempdir().expect("spool");
        let photo = spooled_photo(spool.path(), b"png");

        let h = Harness::new(
            Settings::default(),
            MockCameraDevice::ok(photo.path),
            MockCaptioner::ok("x"),
            MockTranslator::ok("y"),
        );
        let h = h.run(&[CaptureCommand::ActivateCamera]).await;

        let st = h.state.lock().unwrap();
        assert_eq!(st.state, CaptureState::Blocked(BlockReason::MissingConfig));
    }

    #[tokio::test]
    async fn permission_guard_wins_over_later_guards() {
        // Permission, device and config all fail; the first guard's message
        // must be the one shown.
        let camera = MockCameraDevice {
            permission: false,
            available: false,
            result: Err("unused"),
        };
        let h = Harness::new(
            Settings::default(),
            camera,
            MockCaptioner::ok("x"),
            MockTranslator::ok("y"),
        );
        let h = h.run(&[CaptureCommand::ActivateCamera]).await;

        let st = h.state.lock().unwrap();
        assert_eq!(
            st.state,
            CaptureState::Blocked(BlockReason::PermissionDenied)
        );
    }

    // -----------------------------------------------------------------------
    // Happy path
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn full_capture_translates_and_speaks() {
        let spool = tempfile::tempdir().expect("spool");
        let photo = spooled_photo(spool.path(), b"image-bytes");

        let h = Harness::new(
            valid_settings(),
            MockCameraDevice::ok(&photo.path),
            MockCaptioner::ok("seekor kucing"),
            MockTranslator::ok("a cat"),
        );
        let h = h
            .run(&[CaptureCommand::ActivateCamera, CaptureCommand::TakePhoto])
            .await;

        let st = h.state.lock().unwrap();
        assert_eq!(st.state, CaptureState::CaptionReceived);
        assert_eq!(st.session.caption, "seekor kucing");
        assert_eq!(st.session.translated_caption, "a cat");
        assert_eq!(st.session.display_caption(), Some("a cat"));
        assert!(st.session.captured_photo.is_some());
        assert!(st.error_message.is_none());
        drop(st);

        // Exactly one translation, with the caption and the configured pair.
        assert_eq!(
            h.translator.calls(),
            vec![(
                "seekor kucing".to_string(),
                LanguageCode::Id,
                LanguageCode::En
            )]
        );

        // The translated text is what gets spoken.
        assert_eq!(h.speaker.spoken(), vec!["a cat".to_string()]);

        // Exactly one gallery save.
        assert_eq!(h.gallery.save_count(), 1);

        // The uploaded body is the base64 of the re-read file.
        let uploads = h.captioner.uploads.lock().unwrap();
        assert_eq!(
            uploads.as_slice(),
            &[base64::engine::general_purpose::STANDARD.encode(b"image-bytes")]
        );
    }

    #[tokio::test]
    async fn capture_failure_leaves_camera_active() {
        let h = Harness::new(
            valid_settings(),
            MockCameraDevice::failing("lens stuck"),
            MockCaptioner::ok("x"),
            MockTranslator::ok("y"),
        );
        let mut h = h
            .run(&[CaptureCommand::ActivateCamera, CaptureCommand::TakePhoto])
            .await;

        let st = h.state.lock().unwrap();
        // No silent transition to PhotoCaptured.
        assert_eq!(st.state, CaptureState::CameraActive);
        assert!(st.session.captured_photo.is_none());
        assert!(st.error_message.as_deref().unwrap().contains("lens stuck"));
        drop(st);

        assert_eq!(h.captioner.call_count(), 0);
        assert!(h
            .drained_events()
            .iter()
            .any(|e| matches!(e, CaptureEvent::Error { .. })));
    }

    #[tokio::test]
    async fn gallery_denial_aborts_before_upload() {
        let spool = tempfile::tempdir().expect("spool");
        let photo = spooled_photo(spool.path(), b"png");

        let mut h = Harness::new(
            valid_settings(),
            MockCameraDevice::ok(photo.path),
            MockCaptioner::ok("x"),
            MockTranslator::ok("y"),
        );
        // Swap in a denying gallery.
        h.orchestrator.collab.gallery = Arc::new(MockMediaLibrary::denying());

        let h = h
            .run(&[CaptureCommand::ActivateCamera, CaptureCommand::TakePhoto])
            .await;

        let st = h.state.lock().unwrap();
        assert_eq!(st.state, CaptureState::CameraActive);
        drop(st);
        assert_eq!(h.captioner.call_count(), 0);
    }

    // -----------------------------------------------------------------------
    // Captioning failure
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn caption_failure_surfaces_no_caption_and_skips_translation() {
        let spool = tempfile::tempdir().expect("spool");
        let photo = spooled_photo(spool.path(), b"png");

        let h = Harness::new(
            valid_settings(),
            MockCameraDevice::ok(photo.path),
            MockCaptioner::failing(500),
            MockTranslator::ok("never"),
        );
        let h = h
            .run(&[CaptureCommand::ActivateCamera, CaptureCommand::TakePhoto])
            .await;

        let st = h.state.lock().unwrap();
        // The photo made it — the state stops at PhotoCaptured.
        assert_eq!(st.state, CaptureState::PhotoCaptured);
        assert!(st.session.caption.is_empty());
        assert!(st.error_message.is_some());
        drop(st);

        assert!(h.translator.calls().is_empty());
        assert!(h.speaker.spoken().is_empty());
    }

    // -----------------------------------------------------------------------
    // Translation fallback
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn translation_failure_speaks_the_original_caption() {
        let spool = tempfile::tempdir().expect("spool");
        let photo = spooled_photo(spool.path(), b"png");

        let h = Harness::new(
            valid_settings(),
            MockCameraDevice::ok(photo.path),
            MockCaptioner::ok("seekor kucing"),
            MockTranslator::failing(),
        );
        let h = h
            .run(&[CaptureCommand::ActivateCamera, CaptureCommand::TakePhoto])
            .await;

        let st = h.state.lock().unwrap();
        // Still CaptionReceived — translation failure is not fatal.
        assert_eq!(st.state, CaptureState::CaptionReceived);
        assert_eq!(st.session.caption, "seekor kucing");
        assert!(st.session.translated_caption.is_empty());
        assert_eq!(st.session.display_caption(), Some("seekor kucing"));
        drop(st);

        assert_eq!(h.translator.calls().len(), 1);
        assert_eq!(h.speaker.spoken(), vec!["seekor kucing".to_string()]);
    }

    // -----------------------------------------------------------------------
    // Caption de-duplication
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn caption_value_is_translated_only_once() {
        let h = Harness::new(
            valid_settings(),
            MockCameraDevice::absent(),
            MockCaptioner::ok("unused"),
            MockTranslator::ok("a cat"),
        );
        let mut orc = h.orchestrator;

        orc.apply_caption("seekor kucing".into()).await;
        orc.apply_caption("seekor kucing".into()).await;

        let translator_calls = {
            // Re-borrow through the harness's Arc.
            h.translator.calls()
        };
        assert_eq!(translator_calls.len(), 1);
        // The caption display is still updated both times.
        assert_eq!(
            h.state.lock().unwrap().session.caption,
            "seekor kucing".to_string()
        );
    }

    #[tokio::test]
    async fn changed_caption_value_translates_again() {
        let h = Harness::new(
            valid_settings(),
            MockCameraDevice::absent(),
            MockCaptioner::ok("unused"),
            MockTranslator::ok("translated"),
        );
        let mut orc = h.orchestrator;

        orc.apply_caption("seekor kucing".into()).await;
        orc.apply_caption("seekor anjing".into()).await;

        assert_eq!(h.translator.calls().len(), 2);
    }

    #[tokio::test]
    async fn reset_clears_the_dedup_marker() {
        let h = Harness::new(
            valid_settings(),
            MockCameraDevice::absent(),
            MockCaptioner::ok("unused"),
            MockTranslator::ok("a cat"),
        );
        let mut orc = h.orchestrator;

        orc.apply_caption("seekor kucing".into()).await;
        orc.handle_reset().await;
        orc.apply_caption("seekor kucing".into()).await;

        // A fresh session re-translates the identical caption.
        assert_eq!(h.translator.calls().len(), 2);
    }

    // -----------------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn reset_from_caption_received_restores_idle() {
        let spool = tempfile::tempdir().expect("spool");
        let photo = spooled_photo(spool.path(), b"png");

        let h = Harness::new(
            valid_settings(),
            MockCameraDevice::ok(photo.path),
            MockCaptioner::ok("seekor kucing"),
            MockTranslator::ok("a cat"),
        );
        let h = h
            .run(&[
                CaptureCommand::ActivateCamera,
                CaptureCommand::TakePhoto,
                CaptureCommand::Reset,
            ])
            .await;

        let st = h.state.lock().unwrap();
        assert_eq!(st.state, CaptureState::Idle);
        assert!(!st.session.camera_active);
        assert!(st.session.captured_photo.is_none());
        assert!(st.session.caption.is_empty());
        assert!(st.session.translated_caption.is_empty());
    }

    #[tokio::test]
    async fn reset_from_blocked_state_restores_idle() {
        let h = Harness::new(
            valid_settings(),
            MockCameraDevice::denied(),
            MockCaptioner::ok("x"),
            MockTranslator::ok("y"),
        );
        let h = h
            .run(&[CaptureCommand::ActivateCamera, CaptureCommand::Reset])
            .await;

        assert_eq!(h.state.lock().unwrap().state, CaptureState::Idle);
    }

    #[tokio::test]
    async fn take_photo_in_idle_is_ignored() {
        let h = Harness::new(
            valid_settings(),
            MockCameraDevice::absent(),
            MockCaptioner::ok("x"),
            MockTranslator::ok("y"),
        );
        let h = h.run(&[CaptureCommand::TakePhoto]).await;

        assert_eq!(h.state.lock().unwrap().state, CaptureState::Idle);
        assert_eq!(h.captioner.call_count(), 0);
    }

    // -----------------------------------------------------------------------
    // Settings reload / connectivity
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn reload_settings_updates_the_snapshot() {
        let h = Harness::new(
            Settings::default(),
            MockCameraDevice::absent(),
            MockCaptioner::ok("x"),
            MockTranslator::ok("y"),
        );
        h.orchestrator
            .store
            .save(&valid_settings())
            .expect("seed store");

        let h = h.run(&[CaptureCommand::ReloadSettings]).await;

        let st = h.state.lock().unwrap();
        assert_eq!(st.settings, valid_settings());
    }

    #[tokio::test]
    async fn fixing_settings_unblocks_the_capture_flow() {
        let spool = tempfile::tempdir().expect("spool");
        let photo = spooled_photo(spool.path(), b"png");

        let h = Harness::new(
            Settings::default(),
            MockCameraDevice::ok(photo.path),
            MockCaptioner::ok("x"),
            MockTranslator::ok("y"),
        );

        let h = h.run(&[CaptureCommand::ActivateCamera]).await;
        assert_eq!(
            h.state.lock().unwrap().state,
            CaptureState::Blocked(BlockReason::MissingConfig)
        );

        // The user completes the record in Settings and saves it.
        h.orchestrator
            .store
            .save(&valid_settings())
            .expect("save settings");
        let h = h.run(&[CaptureCommand::ReloadSettings]).await;
        assert_eq!(h.state.lock().unwrap().state, CaptureState::Idle);

        // The gate re-evaluates cleanly on the next activation.
        let h = h.run(&[CaptureCommand::ActivateCamera]).await;
        assert_eq!(h.state.lock().unwrap().state, CaptureState::CameraActive);
    }

    #[tokio::test]
    async fn connectivity_command_reports_unreachable_backend() {
        use std::time::Duration;

        let mut h = Harness::new(
            valid_settings(),
            MockCameraDevice::absent(),
            MockCaptioner::ok("x"),
            MockTranslator::ok("y"),
        );
        h.orchestrator.probe = ConnectivityProbe::with_timeout(Duration::from_millis(300));

        // Bind then drop to get a port nothing is listening on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };

        let mut h = h
            .run(&[CaptureCommand::CheckConnectivity {
                host: "127.0.0.1".into(),
                port: port.to_string(),
            }])
            .await;

        let events = h.drained_events();
        assert!(matches!(
            events.as_slice(),
            [CaptureEvent::ConnectivityResult { ok: false }]
        ));
    }
}
