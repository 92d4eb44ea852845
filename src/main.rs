//! Application entry point — V-Synth.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Resolve [`AppPaths`] and load [`Settings`] from disk (defaults on
//!    first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the device collaborators: camera, gallery, captioner,
//!    translator, speaker.
//! 5. Run the speech greeting.
//! 6. Create pipeline channels (`command`, `event`) and spawn the
//!    orchestrator on the tokio runtime.
//! 7. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use tokio::sync::mpsc;
use vsynth::{
    app::{CaptureCommand, CaptureEvent, VSynthApp},
    config::{AppPaths, SettingsStore},
    device::{probe_media_access, DirectoryCamera, FsMediaLibrary},
    net::{HttpCaptioner, MyMemoryTranslator},
    pipeline::{new_shared_state, CaptureOrchestrator, Collaborators},
    speech::{CommandSpeaker, DEFAULT_LOCALE},
};

use eframe::egui;

fn native_options() -> eframe::NativeOptions {
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([420.0, 640.0])
        .with_min_inner_size([360.0, 480.0])
        .with_title("V-Synth");

    eframe::NativeOptions {
        viewport,
        ..Default::default()
    }
}

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("V-Synth starting up");

    // 2. Paths + settings
    let paths = AppPaths::new();
    let store = SettingsStore::at(paths.settings_file.clone());
    let settings = store.load();
    if !settings.is_complete() {
        log::warn!("Backend settings incomplete; camera will not activate until they are set");
    }

    // 3. Tokio runtime (2 worker threads — upload + translate each take one)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. Device collaborators
    let camera = DirectoryCamera::new(&paths.camera_spool_dir);
    let gallery = FsMediaLibrary::new(&paths.gallery_dir, probe_media_access());
    let captioner = HttpCaptioner::for_backend(&settings.host, &settings.port);
    let translator = MyMemoryTranslator::new();
    let speaker = Arc::new(CommandSpeaker::new());

    // 5. Speech greeting — also surfaces a missing engine early.
    let locale = settings
        .language_pair()
        .map(|(_, voice)| voice.locale())
        .unwrap_or(DEFAULT_LOCALE);
    vsynth::speech::startup(speaker.as_ref(), locale);

    // 6. Channels + orchestrator
    let (command_tx, command_rx) = mpsc::channel::<CaptureCommand>(16);
    let (event_tx, event_rx) = mpsc::channel::<CaptureEvent>(64);

    let state = new_shared_state(settings);

    let collaborators = Collaborators {
        camera: Arc::new(camera),
        gallery: Arc::new(gallery),
        captioner: Arc::new(captioner),
        translator: Arc::new(translator),
        speaker: Arc::clone(&speaker) as Arc<dyn vsynth::speech::Speaker>,
    };

    let orchestrator = CaptureOrchestrator::new(
        Arc::clone(&state),
        SettingsStore::at(paths.settings_file.clone()),
        collaborators,
        event_tx,
    );
    rt.spawn(orchestrator.run(command_rx));

    // 7. Build the egui app and run it (blocks until the window is closed)
    let app = VSynthApp::new(state, store, command_tx, event_rx);

    eframe::run_native(
        "V-Synth",
        native_options(),
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
