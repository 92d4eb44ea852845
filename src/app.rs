//! V-Synth desktop window — egui/eframe application.
//!
//! # Architecture
//!
//! [`VSynthApp`] is the top-level [`eframe::App`].  It owns the UI-side
//! widgets plus two channel endpoints:
//!
//! * `command_tx` — sends [`CaptureCommand`] to the pipeline orchestrator.
//! * `event_rx`   — receives [`CaptureEvent`] progress/errors back.
//!
//! The authoritative pipeline state lives in the [`SharedState`] the
//! orchestrator also holds; the UI reads it under the lock each frame and
//! renders accordingly, so a restart of any one side cannot desynchronise
//! the two.
//!
//! # Tabs
//!
//! | Tab | Contents |
//! |-----|----------|
//! | `Capture` | camera start/shoot/reset flow, photo preview, caption |
//! | `Settings` | backend host/port, language pair, connectivity check |
//! | `Information` | static description of the pipeline |

use std::path::PathBuf;

use eframe::egui;
use tokio::sync::mpsc;

use crate::config::{LanguageCode, Settings, SettingsStore};
use crate::pipeline::{BlockReason, CaptureState, SharedState};

// ---------------------------------------------------------------------------
// Pipeline message types (owned by the ui module; the orchestrator imports
// them from here).
// ---------------------------------------------------------------------------

/// Commands sent from the UI thread to the pipeline orchestrator.
#[derive(Debug, Clone)]
pub enum CaptureCommand {
    /// Turn the camera on, subject to the permission/device/config gate.
    ActivateCamera,
    /// Capture a photo and run it through caption, translate and speak.
    TakePhoto,
    /// Discard the session and return to idle.
    Reset,
    /// Re-read the settings blob and re-point the captioning client.
    ReloadSettings,
    /// Probe the captioning backend's root endpoint.
    CheckConnectivity {
        /// Backend host, as typed in the settings form.
        host: String,
        /// Backend port, as typed in the settings form.
        port: String,
    },
}

/// Progress / error events delivered from the pipeline to the UI.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// The precondition gate passed; the camera is live.
    CameraActivated,
    /// The precondition gate failed; a terminal explanation is showing.
    StartBlocked {
        /// Which guard failed.
        reason: BlockReason,
    },
    /// A photo was captured and persisted to the gallery.
    PhotoCaptured {
        /// Where the gallery put it.
        path: PathBuf,
    },
    /// The captioning backend described the photo.
    CaptionReceived {
        /// Caption in the model language.
        caption: String,
    },
    /// Translation (or its fallback to the original) finished; `text` is
    /// what was handed to the speech engine.
    TranslationComplete {
        /// The spoken text.
        text: String,
    },
    /// Result of a connectivity probe.
    ConnectivityResult {
        /// Whether the backend answered the probe with 200 OK.
        ok: bool,
    },
    /// The session was cleared.
    ResetComplete,
    /// A pipeline step failed.
    Error {
        /// Human-readable message, also stored in the shared state.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Tab
// ---------------------------------------------------------------------------

/// Which top-level tab is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Capture,
    Settings,
    Information,
}

// ---------------------------------------------------------------------------
// VSynthApp
// ---------------------------------------------------------------------------

/// eframe application — the V-Synth window.
pub struct VSynthApp {
    // ── Shared pipeline state ────────────────────────────────────────────
    /// State also held by the orchestrator; read under the lock each frame.
    state: SharedState,

    // ── UI state ─────────────────────────────────────────────────────────
    /// Currently selected tab.
    tab: Tab,
    /// A capture command is in flight (drives the spinner).
    busy: bool,
    /// Outcome of the most recent connectivity probe, if any.
    connectivity: Option<bool>,
    /// A connectivity probe is in flight.
    probing: bool,
    /// Feedback line under the settings form (save confirmation or error).
    settings_feedback: Option<String>,

    // ── Settings form ────────────────────────────────────────────────────
    /// Editable copy of the settings; committed on Save.
    form: Settings,
    /// Store the Save button writes through.
    store: SettingsStore,

    // ── Photo preview ────────────────────────────────────────────────────
    /// Decoded texture of the captured photo.
    photo_texture: Option<egui::TextureHandle>,
    /// Which photo file `photo_texture` was decoded from.
    photo_loaded_from: Option<PathBuf>,

    // ── Channels ─────────────────────────────────────────────────────────
    /// Send commands to the background pipeline orchestrator.
    command_tx: mpsc::Sender<CaptureCommand>,
    /// Receive progress / errors from the background pipeline orchestrator.
    event_rx: mpsc::Receiver<CaptureEvent>,
}

impl VSynthApp {
    /// Create a new [`VSynthApp`].
    ///
    /// The settings form is pre-filled from the settings snapshot already
    /// inside `state`.
    pub fn new(
        state: SharedState,
        store: SettingsStore,
        command_tx: mpsc::Sender<CaptureCommand>,
        event_rx: mpsc::Receiver<CaptureEvent>,
    ) -> Self {
        let form = state.lock().unwrap().settings.clone();
        Self {
            state,
            tab: Tab::Capture,
            busy: false,
            connectivity: None,
            probing: false,
            settings_feedback: None,
            form,
            store,
            photo_texture: None,
            photo_loaded_from: None,
            command_tx,
            event_rx,
        }
    }

    // ── Channel polling ──────────────────────────────────────────────────

    /// Drain all pending pipeline events (non-blocking).
    fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                CaptureEvent::CameraActivated | CaptureEvent::StartBlocked { .. } => {
                    self.busy = false;
                }
                CaptureEvent::PhotoCaptured { .. } => {
                    // Captioning is still running; stay busy.
                }
                CaptureEvent::CaptionReceived { .. }
                | CaptureEvent::TranslationComplete { .. } => {
                    self.busy = false;
                }
                CaptureEvent::ConnectivityResult { ok } => {
                    self.connectivity = Some(ok);
                    self.probing = false;
                }
                CaptureEvent::ResetComplete => {
                    self.busy = false;
                    self.photo_texture = None;
                    self.photo_loaded_from = None;
                }
                CaptureEvent::Error { .. } => {
                    // The message itself is read from the shared state.
                    self.busy = false;
                }
            }
        }
    }

    /// Hand a command to the orchestrator without blocking the UI thread.
    ///
    /// Returns whether the command was accepted; a dropped command produces
    /// no completion event, so callers must not latch an in-flight flag on
    /// the drop path.
    fn dispatch(&self, command: CaptureCommand) -> bool {
        match self.command_tx.try_send(command) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("ui: dropping command, pipeline busy: {e}");
                false
            }
        }
    }

    // ── Photo preview ────────────────────────────────────────────────────

    /// Decode the captured photo into a texture, once per file.
    fn refresh_photo_texture(&mut self, ctx: &egui::Context, path: &PathBuf) {
        if self.photo_loaded_from.as_ref() == Some(path) {
            return;
        }
        match image::open(path) {
            Ok(decoded) => {
                let rgba = decoded.to_rgba8();
                let size = [rgba.width() as usize, rgba.height() as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
                self.photo_texture =
                    Some(ctx.load_texture("captured-photo", color_image, Default::default()));
                self.photo_loaded_from = Some(path.clone());
            }
            Err(e) => {
                log::warn!("ui: could not decode {path:?} for preview: {e}");
                self.photo_loaded_from = Some(path.clone());
            }
        }
    }

    // ── Tab renderers ────────────────────────────────────────────────────

    /// Render the Capture tab.
    fn draw_capture(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let (capture_state, camera_active, photo, caption, error) = {
            let st = self.state.lock().unwrap();
            (
                st.state,
                st.session.camera_active,
                st.session.captured_photo.clone(),
                st.session.display_caption().map(str::to_owned),
                st.error_message.clone(),
            )
        };

        if let Some(path) = photo.as_ref() {
            self.refresh_photo_texture(ctx, path);
        }

        ui.add_space(6.0);

        if let CaptureState::Blocked(reason) = capture_state {
            // Terminal explanation screen.  The gate re-evaluates on every
            // activation, so the view recovers as soon as the blocking
            // condition is fixed.
            ui.add_space(20.0);
            ui.vertical_centered(|ui| {
                ui.label(
                    egui::RichText::new(reason.message())
                        .color(egui::Color32::from_rgb(255, 136, 68))
                        .size(16.0),
                );
                ui.add_space(12.0);
                if ui.button("Try Again").clicked() {
                    self.busy = self.dispatch(CaptureCommand::ActivateCamera);
                }
                if ui.button("Reset").clicked() {
                    self.dispatch(CaptureCommand::Reset);
                }
            });
            return;
        }

        // ── Preview area ─────────────────────────────────────────────────
        if let Some(texture) = &self.photo_texture {
            let available = ui.available_width();
            let scale = (available / texture.size_vec2().x).min(1.0);
            ui.add(
                egui::Image::new(texture)
                    .fit_to_exact_size(texture.size_vec2() * scale)
                    .corner_radius(egui::CornerRadius::same(4)),
            );
        } else if camera_active {
            ui.label(
                egui::RichText::new("Camera ready")
                    .color(egui::Color32::from_rgb(120, 160, 120))
                    .size(13.0),
            );
        }

        // ── Caption ──────────────────────────────────────────────────────
        if let Some(caption) = caption.as_deref() {
            ui.add_space(6.0);
            ui.label(
                egui::RichText::new("Deskripsi:")
                    .color(egui::Color32::from_rgb(180, 180, 180))
                    .size(12.0),
            );
            ui.label(
                egui::RichText::new(caption)
                    .color(egui::Color32::from_rgb(80, 200, 120))
                    .size(15.0),
            );
        } else if self.busy && capture_state == CaptureState::PhotoCaptured {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Generating description...");
            });
        }

        if let Some(error) = error.as_deref() {
            ui.add_space(6.0);
            ui.label(
                egui::RichText::new(error)
                    .color(egui::Color32::from_rgb(255, 136, 68))
                    .size(12.0),
            );
        }

        // ── Buttons ──────────────────────────────────────────────────────
        ui.add_space(10.0);
        ui.horizontal(|ui| {
            match capture_state {
                CaptureState::Idle => {
                    if ui.button("Activate Camera").clicked() {
                        self.busy = self.dispatch(CaptureCommand::ActivateCamera);
                    }
                }
                _ => {
                    let can_capture = capture_button_enabled(capture_state, self.busy);
                    if ui
                        .add_enabled(can_capture, egui::Button::new("Take Photo"))
                        .clicked()
                    {
                        self.busy = self.dispatch(CaptureCommand::TakePhoto);
                    }
                    if ui.button("Reset").clicked() {
                        self.dispatch(CaptureCommand::Reset);
                    }
                }
            }
        });
    }

    /// Render the Settings tab: backend form, language pair, connectivity.
    fn draw_settings(&mut self, ui: &mut egui::Ui) {
        ui.add_space(6.0);

        egui::Grid::new("settings-grid")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.label("Host");
                ui.text_edit_singleline(&mut self.form.host);
                ui.end_row();

                ui.label("Port");
                ui.text_edit_singleline(&mut self.form.port);
                ui.end_row();

                ui.label("Model language");
                language_combo(ui, "model-language", &mut self.form.model_language);
                ui.end_row();

                ui.label("Voice language");
                language_combo(ui, "voice-language", &mut self.form.voice_language);
                ui.end_row();
            });

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                match self.store.save(&self.form) {
                    Ok(()) => {
                        self.settings_feedback = Some("Settings saved".into());
                        self.dispatch(CaptureCommand::ReloadSettings);
                    }
                    Err(e) => {
                        self.settings_feedback = Some(format!("Not saved: {e}"));
                    }
                }
            }

            if ui
                .add_enabled(!self.probing, egui::Button::new("Check Connectivity"))
                .clicked()
            {
                self.connectivity = None;
                self.probing = self.dispatch(CaptureCommand::CheckConnectivity {
                    host: self.form.host.clone(),
                    port: self.form.port.clone(),
                });
            }

            if self.probing {
                ui.spinner();
            }
        });

        if let Some(feedback) = self.settings_feedback.as_deref() {
            ui.add_space(4.0);
            ui.label(
                egui::RichText::new(feedback)
                    .color(egui::Color32::from_rgb(150, 150, 150))
                    .size(12.0),
            );
        }

        if let Some(ok) = self.connectivity {
            ui.add_space(4.0);
            let (text, color) = if ok {
                ("Backend reachable", egui::Color32::from_rgb(80, 200, 120))
            } else {
                (
                    "Backend unreachable",
                    egui::Color32::from_rgb(255, 136, 68),
                )
            };
            ui.label(egui::RichText::new(text).color(color).size(12.0));
        }
    }

    /// Render the static Information tab.
    fn draw_information(&self, ui: &mut egui::Ui) {
        ui.add_space(6.0);
        ui.label(
            egui::RichText::new("V-Synth")
                .color(egui::Color32::from_rgb(200, 200, 200))
                .size(16.0),
        );
        ui.add_space(4.0);
        ui.label(
            "Point the camera at a scene, take a photo, and hear a spoken \
             description of it.  The photo is captioned by the configured \
             backend, the caption is translated into the voice language, and \
             the result is read aloud.",
        );
        ui.add_space(8.0);
        ui.label(
            egui::RichText::new(
                "Set the backend host and port under Settings before the \
                 camera can be activated.",
            )
            .color(egui::Color32::from_rgb(150, 150, 150))
            .size(12.0),
        );
    }
}

/// Two-entry language selector bound to a settings field.
fn language_combo(ui: &mut egui::Ui, id: &str, field: &mut String) {
    let selected = LanguageCode::parse(field)
        .map(|l| l.label())
        .unwrap_or("Select...");
    egui::ComboBox::from_id_salt(id)
        .selected_text(selected)
        .show_ui(ui, |ui| {
            for lang in LanguageCode::ALL {
                ui.selectable_value(field, lang.code().to_string(), lang.label());
            }
        });
}

/// Whether the Take Photo button is pressable.  Mirrors the orchestrator's
/// own gate — retake is allowed after a failed caption round — suppressed
/// while a command is already in flight.
fn capture_button_enabled(state: CaptureState, busy: bool) -> bool {
    state.accepts_capture() && !busy
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for VSynthApp {
    /// Called every frame by eframe.  Polls the event channel, then renders
    /// the selected tab.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();

        // Keep polling while the pipeline is working or probing.
        if self.busy || self.probing {
            ctx.request_repaint_after(std::time::Duration::from_millis(66));
        }

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tab, Tab::Capture, "Capture");
                ui.selectable_value(&mut self.tab, Tab::Settings, "Settings");
                ui.selectable_value(&mut self.tab, Tab::Information, "Information");
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.tab {
            Tab::Capture => {
                let ctx_clone = ctx.clone();
                self.draw_capture(ui, &ctx_clone);
            }
            Tab::Settings => self.draw_settings(ui),
            Tab::Information => self.draw_information(ui),
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("V-Synth window closing");
    }
}
