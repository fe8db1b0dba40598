// src/app.rs
use std::sync::Arc;

use eframe::egui;
use face_fx::config::AppConfig;
use face_fx::detection::{DetectionWorker, SourceKind};
use face_fx::effects::{Effect, EffectDispatcher, EffectSettings};
use face_fx::features::DataOption;
use face_fx::frame::{FrameSlot, FrameState};
use face_fx::ui::{paint_draw_list, Theme, VideoWidget};
use face_fx::video::{blank_frame, VideoSource};
use image::DynamicImage;
use tokio::runtime::Runtime;
use tracing::{info, warn};

pub struct FaceFxApp {
    // Core components
    runtime: Runtime,
    video_source: Option<VideoSource>,
    blank: DynamicImage,
    slot: FrameSlot,
    worker: DetectionWorker,
    dispatcher: EffectDispatcher,

    // UI State
    video_widget: VideoWidget,
    theme: Theme,
    quote_draft: String,
    notice: Option<String>,

    // Settings
    settings: EffectSettings,
    config: AppConfig,
}

impl FaceFxApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, runtime: Runtime, config: AppConfig) -> Self {
        let video_source = match VideoSource::new_camera(&config.camera) {
            Ok(source) => Some(source),
            Err(e) => {
                warn!("{}; continuing without a camera", e);
                None
            }
        };
        let (width, height) = video_source
            .as_ref()
            .map_or((config.camera.width, config.camera.height), VideoSource::resolution);

        let slot = FrameSlot::new();
        let worker = DetectionWorker::spawn(
            runtime.handle(),
            config.detector.source.build(),
            config.detector.clone(),
            slot.clone(),
        );

        let settings = config.effects.clone();
        let dispatcher = EffectDispatcher::new(config.fire.clone(), &settings);

        Self {
            runtime,
            notice: video_source
                .is_none()
                .then(|| "No camera available, showing a blank canvas".to_string()),
            video_source,
            blank: blank_frame(width, height),
            slot,
            worker,
            dispatcher,
            video_widget: VideoWidget::new(),
            theme: Theme::default(),
            quote_draft: settings.quote().to_string(),
            settings,
            config,
        }
    }

    fn restart_detection(&mut self, source: SourceKind) {
        info!("Switching landmark source to {:?}", source);
        self.config.detector.source = source;
        self.slot.publish(FrameState::default());
        // The old worker's task is aborted when it is dropped here.
        self.worker = DetectionWorker::spawn(
            self.runtime.handle(),
            self.config.detector.source.build(),
            self.config.detector.clone(),
            self.slot.clone(),
        );
    }

    fn next_frame(&mut self) -> DynamicImage {
        if let Some(source) = self.video_source.as_mut() {
            match source.read_frame() {
                Ok(frame) => return frame,
                Err(e) => {
                    warn!("{}; dropping the camera", e);
                    self.notice = Some(format!("Camera stopped: {e}"));
                    self.video_source = None;
                }
            }
        }
        self.blank.clone()
    }

    fn render_header(&mut self, ctx: &egui::Context, snapshot: &FrameState) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading("Face FX");
                ui.separator();

                let status = self.worker.status();
                ui.label(
                    egui::RichText::new(status.describe()).color(self.theme.status_color(&status)),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        egui::RichText::new(format!(
                            "Batch {} | Frame {} | Particles {}",
                            snapshot.batch,
                            self.dispatcher.frame_count(),
                            self.dispatcher.fire().len()
                        ))
                        .color(self.theme.text_secondary),
                    );
                });
            });
            if let Some(notice) = &self.notice {
                ui.label(egui::RichText::new(notice).color(self.theme.warning));
            }
            ui.add_space(6.0);
        });
    }

    fn render_side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("effects")
            .resizable(false)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Effects");
                for effect in Effect::ALL {
                    let mut enabled = self.settings.is_enabled(effect);
                    if ui.checkbox(&mut enabled, effect.label()).changed() {
                        self.dispatcher.set_effect(&mut self.settings, effect, enabled);
                    }
                }

                ui.separator();
                ui.heading("Data");
                ui.add_enabled_ui(self.settings.is_enabled(Effect::DataReadout), |ui| {
                    for option in DataOption::ALL {
                        let mut enabled = self.settings.data_option(option);
                        if ui.checkbox(&mut enabled, option.label()).changed() {
                            self.settings.set_data_option(option, enabled);
                        }
                    }
                });

                ui.separator();
                ui.heading("Quote");
                ui.add(egui::TextEdit::multiline(&mut self.quote_draft).desired_rows(3));
                if ui.button("Apply quote").clicked() {
                    self.settings.set_quote(self.quote_draft.trim());
                }
                ui.label(
                    egui::RichText::new("Used the next time mouth text is switched on")
                        .small()
                        .color(self.theme.text_secondary),
                );

                ui.separator();
                ui.heading("Landmarks");
                if ui.button("Open landmark feed...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Landmark feed", &["jsonl", "json"])
                        .pick_file()
                    {
                        self.restart_detection(SourceKind::Replay { path });
                    }
                }
                if ui.button("Use simulation").clicked() {
                    self.restart_detection(SourceKind::Simulated);
                }

                ui.separator();
                if ui.button("Save settings").clicked() {
                    self.save_settings();
                }
            });
    }

    fn save_settings(&mut self) {
        self.config.effects = self.settings.clone();
        self.notice = Some(match self.config.save() {
            Ok(path) => format!("Settings saved to {}", path.display()),
            Err(e) => {
                warn!("Failed to save settings: {}", e);
                format!("Could not save settings: {e}")
            }
        });
    }
}

impl eframe::App for FaceFxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let frame = self.next_frame();
        self.video_widget.update_frame(ctx, &frame);
        self.worker.submit_frame(Arc::new(frame));

        // Render never waits on detection; it uses whatever batch is current.
        let snapshot = self.slot.snapshot();
        let overlay = self.dispatcher.dispatch(&snapshot, &self.settings);

        self.render_header(ctx, &snapshot);
        self.render_side_panel(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                let transform = self.video_widget.show(ui);
                paint_draw_list(ui.painter(), &transform, &overlay);
            });
        });

        // Request repaint for continuous updates
        ctx.request_repaint();
    }
}
