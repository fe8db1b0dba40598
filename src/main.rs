// src/main.rs
mod app;

use anyhow::Context;
use eframe::egui;
use face_fx::config::AppConfig;
use face_fx::landmarks::validate_topology;
use face_fx::video::list_cameras;
use tracing::info;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    validate_topology().context("Landmark tables are inconsistent")?;

    let config = AppConfig::load();

    let cameras = list_cameras();
    info!("Found {} camera(s)", cameras.len());
    for (i, name) in cameras.iter().enumerate() {
        info!("  [{}] {}", i, name);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("face-fx-detect")
        .enable_all()
        .build()
        .context("Failed to start the detection runtime")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([900.0, 600.0]),
        centered: true,
        ..Default::default()
    };

    eframe::run_native(
        "Face FX",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(create_visuals());
            Box::new(app::FaceFxApp::new(cc, runtime, config))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Error running application: {e}"))
}

fn create_visuals() -> egui::Visuals {
    let mut visuals = egui::Visuals::dark();

    visuals.widgets.noninteractive.bg_fill = egui::Color32::from_rgb(30, 30, 35);
    visuals.widgets.inactive.bg_fill = egui::Color32::from_rgb(45, 45, 52);
    visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(55, 55, 65);
    visuals.widgets.active.bg_fill = egui::Color32::from_rgb(70, 130, 240);

    visuals.widgets.noninteractive.rounding = egui::Rounding::same(8.0);
    visuals.widgets.inactive.rounding = egui::Rounding::same(8.0);
    visuals.widgets.hovered.rounding = egui::Rounding::same(8.0);
    visuals.widgets.active.rounding = egui::Rounding::same(8.0);

    visuals.window_rounding = egui::Rounding::same(12.0);

    visuals
}
