use anyhow::Result;
use eframe::egui;

mod config;
mod db;
mod export;
mod mappings;
mod models;
mod pipeline;
mod ui;

use ui::ExportApp;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Setup native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("TDS Excel Production Suite")
            .with_inner_size([820.0, 640.0])
            .with_min_inner_size([640.0, 520.0]),
        centered: true,
        ..Default::default()
    };

    // Run the app
    eframe::run_native(
        "TDS Excel Production Suite",
        options,
        Box::new(|cc| {
            configure_fonts(&cc.egui_ctx);
            Ok(Box::new(ExportApp::new(cc)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run application: {}", e))
}

fn configure_fonts(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    style
        .text_styles
        .insert(egui::TextStyle::Body, egui::FontId::proportional(14.0));
    style
        .text_styles
        .insert(egui::TextStyle::Button, egui::FontId::proportional(14.0));
    style
        .text_styles
        .insert(egui::TextStyle::Heading, egui::FontId::proportional(18.0));
    ctx.set_style(style);
}
