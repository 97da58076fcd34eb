use crate::config::Theme;
use eframe::egui;

pub fn apply_theme(ctx: &egui::Context, theme: &Theme) {
    match theme {
        Theme::Dark => apply_dark_theme(ctx),
        Theme::Light => apply_light_theme(ctx),
    }
}

fn apply_dark_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    style.visuals.dark_mode = true;
    style.visuals.override_text_color = Some(egui::Color32::from_rgb(230, 230, 230));

    // Window and panel backgrounds
    style.visuals.window_fill = egui::Color32::from_rgb(30, 30, 30);
    style.visuals.panel_fill = egui::Color32::from_rgb(30, 30, 30);
    style.visuals.faint_bg_color = egui::Color32::from_rgb(43, 43, 43);
    style.visuals.extreme_bg_color = egui::Color32::from_rgb(43, 43, 43);

    // Widget styling
    style.visuals.widgets.inactive.weak_bg_fill = egui::Color32::from_rgb(43, 43, 43);
    style.visuals.widgets.inactive.bg_fill = egui::Color32::from_rgb(50, 50, 50);
    style.visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(60, 60, 60);
    style.visuals.widgets.active.bg_fill = egui::Color32::from_rgb(53, 122, 189);

    // Selection color
    style.visuals.selection.bg_fill = egui::Color32::from_rgb(74, 144, 226);

    // Spacing
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(10.0, 6.0);

    ctx.set_style(style);
}

fn apply_light_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    style.visuals.dark_mode = false;
    style.visuals.override_text_color = Some(egui::Color32::from_rgb(30, 30, 30));

    // Window and panel backgrounds
    style.visuals.window_fill = egui::Color32::from_rgb(244, 244, 244);
    style.visuals.panel_fill = egui::Color32::from_rgb(244, 244, 244);
    style.visuals.faint_bg_color = egui::Color32::from_rgb(235, 235, 235);
    style.visuals.extreme_bg_color = egui::Color32::WHITE;

    // Widget styling
    style.visuals.widgets.inactive.weak_bg_fill = egui::Color32::from_rgb(230, 230, 230);
    style.visuals.widgets.inactive.bg_fill = egui::Color32::from_rgb(222, 222, 222);
    style.visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(210, 210, 210);
    style.visuals.widgets.active.bg_fill = egui::Color32::from_rgb(0, 122, 255);

    // Selection color
    style.visuals.selection.bg_fill = egui::Color32::from_rgb(0, 122, 255);

    // Spacing
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(10.0, 6.0);

    ctx.set_style(style);
}
