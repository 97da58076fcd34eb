use std::path::PathBuf;

use chrono::{DateTime, Local};
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use tokio::sync::mpsc;

use crate::config::{AppConfig, Theme};
use crate::db::directory::{self, DatabaseEntry};
use crate::pipeline::{self, ExportParams, LogLevel, Reporter};
use crate::ui::themes;

pub struct ExportApp {
    config: AppConfig,

    // database search helper
    search_term: String,
    search_results: Vec<DatabaseEntry>,
    selected_result: Option<usize>,
    is_searching: bool,

    // export state
    is_exporting: bool,
    status_message: String,
    app_status: AppStatus,
    log_entries: Vec<LogEntry>,

    // channels from the background tasks
    progress_rx: Option<mpsc::UnboundedReceiver<ProgressUpdate>>,
    export_handle: Option<tokio::task::JoinHandle<()>>,
    search_rx: Option<mpsc::UnboundedReceiver<SearchUpdate>>,
    search_handle: Option<tokio::task::JoinHandle<()>>,
}

#[derive(Debug, Clone)]
struct LogEntry {
    timestamp: DateTime<Local>,
    message: String,
    level: LogLevel,
}

#[derive(Debug, Clone, PartialEq)]
enum AppStatus {
    Ready,
    Exporting,
    Completed,
    Error(String),
}

#[derive(Debug)]
enum ProgressUpdate {
    Log(String, LogLevel),
    Status(String),
    Complete,
    Error(String),
}

#[derive(Debug)]
enum SearchUpdate {
    Results(Vec<DatabaseEntry>),
    Error(String),
}

struct UiReporter {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl Reporter for UiReporter {
    fn log(&self, message: String, level: LogLevel) {
        let _ = self.tx.send(ProgressUpdate::Log(message, level));
    }

    fn status(&self, message: String) {
        let _ = self.tx.send(ProgressUpdate::Status(message));
    }
}

impl ExportApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut config = AppConfig::load().unwrap_or_default();
        if config.output_folder.is_empty() {
            if let Ok(cwd) = std::env::current_dir() {
                config.output_folder = cwd.display().to_string();
            }
        }

        themes::apply_theme(&cc.egui_ctx, &config.theme);

        Self {
            config,
            search_term: String::new(),
            search_results: Vec::new(),
            selected_result: None,
            is_searching: false,
            is_exporting: false,
            status_message: "Ready".to_string(),
            app_status: AppStatus::Ready,
            log_entries: Vec::new(),
            progress_rx: None,
            export_handle: None,
            search_rx: None,
            search_handle: None,
        }
    }

    fn log(&mut self, message: String, level: LogLevel) {
        self.log_entries.push(LogEntry {
            timestamp: Local::now(),
            message,
            level,
        });

        // Keep only the last 1000 messages
        if self.log_entries.len() > 1000 {
            self.log_entries.remove(0);
        }
    }

    fn start_export(&mut self) {
        let errors = self.config.validate();
        if !errors.is_empty() {
            for error in errors {
                self.log(error, LogLevel::Error);
            }
            return;
        }

        if self.is_exporting {
            self.log("Export already in progress".to_string(), LogLevel::Warning);
            return;
        }

        // Drop any finished/stale task before starting over
        if let Some(handle) = self.export_handle.take() {
            handle.abort();
        }

        let _ = self.config.save();

        self.is_exporting = true;
        self.app_status = AppStatus::Exporting;
        self.status_message = "Starting export…".to_string();
        self.log(
            format!(
                "Export started: {} on {}",
                self.config.database, self.config.server
            ),
            LogLevel::Info,
        );

        let (tx, rx) = mpsc::unbounded_channel();
        self.progress_rx = Some(rx);

        let params = ExportParams {
            server: self.config.server.trim().to_string(),
            database: self.config.database.trim().to_string(),
            output_folder: PathBuf::from(self.config.output_folder.trim()),
        };

        let handle = tokio::spawn(async move {
            let reporter = UiReporter { tx: tx.clone() };
            match pipeline::run_export(&params, &reporter).await {
                Ok(()) => {
                    let _ = tx.send(ProgressUpdate::Complete);
                }
                Err(e) => {
                    let _ = tx.send(ProgressUpdate::Error(format!("{e:#}")));
                }
            }
        });
        self.export_handle = Some(handle);
    }

    fn start_search(&mut self) {
        let term = self.search_term.trim().to_string();
        if term.is_empty() {
            self.log("Enter part of a database name first".to_string(), LogLevel::Warning);
            return;
        }

        if let Some(handle) = self.search_handle.take() {
            handle.abort();
        }

        self.is_searching = true;

        let (tx, rx) = mpsc::unbounded_channel();
        self.search_rx = Some(rx);

        let handle = tokio::spawn(async move {
            match directory::search_databases(&term).await {
                Ok(results) => {
                    let _ = tx.send(SearchUpdate::Results(results));
                }
                Err(e) => {
                    let _ = tx.send(SearchUpdate::Error(format!("{e:#}")));
                }
            }
        });
        self.search_handle = Some(handle);
    }

    fn process_updates(&mut self) {
        let mut progress = Vec::new();
        if let Some(rx) = &mut self.progress_rx {
            while let Ok(update) = rx.try_recv() {
                progress.push(update);
            }
        }

        for update in progress {
            match update {
                ProgressUpdate::Log(message, level) => self.log(message, level),
                ProgressUpdate::Status(status) => self.status_message = status,
                ProgressUpdate::Complete => {
                    self.is_exporting = false;
                    self.progress_rx = None;
                    self.export_handle = None;
                    self.app_status = AppStatus::Completed;
                    self.status_message = "Export complete".to_string();
                    self.config.last_export_path = Some(self.config.output_folder.clone());
                    let _ = self.config.save();
                    self.log("Production export completed.".to_string(), LogLevel::Success);
                }
                ProgressUpdate::Error(error) => {
                    self.is_exporting = false;
                    self.progress_rx = None;
                    self.export_handle = None;
                    self.status_message = "Export failed".to_string();
                    self.log(format!("Error: {error}"), LogLevel::Error);
                    self.app_status = AppStatus::Error(error);
                }
            }
        }

        let mut search = Vec::new();
        if let Some(rx) = &mut self.search_rx {
            while let Ok(update) = rx.try_recv() {
                search.push(update);
            }
        }

        for update in search {
            match update {
                SearchUpdate::Results(results) => {
                    self.is_searching = false;
                    self.search_rx = None;
                    self.search_handle = None;
                    self.log(
                        format!("Found {} matching databases", results.len()),
                        LogLevel::Info,
                    );
                    self.selected_result = None;
                    self.search_results = results;
                }
                SearchUpdate::Error(error) => {
                    self.is_searching = false;
                    self.search_rx = None;
                    self.search_handle = None;
                    self.log(format!("Search failed: {error}"), LogLevel::Error);
                }
            }
        }
    }

    fn handle_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::E)) && !self.is_exporting {
            self.start_export();
        }
    }

    fn status_badge(&self) -> (&'static str, egui::Color32, &'static str) {
        match &self.app_status {
            AppStatus::Ready => ("●", egui::Color32::from_rgb(76, 175, 80), "Ready"),
            AppStatus::Exporting => ("●", egui::Color32::from_rgb(33, 150, 243), "Exporting"),
            AppStatus::Completed => ("●", egui::Color32::from_rgb(76, 175, 80), "Completed"),
            AppStatus::Error(_) => ("●", egui::Color32::from_rgb(244, 67, 54), "Error"),
        }
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("TDS Excel Production Suite");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let label = match self.config.theme {
                    Theme::Dark => "☀ Light",
                    Theme::Light => "🌙 Dark",
                };
                if ui.button(label).clicked() {
                    self.config.theme = match self.config.theme {
                        Theme::Dark => Theme::Light,
                        Theme::Light => Theme::Dark,
                    };
                    let _ = self.config.save();
                }
            });
        });
    }

    fn render_search(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label("Database Search");
            ui.separator();

            ui.horizontal(|ui| {
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.search_term)
                        .desired_width(260.0)
                        .hint_text("Database name contains…"),
                );
                let submitted =
                    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

                let clicked = ui
                    .add_enabled(!self.is_searching, egui::Button::new("🔍 Search"))
                    .clicked();

                if self.is_searching {
                    ui.add(egui::Spinner::new());
                }

                if (clicked || submitted) && !self.is_searching {
                    self.start_search();
                }
            });

            if !self.search_results.is_empty() {
                ui.add_space(4.0);
                self.render_search_results(ui);
            }
        });
    }

    fn render_search_results(&mut self, ui: &mut egui::Ui) {
        let mut clicked_row = None;

        TableBuilder::new(ui)
            .striped(true)
            .sense(egui::Sense::click())
            .max_scroll_height(160.0)
            .column(Column::remainder().at_least(180.0))
            .column(Column::remainder().at_least(160.0))
            .column(Column::auto().at_least(100.0))
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Description");
                });
                header.col(|ui| {
                    ui.strong("Database");
                });
                header.col(|ui| {
                    ui.strong("Server");
                });
            })
            .body(|mut body| {
                for (idx, entry) in self.search_results.iter().enumerate() {
                    body.row(18.0, |mut row| {
                        row.set_selected(self.selected_result == Some(idx));
                        row.col(|ui| {
                            ui.label(&entry.description);
                        });
                        row.col(|ui| {
                            ui.label(&entry.database_name);
                        });
                        row.col(|ui| {
                            ui.label(&entry.server);
                        });
                        if row.response().clicked() {
                            clicked_row = Some(idx);
                        }
                    });
                }
            });

        if let Some(idx) = clicked_row {
            let entry = self.search_results[idx].clone();
            self.selected_result = Some(idx);
            self.config.server = entry.server;
            self.config.database = entry.database_name;
            let _ = self.config.save();
        }
    }

    fn render_connection(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label("Connection");
            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Server:");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.config.server).desired_width(300.0),
                );
                if response.changed() {
                    let _ = self.config.save();
                }
            });

            ui.horizontal(|ui| {
                ui.label("Database:");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.config.database)
                        .desired_width(300.0)
                        .hint_text("e.g. 001-7782-000"),
                );
                if response.changed() {
                    let _ = self.config.save();
                }
            });
        });
    }

    fn render_output(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label("Output");
            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Folder:");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.config.output_folder)
                        .desired_width(300.0),
                );
                if response.changed() {
                    let _ = self.config.save();
                }

                if ui.button("Browse…").clicked() {
                    let mut dialog = rfd::FileDialog::new();
                    if !self.config.output_folder.trim().is_empty() {
                        dialog = dialog.set_directory(&self.config.output_folder);
                    }
                    if let Some(folder) = dialog.pick_folder() {
                        self.config.output_folder = folder.display().to_string();
                        let _ = self.config.save();
                    }
                }
            });
        });
    }

    fn render_run_controls(&mut self, ui: &mut egui::Ui) {
        let validation_errors = self.config.validate();
        let can_run = validation_errors.is_empty() && !self.is_exporting;

        if !validation_errors.is_empty() {
            for error in &validation_errors {
                ui.colored_label(egui::Color32::from_rgb(244, 67, 54), format!("• {error}"));
            }
            ui.add_space(4.0);
        }

        let run_btn = ui.add_sized(
            egui::Vec2::new(280.0, 40.0),
            egui::Button::new("▶ RUN PRODUCTION EXPORT").fill(if can_run {
                egui::Color32::from_rgb(40, 167, 69)
            } else {
                egui::Color32::from_rgb(100, 100, 100)
            }),
        );

        if run_btn.clicked() && can_run {
            self.start_export();
        }
    }

    fn render_log(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label("Log");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Clear").clicked() {
                        self.log_entries.clear();
                    }
                });
            });
            ui.separator();

            egui::ScrollArea::vertical()
                .max_height(180.0)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    if self.log_entries.is_empty() {
                        ui.weak("Nothing yet — run an export.");
                    }
                    for entry in &self.log_entries {
                        ui.horizontal_wrapped(|ui| {
                            ui.weak(format!("[{}]", entry.timestamp.format("%H:%M:%S")));
                            match entry.level {
                                LogLevel::Info => {
                                    ui.label(&entry.message);
                                }
                                level => {
                                    ui.colored_label(level_color(level), &entry.message);
                                }
                            }
                        });
                    }
                });
        });
    }

    fn render_status_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let (icon, color, text) = self.status_badge();
            let badge = ui.colored_label(color, icon);
            if let AppStatus::Error(e) = &self.app_status {
                badge.on_hover_text(e);
            }
            ui.label(text);
            ui.separator();
            ui.label(&self.status_message);

            if self.is_exporting {
                ui.add(egui::Spinner::new());
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.add_space(10.0);
                ui.label(format!("v{}", env!("CARGO_PKG_VERSION")));
            });
        });
    }
}

fn level_color(level: LogLevel) -> egui::Color32 {
    match level {
        LogLevel::Info => egui::Color32::from_rgb(200, 200, 200),
        LogLevel::Success => egui::Color32::from_rgb(76, 175, 80),
        LogLevel::Warning => egui::Color32::from_rgb(255, 193, 7),
        LogLevel::Error => egui::Color32::from_rgb(244, 67, 54),
    }
}

impl eframe::App for ExportApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keyboard_shortcuts(ctx);
        self.process_updates();

        // Keep the UI repainting while a background task is feeding it
        if self.is_exporting || self.is_searching {
            ctx.request_repaint();
        }

        themes::apply_theme(ctx, &self.config.theme);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            self.render_status_bar(ui);
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(8.0);
                self.render_header(ui);
                ui.add_space(8.0);
                self.render_search(ui);
                ui.add_space(8.0);
                self.render_connection(ui);
                ui.add_space(8.0);
                self.render_output(ui);
                ui.add_space(12.0);
                self.render_run_controls(ui);
                ui.add_space(12.0);
                self.render_log(ui);
            });
        });
    }
}
