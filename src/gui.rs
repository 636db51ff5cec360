// src/gui.rs
use std::path::PathBuf;
use std::time::Instant;
use eframe::egui;
use egui::{Color32, RichText};
use egui_plot::{Legend, Line, Plot, PlotPoints};
use log::warn;
use crate::config::AppConfig;
use crate::drivers::{available_ports, LiveHistory};
use crate::engine::{ConnectTarget, Engine};
use crate::exporter::default_export_path;
use crate::types::{BaudRate, ConnectionMode};

#[derive(PartialEq, Clone, Copy, Debug)]
enum Tab {
    RealTime,
    Recorder,
}

// Button presses collected while drawing, applied afterwards
enum RecorderCommand {
    Start(usize),
    Stop(usize),
    StartAll,
    StopAll,
}

pub struct ThermoLogApp {
    engine: Engine,
    config: AppConfig,
    config_path: PathBuf,
    ports: Vec<String>,
    live: LiveHistory,
    tab: Tab,
    export_path: String,
    last_tick: Instant,
    log_messages: Vec<String>,
}

impl ThermoLogApp {
    pub fn new(config: AppConfig, config_path: PathBuf) -> Self {
        let engine = Engine::from_config(&config);
        let live = LiveHistory::new(config.channel_count(), config.live_window_s as f64);
        let export_path = default_export_path(&config.export_dir, "csv")
            .display()
            .to_string();
        let mut app = Self {
            engine,
            config,
            config_path,
            ports: Vec::new(),
            live,
            tab: Tab::RealTime,
            export_path,
            last_tick: Instant::now(),
            log_messages: vec!["ThermoLog ready.".to_owned()],
        };
        app.refresh_ports();
        app
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > 8 {
            self.log_messages.remove(0);
        }
    }

    fn refresh_ports(&mut self) {
        match available_ports() {
            Ok(ports) => {
                if self.config.port.is_none() {
                    self.config.port = ports.first().cloned();
                }
                self.ports = ports;
            }
            Err(e) => {
                warn!("{}", e);
                self.log(&e.to_string());
            }
        }
    }

    fn save_settings(&mut self) {
        if let Err(e) = self.config.save(&self.config_path) {
            warn!("{}", e);
            self.log(&e.to_string());
        }
    }

    fn toggle_connection(&mut self) {
        if self.engine.is_connected() {
            if let Err(e) = self.engine.disconnect() {
                self.log(&e.to_string());
            } else {
                self.log("Disconnected");
            }
            return;
        }
        let result = ConnectTarget::from_config(&self.config)
            .and_then(|target| self.engine.connect(&target));
        match result {
            Ok(()) => {
                let name = self.engine.connected_to().unwrap_or_default().to_owned();
                self.log(&format!("Connected to {}", name));
                self.save_settings();
            }
            Err(e) => {
                warn!("connection failed: {}", e);
                self.log(&format!("Connection error: {}", e));
            }
        }
    }

    // Fixed-interval foreground tick
    fn poll(&mut self) {
        if self.last_tick.elapsed() < self.config.tick_interval() {
            return;
        }
        self.last_tick = Instant::now();
        let report = self.engine.tick();
        self.live.extend(&report.samples);
        for channel in report.auto_stopped {
            self.log(&format!("Sensor {} reached its max duration", channel + 1));
        }
        if let Some(e) = report.link_error {
            self.log(&format!("Connection lost: {}", e));
        }
    }

    fn apply(&mut self, command: RecorderCommand) {
        let result = match command {
            RecorderCommand::Start(ch) => match self.config.channels.get(ch) {
                Some(settings) => self.engine.start_recording(ch, settings),
                None => Ok(()),
            },
            RecorderCommand::Stop(ch) => self.engine.stop_recording(ch),
            RecorderCommand::StartAll => self.engine.start_all(&self.config.channels),
            RecorderCommand::StopAll => {
                self.engine.stop_all();
                Ok(())
            }
        };
        if let Err(e) = result {
            self.log(&e.to_string());
        }
    }

    fn export_csv(&mut self) {
        let path = PathBuf::from(self.export_path.trim());
        match self.engine.export_csv(&path, &self.config.labels()) {
            Ok(rows) => self.log(&format!("Exported {} rows to {}", rows, path.display())),
            Err(e) => self.log(&format!("Export failed: {}", e)),
        }
    }

    fn save_plot(&mut self) {
        let path = PathBuf::from(self.export_path.trim()).with_extension("png");
        match self.engine.save_plot(&path, &self.config.labels()) {
            Ok(()) => self.log(&format!("Plot saved to {}", path.display())),
            Err(e) => self.log(&format!("Plot export failed: {}", e)),
        }
    }

    fn connection_bar(&mut self, ui: &mut egui::Ui) {
        let connected = self.engine.is_connected();
        ui.horizontal(|ui| {
            ui.add_enabled_ui(!connected, |ui| {
                ui.selectable_value(&mut self.config.mode, ConnectionMode::Hardware, "Serial");
                ui.selectable_value(&mut self.config.mode, ConnectionMode::Simulation, "Simulated");
                ui.separator();
                ui.label("Port:");
                let selected = self.config.port.clone().unwrap_or_else(|| "-".to_owned());
                egui::ComboBox::from_id_source("port")
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        for port in &self.ports {
                            ui.selectable_value(&mut self.config.port, Some(port.clone()), port.as_str());
                        }
                    });
                if ui.button("Refresh").clicked() {
                    self.refresh_ports();
                }
                ui.label("Baudrate:");
                egui::ComboBox::from_id_source("baud")
                    .selected_text(self.config.baud.to_string())
                    .show_ui(ui, |ui| {
                        for baud in BaudRate::ALL {
                            ui.selectable_value(&mut self.config.baud, baud, baud.to_string());
                        }
                    });
            });
            let label = if connected { "Disconnect" } else { "Connect" };
            if ui.button(label).clicked() {
                self.toggle_connection();
            }
            match self.engine.connected_to() {
                Some(name) => ui.colored_label(Color32::GREEN, format!("Connected: {}", name)),
                None => ui.colored_label(Color32::GRAY, "Disconnected"),
            };
        });
    }

    fn realtime_page(&mut self, ui: &mut egui::Ui) {
        let latest = self.engine.latest();
        ui.horizontal(|ui| {
            for ch in 0..self.engine.num_channels() {
                let text = match latest.as_ref().and_then(|s| s.value(ch)) {
                    Some(v) => format!("{:.2} °C", v),
                    None => "--.- °C".to_owned(),
                };
                ui.label(format!("Sensor {}:", ch + 1));
                ui.label(RichText::new(text).size(16.0).strong());
                ui.add_space(12.0);
            }
            if ui.button("Reset view").clicked() {
                self.live.clear();
            }
        });
        Plot::new("live_plot")
            .legend(Legend::default())
            .x_axis_label("Time (s)")
            .y_axis_label("Temperature (°C)")
            .show(ui, |plot_ui| {
                for ch in 0..self.live.num_channels() {
                    let points = self.live.channel(ch);
                    if !points.is_empty() {
                        plot_ui.line(Line::new(PlotPoints::new(points)).name(format!("Sensor {}", ch + 1)));
                    }
                }
            });
    }

    fn recorder_page(&mut self, ui: &mut egui::Ui) {
        let count = self.engine.num_channels();
        let mut commands = Vec::new();
        ui.horizontal(|ui| {
            if ui.button("Start All").clicked() {
                commands.push(RecorderCommand::StartAll);
            }
            if ui.button("Stop All").clicked() {
                commands.push(RecorderCommand::StopAll);
            }
        });
        egui::Grid::new("channel_grid").striped(true).show(ui, |ui| {
            ui.label("");
            for ch in 0..count {
                ui.strong(format!("Sensor {}", ch + 1));
            }
            ui.end_row();

            ui.label("Status");
            for ch in 0..count {
                if self.engine.recorder().is_recording(ch) {
                    ui.colored_label(Color32::GREEN, "Recording");
                } else {
                    ui.colored_label(Color32::GRAY, "Idle");
                }
            }
            ui.end_row();

            ui.label("Title");
            for settings in self.config.channels.iter_mut().take(count) {
                ui.add(egui::TextEdit::singleline(&mut settings.label).desired_width(120.0));
            }
            ui.end_row();

            ui.label("Sample period");
            for settings in self.config.channels.iter_mut().take(count) {
                ui.add(egui::DragValue::new(&mut settings.period_s).clamp_range(0..=86_400).suffix(" s"));
            }
            ui.end_row();

            ui.label("Max duration");
            for settings in self.config.channels.iter_mut().take(count) {
                ui.add(egui::DragValue::new(&mut settings.max_duration_min).clamp_range(0..=10_080).suffix(" min"));
            }
            ui.end_row();

            ui.label("Entries");
            for ch in 0..count {
                ui.label(self.engine.recorder().log(ch).map_or(0, |l| l.len()).to_string());
            }
            ui.end_row();

            ui.label("");
            for ch in 0..count {
                ui.horizontal(|ui| {
                    if ui.button("Start").clicked() {
                        commands.push(RecorderCommand::Start(ch));
                    }
                    if ui.button("Stop").clicked() {
                        commands.push(RecorderCommand::Stop(ch));
                    }
                });
            }
            ui.end_row();
        });
        for command in commands {
            self.apply(command);
        }

        ui.separator();
        ui.horizontal(|ui| {
            ui.label("Export to:");
            ui.add(egui::TextEdit::singleline(&mut self.export_path).desired_width(360.0));
            if ui.button("New name").clicked() {
                self.export_path = default_export_path(&self.config.export_dir, "csv")
                    .display()
                    .to_string();
            }
            if ui.button("Export to CSV").clicked() {
                self.export_csv();
            }
            if ui.button("Save plot").clicked() {
                self.save_plot();
            }
            if ui.button("Save settings").clicked() {
                self.save_settings();
            }
        });

        ui.columns(count.max(1), |columns| {
            for (ch, col) in columns.iter_mut().enumerate() {
                col.strong(format!("Sensor {} Data", ch + 1));
                let Some(log) = self.engine.recorder().log(ch) else {
                    continue;
                };
                egui::ScrollArea::vertical()
                    .id_source(("rows", ch))
                    .max_height(160.0)
                    .stick_to_bottom(true)
                    .show(col, |ui| {
                        egui::Grid::new(("row_grid", ch)).striped(true).show(ui, |ui| {
                            ui.strong("Time (s)");
                            ui.strong("Temp (°C)");
                            ui.strong("Timestamp");
                            ui.end_row();
                            for entry in log.entries() {
                                ui.label(format!("{:.1}", entry.elapsed_s));
                                ui.label(format!("{:.2}", entry.value));
                                ui.label(entry.wall_clock.as_str());
                                ui.end_row();
                            }
                        });
                    });
            }
        });

        Plot::new("recorded_plot")
            .legend(Legend::default())
            .x_axis_label("Time (s)")
            .y_axis_label("Temperature (°C)")
            .show(ui, |plot_ui| {
                for (ch, log) in self.engine.recorder().logs().enumerate() {
                    if log.is_empty() {
                        continue;
                    }
                    let points: Vec<[f64; 2]> = log
                        .entries()
                        .iter()
                        .map(|e| [e.elapsed_s, e.value])
                        .collect();
                    plot_ui.line(Line::new(PlotPoints::new(points)).name(format!("Sensor {}", ch + 1)));
                }
            });
    }
}

impl eframe::App for ThermoLogApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll();

        egui::TopBottomPanel::top("connection").show(ctx, |ui| {
            ui.add_space(4.0);
            self.connection_bar(ui);
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("messages").show(ctx, |ui| {
            egui::ScrollArea::vertical().max_height(100.0).show(ui, |ui| {
                for m in &self.log_messages {
                    ui.monospace(m);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tab, Tab::RealTime, "Real Time");
                ui.selectable_value(&mut self.tab, Tab::Recorder, "Data Recorder");
            });
            ui.separator();
            match self.tab {
                Tab::RealTime => self.realtime_page(ui),
                Tab::Recorder => self.recorder_page(ui),
            }
        });

        ctx.request_repaint_after(self.config.tick_interval());
    }
}
