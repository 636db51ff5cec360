// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod config;
mod drivers;
mod engine;
mod exporter;
mod gui;
mod recorder;
mod types;
use anyhow::{anyhow, Context};
use eframe::egui;
use log::{info, warn};
use crate::config::AppConfig;
fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config_path = AppConfig::default_path();
    let config = match AppConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            warn!("{}; using defaults", e);
            AppConfig::default()
        }
    };
    info!(
        "settings from {} ({} channels)",
        config_path.display(),
        config.channel_count()
    );
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1100.0, 800.0])
        .with_min_inner_size([800.0, 600.0])
        .with_title("ThermoLog");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "ThermoLog",
        options,
        Box::new(move |_cc| Box::new(gui::ThermoLogApp::new(config, config_path))),
    )
    .map_err(|e| anyhow!("{e}"))
    .context("GUI terminated with an error")
}
