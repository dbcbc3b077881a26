// app.rs - egui front end for the studio
// Thin wiring: every button forwards to the simulation core

use std::time::Instant;

use conway::patterns;
use conway::{Host, LifeError, Notice, Simulation, StopSignal, StudioConfig};
use eframe::egui;
use egui::{Color32, Rect, Sense, Stroke, Vec2};
use tracing::{error, info};

use crate::store::{JsonFileStore, RecordingStore, RecordingSummary};

/// Forwards core callbacks to egui repaints and the status line.
struct UiHost<'a> {
    ctx: &'a egui::Context,
    status: &'a mut Option<String>,
}

impl Host for UiHost<'_> {
    fn redraw(&mut self) {
        self.ctx.request_repaint();
    }

    fn on_stop(&mut self, signal: StopSignal) {
        info!(generation = signal.generation, "run stopped by stability detector");
    }

    fn notify(&mut self, notice: Notice) {
        *self.status = Some(match notice {
            Notice::Stabilized { generation } => format!("Pattern stabilized at generation {generation}"),
            Notice::RuleFallback { input, error } => format!("Rule {input:?} rejected ({error}); using B3/S23"),
            Notice::PlaybackFinished => "Playback finished".to_string(),
        });
    }
}

pub struct StudioApp {
    sim: Simulation,
    runtime: tokio::runtime::Runtime,
    store: JsonFileStore,

    live_color: Color32,
    dead_color: Color32,
    fade_color: Color32,
    selected_pattern: usize,
    rule_input: String,
    seed_input: String,
    playback_speed: f64,
    export_start: usize,
    export_end: usize,
    save_name: String,
    recordings: Vec<RecordingSummary>,
    status: Option<String>,
}

impl StudioApp {
    pub fn new(config: StudioConfig, runtime: tokio::runtime::Runtime) -> anyhow::Result<Self> {
        let store = JsonFileStore::new(&config.recordings_dir);
        let rule_input = config.rules.clone();
        let sim = Simulation::new(config)?;
        let mut app = Self {
            sim,
            runtime,
            store,
            live_color: Color32::from_rgb(0, 200, 0),
            dead_color: Color32::from_rgb(40, 40, 40),
            fade_color: Color32::from_rgb(0, 90, 60),
            selected_pattern: 0,
            rule_input,
            seed_input: String::new(),
            playback_speed: 4.0,
            export_start: 0,
            export_end: 0,
            save_name: "Untitled".to_string(),
            recordings: Vec::new(),
            status: None,
        };
        app.refresh_recordings();
        Ok(app)
    }

    fn report(&mut self, result: Result<(), LifeError>) {
        if let Err(err) = result {
            self.status = Some(err.to_string());
        }
    }

    fn seed(&self) -> Option<u64> {
        self.seed_input.trim().parse().ok()
    }

    fn refresh_recordings(&mut self) {
        match self.runtime.block_on(self.store.list()) {
            Ok(list) => self.recordings = list,
            Err(err) => {
                error!(%err, "listing recordings failed");
                self.status = Some(err.to_string());
            }
        }
    }

    fn save_recording(&mut self, range: Option<(usize, usize)>) {
        let record = match range {
            Some((start, end)) => self.sim.export_range(start, end),
            None => self.sim.export_recording(),
        };
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                self.status = Some(err.to_string());
                return;
            }
        };
        match self.runtime.block_on(self.store.save(&self.save_name, &record)) {
            Ok(id) => {
                info!(id, frames = record.generations.len(), "recording saved");
                // Range exports leave the buffer for further exports
                if range.is_none() {
                    self.sim.mark_recording_saved();
                }
                self.status = Some(format!("Saved recording #{id}"));
                self.refresh_recordings();
            }
            Err(err) => {
                error!(%err, "saving recording failed");
                self.status = Some(format!("Save failed: {err}"));
            }
        }
    }

    fn load_recording(&mut self, ctx: &egui::Context, id: u64) {
        let stored = match self.runtime.block_on(self.store.load(id)) {
            Ok(stored) => stored,
            Err(err) => {
                error!(%err, id, "loading recording failed");
                self.status = Some(format!("Load failed: {err}"));
                return;
            }
        };
        let mut host = UiHost { ctx, status: &mut self.status };
        if let Err(err) = self.sim.load_recording(&stored.record, &mut host) {
            self.status = Some(err.to_string());
            return;
        }
        self.rule_input = self.sim.engine().rules_as_string();
        self.export_start = 0;
        self.export_end = stored.record.generations.len().saturating_sub(1);
        self.status = Some(format!("Viewing \"{}\"", stored.name));
    }

    fn delete_recording(&mut self, id: u64) {
        if let Err(err) = self.runtime.block_on(self.store.delete(id)) {
            error!(%err, id, "deleting recording failed");
            self.status = Some(format!("Delete failed: {err}"));
        }
        self.refresh_recordings();
    }

    fn simulation_controls(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let locked = self.sim.is_in_playback_mode();
        let now = Instant::now();
        let density = self.sim.config().random_density;
        let seed = self.seed();

        let mut outcome: Result<(), LifeError> = Ok(());
        ui.horizontal(|ui| {
            ui.add_enabled_ui(!locked, |ui| {
                let button_text = if self.sim.is_running() { "⏸ Pause" } else { "▶ Start" };
                if ui.button(button_text).clicked() {
                    outcome = self.sim.toggle(now);
                }

                let mut host = UiHost { ctx, status: &mut self.status };
                if ui.button("⏭ Step").clicked() {
                    outcome = self.sim.step_once(now, &mut host).map(|_| ());
                }
                if ui.button("⏮ Back").clicked() {
                    self.sim.step_back(&mut host);
                }
                if self.sim.session().is_scrubbing() && ui.button("Fwd").clicked() {
                    self.sim.step_forward_in_session(&mut host);
                }
                if ui.button("⏹ Clear").clicked() {
                    outcome = self.sim.reset(&mut host);
                }

                if ui.button("🎲 Random").clicked() {
                    outcome = self.sim.randomize(density, seed, &mut host);
                }
                if ui.button("Edges").clicked() {
                    outcome = self.sim.fill_edges(density, seed, &mut host);
                }
                if ui.button("Center").clicked() {
                    outcome = self.sim.fill_center(density, seed, &mut host);
                }
                if ui.button("Invert").clicked() {
                    outcome = self.sim.invert(&mut host);
                }
            });

            ui.label("Seed:");
            ui.add(egui::TextEdit::singleline(&mut self.seed_input).desired_width(60.0));
        });
        self.report(outcome);

        ui.horizontal(|ui| {
            ui.label("Pattern:");
            egui::ComboBox::from_id_source("pattern_selector")
                .selected_text(patterns::PATTERNS[self.selected_pattern].name)
                .show_ui(ui, |ui| {
                    for (i, pattern) in patterns::PATTERNS.iter().enumerate() {
                        ui.selectable_value(&mut self.selected_pattern, i, pattern.name);
                    }
                });

            if ui.add_enabled(!locked, egui::Button::new("Apply Pattern")).clicked() {
                let mut host = UiHost { ctx, status: &mut self.status };
                let pattern = &patterns::PATTERNS[self.selected_pattern];
                let result = self.sim.apply_pattern(pattern, &mut host);
                self.report(result);
            }

            ui.separator();

            ui.label("Rules:");
            ui.add(egui::TextEdit::singleline(&mut self.rule_input).desired_width(80.0));
            if ui.button("Apply").clicked() {
                let mut host = UiHost { ctx, status: &mut self.status };
                self.sim.set_rules(&self.rule_input, &mut host);
                self.rule_input = self.sim.engine().rules_as_string();
            }

            ui.separator();
            ui.label(format!("Generation: {}", self.sim.engine().generation()));
        });

        ui.horizontal(|ui| {
            ui.label("Speed:");
            let mut speed = self.sim.config().speed;
            if ui.add(egui::Slider::new(&mut speed, 0.5..=90.0).suffix(" gen/sec")).changed() {
                self.sim.set_speed(speed);
            }

            let mut fade = self.sim.config().fade_duration;
            if ui.add(egui::Slider::new(&mut fade, 0..=30).text("fade")).changed() {
                self.sim.set_fade_duration(fade);
            }

            let mut cell_size = self.sim.config().cell_size;
            if ui.add(egui::Slider::new(&mut cell_size, 2..=30).text("cell px")).changed() {
                self.sim.set_cell_size(cell_size);
            }
        });

        ui.horizontal(|ui| {
            let mut enabled = self.sim.detector().is_enabled();
            if ui.checkbox(&mut enabled, "Stop when stable").changed() {
                self.sim.set_stability_enabled(enabled);
            }
            let mut delay = self.sim.detector().delay();
            if ui.add(egui::Slider::new(&mut delay, 1..=20).text("stable ticks")).changed() {
                self.sim.set_stability_delay(delay);
            }

            ui.separator();
            ui.label("Live:");
            ui.color_edit_button_srgba(&mut self.live_color);
            ui.label("Dead:");
            ui.color_edit_button_srgba(&mut self.dead_color);
            ui.label("Trail:");
            ui.color_edit_button_srgba(&mut self.fade_color);
        });
    }

    fn recording_controls(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let now = Instant::now();
        let frames = self.sim.recorder().len();

        ui.horizontal(|ui| {
            let state = if self.sim.recorder().is_recording() { "● REC" } else { "Recording" };
            ui.label(format!("{state}: {frames} frames"));

            let mut host = UiHost { ctx, status: &mut self.status };
            if ui.button("▶").clicked() {
                self.sim.play_recording(self.playback_speed, now, &mut host);
            }
            if ui.button("⏸").clicked() {
                self.sim.pause_recording();
            }
            if ui.button("⏹").clicked() {
                self.sim.stop_recording_playback(&mut host);
            }
            if ui.add(egui::Slider::new(&mut self.playback_speed, 0.5..=10.0).text("x")).changed() {
                self.sim.set_playback_speed(self.playback_speed);
            }

            if frames > 0 {
                let mut index = self.sim.recorder().timeline().current_index();
                if ui.add(egui::Slider::new(&mut index, 0..=frames - 1).text("frame")).changed() {
                    self.sim.seek_recording(index, &mut host);
                }
            }

            if self.sim.is_in_playback_mode() && ui.button("Exit playback").clicked() {
                self.sim.exit_playback_mode(&mut host);
            }
        });

        ui.horizontal(|ui| {
            ui.label("Name:");
            ui.add(egui::TextEdit::singleline(&mut self.save_name).desired_width(120.0));
            if ui.add_enabled(frames > 0, egui::Button::new("💾 Save")).clicked() {
                self.save_recording(None);
            }

            ui.separator();
            let last = frames.saturating_sub(1);
            ui.add(egui::DragValue::new(&mut self.export_start).clamp_range(0..=last).prefix("from "));
            ui.add(egui::DragValue::new(&mut self.export_end).clamp_range(0..=last).prefix("to "));
            if ui.add_enabled(frames > 0, egui::Button::new("Save range")).clicked() {
                self.save_recording(Some((self.export_start, self.export_end)));
            }
            if ui.add_enabled(frames > 0, egui::Button::new("Discard")).clicked() {
                self.sim.clear_recording();
            }
        });

        let mut load = None;
        let mut delete = None;
        let mut refresh = false;
        egui::CollapsingHeader::new(format!("Saved recordings ({})", self.recordings.len())).show(ui, |ui| {
            for summary in &self.recordings {
                ui.horizontal(|ui| {
                    ui.label(format!(
                        "#{} {} - {} gens, {}",
                        summary.id, summary.name, summary.total_generations, summary.rule_string
                    ));
                    if ui.button("Load").clicked() {
                        load = Some(summary.id);
                    }
                    if ui.button("Delete").clicked() {
                        delete = Some(summary.id);
                    }
                });
            }
            refresh = ui.button("Refresh").clicked();
        });
        if refresh {
            self.refresh_recordings();
        }
        if let Some(id) = load {
            self.load_recording(ctx, id);
        }
        if let Some(id) = delete {
            self.delete_recording(id);
        }
    }

    fn cell_color(&self, row: usize, col: usize) -> Color32 {
        let engine = self.sim.engine();
        if engine.get_cell(row, col) {
            return self.live_color;
        }
        let fade = engine.fade_at(row, col);
        let duration = engine.fade_duration();
        if fade == 0 || duration == 0 {
            return self.dead_color;
        }
        let t = (fade as f32 / duration as f32).min(1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color32::from_rgb(
            mix(self.dead_color.r(), self.fade_color.r()),
            mix(self.dead_color.g(), self.fade_color.g()),
            mix(self.dead_color.b(), self.fade_color.b()),
        )
    }

    fn draw_grid(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let engine = self.sim.engine();
        let (rows, cols) = (engine.rows(), engine.cols());
        let box_size = self.sim.config().cell_size as f32;
        let spacing = if box_size >= 6.0 { 0.5 } else { 0.0 };
        let pitch = box_size + spacing;

        let start_pos = ui.cursor().min;
        let total_size = Vec2::new(pitch * cols as f32 - spacing, pitch * rows as f32 - spacing);
        let (response, painter) = ui.allocate_painter(total_size, Sense::click());

        painter.rect_filled(Rect::from_min_size(start_pos, total_size), 0.0, Color32::BLACK);

        for row in 0..rows {
            for col in 0..cols {
                let x = start_pos.x + col as f32 * pitch;
                let y = start_pos.y + row as f32 * pitch;
                let rect = Rect::from_min_size(egui::pos2(x, y), Vec2::splat(box_size));
                painter.rect_filled(rect, 1.0, self.cell_color(row, col));
                if spacing > 0.0 {
                    painter.rect_stroke(rect, 1.0, Stroke::new(0.2, Color32::from_gray(60)));
                }
            }
        }

        // Editing only while stopped
        if !self.sim.is_running() && response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let offset = pos - start_pos;
                let (row, col) = ((offset.y / pitch) as usize, (offset.x / pitch) as usize);
                let mut host = UiHost { ctx, status: &mut self.status };
                let result = self.sim.toggle_cell(row, col, &mut host);
                self.report(result);
            }
        }
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut host = UiHost { ctx, status: &mut self.status };
        self.sim.tick(Instant::now(), &mut host);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Conway Studio");

            self.simulation_controls(ui, ctx);
            ui.separator();
            self.recording_controls(ui, ctx);
            ui.separator();

            if let Some(status) = &self.status {
                ui.label(status.as_str());
                ui.separator();
            }

            egui::ScrollArea::both().show(ui, |ui| {
                self.draw_grid(ui, ctx);
            });

            ui.separator();

            let engine = self.sim.engine();
            let total = engine.rows() * engine.cols();
            let live_cells = engine.population();
            ui.horizontal(|ui| {
                ui.label(format!("Live cells: {}", live_cells));
                ui.label(format!("Dead cells: {}", total - live_cells));
                ui.label(format!("Population: {:.1}%", (live_cells as f32 / total as f32) * 100.0));
                ui.label(format!("Rule: {}", engine.rules_as_string()));
            });
        });

        // Keep polling the live loop and replay timers
        if self.sim.is_running() || self.sim.recorder().timeline().is_playing() {
            ctx.request_repaint();
        }
    }
}
