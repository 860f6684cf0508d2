//! Interactive physics toy viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`Simulation`] and
//! implements [`eframe::App`] to edit its configuration, forward pointer
//! input, and show the rendered canvas as a texture.

use eframe::App;
use glam::Vec2;
use toy_core::{
    config::{
        BackgroundKind, BoundsMode, ColorMode, Config, FractalKind, ParticleShape, RecordingFormat,
        RecordingQuality,
    },
    simulation::Simulation,
};

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The simulation core: a [`Simulation`] and its configuration store.
/// - A draft copy of the configuration edited by the side panel and
///   committed to the store whenever it differs.
/// - eframe/egui callbacks for drawing and user interaction.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions and commit the draft.
/// 2. If `running` is `true` and a frame interval has passed, call
///    [`Simulation::step`].
/// 3. Upload the canvas and draw it letterboxed into the central panel.
///
/// ### Fields
/// - `sim` - The simulation being shown.
/// - `draft` - Configuration being edited; pushed into the store on change.
/// - `texture` - GPU copy of the last rendered canvas.
///
/// - `running` - Whether the simulation is currently auto-advancing.
/// - `fit_window` - Whether the canvas size follows the central panel.
/// - `show_panel` - Whether the configuration side panel is visible (`H`).
///
/// - `preset_choice` - Preset selected in the top bar combo box.
/// - `preset_name` - Name typed for "Save preset".
/// - `status` - Result of the last preset operation, shown in the status bar.
///
/// - `last_step_time` - Time stamp of the last step (egui time).
pub struct Viewer {
    sim: Simulation,
    draft: Config,
    texture: Option<egui::TextureHandle>,

    running: bool,
    fit_window: bool,
    show_panel: bool,

    preset_choice: String,
    preset_name: String,
    status: String,

    last_step_time: f64,
}

/// Largest rectangle with the canvas aspect ratio centered in `avail`.
pub fn fit_rect(avail: egui::Rect, canvas: Vec2) -> egui::Rect {
    if canvas.x <= 0.0 || canvas.y <= 0.0 {
        return avail;
    }
    let scale = (avail.width() / canvas.x).min(avail.height() / canvas.y);
    egui::Rect::from_center_size(avail.center(), egui::vec2(canvas.x * scale, canvas.y * scale))
}

/// Maps a screen position inside `image` to canvas pixel coordinates.
pub fn screen_to_canvas(p: egui::Pos2, image: egui::Rect, canvas: Vec2) -> Vec2 {
    let local = p - image.min;
    Vec2::new(
        local.x / image.width().max(1.0) * canvas.x,
        local.y / image.height().max(1.0) * canvas.y,
    )
}

/// Inverse of [`screen_to_canvas`].
pub fn canvas_to_screen(p: Vec2, image: egui::Rect, canvas: Vec2) -> egui::Pos2 {
    image.min
        + egui::vec2(
            p.x / canvas.x.max(1.0) * image.width(),
            p.y / canvas.y.max(1.0) * image.height(),
        )
}

impl Viewer {
    /// Creates a viewer around a freshly initialized default simulation.
    pub fn new() -> Self {
        let sim = Simulation::new(Config::default());
        let draft = sim.config().clone();

        Self {
            sim,
            draft,
            texture: None,
            running: true,
            fit_window: true,
            show_panel: true,
            preset_choice: "bouncy".to_string(),
            preset_name: String::new(),
            status: String::new(),
            last_step_time: 0.0,
        }
    }

    /// Pushes the draft into the store if it changed.
    fn commit_draft(&mut self) {
        self.sim.store_mut().set(self.draft.clone());
    }

    /// Pulls the store's configuration back into the draft.
    fn sync_draft(&mut self) {
        self.draft = self.sim.config().clone();
    }

    /// Commits the draft and rebuilds every subsystem from it.
    fn reinitialize(&mut self) {
        self.commit_draft();
        self.sim.initialize();
        self.running = false;
    }

    fn randomize(&mut self) {
        self.sim.randomize();
        self.sync_draft();
        self.sim.initialize();
    }

    fn load_preset(&mut self) {
        match self.sim.store_mut().load_preset(&self.preset_choice) {
            Ok(()) => {
                self.sync_draft();
                self.sim.initialize();
                self.status = format!("loaded `{}`", self.preset_choice);
            }
            Err(err) => {
                log::warn!("{err}");
                self.status = err.to_string();
            }
        }
    }

    fn save_preset(&mut self) {
        self.commit_draft();
        match self.sim.store_mut().save_preset(&self.preset_name) {
            Ok(()) => {
                self.preset_choice = self.preset_name.trim().to_string();
                self.status = format!("saved `{}`", self.preset_choice);
                self.preset_name.clear();
            }
            Err(err) => {
                log::warn!("{err}");
                self.status = err.to_string();
            }
        }
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `u32` [`egui::DragValue`].
    fn labeled_drag_u32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut u32,
        range: std::ops::RangeInclusive<u32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to pick one value of a closed option set.
    fn labeled_combo<T>(ui: &mut egui::Ui, label: &str, value: &mut T, all: &[T])
    where
        T: Copy + PartialEq + std::fmt::Display,
    {
        egui::ComboBox::from_label(label)
            .selected_text(value.to_string())
            .show_ui(ui, |ui| {
                for option in all {
                    ui.selectable_value(value, *option, option.to_string());
                }
            });
    }

    fn labeled_color(ui: &mut egui::Ui, label: &str, color: &mut [u8; 3]) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.color_edit_button_srgb(color);
        });
    }

    /// Builds the top panel UI (run controls, presets).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                if ui.button("Step").clicked() {
                    self.sim.step();
                }

                if ui.button("Reinitialize").clicked() {
                    self.reinitialize();
                }

                if ui.button("Randomize").clicked() {
                    self.randomize();
                }

                ui.separator();
                let names: Vec<String> = self.sim.store().preset_names().map(str::to_string).collect();
                egui::ComboBox::from_id_salt("preset_choice")
                    .selected_text(self.preset_choice.as_str())
                    .show_ui(ui, |ui| {
                        for name in names {
                            ui.selectable_value(&mut self.preset_choice, name.clone(), name);
                        }
                    });
                if ui.button("Load").clicked() {
                    self.load_preset();
                }

                ui.separator();
                ui.add(
                    egui::TextEdit::singleline(&mut self.preset_name)
                        .hint_text("preset name")
                        .desired_width(100.0),
                );
                if ui.button("Save preset").clicked() {
                    self.save_preset();
                }
            });
        });
    }

    /// Builds the bottom status bar (frame, live counts, last message).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("frame = {}", self.sim.frame()));
                ui.separator();
                ui.label(format!("particles = {}", self.sim.particles().len()));
                ui.label(format!("attractors = {}", self.sim.attractors().len()));
                ui.label(format!("constraints = {}", self.sim.constraints().len()));
                ui.separator();
                ui.label(self.status.as_str());
            });
        });
    }

    /// Builds the right-hand configuration panel editing the draft.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        if !self.show_panel {
            return;
        }
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Config");
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let cfg = &mut self.draft;

                    ui.collapsing("Modules", |ui| {
                        let m = &mut cfg.modules;
                        ui.checkbox(&mut m.particles, "particles");
                        ui.checkbox(&mut m.attractors, "attractors");
                        ui.checkbox(&mut m.forces, "forces");
                        ui.checkbox(&mut m.constraints, "constraints");
                        ui.checkbox(&mut m.fractals, "fractals");
                        ui.checkbox(&mut m.effects, "effects");
                    });

                    ui.collapsing("Canvas", |ui| {
                        ui.checkbox(&mut self.fit_window, "fit window");
                        ui.add_enabled_ui(!self.fit_window, |ui| {
                            Self::labeled_drag_u32(ui, "width:", &mut cfg.canvas.width, 16..=4096, 1.0);
                            Self::labeled_drag_u32(ui, "height:", &mut cfg.canvas.height, 16..=4096, 1.0);
                        });
                        Self::labeled_drag_u32(ui, "frame rate:", &mut cfg.canvas.frame_rate, 1..=240, 1.0);
                        ui.horizontal(|ui| {
                            ui.label("background:");
                            ui.color_edit_button_srgba_unmultiplied(&mut cfg.canvas.background_color);
                        });
                    });

                    ui.collapsing("Particles", |ui| {
                        let p = &mut cfg.particles;
                        Self::labeled_drag_usize(ui, "count:", &mut p.count, 0..=2000, 1.0);
                        ui.checkbox(&mut p.size_variation, "size variation");
                        if p.size_variation {
                            Self::labeled_drag_f32(ui, "min size:", &mut p.min_size, 1.0..=100.0, 0.5);
                            Self::labeled_drag_f32(ui, "max size:", &mut p.max_size, 1.0..=100.0, 0.5);
                        } else {
                            Self::labeled_drag_f32(ui, "size:", &mut p.size, 1.0..=100.0, 0.5);
                        }
                        Self::labeled_combo(ui, "color mode", &mut p.color_mode, ColorMode::ALL);
                        if p.color_mode == ColorMode::Solid {
                            Self::labeled_color(ui, "color:", &mut p.color);
                        }
                        Self::labeled_combo(ui, "shape", &mut p.shape, ParticleShape::ALL);
                        ui.checkbox(&mut p.outline, "outline");
                        if p.outline {
                            Self::labeled_color(ui, "outline color:", &mut p.outline_color);
                            Self::labeled_drag_f32(ui, "outline weight:", &mut p.outline_weight, 0.5..=10.0, 0.1);
                        }
                        Self::labeled_drag_f32(ui, "opacity:", &mut p.opacity, 0.0..=255.0, 1.0);
                        Self::labeled_drag_f32(ui, "max speed:", &mut p.max_speed, 0.0..=50.0, 0.1);

                        let mut finite = p.lifespan.is_some();
                        if ui.checkbox(&mut finite, "finite lifespan").changed() {
                            p.lifespan = finite.then_some(300);
                        }
                        if let Some(frames) = p.lifespan.as_mut() {
                            Self::labeled_drag_u32(ui, "lifespan:", frames, 1..=10_000, 1.0);
                        }

                        ui.checkbox(&mut p.trails, "trails");
                        if p.trails {
                            Self::labeled_drag_usize(ui, "trail length:", &mut p.trail_length, 0..=200, 1.0);
                        }
                    });

                    ui.collapsing("Physics", |ui| {
                        let ph = &mut cfg.physics;
                        ui.checkbox(&mut ph.gravity.active, "gravity");
                        Self::labeled_drag_f32(ui, "gravity.x:", &mut ph.gravity.x, -2.0..=2.0, 0.01);
                        Self::labeled_drag_f32(ui, "gravity.y:", &mut ph.gravity.y, -2.0..=2.0, 0.01);

                        ui.separator();
                        ui.checkbox(&mut ph.bounds.active, "bounds");
                        Self::labeled_combo(ui, "bounds mode", &mut ph.bounds.mode, BoundsMode::ALL);

                        ui.separator();
                        ui.checkbox(&mut ph.friction.active, "friction");
                        Self::labeled_drag_f32(ui, "friction:", &mut ph.friction.value, 0.8..=1.0, 0.001);

                        ui.separator();
                        ui.checkbox(&mut ph.turbulence.active, "turbulence");
                        Self::labeled_drag_f32(ui, "strength:", &mut ph.turbulence.strength, 0.0..=2.0, 0.01);
                        ui.checkbox(&mut ph.turbulence.show_field, "show field");

                        ui.separator();
                        ui.checkbox(&mut ph.collision.active, "collision");
                        Self::labeled_drag_f32(ui, "elasticity:", &mut ph.collision.elasticity, 0.0..=1.0, 0.01);
                    });

                    ui.collapsing("Attractors", |ui| {
                        let a = &mut cfg.attractors;
                        Self::labeled_drag_usize(ui, "count:", &mut a.count, 0..=20, 1.0);
                        Self::labeled_drag_f32(ui, "strength:", &mut a.strength, 0.0..=10.0, 0.05);
                        Self::labeled_drag_f32(ui, "size:", &mut a.size, 1.0..=200.0, 0.5);
                        ui.checkbox(&mut a.fixed, "fixed");
                        ui.checkbox(&mut a.visible, "visible");
                        Self::labeled_color(ui, "color:", &mut a.color);
                    });

                    ui.collapsing("Constraints", |ui| {
                        let c = &mut cfg.constraints;
                        Self::labeled_drag_usize(ui, "count:", &mut c.count, 0..=500, 1.0);
                        Self::labeled_drag_f32(ui, "length:", &mut c.length, 0.0..=500.0, 1.0);
                        Self::labeled_drag_f32(ui, "stiffness:", &mut c.stiffness, 0.0..=1.0, 0.005);
                        Self::labeled_drag_f32(ui, "damping:", &mut c.damping, 0.0..=1.0, 0.005);
                        ui.checkbox(&mut c.visible, "visible");
                        Self::labeled_color(ui, "color:", &mut c.color);
                        Self::labeled_drag_f32(ui, "weight:", &mut c.weight, 0.5..=10.0, 0.1);
                    });

                    ui.collapsing("Fractal", |ui| {
                        let f = &mut cfg.fractal;
                        Self::labeled_combo(ui, "type", &mut f.kind, FractalKind::ALL);
                        Self::labeled_drag_u32(ui, "depth:", &mut f.depth, 0..=10, 0.1);
                        Self::labeled_drag_f32(ui, "size:", &mut f.size, 10.0..=500.0, 1.0);
                        Self::labeled_drag_f32(ui, "rotation:", &mut f.rotation_speed, -0.1..=0.1, 0.001);
                        Self::labeled_color(ui, "color:", &mut f.color);
                        ui.checkbox(&mut f.interactive, "interactive");
                    });

                    ui.collapsing("Effects", |ui| {
                        let e = &mut cfg.effects;
                        Self::labeled_combo(ui, "background", &mut e.background, BackgroundKind::ALL);
                        ui.checkbox(&mut e.blur, "blur");
                        ui.checkbox(&mut e.glow, "glow");
                        Self::labeled_drag_u32(ui, "glow strength:", &mut e.glow_strength, 1..=40, 0.2);
                        ui.checkbox(&mut e.vignette, "vignette");
                        Self::labeled_drag_f32(ui, "vignette amount:", &mut e.vignette_amount, 0.0..=1.0, 0.01);
                    });

                    ui.collapsing("Recording", |ui| {
                        let r = &mut cfg.recording;
                        Self::labeled_drag_f32(ui, "duration (s):", &mut r.duration_secs, 1.0..=60.0, 0.5);
                        Self::labeled_drag_u32(ui, "fps:", &mut r.fps, 1..=60, 1.0);
                        Self::labeled_combo(ui, "format", &mut r.format, RecordingFormat::ALL);
                        Self::labeled_combo(ui, "quality", &mut r.quality, RecordingQuality::ALL);
                    });

                    ui.separator();
                    if ui.button("Reset cfg to default").clicked() {
                        *cfg = Config::default();
                    }
                });
            });
    }

    /// Builds the central panel showing the canvas and forwarding the pointer.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;

            if self.fit_window {
                self.draft.canvas.width = rect.width().round().max(16.0) as u32;
                self.draft.canvas.height = rect.height().round().max(16.0) as u32;
            }
            self.commit_draft();

            // Auto-run simulation if requested.
            if self.running {
                let now = ctx.input(|i| i.time);
                let interval = 1.0 / self.sim.config().canvas.frame_rate.max(1) as f64;
                if now - self.last_step_time >= interval {
                    self.sim.step();
                    self.last_step_time = now;
                }
                ctx.request_repaint();
            }

            let canvas = self.sim.canvas();
            let canvas_size = canvas.size();
            let image = egui::ColorImage::from_rgba_unmultiplied(
                [canvas.width(), canvas.height()],
                canvas.as_bytes(),
            );
            if let Some(texture) = &mut self.texture {
                texture.set(image, egui::TextureOptions::NEAREST);
            } else {
                self.texture = Some(ctx.load_texture("canvas", image, egui::TextureOptions::NEAREST));
            }
            let Some(texture) = &self.texture else {
                return;
            };

            let image_rect = fit_rect(rect, canvas_size);
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            ui.painter_at(rect)
                .image(texture.id(), image_rect, uv, egui::Color32::WHITE);

            let (pressed, released, latest) = ctx.input(|i| {
                (
                    i.pointer.primary_pressed(),
                    i.pointer.primary_released(),
                    i.pointer.latest_pos(),
                )
            });
            if let Some(pos) = latest {
                let p = screen_to_canvas(pos, image_rect, canvas_size);
                self.sim.pointer_moved(p);
                if pressed && response.hovered() {
                    self.sim.pointer_pressed(p);
                }
            }
            if released {
                self.sim.pointer_released();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    ///
    /// This method:
    /// - Renders the top control bar and status bar.
    /// - Renders the config side panel (toggled with `H`).
    /// - Steps, uploads and draws the canvas and handles pointer input.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(egui::Key::H)) && !ctx.wants_keyboard_input() {
            self.show_panel = !self.show_panel;
        }
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(100.0, 50.0), egui::vec2(800.0, 600.0))
    }

    #[test]
    fn fit_rect_keeps_aspect_and_centers() {
        let avail = test_rect();
        let fitted = fit_rect(avail, Vec2::new(400.0, 100.0));

        assert!((fitted.width() - 800.0).abs() < 1e-4);
        assert!((fitted.height() - 200.0).abs() < 1e-4);
        assert!((fitted.center() - avail.center()).length() < 1e-4);
    }

    #[test]
    fn canvas_to_screen_and_back_is_roundtrip() {
        let image = fit_rect(test_rect(), Vec2::new(960.0, 640.0));
        let canvas = Vec2::new(960.0, 640.0);

        let eps = 1e-3;

        for p in [Vec2::ZERO, Vec2::new(480.0, 320.0), Vec2::new(959.0, 10.5)] {
            let screen = canvas_to_screen(p, image, canvas);
            let back = screen_to_canvas(screen, image, canvas);
            assert!(
                (back - p).length() < eps,
                "roundtrip mismatch: p={:?}, back={:?}",
                p,
                back
            );
        }

        // The image's top-left corner is the canvas origin.
        assert_eq!(screen_to_canvas(image.min, image, canvas), Vec2::ZERO);
    }

    #[test]
    fn reinitialize_applies_draft_and_pauses() {
        let mut viewer = Viewer::new();
        viewer.draft.particles.count = 7;
        viewer.running = true;

        viewer.reinitialize();

        assert_eq!(viewer.sim.particles().len(), 7);
        assert_eq!(viewer.sim.config().particles.count, 7);
        assert!(!viewer.running);
    }

    #[test]
    fn load_preset_updates_draft() {
        let mut viewer = Viewer::new();
        viewer.preset_choice = "bouncy".to_string();

        viewer.load_preset();

        assert_eq!(viewer.draft.particles.count, 50);
        assert!(viewer.draft.physics.gravity.active);
        assert_eq!(viewer.sim.particles().len(), 50);
    }

    #[test]
    fn unknown_preset_reports_status() {
        let mut viewer = Viewer::new();
        viewer.preset_choice = "missing".to_string();
        let before = viewer.draft.clone();

        viewer.load_preset();

        assert!(viewer.status.contains("missing"));
        assert_eq!(viewer.draft, before);
    }

    #[test]
    fn save_preset_rejects_blank_name() {
        let mut viewer = Viewer::new();
        viewer.preset_name = "   ".to_string();
        viewer.save_preset();
        assert!(viewer.status.contains("blank"));

        viewer.preset_name = "mine".to_string();
        viewer.save_preset();
        assert!(viewer.sim.store().preset("mine").is_some());
        assert_eq!(viewer.preset_choice, "mine");
        assert!(viewer.preset_name.is_empty());
    }

    #[test]
    fn randomize_keeps_draft_in_sync() {
        let mut viewer = Viewer::new();
        viewer.randomize();
        assert_eq!(&viewer.draft, viewer.sim.config());
        assert_eq!(viewer.sim.particles().len(), viewer.draft.particles.count);
    }
}
