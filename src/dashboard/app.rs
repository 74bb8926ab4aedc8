//! Dashboard application entry point

use eframe::egui;
use egui::{RichText, TextureHandle, Vec2};
use tracing::info;

use crate::app::DigitController;
use crate::config::AppConfig;
use crate::dashboard::components::{gray_texture, pad_caption, preview_card, result_card, SketchPad};
use crate::dashboard::theme::{self, ThemeColors};
use crate::vision::{DigitModel, PreprocessConfig, RemapMode};

/// Side of the preview images in points
const PREVIEW_SIDE: f32 = 112.0;

/// GPU copies of the two preview images
#[derive(Default)]
struct PreviewTextures {
    /// Display generation the textures were built from
    generation: u64,
    resized: Option<TextureHandle>,
    remapped: Option<TextureHandle>,
}

/// The main dashboard application
pub struct DashboardApp {
    /// Sketch-and-classify controller
    controller: DigitController,
    /// Drawing surface widget
    sketch_pad: SketchPad,
    /// Preview textures
    textures: PreviewTextures,
    /// Preprocessing settings edited in the side panel
    preprocess: PreprocessConfig,
    /// Canvas size from config, in points
    canvas_size: Vec2,
    /// Model name for the status bar
    model_name: String,
    /// Whether theme has been applied
    theme_applied: bool,
}

impl DashboardApp {
    /// Create a new dashboard application
    pub fn new(controller: DigitController, config: &AppConfig, model_name: String) -> Self {
        Self {
            controller,
            sketch_pad: SketchPad::default(),
            textures: PreviewTextures::default(),
            preprocess: config.preprocess,
            canvas_size: Vec2::new(config.canvas.width as f32, config.canvas.height as f32),
            model_name,
            theme_applied: false,
        }
    }

    /// Create eframe options for the dashboard window
    pub fn options(config: &AppConfig) -> eframe::NativeOptions {
        let width = config.canvas.width as f32 + 360.0;
        let height = (config.canvas.height as f32 + 140.0).max(480.0);
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([width, height])
                .with_min_inner_size([480.0, 360.0])
                .with_title("Digit Sketch"),
            ..Default::default()
        }
    }

    /// Rebuild preview textures after a new result
    fn sync_textures(&mut self, ctx: &egui::Context) {
        let display = self.controller.display();
        if display.generation == self.textures.generation {
            return;
        }
        self.textures.generation = display.generation;

        match &display.result.previews {
            Some(previews) => {
                self.textures.resized = Some(gray_texture(ctx, "resized_preview", &previews.resized));
                self.textures.remapped = Some(gray_texture(ctx, "remapped_preview", &previews.remapped));
            }
            None => {
                self.textures.resized = None;
                self.textures.remapped = None;
            }
        }
    }

    /// Remap mode and threshold controls
    fn render_preprocess_controls(&mut self, ui: &mut egui::Ui) {
        let before = self.preprocess;

        ui.label(RichText::new("Pixel remap").size(12.0).color(ThemeColors::TEXT_MUTED));
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.preprocess.remap, RemapMode::Invert, "Invert");
            ui.selectable_value(&mut self.preprocess.remap, RemapMode::Threshold, "Threshold");
        });

        ui.add_enabled(
            self.preprocess.remap == RemapMode::Threshold,
            egui::Slider::new(&mut self.preprocess.threshold, 1..=255).text("T"),
        );

        if self.preprocess != before {
            info!("Preprocessing changed: {:?}", self.preprocess);
            self.controller.update_preprocess(self.preprocess);
        }
    }

    fn render_status_bar(&self, ui: &mut egui::Ui) {
        let display = self.controller.display();
        ui.horizontal(|ui| {
            ui.label(
                RichText::new(format!("State: {}", display.phase.name()))
                    .size(12.0)
                    .color(ThemeColors::TEXT_SECONDARY),
            );
            ui.separator();
            ui.label(
                RichText::new(format!("Model: {}", self.model_name))
                    .size(12.0)
                    .color(ThemeColors::TEXT_SECONDARY),
            );
            if display.result.processing_time_ms > 0 {
                ui.separator();
                ui.label(
                    RichText::new(format!("{} ms", display.result.processing_time_ms))
                        .size(12.0)
                        .color(ThemeColors::TEXT_MUTED),
                );
            }
            if let Some(error) = &display.result.error {
                ui.separator();
                ui.label(RichText::new(error).size(12.0).color(ThemeColors::ACCENT_ERROR));
            }
        });
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Apply theme once
        if !self.theme_applied {
            theme::apply_theme(ctx);
            self.theme_applied = true;
        }

        // Pick up results posted by the worker
        self.controller.poll();
        self.sync_textures(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.render_status_bar(ui);
        });

        egui::SidePanel::right("results")
            .resizable(false)
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.add_space(16.0);
                result_card(ui, self.controller.display());
                ui.add_space(12.0);

                // Title follows the image on screen, not the pending setting
                let remapped_title = self
                    .controller
                    .display()
                    .result
                    .previews
                    .as_ref()
                    .map(|p| p.remapped_title())
                    .unwrap_or("Model input");
                ui.horizontal(|ui| {
                    preview_card(ui, "Resized", self.textures.resized.as_ref(), PREVIEW_SIDE);
                    preview_card(ui, remapped_title, self.textures.remapped.as_ref(), PREVIEW_SIDE);
                });

                ui.add_space(12.0);
                ui.separator();
                ui.add_space(8.0);
                self.render_preprocess_controls(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::Frame::none().inner_margin(24.0).show(ui, |ui| {
                let (events, rect) = self.sketch_pad.show(ui, self.canvas_size, self.controller.path());

                self.controller.set_canvas(
                    crate::canvas::CanvasSize::from_f32(rect.width(), rect.height()),
                    ctx.pixels_per_point(),
                );
                for event in events {
                    self.controller.handle(event);
                }

                ui.add_space(6.0);
                pad_caption(
                    ui,
                    &format!(
                        "{:.0} x {:.0} canvas. Each stroke is classified on release.",
                        rect.width(),
                        rect.height()
                    ),
                );
            });
        });
    }
}

/// Run the dashboard application
pub fn run_dashboard(config: AppConfig, model: Box<dyn DigitModel>) -> Result<(), eframe::Error> {
    let options = DashboardApp::options(&config);
    let model_name = model.name().to_string();

    eframe::run_native(
        "Digit Sketch",
        options,
        Box::new(move |cc| {
            let repaint = cc.egui_ctx.clone();
            let controller = DigitController::with_notifier(
                model,
                config.preprocess,
                config.canvas.size(),
                Some(Box::new(move || repaint.request_repaint())),
            )?;
            Ok(Box::new(DashboardApp::new(controller, &config, model_name)))
        }),
    )
}
