//! Preview card for the intermediate 28x28 images

use egui::{RichText, Rounding, TextureHandle, Vec2};

use crate::dashboard::theme::ThemeColors;

/// Upload a grayscale image as a nearest-filtered texture
pub fn gray_texture(ctx: &egui::Context, name: &str, image: &image::GrayImage) -> TextureHandle {
    let (width, height) = image.dimensions();
    let color_image = egui::ColorImage::from_gray([width as usize, height as usize], image.as_raw());
    ctx.load_texture(name, color_image, egui::TextureOptions::NEAREST)
}

/// Titled frame showing `texture` scaled to `side` points, or a placeholder
pub fn preview_card(ui: &mut egui::Ui, title: &str, texture: Option<&TextureHandle>, side: f32) {
    egui::Frame::none()
        .fill(ThemeColors::BG_MEDIUM)
        .rounding(Rounding::same(8.0))
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                ui.label(RichText::new(title).size(12.0).color(ThemeColors::TEXT_MUTED));
                ui.add_space(6.0);

                match texture {
                    Some(texture) => {
                        ui.image((texture.id(), Vec2::splat(side)));
                    }
                    None => {
                        let (rect, _) = ui.allocate_exact_size(Vec2::splat(side), egui::Sense::hover());
                        ui.painter().rect_filled(rect, Rounding::same(4.0), ThemeColors::BG_DARK);
                        ui.painter().text(
                            rect.center(),
                            egui::Align2::CENTER_CENTER,
                            "No preview",
                            egui::FontId::proportional(11.0),
                            ThemeColors::TEXT_MUTED,
                        );
                    }
                }
            });
        });
}
