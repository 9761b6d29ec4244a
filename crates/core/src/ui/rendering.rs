//! UI rendering helpers.
//!
//! Texture upload for photos and previews, size fitting, and the framed
//! image widget shared by the views.

use crate::image_processing::EncodedImage;
use eframe::egui;
use image::DynamicImage;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Converts a decoded image into egui's pixel format.
///
/// This is the expensive step; call it once per image, not per frame.
pub fn to_color_image(image: &DynamicImage) -> egui::ColorImage {
    let image_buffer = image.to_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    let pixels = image_buffer.as_flat_samples();
    egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice())
}

/// Largest size with the same aspect ratio that fits in `max`.
pub fn fit_size(image_size: egui::Vec2, max: egui::Vec2) -> egui::Vec2 {
    if image_size.x <= 0.0 || image_size.y <= 0.0 {
        return egui::Vec2::ZERO;
    }
    let scale = (max.x / image_size.x).min(max.y / image_size.y).min(1.0);
    image_size * scale
}

/// A texture bound to one encoded image, re-uploaded only when the image changes.
#[derive(Default)]
pub struct TextureSlot {
    key: Option<u64>,
    handle: Option<egui::TextureHandle>,
}

fn image_key(image: &EncodedImage) -> u64 {
    let mut hasher = DefaultHasher::new();
    image.data.hash(&mut hasher);
    hasher.finish()
}

impl TextureSlot {
    /// Makes the slot show `image`, or nothing when `None`.
    pub fn sync(&mut self, ctx: &egui::Context, name: &str, image: Option<&EncodedImage>) {
        let Some(image) = image else {
            self.clear();
            return;
        };
        let key = image_key(image);
        if self.key == Some(key) {
            return;
        }
        self.key = Some(key);
        self.handle = match image.decode() {
            Ok(decoded) => Some(ctx.load_texture(
                name,
                to_color_image(&decoded),
                egui::TextureOptions::LINEAR,
            )),
            Err(e) => {
                tracing::warn!("cannot display {}: {}", name, e);
                None
            }
        };
    }

    /// Uploads a live frame, replacing the previous one in place.
    pub fn set_frame(&mut self, ctx: &egui::Context, name: &str, frame: &DynamicImage) {
        let color_image = to_color_image(frame);
        if self.key.is_none() {
            if let Some(handle) = self.handle.as_mut() {
                handle.set(color_image, egui::TextureOptions::LINEAR);
                return;
            }
        }
        self.key = None;
        self.handle = Some(ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR));
    }

    pub fn clear(&mut self) {
        self.key = None;
        self.handle = None;
    }

    pub fn handle(&self) -> Option<&egui::TextureHandle> {
        self.handle.as_ref()
    }
}

/// Draws `texture` scaled to fit `max` with a thin border. Returns the response
/// so callers can react to clicks.
pub fn framed_image(
    ui: &mut egui::Ui,
    texture: &egui::TextureHandle,
    max: egui::Vec2,
    scale: f32,
) -> egui::Response {
    let size = fit_size(texture.size_vec2(), max) * scale;
    let response = ui.add(
        egui::Image::new(egui::load::SizedTexture::new(texture.id(), size))
            .sense(egui::Sense::click()),
    );
    ui.painter().rect_stroke(
        response.rect,
        4.0,
        egui::Stroke::new(1.0, egui::Color32::from_rgb(99, 102, 241)),
        egui::StrokeKind::Outside,
    );
    response
}
