//! Reusable UI components
//!
//! This module contains standalone UI components that can be used
//! throughout the application.

use crate::theme;
use crate::types::Product;
use crate::utils::format_number;
use eframe::egui;

/// Per-card styling chosen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardStyle {
    pub border_color: egui::Color32,
}

impl Default for CardStyle {
    fn default() -> Self {
        Self {
            border_color: theme::BORDER_DEFAULT,
        }
    }
}

/// Presentational block for one product. Holds only display text, so two
/// cards built from the same product and style are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductCard {
    pub title: String,
    pub image_url: String,
    pub price_text: String,
    pub category_text: String,
    pub description_text: String,
    pub rating_text: String,
    pub style: CardStyle,
}

impl ProductCard {
    pub fn new(product: &Product, style: CardStyle) -> Self {
        Self {
            title: product.title.clone(),
            image_url: product.image.clone(),
            price_text: format!("Price: ${}", format_number(product.price)),
            category_text: format!("Category: {}", product.category),
            description_text: format!("Description: {}", product.description),
            rating_text: format!(
                "Rating: {} (Count: {})",
                format_number(product.rating.rate),
                product.rating.count
            ),
            style,
        }
    }

    /// Paint the card. `image` is the product image if it has been loaded.
    pub fn show(&self, ui: &mut egui::Ui, image: Option<&egui::TextureHandle>) -> egui::Response {
        egui::Frame::new()
            .fill(theme::BG_ELEVATED)
            .stroke(egui::Stroke::new(theme::STROKE_CARD, self.style.border_color))
            .corner_radius(theme::RADIUS_LARGE)
            .inner_margin(egui::Margin::same(theme::SPACING_LG as i8))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical_centered(|ui| match image {
                    Some(tex) => {
                        ui.add(
                            egui::Image::new(tex)
                                .max_size(egui::vec2(theme::CARD_IMAGE_SIZE, theme::CARD_IMAGE_SIZE))
                                .maintain_aspect_ratio(true),
                        );
                    }
                    None => image_placeholder(ui),
                });
                ui.add_space(theme::SPACING_MD);

                ui.label(
                    egui::RichText::new(&self.title)
                        .strong()
                        .size(theme::FONT_HEADING)
                        .color(theme::TEXT_PRIMARY),
                );
                ui.label(egui::RichText::new(&self.price_text).color(theme::ACCENT));
                ui.label(egui::RichText::new(&self.category_text).color(theme::TEXT_MUTED));
                ui.label(egui::RichText::new(&self.description_text).color(theme::TEXT_SECONDARY));
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(egui_phosphor::regular::STAR).color(theme::STAR_FILLED),
                    );
                    ui.label(egui::RichText::new(&self.rating_text).color(theme::TEXT_MUTED));
                });
            })
            .response
    }
}

fn image_placeholder(ui: &mut egui::Ui) {
    let size = egui::vec2(theme::CARD_IMAGE_SIZE, theme::CARD_IMAGE_SIZE);
    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
    if ui.is_rect_visible(rect) {
        let painter = ui.painter();
        painter.rect_filled(rect, theme::RADIUS_DEFAULT, theme::BG_SURFACE);
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            egui_phosphor::regular::IMAGE,
            egui::FontId::proportional(theme::CARD_IMAGE_SIZE * 0.3),
            theme::TEXT_DIM,
        );
    }
}
