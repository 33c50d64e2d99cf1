//! View rendering (spinner, error, product list)
//!
//! `build_view` turns the current `LoadState` into a plain description of
//! what to draw; `show_view` paints it. Keeping the two apart means the same
//! state always yields the same tree.

use super::images::ImageCache;
use crate::theme;
use crate::types::{LoadState, Product};
use crate::ui::components::{CardStyle, ProductCard};
use eframe::egui;
use std::collections::HashMap;

/// Identity of a card in the list. `occurrence` is 0 unless the feed repeats
/// the id, in which case later copies get 1, 2, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CardKey {
    pub id: i64,
    pub occurrence: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub key: CardKey,
    pub card: ProductCard,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenView {
    Spinner { color: egui::Color32 },
    Error { text: String },
    List { entries: Vec<ListEntry> },
}

/// Border color by id parity: even ids get one color, odd ids the other.
pub fn border_for_id(id: i64) -> egui::Color32 {
    if id.rem_euclid(2) == 0 {
        theme::CARD_BORDER_EVEN
    } else {
        theme::CARD_BORDER_ODD
    }
}

pub fn build_view(state: &LoadState) -> ScreenView {
    match state {
        LoadState::Loading => ScreenView::Spinner {
            color: theme::SPINNER,
        },
        LoadState::Failure(message) => ScreenView::Error {
            text: format!("Error: {}", message),
        },
        LoadState::Success(products) => ScreenView::List {
            entries: list_entries(products),
        },
    }
}

fn list_entries(products: &[Product]) -> Vec<ListEntry> {
    let mut seen: HashMap<i64, usize> = HashMap::new();
    products
        .iter()
        .map(|product| {
            let count = seen.entry(product.id).or_insert(0);
            let key = CardKey {
                id: product.id,
                occurrence: *count,
            };
            *count += 1;
            let style = CardStyle {
                border_color: border_for_id(product.id),
            };
            ListEntry {
                key,
                card: ProductCard::new(product, style),
            }
        })
        .collect()
}

pub fn show_view(ui: &mut egui::Ui, view: &ScreenView, images: &mut ImageCache) {
    match view {
        ScreenView::Spinner { color } => {
            ui.centered_and_justified(|ui| {
                ui.add(egui::Spinner::new().size(theme::SPINNER_SIZE).color(*color));
            });
        }
        ScreenView::Error { text } => {
            ui.centered_and_justified(|ui| {
                ui.label(
                    egui::RichText::new(text)
                        .size(theme::FONT_BODY)
                        .color(theme::STATUS_ERROR),
                );
            });
        }
        ScreenView::List { entries } => {
            let ctx = ui.ctx().clone();
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .id_salt("catalog_scroll")
                .show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.set_max_width(theme::LIST_MAX_WIDTH);
                        ui.add_space(theme::SPACING_LG);
                        for entry in entries {
                            ui.push_id(entry.key, |ui| {
                                let texture = images.texture(&ctx, &entry.card.image_url);
                                entry.card.show(ui, texture.as_ref());
                            });
                            ui.add_space(theme::SPACING_MD);
                        }
                    });
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::sample_product;

    fn ids(view: &ScreenView) -> Vec<i64> {
        match view {
            ScreenView::List { entries } => entries.iter().map(|e| e.key.id).collect(),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn loading_shows_spinner() {
        assert_eq!(
            build_view(&LoadState::Loading),
            ScreenView::Spinner {
                color: theme::SPINNER
            }
        );
    }

    #[test]
    fn failure_shows_prefixed_message() {
        let view = build_view(&LoadState::Failure("Network Error".into()));
        assert_eq!(
            view,
            ScreenView::Error {
                text: "Error: Network Error".into()
            }
        );
    }

    #[test]
    fn single_odd_product_scenario() {
        let view = build_view(&LoadState::Success(vec![sample_product(1, "Shirt")]));
        let ScreenView::List { entries } = view else {
            panic!("expected list");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].card.style.border_color, theme::CARD_BORDER_ODD);
        assert_eq!(entries[0].card.price_text, "Price: $10");
    }

    #[test]
    fn empty_catalog_renders_no_cards() {
        assert_eq!(
            build_view(&LoadState::Success(vec![])),
            ScreenView::List { entries: vec![] }
        );
    }

    #[test]
    fn one_card_per_product_in_order() {
        let products: Vec<Product> = [7, 3, 4, 1, 10]
            .iter()
            .map(|&id| sample_product(id, "p"))
            .collect();
        let view = build_view(&LoadState::Success(products));
        assert_eq!(ids(&view), vec![7, 3, 4, 1, 10]);
    }

    #[test]
    fn border_alternates_by_parity() {
        for id in -4..=20i64 {
            let expected = if id % 2 == 0 {
                theme::CARD_BORDER_EVEN
            } else {
                theme::CARD_BORDER_ODD
            };
            assert_eq!(border_for_id(id), expected, "id {}", id);
        }
        assert_ne!(theme::CARD_BORDER_EVEN, theme::CARD_BORDER_ODD);
    }

    #[test]
    fn building_twice_is_identical() {
        let state = LoadState::Success(vec![sample_product(1, "a"), sample_product(2, "b")]);
        assert_eq!(build_view(&state), build_view(&state));
    }

    #[test]
    fn repeated_ids_get_fallback_keys() {
        let state = LoadState::Success(vec![
            sample_product(5, "a"),
            sample_product(6, "b"),
            sample_product(5, "c"),
            sample_product(5, "d"),
        ]);
        let ScreenView::List { entries } = build_view(&state) else {
            panic!("expected list");
        };
        let keys: Vec<CardKey> = entries.iter().map(|e| e.key).collect();
        assert_eq!(
            keys,
            vec![
                CardKey { id: 5, occurrence: 0 },
                CardKey { id: 6, occurrence: 0 },
                CardKey { id: 5, occurrence: 1 },
                CardKey { id: 5, occurrence: 2 },
            ]
        );
        assert_eq!(entries[2].card.title, "c");
    }

    #[test]
    fn every_view_renders_headless() {
        let dir = tempfile::tempdir().unwrap();
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let token = tokio_util::sync::CancellationToken::new();
        token.cancel();
        let mut images = ImageCache::new(dir.path(), rt.handle().clone(), token);

        let views = [
            build_view(&LoadState::Loading),
            build_view(&LoadState::Failure("boom".into())),
            build_view(&LoadState::Success(vec![sample_product(1, "a"), sample_product(1, "b")])),
        ];
        let ctx = egui::Context::default();
        for view in &views {
            let _ = ctx.run(egui::RawInput::default(), |ctx| {
                egui::CentralPanel::default().show(ctx, |ui| show_view(ui, view, &mut images));
            });
        }
    }
}
