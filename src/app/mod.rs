//! App module - contains the main application state and logic

mod images;
mod screen;
mod views;

pub use screen::CatalogScreen;

use crate::catalog::CatalogClient;
use crate::settings::Settings;
use crate::theme;
use crate::utils::get_cache_dir;
use eframe::egui;
use images::ImageCache;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    pub(crate) screen: CatalogScreen,
    pub(crate) images: ImageCache,
    pub(crate) settings: Settings,
    pub(crate) runtime: tokio::runtime::Runtime,
    pub(crate) cancel: CancellationToken,
    pub(crate) data_dir: PathBuf,
    pub(crate) window_pos: Option<egui::Pos2>,
    pub(crate) window_size: Option<egui::Vec2>,
    pub(crate) needs_center: bool,
}

// ============================================================================
// APP INITIALIZATION & HELPERS
// ============================================================================

impl App {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        runtime: tokio::runtime::Runtime,
        settings: Settings,
        data_dir: PathBuf,
    ) -> Self {
        // Force dark theme
        cc.egui_ctx.set_theme(egui::Theme::Dark);

        // Add Phosphor icons font
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        theme::apply_visuals(&cc.egui_ctx);

        let cache_dir = get_cache_dir(&data_dir);
        std::fs::create_dir_all(&cache_dir).ok();

        let cancel = CancellationToken::new();
        let images = ImageCache::new(&cache_dir, runtime.handle().clone(), cancel.child_token());

        let mut app = Self {
            screen: CatalogScreen::new(),
            images,
            settings,
            runtime,
            cancel,
            data_dir,
            window_pos: None,
            window_size: None,
            needs_center: false,
        };
        app.mount_screen(&cc.egui_ctx);
        app
    }

    /// Mount the catalog screen: one fetch, repaint when it settles.
    fn mount_screen(&mut self, ctx: &egui::Context) {
        let ctx = ctx.clone();
        let repaint = move || ctx.request_repaint();
        let handle = self.runtime.handle().clone();

        match CatalogClient::from_settings(&self.settings) {
            Ok(client) => {
                info!(url = client.url(), "Loading catalog");
                self.screen
                    .mount(&handle, async move { client.fetch().await }, repaint);
            }
            Err(e) => {
                // The client could not even be built; surface it like any other fetch failure.
                error!(error = %e, "Failed to create catalog client");
                let message = e.to_string();
                self.screen
                    .mount(&handle, async move { Err::<Vec<_>, _>(message) }, repaint);
            }
        }
    }

    pub fn save_settings(&mut self) {
        self.settings.window_x = self.window_pos.map(|p| p.x);
        self.settings.window_y = self.window_pos.map(|p| p.y);
        self.settings.window_w = self.window_size.map(|s| s.x);
        self.settings.window_h = self.window_size.map(|s| s.y);
        self.settings.save(&self.data_dir);
    }

    /// Tear down the screen and stop background work.
    pub fn shutdown(&mut self) {
        self.screen.unmount();
        self.cancel.cancel();
    }

    pub(crate) fn show_catalog(&mut self, ui: &mut egui::Ui) {
        let view = self.screen.with_state(views::build_view);
        views::show_view(ui, &view, &mut self.images);
    }
}
