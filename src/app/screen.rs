//! Catalog screen state machine
//!
//! The screen starts in `Loading`, performs exactly one fetch when mounted,
//! and settles into `Success` or `Failure`. The fetch is bound to the
//! screen's lifetime: unmounting (or dropping) the screen cancels it and any
//! result that arrives afterwards is discarded.

use crate::types::{LoadState, Product};
use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct CatalogScreen {
    state: Arc<Mutex<LoadState>>,
    cancel: CancellationToken,
    mounted: bool,
}

impl Default for CatalogScreen {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(state: &Mutex<LoadState>) -> MutexGuard<'_, LoadState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CatalogScreen {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LoadState::Loading)),
            cancel: CancellationToken::new(),
            mounted: false,
        }
    }

    #[cfg(test)]
    pub fn is_mounted(&self) -> bool {
        self.mounted && !self.cancel.is_cancelled()
    }

    /// Start the one and only fetch for this screen. Later calls, and calls
    /// after unmount, are ignored and return false.
    ///
    /// `on_settled` runs after the state has transitioned; it never runs if
    /// the screen was torn down first.
    pub fn mount<F, E, S>(&mut self, runtime: &tokio::runtime::Handle, fetch: F, on_settled: S) -> bool
    where
        F: Future<Output = Result<Vec<Product>, E>> + Send + 'static,
        E: Display + Send + 'static,
        S: FnOnce() + Send + 'static,
    {
        if self.mounted || self.cancel.is_cancelled() {
            return false;
        }
        self.mounted = true;

        let state = self.state.clone();
        let token = self.cancel.clone();
        debug!("Catalog screen mounted, starting fetch");

        runtime.spawn(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Catalog fetch cancelled");
                    return;
                }
                result = fetch => result,
            };

            {
                let mut guard = lock(&state);
                if token.is_cancelled() {
                    debug!("Discarding catalog result after unmount");
                    return;
                }
                match &result {
                    Ok(products) => {
                        info!(count = products.len(), "Catalog loaded");
                        let duplicates = duplicate_ids(products);
                        if !duplicates.is_empty() {
                            warn!(?duplicates, "Catalog contains repeated product ids, using fallback keys");
                        }
                    }
                    Err(e) => warn!(error = %e, "Catalog fetch failed"),
                }
                guard.resolve(result);
            }

            on_settled();
        });
        true
    }

    /// Tear the screen down. An in-flight fetch is cancelled and its result,
    /// if it still arrives, is dropped.
    pub fn unmount(&mut self) {
        let _guard = lock(&self.state);
        if !self.cancel.is_cancelled() {
            debug!("Catalog screen unmounted");
            self.cancel.cancel();
        }
    }

    /// Borrow the current state for rendering.
    pub fn with_state<R>(&self, f: impl FnOnce(&LoadState) -> R) -> R {
        f(&lock(&self.state))
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> LoadState {
        self.with_state(LoadState::clone)
    }
}

impl Drop for CatalogScreen {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Ids that occur more than once, in first-repeat order.
pub fn duplicate_ids(products: &[Product]) -> Vec<i64> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    products
        .iter()
        .filter(|p| !seen.insert(p.id) && reported.insert(p.id))
        .map(|p| p.id)
        .collect()
}
