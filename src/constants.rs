//! Application constants and configuration

pub const APP_NAME: &str = "Product Catalog Viewer";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CATALOG_URL: &str = "https://fakestoreapi.com/products";
pub const USER_AGENT: &str = concat!("product-catalog-viewer/", env!("CARGO_PKG_VERSION"));

/// Upper bound for a single retry delay
pub const MAX_RETRY_DELAY_MS: u64 = 10_000;

/// Parallel image downloads
pub const IMAGE_FETCH_CONCURRENCY: usize = 8;
