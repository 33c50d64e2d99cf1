//! Common types and data structures

use serde::{Deserialize, Serialize};

/// One catalog entry as served by the remote endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub image: String,
    pub rating: Rating,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub rate: f64,
    pub count: i64,
}

/// What the catalog screen is currently showing
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState {
    #[default]
    Loading,
    Success(Vec<Product>),
    Failure(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    /// Settle a pending load. Only `Loading` can transition; returns false
    /// and leaves the state untouched otherwise.
    pub fn resolve<E: std::fmt::Display>(&mut self, result: Result<Vec<Product>, E>) -> bool {
        if !self.is_loading() {
            return false;
        }
        *self = match result {
            Ok(products) => LoadState::Success(products),
            Err(e) => LoadState::Failure(e.to_string()),
        };
        true
    }
}

#[cfg(test)]
pub(crate) fn sample_product(id: i64, title: &str) -> Product {
    Product {
        id,
        title: title.to_string(),
        price: 10.0,
        description: "d".to_string(),
        category: "c".to_string(),
        image: "http://x/i.png".to_string(),
        rating: Rating { rate: 4.0, count: 2 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_catalog_entry() {
        let json = r#"[{"id":1,"title":"Shirt","price":10,"description":"d","category":"c",
            "image":"http://x/i.png","rating":{"rate":4,"count":2}}]"#;
        let products: Vec<Product> = serde_json::from_str(json).unwrap();
        assert_eq!(products, vec![sample_product(1, "Shirt")]);
    }

    #[test]
    fn rejects_entry_without_rating() {
        let json = r#"[{"id":1,"title":"Shirt","price":10,"description":"d","category":"c","image":"u"}]"#;
        assert!(serde_json::from_str::<Vec<Product>>(json).is_err());
    }

    #[test]
    fn resolve_is_one_shot() {
        let mut state = LoadState::default();
        assert!(state.is_loading());

        assert!(state.resolve(Ok::<_, String>(vec![])));
        assert_eq!(state, LoadState::Success(vec![]));

        assert!(!state.resolve(Err::<Vec<Product>, _>("late")));
        assert_eq!(state, LoadState::Success(vec![]));
    }

    #[test]
    fn resolve_failure_keeps_message_verbatim() {
        let mut state = LoadState::Loading;
        assert!(state.resolve(Err::<Vec<Product>, _>("Network Error")));
        assert_eq!(state, LoadState::Failure("Network Error".to_string()));
    }
}
