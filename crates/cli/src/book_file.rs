//! Book summaries stored as TOML files

use anyhow::{Context, Result};
use keypoint_core::{AppError, BookSummary, Chapter, Validator};
use keypoint_store::Product;
use serde::Deserialize;
use std::path::Path;

/// Store listing for the book's purchase id
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProductEntry {
    pub display_name: String,
    pub display_price: String,
    #[serde(default)]
    pub description: String,
}

/// On-disk shape of a book
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BookFile {
    pub title: String,
    #[serde(default)]
    pub image_ref: String,
    pub purchase_id: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    pub product: Option<ProductEntry>,
}

impl BookFile {
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse book file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read book file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid book file {}", path.display()))
    }

    /// Builds the validated book and the product the demo store offers for it
    pub fn into_parts(self) -> Result<(BookSummary, Product)> {
        let product = match self.product {
            Some(entry) => Product::new(&self.purchase_id, entry.display_name, entry.display_price)
                .with_description(entry.description),
            None => Product::new(&self.purchase_id, "Keypoint Premium", "$9.99"),
        };

        let book = BookSummary::new(self.title, self.image_ref, self.chapters, self.purchase_id);
        if let Err(details) = book.validate() {
            return Err(AppError::InvalidBook { details }.into());
        }
        Ok((book, product))
    }
}
