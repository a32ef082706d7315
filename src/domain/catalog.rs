//! Catalog tree entities
//!
//! Mirrors the backend navigation payload: a three-level hierarchy of
//! super-categories, product lines, and categories. Ordering within each
//! level is insertion order from the backend and is preserved for display.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Backend database id of a super-category.
pub type SuperCategoryId = i64;

/// Backend database id of a product line.
pub type ProductLineId = i64;

/// Backend database id of a category.
pub type CategoryId = i64;

/// Top level of the catalog tree (e.g. "Phones").
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SuperCategory {
    pub id: SuperCategoryId,
    pub name: String,
    pub product_lines: Vec<ProductLine>,
}

/// Middle level of the catalog tree (e.g. "iPhone").
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductLine {
    pub id: ProductLineId,
    pub name: String,
    pub categories: Vec<Category>,
}

/// Leaf level of the catalog tree (e.g. "iPhone 13").
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub is_active: bool,
}

impl SuperCategory {
    /// Ids of every product line directly under this super-category.
    pub fn product_line_ids(&self) -> impl Iterator<Item = ProductLineId> + '_ {
        self.product_lines.iter().map(|line| line.id)
    }
}

impl ProductLine {
    pub fn category_ids(&self) -> impl Iterator<Item = CategoryId> + '_ {
        self.categories.iter().map(|category| category.id)
    }
}
