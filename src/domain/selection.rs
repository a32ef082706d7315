//! Tri-state catalog selection
//!
//! Holds the catalog tree (fetched once from the backend) and the current
//! selection over it. Super-category check state is derived from
//! product-line membership, never stored, so the checked/indeterminate pair
//! can never disagree with the underlying sets. All operations are total
//! functions over in-memory state; no network I/O happens here.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::catalog::{CategoryId, ProductLineId, SuperCategory, SuperCategoryId};
use crate::domain::job::SyncSelection;

/// The two selection axes. A super-category has no direct membership; its
/// state is always derived from `selected_product_line_ids`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub selected_category_ids: HashSet<CategoryId>,
    pub selected_product_line_ids: HashSet<ProductLineId>,
}

impl SelectionState {
    pub fn is_empty(&self) -> bool {
        self.selected_category_ids.is_empty() && self.selected_product_line_ids.is_empty()
    }
}

/// In-memory model of the selectable catalog with tri-state aggregation.
#[derive(Debug, Default)]
pub struct SelectionTree {
    tree: Vec<SuperCategory>,
    state: SelectionState,
}

impl SelectionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached tree wholesale. No merge semantics: a second call
    /// fully overwrites the first. Existing selections are kept even when
    /// they reference ids absent from the new tree; stale ids are harmless
    /// because mutations on unknown ids are no-ops and the backend ignores
    /// ids it does not know.
    pub fn load(&mut self, tree: Vec<SuperCategory>) {
        debug!(super_categories = tree.len(), "catalog tree loaded");
        self.tree = tree;
    }

    pub fn tree(&self) -> &[SuperCategory] {
        &self.tree
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Snapshot of the current selection in the shape the backend expects.
    /// Ids are sorted so identical selections produce identical requests.
    pub fn selection(&self) -> SyncSelection {
        let mut category_ids: Vec<CategoryId> =
            self.state.selected_category_ids.iter().copied().collect();
        let mut product_line_ids: Vec<ProductLineId> =
            self.state.selected_product_line_ids.iter().copied().collect();
        category_ids.sort_unstable();
        product_line_ids.sort_unstable();
        SyncSelection { category_ids, product_line_ids }
    }

    /// Empties both selection axes. The loaded tree is untouched.
    pub fn clear(&mut self) {
        self.state.selected_category_ids.clear();
        self.state.selected_product_line_ids.clear();
    }

    /// Flips membership of a category. Unknown ids are a silent no-op.
    pub fn toggle_category(&mut self, id: CategoryId) -> &SelectionState {
        if self.category_exists(id) && !self.state.selected_category_ids.remove(&id) {
            self.state.selected_category_ids.insert(id);
        }
        &self.state
    }

    /// Flips membership of a product line. Unknown ids are a silent no-op.
    pub fn toggle_product_line(&mut self, id: ProductLineId) -> &SelectionState {
        if self.product_line_exists(id) && !self.state.selected_product_line_ids.remove(&id) {
            self.state.selected_product_line_ids.insert(id);
        }
        &self.state
    }

    /// Bulk-selects or deselects every product line under a super-category.
    /// Idempotent: repeating the call with the same `checked` value changes
    /// nothing after the first.
    pub fn toggle_super_category(
        &mut self,
        id: SuperCategoryId,
        checked: bool,
    ) -> &SelectionState {
        let line_ids: Vec<ProductLineId> = match self.find_super_category(id) {
            Some(super_cat) => super_cat.product_line_ids().collect(),
            None => return &self.state,
        };
        for line_id in line_ids {
            if checked {
                self.state.selected_product_line_ids.insert(line_id);
            } else {
                self.state.selected_product_line_ids.remove(&line_id);
            }
        }
        &self.state
    }

    /// True when every product line under the super-category is selected.
    /// A super-category with no product lines is never considered selected.
    pub fn is_super_category_selected(&self, id: SuperCategoryId) -> bool {
        match self.find_super_category(id) {
            Some(super_cat) => {
                !super_cat.product_lines.is_empty()
                    && super_cat
                        .product_line_ids()
                        .all(|line_id| self.state.selected_product_line_ids.contains(&line_id))
            }
            None => false,
        }
    }

    /// True when some but not all product lines under the super-category are
    /// selected. Never true simultaneously with `is_super_category_selected`.
    pub fn is_super_category_indeterminate(&self, id: SuperCategoryId) -> bool {
        match self.find_super_category(id) {
            Some(super_cat) => {
                let selected = super_cat
                    .product_line_ids()
                    .filter(|line_id| self.state.selected_product_line_ids.contains(line_id))
                    .count();
                selected > 0 && selected < super_cat.product_lines.len()
            }
            None => false,
        }
    }

    /// Bulk-selects every category whose name matches at least one include
    /// term and no exclude term (case-insensitive substring match at any
    /// depth). Replace semantics: the qualifying ids replace the category
    /// selection entirely and the product-line selection is cleared, so the
    /// result is a pure function of tree and terms.
    pub fn apply_preset(
        &mut self,
        include_terms: &[String],
        exclude_terms: &[String],
    ) -> &SelectionState {
        let includes: Vec<String> = include_terms.iter().map(|t| t.to_lowercase()).collect();
        let excludes: Vec<String> = exclude_terms.iter().map(|t| t.to_lowercase()).collect();

        let mut qualifying = HashSet::new();
        for super_cat in &self.tree {
            for line in &super_cat.product_lines {
                for category in &line.categories {
                    let name = category.name.to_lowercase();
                    let included = includes.iter().any(|term| name.contains(term));
                    let excluded = excludes.iter().any(|term| name.contains(term));
                    if included && !excluded {
                        qualifying.insert(category.id);
                    }
                }
            }
        }

        debug!(matched = qualifying.len(), "preset applied to catalog");
        self.state.selected_category_ids = qualifying;
        self.state.selected_product_line_ids.clear();
        &self.state
    }

    fn find_super_category(&self, id: SuperCategoryId) -> Option<&SuperCategory> {
        self.tree.iter().find(|super_cat| super_cat.id == id)
    }

    fn product_line_exists(&self, id: ProductLineId) -> bool {
        self.tree
            .iter()
            .flat_map(|super_cat| &super_cat.product_lines)
            .any(|line| line.id == id)
    }

    fn category_exists(&self, id: CategoryId) -> bool {
        self.tree
            .iter()
            .flat_map(|super_cat| &super_cat.product_lines)
            .flat_map(|line| &line.categories)
            .any(|category| category.id == id)
    }
}
