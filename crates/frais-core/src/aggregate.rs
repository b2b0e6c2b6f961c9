//! Category aggregation for the on-screen summary and the report totals row
//!
//! The renderer's totals row is fed by the same [`category_totals`] function
//! the summary table uses, so the two can never drift apart.

use serde::Serialize;

use crate::format::format_amount;
use crate::models::{Category, ExpenseLine};

/// Per-category subtotal
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
}

/// Derived totals over the current line list. Recomputed on demand, never
/// stored independently of the source records.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTotals {
    /// One entry per fixed category, in report column order
    pub by_category: Vec<CategoryTotal>,
    pub grand_total: f64,
}

impl CategoryTotals {
    /// Subtotal for one category
    pub fn amount_for(&self, category: Category) -> f64 {
        self.by_category
            .iter()
            .find(|t| t.category == category)
            .map(|t| t.total)
            .unwrap_or(0.0)
    }

    /// Formatted subtotal (`1 234,50`) for one category
    pub fn formatted_for(&self, category: Category) -> String {
        format_amount(self.amount_for(category))
    }

    /// Formatted grand total
    pub fn formatted_grand_total(&self) -> String {
        format_amount(self.grand_total)
    }
}

/// A stored amount that survives external bulk edits.
///
/// Non-finite or negative values contribute zero to every total and render
/// as a blank cell; they are logged, never raised.
pub fn sanitize_amount(amount: f64) -> Option<f64> {
    if amount.is_finite() && amount >= 0.0 {
        Some(amount)
    } else {
        tracing::warn!(amount, "ignoring malformed expense amount");
        None
    }
}

/// Reduce the current line list into per-category subtotals and a grand
/// total. An empty list yields all zeros.
pub fn category_totals(lines: &[ExpenseLine]) -> CategoryTotals {
    let mut by_category: Vec<CategoryTotal> = Category::ALL
        .iter()
        .map(|&category| CategoryTotal {
            category,
            total: 0.0,
        })
        .collect();

    for line in lines {
        if let Some(amount) = sanitize_amount(line.amount) {
            if let Some(entry) = by_category
                .iter_mut()
                .find(|t| t.category == line.category)
            {
                entry.total += amount;
            }
        }
    }

    let grand_total = by_category.iter().map(|t| t.total).sum();
    CategoryTotals {
        by_category,
        grand_total,
    }
}
