//! Amount and date presentation helpers
//!
//! Amounts are rendered the French way everywhere they are shown: integer
//! part grouped by thousands with a space, comma as decimal separator,
//! always two decimal digits. The currency symbol is appended separately by
//! callers and never participates in formatting.

use chrono::{Datelike, NaiveDate};

/// French month names, indexed by `month0`
pub const MONTHS_FR: [&str; 12] = [
    "Janvier",
    "Février",
    "Mars",
    "Avril",
    "Mai",
    "Juin",
    "Juillet",
    "Août",
    "Septembre",
    "Octobre",
    "Novembre",
    "Décembre",
];

/// Format a non-negative amount as `1 234,50`.
///
/// Non-finite or negative values fall back to `0,00`; such values only
/// appear after an external bulk edit and are treated as zero by the whole
/// pipeline.
pub fn format_amount(amount: f64) -> String {
    let amount = if amount.is_finite() && amount >= 0.0 {
        amount
    } else {
        0.0
    };
    let cents = (amount * 100.0).round() as u64;
    let int_part = cents / 100;
    let dec_part = cents % 100;

    let digits = int_part.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    format!("{},{:02}", grouped, dec_part)
}

/// French month name for a date
pub fn month_name_fr(date: NaiveDate) -> &'static str {
    MONTHS_FR[date.month0() as usize]
}

/// Day/month/year display used in the table and signature block
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Suggested filename for the merged report download:
/// `NDF_Jean_Dupont_Juin_2024.pdf`
pub fn suggested_filename(user_name: &str, today: NaiveDate) -> String {
    let name = user_name.trim().replace(' ', "_");
    format!(
        "NDF_{}_{}_{}.pdf",
        name,
        month_name_fr(today),
        today.year()
    )
}
