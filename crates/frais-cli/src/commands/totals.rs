//! `frais totals` - per-category totals for a session file

use std::path::Path;

use anyhow::Result;

use frais_core::CompanyDirectory;

use super::core::load_session;

pub fn cmd_totals(session_path: &Path, json: bool, directory: &CompanyDirectory) -> Result<()> {
    let session = load_session(session_path, directory)?;
    let totals = session.totals();

    if json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
        return Ok(());
    }

    println!(
        "📊 Totals for {} ({} lines)",
        session.user_name(),
        session.lines().len()
    );
    println!("   ─────────────────────────────────────────────");
    for entry in &totals.by_category {
        println!(
            "   {:<30} {:>12}",
            entry.category.label(),
            totals.formatted_for(entry.category)
        );
    }
    println!("   ─────────────────────────────────────────────");
    println!(
        "   {:<30} {:>12} {}",
        "TOTAL",
        totals.formatted_grand_total(),
        session.currency_symbol()
    );

    Ok(())
}
