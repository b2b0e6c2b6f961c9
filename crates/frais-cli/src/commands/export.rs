//! `frais export` - render and merge the full report PDF

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use frais_core::CompanyDirectory;

use super::core::{load_session, resolve_date};

pub fn cmd_export(
    session_path: &Path,
    output: Option<&Path>,
    date: Option<&str>,
    directory: &CompanyDirectory,
) -> Result<()> {
    let mut session = load_session(session_path, directory)?;
    let today = resolve_date(date)?;

    println!(
        "🧾 Exporting report for {} ({} lines)...",
        session.user_name(),
        session.lines().len()
    );

    let result = session.export_as_of(today)?.clone();
    let output_path = match output {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(&result.filename),
    };
    std::fs::write(&output_path, &result.pdf)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    for warning in &result.warnings {
        println!("   ⚠️  {}", warning);
    }

    let totals = session.totals();
    println!(
        "✅ Wrote {} ({} bytes, total {} {})",
        output_path.display(),
        result.pdf.len(),
        totals.formatted_grand_total(),
        session.currency_symbol()
    );

    Ok(())
}
