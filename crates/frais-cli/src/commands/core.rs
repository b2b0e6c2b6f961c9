//! Shared command utilities: company directory and session file loading
//!
//! A session file is a JSON document describing one report: the beneficiary,
//! the company, the expense lines and paths to justification documents.
//! Paths resolve relative to the session file itself.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use frais_core::{Category, CompanyDirectory, NewAttachment, NewExpenseLine, Session};

#[derive(Debug, Deserialize)]
pub struct SessionFile {
    pub user_name: String,
    pub company: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Raster signature path, relative to the session file
    pub signature: Option<String>,
    #[serde(default)]
    pub lines: Vec<SessionLine>,
}

fn default_currency() -> String {
    "€".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SessionLine {
    pub date: NaiveDate,
    pub supplier: String,
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub budget_code: Option<String>,
    /// Justification document path, relative to the session file
    pub attachment: Option<String>,
}

/// Built-in company directory, overlaid with a TOML file when given.
pub fn load_directory(companies_file: Option<&Path>) -> Result<CompanyDirectory> {
    match companies_file {
        Some(path) => CompanyDirectory::from_toml_file(path)
            .with_context(|| format!("Failed to load company directory {}", path.display())),
        None => Ok(CompanyDirectory::builtin()),
    }
}

/// Load a session file and populate a validated in-memory session.
pub fn load_session(path: &Path, directory: &CompanyDirectory) -> Result<Session> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file {}", path.display()))?;
    let file: SessionFile = serde_json::from_str(&text)
        .with_context(|| format!("Invalid session file {}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let company = directory.lookup(&file.company);
    let mut session = Session::new(file.user_name, company, file.currency);

    if let Some(rel) = &file.signature {
        let sig_path = base_dir.join(rel);
        let bytes = std::fs::read(&sig_path)
            .with_context(|| format!("Failed to read signature {}", sig_path.display()))?;
        session.set_signature(Some(bytes));
    }

    for (index, line) in file.lines.into_iter().enumerate() {
        let category: Category = line
            .category
            .parse()
            .map_err(|e: String| anyhow!(e))
            .with_context(|| format!("Line {}", index + 1))?;

        let attachment = match &line.attachment {
            Some(rel) => {
                let att_path = base_dir.join(rel);
                let bytes = std::fs::read(&att_path)
                    .with_context(|| format!("Failed to read attachment {}", att_path.display()))?;
                let filename = att_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| rel.clone());
                Some(NewAttachment { filename, bytes })
            }
            None => None,
        };

        session
            .add_line(NewExpenseLine {
                date: line.date,
                supplier: line.supplier,
                description: line.description,
                category,
                amount: line.amount,
                budget_code: line.budget_code,
                attachment,
            })
            .with_context(|| format!("Line {} rejected", index + 1))?;
    }

    Ok(session)
}

/// Parse an optional YYYY-MM-DD argument, defaulting to today.
pub fn resolve_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .context("Invalid --date format (use YYYY-MM-DD)"),
        None => Ok(chrono::Local::now().date_naive()),
    }
}
