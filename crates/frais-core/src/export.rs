//! Full export orchestration
//!
//! Renders the report, normalizes each line's attachment in line order,
//! merges everything into one document and picks the download filename.
//! Unreadable attachments never abort the export; they turn into warnings.

use std::collections::HashMap;

use crate::attachments::{normalize_line_attachments, AttachmentOutcome};
use crate::error::Result;
use crate::format::suggested_filename;
use crate::merge::merge_documents;
use crate::models::{Attachment, AttachmentId, ExpenseLine};
use crate::report::{render_report, ReportContext};

/// A finished export: the merged document plus everything the caller needs
/// to hand it over.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub pdf: Vec<u8>,
    /// Suggested download filename, `NDF_{name}_{month}_{year}.pdf`
    pub filename: String,
    /// One entry per attachment that had to be skipped
    pub warnings: Vec<String>,
}

/// Build the merged report document.
///
/// The report pages always come first, followed by one block of pages per
/// justification document in expense-line order.
pub fn build_merged_report(
    lines: &[ExpenseLine],
    attachments: &HashMap<AttachmentId, Attachment>,
    ctx: &ReportContext,
) -> Result<ExportOutput> {
    let report = render_report(lines, ctx)?;
    let mut parts = vec![report];
    let mut warnings = Vec::new();

    for outcome in normalize_line_attachments(lines, attachments) {
        match outcome {
            AttachmentOutcome::Normalized { pdf, .. } => parts.push(pdf),
            AttachmentOutcome::Skipped { filename, reason } => {
                warnings.push(format!("Justificatif ignoré ({}): {}", filename, reason));
            }
        }
    }

    let pdf = merge_documents(&parts)?;
    tracing::info!(
        lines = lines.len(),
        attachments = parts.len() - 1,
        skipped = warnings.len(),
        bytes = pdf.len(),
        "export assembled"
    );

    Ok(ExportOutput {
        pdf,
        filename: suggested_filename(ctx.user_name, ctx.today),
        warnings,
    })
}
