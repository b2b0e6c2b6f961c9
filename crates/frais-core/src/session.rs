//! In-memory expense session
//!
//! Owns the line list, the attachment store and the export cache. Every
//! mutation drops the cached export, so a download after any edit always
//! reflects the current state.

use std::collections::HashMap;

use chrono::{Local, NaiveDate};

use crate::aggregate::{category_totals, CategoryTotals};
use crate::attachments::{
    compress_image, COMPRESSION_FLOOR_QUALITY, COMPRESSION_START_QUALITY,
    COMPRESSION_THRESHOLD_BYTES,
};
use crate::error::{Error, Result};
use crate::export::{build_merged_report, ExportOutput};
use crate::models::{
    Attachment, AttachmentId, AttachmentKind, CompanyProfile, ExpenseLine, NewAttachment,
    NewExpenseLine,
};
use crate::report::ReportContext;

#[derive(Debug)]
pub struct Session {
    user_name: String,
    company: CompanyProfile,
    currency_symbol: String,
    signature: Option<Vec<u8>>,
    lines: Vec<ExpenseLine>,
    attachments: HashMap<AttachmentId, Attachment>,
    next_attachment_id: AttachmentId,
    cached_export: Option<ExportOutput>,
}

impl Session {
    pub fn new(
        user_name: impl Into<String>,
        company: CompanyProfile,
        currency_symbol: impl Into<String>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            company,
            currency_symbol: currency_symbol.into(),
            signature: None,
            lines: Vec::new(),
            attachments: HashMap::new(),
            next_attachment_id: 1,
            cached_export: None,
        }
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn company(&self) -> &CompanyProfile {
        &self.company
    }

    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    pub fn lines(&self) -> &[ExpenseLine] {
        &self.lines
    }

    pub fn attachment(&self, id: AttachmentId) -> Option<&Attachment> {
        self.attachments.get(&id)
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }

    /// Validate and append a line; stores its attachment if one came with
    /// it. Rejection leaves the session untouched.
    pub fn add_line(&mut self, new: NewExpenseLine) -> Result<()> {
        let errors = new.validation_errors();
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }

        let attachment_id = match new.attachment {
            Some(upload) => Some(self.store_attachment(upload)?),
            None => None,
        };

        self.lines.push(ExpenseLine {
            date: new.date,
            supplier: new.supplier,
            description: new.description,
            category: new.category,
            amount: new.amount,
            budget_code: new.budget_code,
            attachment_id,
        });
        self.invalidate_export();
        tracing::debug!(lines = self.lines.len(), "expense line added");
        Ok(())
    }

    fn store_attachment(&mut self, upload: NewAttachment) -> Result<AttachmentId> {
        let kind = AttachmentKind::from_filename(&upload.filename)
            .ok_or_else(|| Error::UnsupportedAttachment(upload.filename.clone()))?;

        // Images are compressed once at upload so the session never holds
        // multi-megabyte photos.
        let bytes = match kind {
            AttachmentKind::Image => compress_image(
                &upload.bytes,
                COMPRESSION_THRESHOLD_BYTES,
                COMPRESSION_START_QUALITY,
                COMPRESSION_FLOOR_QUALITY,
            ),
            AttachmentKind::Pdf => upload.bytes,
        };

        let id = self.next_attachment_id;
        self.next_attachment_id += 1;
        self.attachments.insert(
            id,
            Attachment {
                id,
                filename: upload.filename,
                kind,
                bytes,
            },
        );
        Ok(id)
    }

    /// Replace the whole line list, as after an external bulk edit. Lines
    /// keep their attachment references; orphaned attachments stay stored
    /// and are simply never merged.
    pub fn replace_lines(&mut self, lines: Vec<ExpenseLine>) {
        self.lines = lines;
        self.invalidate_export();
    }

    /// Drop every line and every attachment.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.attachments.clear();
        self.invalidate_export();
    }

    pub fn set_company(&mut self, company: CompanyProfile) {
        self.company = company;
        self.invalidate_export();
    }

    pub fn set_currency_symbol(&mut self, symbol: impl Into<String>) {
        self.currency_symbol = symbol.into();
        self.invalidate_export();
    }

    pub fn set_signature(&mut self, signature: Option<Vec<u8>>) {
        self.signature = signature;
        self.invalidate_export();
    }

    pub fn totals(&self) -> CategoryTotals {
        category_totals(&self.lines)
    }

    /// Cached export, if the session has not changed since it was built.
    pub fn last_export(&self) -> Option<&ExportOutput> {
        self.cached_export.as_ref()
    }

    /// Build (or reuse) the merged export using today's date.
    pub fn export(&mut self) -> Result<&ExportOutput> {
        self.export_as_of(Local::now().date_naive())
    }

    /// Build (or reuse) the merged export for a given reference date.
    pub fn export_as_of(&mut self, today: NaiveDate) -> Result<&ExportOutput> {
        if self.cached_export.is_none() {
            let ctx = ReportContext {
                user_name: &self.user_name,
                company: &self.company,
                currency_symbol: &self.currency_symbol,
                signature: self.signature.as_deref(),
                today,
            };
            let output = build_merged_report(&self.lines, &self.attachments, &ctx)?;
            self.cached_export = Some(output);
        } else {
            tracing::debug!("reusing cached export");
        }
        // Populated just above when absent.
        self.cached_export
            .as_ref()
            .ok_or_else(|| Error::InvalidData("export cache empty".to_string()))
    }

    fn invalidate_export(&mut self) {
        self.cached_export = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use std::io::Cursor;

    fn session() -> Session {
        Session::new("Jean Dupont", CompanyProfile::plain("IFEA SAS"), "€")
    }

    fn new_line(category: Category, amount: f64) -> NewExpenseLine {
        NewExpenseLine {
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            supplier: "SNCF".to_string(),
            description: "Paris-Lyon".to_string(),
            category,
            amount,
            budget_code: None,
            attachment: None,
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([0, 80, 0]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageOutputFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_add_line_and_totals() {
        let mut s = session();
        s.add_line(new_line(Category::Telephone, 50.0)).unwrap();
        s.add_line(new_line(Category::Divers, 10.5)).unwrap();
        assert_eq!(s.lines().len(), 2);
        assert_eq!(s.totals().formatted_grand_total(), "60,50");
    }

    #[test]
    fn test_invalid_line_is_rejected_whole() {
        let mut s = session();
        let mut bad = new_line(Category::Divers, 0.0);
        bad.supplier = String::new();
        let err = s.add_line(bad).unwrap_err();
        match err {
            Error::Validation(fields) => assert_eq!(fields.len(), 2),
            other => panic!("expected validation error, got {}", other),
        }
        assert!(s.lines().is_empty());
        assert_eq!(s.attachment_count(), 0);
    }

    #[test]
    fn test_unsupported_attachment_extension_rejected() {
        let mut s = session();
        let mut line = new_line(Category::Divers, 5.0);
        line.attachment = Some(NewAttachment {
            filename: "notes.txt".to_string(),
            bytes: vec![1, 2, 3],
        });
        assert!(s.add_line(line).is_err());
        assert!(s.lines().is_empty());
    }

    #[test]
    fn test_attachment_gets_fresh_id() {
        let mut s = session();
        for _ in 0..2 {
            let mut line = new_line(Category::Divers, 5.0);
            line.attachment = Some(NewAttachment {
                filename: "recu.png".to_string(),
                bytes: png_bytes(40, 40),
            });
            s.add_line(line).unwrap();
        }
        // Same filename twice still yields two distinct attachments.
        assert_eq!(s.attachment_count(), 2);
        let ids: Vec<_> = s.lines().iter().filter_map(|l| l.attachment_id).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_export_is_cached_until_mutation() {
        let mut s = session();
        s.add_line(new_line(Category::Hotel, 100.0)).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();

        let first = s.export_as_of(today).unwrap().pdf.clone();
        assert!(s.last_export().is_some());
        let second = s.export_as_of(today).unwrap().pdf.clone();
        assert_eq!(first, second);

        s.add_line(new_line(Category::Divers, 1.0)).unwrap();
        assert!(s.last_export().is_none());
    }

    #[test]
    fn test_every_mutation_invalidates_cache() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();
        let mutations: Vec<fn(&mut Session)> = vec![
            |s| s.replace_lines(Vec::new()),
            |s| s.clear(),
            |s| s.set_company(CompanyProfile::plain("GIE IFEA")),
            |s| s.set_currency_symbol("CHF"),
            |s| s.set_signature(None),
        ];
        for mutate in mutations {
            let mut s = session();
            s.add_line(new_line(Category::Divers, 2.0)).unwrap();
            s.export_as_of(today).unwrap();
            assert!(s.last_export().is_some());
            mutate(&mut s);
            assert!(s.last_export().is_none());
        }
    }

    #[test]
    fn test_clear_drops_lines_and_attachments() {
        let mut s = session();
        let mut line = new_line(Category::Divers, 5.0);
        line.attachment = Some(NewAttachment {
            filename: "recu.png".to_string(),
            bytes: png_bytes(40, 40),
        });
        s.add_line(line).unwrap();
        s.clear();
        assert!(s.lines().is_empty());
        assert_eq!(s.attachment_count(), 0);
    }

    #[test]
    fn test_export_filename_follows_period() {
        let mut s = session();
        s.add_line(new_line(Category::Transport, 75.0)).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 11, 3).unwrap();
        let output = s.export_as_of(today).unwrap();
        assert_eq!(output.filename, "NDF_Jean_Dupont_Novembre_2024.pdf");
    }
}
