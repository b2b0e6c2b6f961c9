//! frais-core: expense report aggregation and PDF export
//!
//! A session collects validated expense lines with their justification
//! documents, aggregates amounts per category, renders the landscape report
//! table and merges it with every attachment into one downloadable PDF.

pub mod aggregate;
pub mod attachments;
pub mod company;
pub mod error;
pub mod export;
pub mod format;
pub mod merge;
pub mod models;
pub mod report;
pub mod session;

pub use aggregate::{category_totals, sanitize_amount, CategoryTotal, CategoryTotals};
pub use attachments::{compress_image, normalize, AttachmentOutcome};
pub use company::{CompanyDirectory, BUILTIN_COMPANIES};
pub use error::{Error, Result};
pub use export::{build_merged_report, ExportOutput};
pub use format::{format_amount, format_date, month_name_fr, suggested_filename, MONTHS_FR};
pub use merge::{merge_documents, page_count};
pub use models::{
    Attachment, AttachmentId, AttachmentKind, Category, CompanyProfile, ExpenseLine,
    NewAttachment, NewExpenseLine,
};
pub use report::{render_report, ReportContext};
pub use session::Session;
