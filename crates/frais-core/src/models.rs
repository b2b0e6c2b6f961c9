//! Domain models for frais

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier of an attachment within a session.
///
/// Generated by the session store; the original filename is kept as display
/// metadata only, so two uploads sharing a filename never collide.
pub type AttachmentId = u64;

/// The fixed expense categories of the report template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "RECEPTION-INVITATIONS-REPAS")]
    Reception,
    #[serde(rename = "HOTEL-HEBERGEMENT")]
    Hotel,
    #[serde(rename = "TRANSPORT-CARBURANT")]
    Transport,
    #[serde(rename = "TELEPHONE")]
    Telephone,
    #[serde(rename = "AFFRANCHISSEMENT")]
    Affranchissement,
    #[serde(rename = "DIVERS")]
    Divers,
}

impl Category {
    /// All categories in report column order
    pub const ALL: [Category; 6] = [
        Self::Reception,
        Self::Hotel,
        Self::Transport,
        Self::Telephone,
        Self::Affranchissement,
        Self::Divers,
    ];

    /// Storage key (ASCII, stable across revisions)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reception => "RECEPTION-INVITATIONS-REPAS",
            Self::Hotel => "HOTEL-HEBERGEMENT",
            Self::Transport => "TRANSPORT-CARBURANT",
            Self::Telephone => "TELEPHONE",
            Self::Affranchissement => "AFFRANCHISSEMENT",
            Self::Divers => "DIVERS",
        }
    }

    /// Accented display label for UI and report output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Reception => "RECEPTION-INVITATIONS-REPAS",
            Self::Hotel => "HÔTEL-HEBERGEMENT",
            Self::Transport => "TRANSPORT-CARBURANT",
            Self::Telephone => "TÉLÉPHONE",
            Self::Affranchissement => "AFFRANCHISSEMENT",
            Self::Divers => "DIVERS",
        }
    }

    /// Column header lines for the report table (narrow columns need breaks)
    pub fn header_lines(&self) -> &'static [&'static str] {
        match self {
            Self::Reception => &["RECEPTION-", "INVITATIONS-", "REPAS (TTC)"],
            Self::Hotel => &["HÔTEL-", "HEBERGEMENT", "(TTC)"],
            Self::Transport => &["TRANSPORT-", "CARBURANT", "(TTC)"],
            Self::Telephone => &["TÉLÉPHONE", "(TTC)"],
            Self::Affranchissement => &["AFFRAN-", "CHISSEMENT", "(TTC)"],
            Self::Divers => &["DIVERS", "(TTC)"],
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().replace(' ', "").as_str() {
            "RECEPTION-INVITATIONS-REPAS" | "RECEPTION" => Ok(Self::Reception),
            "HOTEL-HEBERGEMENT" | "HOTEL" => Ok(Self::Hotel),
            "TRANSPORT-CARBURANT" | "TRANSPORT" => Ok(Self::Transport),
            "TELEPHONE" => Ok(Self::Telephone),
            "AFFRANCHISSEMENT" => Ok(Self::Affranchissement),
            "DIVERS" => Ok(Self::Divers),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attachment content kind, derived from the uploaded filename extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Pdf,
    Image,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
        }
    }

    /// Classify a filename by extension. `None` means the type is not
    /// supported and must be rejected at the boundary.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit('.').next()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" | "png" => Some(Self::Image),
            _ => None,
        }
    }
}

impl std::fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One user-submitted expense line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseLine {
    pub date: NaiveDate,
    pub supplier: String,
    pub description: String,
    pub category: Category,
    /// Tax-inclusive amount in the session currency
    pub amount: f64,
    /// Cost-center tag, optional in later revisions
    pub budget_code: Option<String>,
    /// Justification document, if one was uploaded with the line
    pub attachment_id: Option<AttachmentId>,
}

/// A new expense line before validation and insertion into the session
#[derive(Debug, Clone)]
pub struct NewExpenseLine {
    pub date: NaiveDate,
    pub supplier: String,
    pub description: String,
    pub category: Category,
    pub amount: f64,
    pub budget_code: Option<String>,
    pub attachment: Option<NewAttachment>,
}

impl NewExpenseLine {
    /// Collect every missing/invalid required field.
    ///
    /// Returns an empty list when the line is acceptable. The caller reports
    /// the whole list at once rather than failing on the first field.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.supplier.trim().is_empty() {
            errors.push("supplier".to_string());
        }
        if self.description.trim().is_empty() {
            errors.push("description".to_string());
        }
        if !(self.amount.is_finite() && self.amount > 0.0) {
            errors.push("amount (> 0)".to_string());
        }
        if let Some(att) = &self.attachment {
            if AttachmentKind::from_filename(&att.filename).is_none() {
                errors.push(format!("attachment type ({})", att.filename));
            }
        }
        errors
    }
}

/// Raw upload content for a new attachment
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Binary content backing one expense line's justification document
#[derive(Debug, Clone)]
pub struct Attachment {
    pub id: AttachmentId,
    /// Original filename, display metadata only
    pub filename: String,
    pub kind: AttachmentKind,
    pub bytes: Vec<u8>,
}

/// Static per-company branding applied to the report header
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub address: Option<String>,
    /// Raster logo (PNG/JPEG bytes); absent means text-only header
    #[serde(skip)]
    pub logo: Option<Vec<u8>>,
}

impl CompanyProfile {
    /// Profile with no branding beyond the name
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            logo: None,
        }
    }
}
