//! Company directory
//!
//! The built-in list carries the organizations the report template was made
//! for; a TOML file can add branding (address, logo) or extra entries on top.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::CompanyProfile;

/// Organizations selectable out of the box
pub const BUILTIN_COMPANIES: [&str; 5] = [
    "IFEA SAS",
    "IFEA Bois Colombes",
    "Ecole Secondaire Suger",
    "MindEd Tech",
    "GIE IFEA",
];

#[derive(Debug, Clone, Default)]
pub struct CompanyDirectory {
    profiles: Vec<CompanyProfile>,
}

#[derive(Debug, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    company: Vec<CompanyEntry>,
}

#[derive(Debug, Deserialize)]
struct CompanyEntry {
    name: String,
    address: Option<String>,
    /// Path to a PNG/JPEG logo, relative to the config file
    logo: Option<String>,
}

impl CompanyDirectory {
    /// Directory holding only the built-in names, without branding.
    pub fn builtin() -> Self {
        Self {
            profiles: BUILTIN_COMPANIES
                .iter()
                .copied()
                .map(CompanyProfile::plain)
                .collect(),
        }
    }

    /// Load a `[[company]]` TOML file and overlay it on the built-ins.
    /// Logo paths resolve relative to the config file's directory.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut directory = Self::builtin();
        directory.merge_toml(&text, base_dir)?;
        Ok(directory)
    }

    /// Overlay parsed TOML entries; existing names are replaced.
    pub fn merge_toml(&mut self, text: &str, base_dir: &Path) -> Result<()> {
        let file: DirectoryFile =
            toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        for entry in file.company {
            let logo = match entry.logo {
                Some(rel) => Some(std::fs::read(base_dir.join(&rel))?),
                None => None,
            };
            self.upsert(CompanyProfile {
                name: entry.name,
                address: entry.address,
                logo,
            });
        }
        Ok(())
    }

    pub fn upsert(&mut self, profile: CompanyProfile) {
        match self.profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
    }

    /// Profile for a name. Unknown names get a plain profile so a freshly
    /// typed company still produces a report, just without branding.
    pub fn lookup(&self, name: &str) -> CompanyProfile {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .unwrap_or_else(|| CompanyProfile::plain(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }
}
