//! Embedded CWE reference table.

use std::collections::HashMap;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// One weakness entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CweEntry {
    /// Identifier such as `CWE-79`.
    pub id: String,
    /// Official title.
    pub title: String,
    /// Abridged description.
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct CweFile {
    entries: Vec<CweEntry>,
}

/// Lookup table keyed by CWE identifier.
#[derive(Debug)]
pub struct CweTable {
    by_id: HashMap<String, CweEntry>,
}

impl CweTable {
    /// Parses the table embedded in the binary.
    pub fn load() -> Result<Self> {
        let yaml_content = include_str!("../templates/cwe.yaml");
        let file: CweFile =
            serde_yaml::from_str(yaml_content).context("Failed to parse embedded CWE table")?;
        let by_id = file
            .entries
            .into_iter()
            .map(|entry| (entry.id.clone(), entry))
            .collect();
        Ok(Self { by_id })
    }

    /// Looks up an entry. Accepts `CWE-79`, `cwe-79` or a bare `79`.
    pub fn get(&self, cwe_id: &str) -> Option<&CweEntry> {
        self.by_id.get(&normalize_id(cwe_id))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Canonical `CWE-N` form of an identifier.
pub fn normalize_id(cwe_id: &str) -> String {
    let trimmed = cwe_id.trim();
    let number = trimmed
        .strip_prefix("CWE-")
        .or_else(|| trimmed.strip_prefix("cwe-"))
        .unwrap_or(trimmed);
    format!("CWE-{number}")
}

/// MITRE definition page for a CWE identifier.
pub fn mitre_link(cwe_id: &str) -> String {
    let number = cwe_id.rsplit('-').next().unwrap_or(cwe_id);
    format!("https://cwe.mitre.org/data/definitions/{number}.html")
}

static CWE_TABLE: OnceLock<CweTable> = OnceLock::new();

/// The process-wide CWE table.
pub fn cwe_table() -> Result<&'static CweTable> {
    if let Some(table) = CWE_TABLE.get() {
        return Ok(table);
    }
    let table = CweTable::load()?;
    Ok(CWE_TABLE.get_or_init(|| table))
}
