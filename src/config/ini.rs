//! INI-style document handling for the Stratus config files
//!
//! The cloud registry and the active-cloud pointer are stored as plain
//! `[section]` / `key = value` text. Section and entry order is preserved
//! across a parse/serialize round trip. Keys this tool does not recognize
//! are kept by the document layer; the registry simply never writes them.

use anyhow::{bail, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Match section headers like: [StratusCloud]
    static ref SECTION_PATTERN: Regex =
        Regex::new(r"^\[([^\[\]]+)\]$").expect("Invalid section pattern regex");

    // Match entries like: endpoint_management = https://management.stratus.cloud
    static ref ENTRY_PATTERN: Regex =
        Regex::new(r"^([^=\s][^=]*?)\s*=\s*(.*)$").expect("Invalid entry pattern regex");
}

/// A single `[name]` section with its entries in file order
#[derive(Debug, Clone, PartialEq)]
pub struct IniSection {
    name: String,
    entries: Vec<(String, String)>,
}

impl IniSection {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Section name (the cloud name, for registry files)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a key to a value, replacing any existing entry for that key
    pub fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter().position(|(k, _)| k == key) {
            Some(index) => self.entries[index].1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    /// Remove a key; returns whether an entry was removed
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        self.entries.len() != before
    }

    /// Keep only the entries whose key satisfies the predicate
    pub fn retain_keys<F: Fn(&str) -> bool>(&mut self, keep: F) {
        self.entries.retain(|(k, _)| keep(k));
    }

    /// Iterate over entries in file order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// An ordered collection of INI sections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IniDocument {
    sections: Vec<IniSection>,
}

impl IniDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse document text
    ///
    /// Blank lines and `;`/`#` comment lines are skipped. An entry before
    /// the first section header is an error. A repeated section header
    /// continues the existing section; a repeated key replaces the value.
    pub fn parse(input: &str) -> Result<Self> {
        let mut doc = Self::new();
        let mut current: Option<usize> = None;

        for (line_number, raw_line) in input.lines().enumerate() {
            let line = raw_line.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(caps) = SECTION_PATTERN.captures(line) {
                let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
                if name.is_empty() {
                    bail!("Empty section name on line {}", line_number + 1);
                }
                current = Some(doc.index_of_or_insert(name));
            } else if let Some(caps) = ENTRY_PATTERN.captures(line) {
                let key = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                let value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                match current {
                    Some(index) => doc.sections[index].set(key, value),
                    None => bail!(
                        "Entry '{}' on line {} appears before any section header",
                        key,
                        line_number + 1
                    ),
                }
            } else {
                bail!("Malformed line {}: '{}'", line_number + 1, line);
            }
        }

        Ok(doc)
    }

    /// Serialize the document back to text
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push('[');
            out.push_str(&section.name);
            out.push_str("]\n");
            for (key, value) in section.entries() {
                out.push_str(key);
                out.push_str(" = ");
                out.push_str(value);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    /// Iterate over sections in file order
    pub fn sections(&self) -> impl Iterator<Item = &IniSection> {
        self.sections.iter()
    }

    /// Whether a section with the given name exists
    pub fn has_section(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s.name == name)
    }

    /// Get a section by name
    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Get a mutable section by name
    pub fn section_mut(&mut self, name: &str) -> Option<&mut IniSection> {
        self.sections.iter_mut().find(|s| s.name == name)
    }

    /// Get a mutable section by name, creating it at the end if absent
    pub fn ensure_section(&mut self, name: &str) -> &mut IniSection {
        let index = self.index_of_or_insert(name);
        &mut self.sections[index]
    }

    /// Remove a section; returns whether a section was removed
    pub fn remove_section(&mut self, name: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.name != name);
        self.sections.len() != before
    }

    fn index_of_or_insert(&mut self, name: &str) -> usize {
        if let Some(index) = self.sections.iter().position(|s| s.name == name) {
            return index;
        }
        self.sections.push(IniSection::new(name));
        self.sections.len() - 1
    }
}
