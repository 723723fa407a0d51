use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Normal band for one measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub name: String,
    pub low: f64,
    pub high: f64,
    pub unit: String,
}

impl ReferenceEntry {
    pub fn range_label(&self) -> String {
        format!("{} - {} {}", self.low, self.high, self.unit)
    }
}

#[derive(Deserialize)]
struct RawRange {
    low: f64,
    high: f64,
    unit: String,
}

/// Reference ranges keyed by canonical test name, in file order.
#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    entries: Vec<ReferenceEntry>,
    index: HashMap<String, usize>,
}

impl ReferenceCatalog {
    /// Load the catalog from a JSON object of `{"Name": {"low", "high", "unit"}}`.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let map: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if map.is_empty() {
            return Err(CatalogError::Empty {
                path: path.to_path_buf(),
            });
        }

        let mut entries = Vec::with_capacity(map.len());
        for (name, value) in map {
            let range: RawRange =
                serde_json::from_value(value).map_err(|e| CatalogError::InvalidEntry {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            entries.push(ReferenceEntry {
                name,
                low: range.low,
                high: range.high,
                unit: range.unit,
            });
        }

        let catalog = Self::from_entries(entries)?;
        tracing::info!(count = catalog.len(), path = %path.display(), "loaded reference ranges");
        Ok(catalog)
    }

    pub fn from_entries(entries: Vec<ReferenceEntry>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if !entry.low.is_finite() || !entry.high.is_finite() {
                return Err(CatalogError::InvalidEntry {
                    name: entry.name.clone(),
                    reason: "bounds must be finite numbers".to_string(),
                });
            }
            if entry.low > entry.high {
                return Err(CatalogError::InvalidEntry {
                    name: entry.name.clone(),
                    reason: format!("low {} exceeds high {}", entry.low, entry.high),
                });
            }
            if index.insert(entry.name.clone(), position).is_some() {
                return Err(CatalogError::InvalidEntry {
                    name: entry.name.clone(),
                    reason: "duplicate test name".to_string(),
                });
            }
        }
        Ok(Self { entries, index })
    }

    pub fn get(&self, name: &str) -> Option<&ReferenceEntry> {
        self.index.get(name).map(|&position| &self.entries[position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
