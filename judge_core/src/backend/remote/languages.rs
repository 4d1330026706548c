use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::{debug, info, warn};
use serde::Deserialize;

/// One entry of `GET /languages`.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteLanguage {
    pub id: u32,
    pub name: String,
}

const DEFAULT_IDS: &[(&str, u32)] = &[
    ("java", 62),
    ("python", 71),
    ("python3", 71),
    ("python3.8", 71),
    ("python3.10", 76),
    ("python3.11", 92),
    ("python2", 68),
    ("c", 65),
    ("cpp", 64),
    ("c++", 64),
    ("csharp", 69),
    ("c#", 69),
    ("go", 60),
    ("javascript", 91),
    ("typescript", 92),
    ("rust", 73),
];

pub fn default_ids() -> HashMap<String, u32> {
    DEFAULT_IDS
        .iter()
        .map(|(name, id)| (name.to_string(), *id))
        .collect()
}

/// Keys a catalog name is reachable under, e.g. `Python (3.8.1)` gives
/// `python (3.8.1)`, `python` and `python3.8`.
fn catalog_keys(name: &str) -> Vec<String> {
    let full = name.trim().to_lowercase();
    let mut keys = vec![full.clone()];

    let (base, detail) = match full.find('(') {
        Some(i) => (full[..i].trim(), full[i + 1..].trim_end_matches(')').trim()),
        None => return keys,
    };
    if base.is_empty() {
        return keys;
    }
    keys.push(base.to_string());

    // versions like `3.8.1` become `python3.8`
    let version: Vec<&str> = detail
        .split(|c: char| c == '.' || c.is_whitespace())
        .take_while(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
        .take(2)
        .collect();
    if !version.is_empty() {
        keys.push(format!("{}{}", base, version.join(".")));
    }
    keys
}

/// Merges a catalog over the defaults. Names already known keep their
/// default id; the catalog adds everything else.
pub fn from_catalog(catalog: &[RemoteLanguage]) -> HashMap<String, u32> {
    let mut table = default_ids();
    for language in catalog {
        for key in catalog_keys(&language.name) {
            table.entry(key).or_insert(language.id);
        }
    }
    table
}

/// Language name to remote id. Lookups see either the old or the new table,
/// never a half-written one.
pub struct LanguageTable {
    ids: RwLock<Arc<HashMap<String, u32>>>,
    fallback: u32,
}

impl LanguageTable {
    pub fn new(fallback: u32) -> Self {
        Self {
            ids: RwLock::new(Arc::new(default_ids())),
            fallback,
        }
    }

    fn snapshot(&self) -> Arc<HashMap<String, u32>> {
        match self.ids.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, table: HashMap<String, u32>) {
        let table = Arc::new(table);
        match self.ids.write() {
            Ok(mut guard) => *guard = table,
            Err(poisoned) => *poisoned.into_inner() = table,
        }
    }

    /// Installs `catalog` merged over the defaults; an empty catalog leaves
    /// the table alone.
    pub fn refresh(&self, catalog: &[RemoteLanguage]) -> bool {
        if catalog.is_empty() {
            warn!("remote language catalog is empty, keeping the built-in table");
            return false;
        }
        let table = from_catalog(catalog);
        info!("remote language table refreshed: {} names", table.len());
        self.replace(table);
        true
    }

    pub fn resolve(&self, language: &str) -> u32 {
        let key = language.trim().to_lowercase();
        match self.snapshot().get(&key) {
            Some(id) => *id,
            None => {
                debug!("no remote id for `{}`, using {}", language, self.fallback);
                self.fallback
            }
        }
    }
}
