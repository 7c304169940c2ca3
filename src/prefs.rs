//! The preference store: a small string key-value store for user preferences and mirrored
//! averages.
//!
//! Writes to the store are best-effort. `remember` and `remember_all` log a failure at `warn` and
//! carry on, so a broken store never changes what the analysis computes.

use crate::model::Budget;
use crate::Result;
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Key of the last selected budget id.
pub const SELECTED_BUDGET_ID: &str = "selectedBudgetId";

/// Key of the persisted theme, `"dark"` or `"light"`.
pub const THEME: &str = "theme";

/// Returns the key under which the monthly average of a category or group is mirrored.
pub fn average_key(id: &str, year: i32) -> String {
    format!("average_{id}_{year}")
}

/// A string key-value store. Last write wins.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Writes several entries at once. Implementations may override this to write only once.
    fn set_all(&self, entries: &[(String, String)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// Writes `value` under `key`, logging and swallowing any failure.
pub fn remember(store: &dyn PreferenceStore, key: &str, value: &str) {
    if let Err(e) = store.set(key, value) {
        warn!("Unable to save preference '{key}': {e:#}");
    }
}

/// Writes all `entries`, logging and swallowing any failure.
pub fn remember_all(store: &dyn PreferenceStore, entries: &[(String, String)]) {
    if entries.is_empty() {
        return;
    }
    if let Err(e) = store.set_all(entries) {
        warn!("Unable to save {} preferences: {e:#}", entries.len());
    }
}

/// Reads `key`, treating a failure the same as a missing value.
pub fn recall(store: &dyn PreferenceStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!("Unable to read preference '{key}': {e:#}");
            None
        }
    }
}

/// A `PreferenceStore` persisted as a JSON object in a single file.
///
/// The whole file is rewritten on every write. A missing file is an empty store.
#[derive(Debug)]
pub struct JsonPreferences {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonPreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).with_context(|| {
                format!("Failed to parse preferences at {}", self.path.display())
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read preferences at {}", self.path.display())),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(map).context("Unable to serialize preferences")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Unable to write to {}", self.path.display()))
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("The preferences lock is poisoned"))?;
        let mut map = self.read_map()?;
        f(&mut map);
        self.write_map(&map)
    }
}

impl PreferenceStore for JsonPreferences {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn set_all(&self, entries: &[(String, String)]) -> Result<()> {
        self.update(|map| {
            map.extend(entries.iter().cloned());
        })?;
        debug!("Saved {} preferences to {}", entries.len(), self.path.display());
        Ok(())
    }
}

/// A `PreferenceStore` that lives only in memory.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    map: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything in the store.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.map.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self
            .map
            .lock()
            .map_err(|_| anyhow!("The preferences lock is poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self
            .map
            .lock()
            .map_err(|_| anyhow!("The preferences lock is poisoned"))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Returns the selected budget id, if one has been stored and it is not empty.
pub fn selected_budget_id(store: &dyn PreferenceStore) -> Option<String> {
    recall(store, SELECTED_BUDGET_ID).filter(|id| !id.is_empty())
}

/// Stores `budget_id` as the selected budget.
pub fn select_budget(store: &dyn PreferenceStore, budget_id: &str) {
    remember(store, SELECTED_BUDGET_ID, budget_id);
}

/// Selects the first of `budgets` when no budget is selected yet. Returns the selected budget id.
pub fn select_default_budget(store: &dyn PreferenceStore, budgets: &[Budget]) -> Option<String> {
    if let Some(id) = selected_budget_id(store) {
        return Some(id);
    }
    let first = budgets.first()?;
    debug!("No budget selected, selecting '{}'", first.id);
    select_budget(store, &first.id);
    Some(first.id.clone())
}

/// The color theme preference.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    #[default]
    Light,
}

serde_plain::derive_display_from_serialize!(Theme);
serde_plain::derive_fromstr_from_deserialize!(Theme);

impl Theme {
    /// Reads the stored theme. Anything stored other than `"dark"` is light. When nothing is
    /// stored, `os_prefers_dark` decides.
    pub fn load(store: &dyn PreferenceStore, os_prefers_dark: bool) -> Self {
        match recall(store, THEME) {
            Some(stored) if stored == "dark" => Theme::Dark,
            Some(_) => Theme::Light,
            None if os_prefers_dark => Theme::Dark,
            None => Theme::Light,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    /// Flips the theme and persists the new value.
    pub fn toggle(store: &dyn PreferenceStore, os_prefers_dark: bool) -> Self {
        let theme = Self::load(store, os_prefers_dark).toggled();
        theme.save(store);
        theme
    }

    pub fn save(self, store: &dyn PreferenceStore) {
        remember(store, THEME, &self.to_string());
    }
}

/// Guesses whether the terminal has a dark background from `COLORFGBG`, which terminals set as
/// `"<fg>;<bg>"`. Background colors 0-6 and 8 are dark.
pub fn os_prefers_dark() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .as_deref()
        .is_some_and(colorfgbg_is_dark)
}

fn colorfgbg_is_dark(value: &str) -> bool {
    value
        .rsplit(';')
        .next()
        .and_then(|bg| bg.trim().parse::<u8>().ok())
        .is_some_and(|bg| bg <= 6 || bg == 8)
}
