use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Remote-service credentials plus user preferences.
///
/// All four identifier strings must be non-empty before any remote call is
/// attempted; the orchestrator checks [`Credentials::is_valid`] and falls back
/// to local-only behavior otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer token for the document-collection service.
    pub craft_token: String,
    /// Space the collection lives in; part of the base URL.
    pub space_id: String,
    /// Collection that receives one item per meal.
    pub collection_id: String,
    /// API key for the vision analysis endpoint.
    pub gemini_key: String,
    #[serde(default = "default_calorie_goal")]
    pub daily_calorie_goal: u32,
    #[serde(default = "default_macro_split")]
    pub macro_split: MacroSplit,
}

/// Target macro distribution, in percent of total grams.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacroSplit {
    pub protein_pct: u8,
    pub carbs_pct: u8,
    pub fat_pct: u8,
}

fn default_calorie_goal() -> u32 {
    2000
}

fn default_macro_split() -> MacroSplit {
    MacroSplit { protein_pct: 30, carbs_pct: 40, fat_pct: 30 }
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            craft_token: String::new(),
            space_id: String::new(),
            collection_id: String::new(),
            gemini_key: String::new(),
            daily_calorie_goal: default_calorie_goal(),
            macro_split: default_macro_split(),
        }
    }
}

impl Credentials {
    pub fn is_valid(&self) -> bool {
        !self.craft_token.is_empty()
            && !self.space_id.is_empty()
            && !self.collection_id.is_empty()
            && !self.gemini_key.is_empty()
    }
}

/// File-backed persistence for [`Credentials`].
///
/// Loading and saving are separate explicit calls: `load` returns a plain
/// value and nothing is written back until the caller invokes `save`, so
/// initialization can never trigger a re-entrant write.
pub struct CredentialsStore {
    path: PathBuf,
}

impl CredentialsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read credentials from disk. A missing file yields the defaults.
    pub fn load(&self) -> anyhow::Result<Credentials> {
        if !self.path.exists() {
            return Ok(Credentials::default());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read credentials file {}", self.path.display()))?;
        let creds = serde_json::from_str(&raw)
            .with_context(|| format!("parse credentials file {}", self.path.display()))?;
        Ok(creds)
    }

    pub fn save(&self, creds: &Credentials) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create credentials dir {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(creds).context("serialize credentials")?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("write credentials file {}", self.path.display()))?;
        Ok(())
    }
}
