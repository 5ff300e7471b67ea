use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::Layout;

/// The local working copy of a dashboard session, kept between CLI runs.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub current_layout: Option<Layout>,
    #[serde(default)]
    pub is_using_fallback: bool,
}

impl SessionSnapshot {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut buf = String::new();
        File::open(path)
            .with_context(|| format!("opening session {}", path.display()))?
            .read_to_string(&mut buf)?;
        ron::from_str(&buf).with_context(|| format!("parsing session {}", path.display()))
    }

    /// Like [`SessionSnapshot::load`], but a missing file is an empty session.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() { Self::load(path) } else { Ok(Self::default()) }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        File::create(path)?.write_all(self.serialize_to_string()?.as_bytes())?;
        Ok(())
    }

    pub fn serialize_to_string(&self) -> anyhow::Result<String> { Ok(ron::ser::to_string(self)?) }
}
