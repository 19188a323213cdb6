use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::OnceCell;

use super::loader;
use super::model::Panel;

// ---------------------------------------------------------------------------
// Load-once panel store
// ---------------------------------------------------------------------------

/// Owns the input path and the panel read from it.
///
/// The first successful [`PanelStore::get`] reads the file; later calls hand
/// out the same `Arc` without touching the disk. A failed read is not cached.
#[derive(Debug)]
pub struct PanelStore {
    path: PathBuf,
    panel: OnceCell<Arc<Panel>>,
}

impl PanelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            panel: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The loaded panel, reading the file on first use.
    pub fn get(&self) -> Result<Arc<Panel>> {
        self.panel
            .get_or_try_init(|| {
                let panel = loader::load_file(&self.path)?;
                log::info!(
                    "Loaded {} observations from {} ({} provinces, years {:?}..={:?})",
                    panel.len(),
                    self.path.display(),
                    panel.provinces.len(),
                    panel.years.first(),
                    panel.years.last(),
                );
                Ok(Arc::new(panel))
            })
            .map(Arc::clone)
    }
}
