use std::path::{Path, PathBuf};

use crate::model::ModelManager;

#[derive(Debug, Clone)]
pub struct AppState {
    mm: ModelManager,
    uploads_dir: PathBuf,
}

impl AppState {
    pub fn new(mm: ModelManager, uploads_dir: PathBuf) -> Self {
        Self { mm, uploads_dir }
    }

    pub fn pool(&self) -> &ModelManager {
        &self.mm
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }
}
