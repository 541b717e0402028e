use serde::Serialize;

use crate::utils::uploads::StoredFile;

pub const STATIC_PREFIX: &str = "/api/v1/static/";

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub name: String,
    pub url: String,
    pub size: usize,
}

impl From<StoredFile> for UploadResponse {
    fn from(file: StoredFile) -> Self {
        Self {
            url: format!("{STATIC_PREFIX}{}", file.stored_name),
            name: file.stored_name,
            size: file.size,
        }
    }
}
