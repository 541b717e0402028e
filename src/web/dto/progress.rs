use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::learning::ProgressSummary;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProgressQuery {
    /// Staff only: whose progress to report. Defaults to the caller.
    pub trainee_id: Option<Uuid>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProgressResponse {
    pub program_id: Uuid,
    pub trainee_id: Uuid,
    #[serde(flatten)]
    pub summary: ProgressSummary,
    pub complete: bool,
}

impl ProgressResponse {
    pub fn new(program_id: Uuid, trainee_id: Uuid, summary: ProgressSummary) -> Self {
        Self {
            program_id,
            trainee_id,
            complete: summary.is_complete(),
            summary,
        }
    }
}
