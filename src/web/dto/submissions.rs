use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::entity::{Feedback, Submission, SubmissionStatus};

#[derive(Debug, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct ReviewBody {
    pub status: SubmissionStatus,
    #[validate(length(min = 1, max = 10000, message = "comment must be 1-10000 characters"))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ReviewResponse {
    pub submission: Submission,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
}
