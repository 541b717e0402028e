use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    learning::{ProgressSummary, RiskAssessment},
    model::entity::{EnrollmentStatus, ScheduleStatus},
};

#[derive(Debug, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct EnrollBody {
    pub trainee_id: Uuid,
}

#[derive(Debug, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct EnrollmentStatusBody {
    pub status: EnrollmentStatus,
}

/// One ACTIVE enrollment as seen on the cohort's at-risk board.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AtRiskEntry {
    pub enrollment_id: Uuid,
    pub trainee_id: Uuid,
    pub username: String,
    pub progress: ProgressSummary,
    #[serde(flatten)]
    pub assessment: RiskAssessment,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UpcomingQuery {
    /// Only calls that have not ended yet.
    #[serde(default)]
    pub upcoming: bool,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScheduleStatusQuery {
    pub status: Option<ScheduleStatus>,
}

#[derive(Debug, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct DecisionBody {
    /// APPROVED or REJECTED.
    pub status: ScheduleStatus,
}
