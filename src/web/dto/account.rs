use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::web::UserRole;

#[derive(Debug, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct SignupBody {
    #[validate(length(min = 3, max = 64, message = "username must be 3-64 characters"))]
    pub username: String,
    #[validate(length(min = 4, max = 256, message = "password must be at least 4 characters"))]
    pub password: String,
}

/// Sign-in checks credentials only, so no length rules apply.
#[derive(Debug, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct SigninBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct RenameBody {
    #[validate(length(min = 3, max = 64, message = "username must be 3-64 characters"))]
    pub username: String,
}

#[derive(Debug, Deserialize, Serialize, Validate, utoipa::ToSchema)]
pub struct RoleBody {
    pub role: UserRole,
}
