//! Request context, e.g. user id, its role, etc.
//!

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};

use crate::{
    model::ResourceType,
    web::{WebResult, error::WebError},
};

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    user_id: uuid::Uuid,
    user_role: UserRole,
}

impl AuthenticatedUser {
    pub fn new(user_id: uuid::Uuid, user_role: UserRole) -> Self {
        Self { user_id, user_role }
    }

    pub fn admin() -> Self {
        Self {
            user_role: UserRole::Admin,
            user_id: uuid::Uuid::max(), // admin ID
        }
    }

    pub fn user_id(&self) -> uuid::Uuid {
        self.user_id
    }

    pub fn user_role(&self) -> UserRole {
        self.user_role
    }

    pub fn is_admin(&self) -> bool {
        self.user_role == UserRole::Admin
    }

    /// Admins and mentors.
    pub fn is_staff(&self) -> bool {
        matches!(self.user_role, UserRole::Admin | UserRole::Mentor)
    }

    pub fn is_trainee(&self) -> bool {
        self.user_role == UserRole::Trainee
    }

    pub fn require_admin(&self, resource: ResourceType) -> WebResult<()> {
        self.require_any(&[UserRole::Admin], resource)
    }

    pub fn require_staff(&self, resource: ResourceType) -> WebResult<()> {
        self.require_any(&[UserRole::Admin, UserRole::Mentor], resource)
    }

    pub fn require_any(&self, roles: &[UserRole], resource: ResourceType) -> WebResult<()> {
        if roles.contains(&self.user_role) {
            Ok(())
        } else {
            Err(WebError::resource_forbidden(resource))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Mentor,
    Trainee,
}

impl From<&str> for UserRole {
    fn from(value: &str) -> Self {
        match value {
            "admin" => Self::Admin,
            "mentor" => Self::Mentor,
            _ => Self::Trainee,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Mentor => write!(f, "mentor"),
            Self::Trainee => write!(f, "trainee"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    maybe_user: Option<AuthenticatedUser>,
}

impl RequestContext {
    pub fn new(maybe_user: Option<AuthenticatedUser>) -> Self {
        Self { maybe_user }
    }

    pub fn admin() -> Self {
        Self::new(Some(AuthenticatedUser::admin()))
    }

    pub fn maybe_user(&self) -> Option<&AuthenticatedUser> {
        self.maybe_user.as_ref()
    }

    pub fn user(&self) -> WebResult<&AuthenticatedUser> {
        self.maybe_user.as_ref().ok_or(WebError::auth_required())
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts.extensions.get::<RequestContext>();
        if let Some(ctx) = ctx {
            Ok(ctx.clone())
        } else {
            Ok(RequestContext::new(None))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        for role in [UserRole::Admin, UserRole::Mentor, UserRole::Trainee] {
            assert_eq!(UserRole::from(role.to_string().as_str()), role);
        }
        assert_eq!(UserRole::from("garbage"), UserRole::Trainee);
    }

    #[test]
    fn staff_checks() {
        let mentor = AuthenticatedUser::new(uuid::Uuid::new_v4(), UserRole::Mentor);
        assert!(mentor.is_staff());
        assert!(mentor.require_staff(ResourceType::Submission).is_ok());
        assert!(mentor.require_admin(ResourceType::Program).is_err());

        let trainee = AuthenticatedUser::new(uuid::Uuid::new_v4(), UserRole::Trainee);
        assert!(trainee.require_staff(ResourceType::Submission).is_err());
    }

    #[test]
    fn anonymous_context_requires_auth() {
        let ctx = RequestContext::new(None);
        assert!(ctx.user().is_err());
        assert!(RequestContext::admin().user().unwrap().is_admin());
    }
}
