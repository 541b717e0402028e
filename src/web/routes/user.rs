use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use tower_cookies::{Cookie, Cookies, cookie::SameSite};
use uuid::Uuid;

use crate::{
    Config,
    auth::{self, UserClaims, hash_password, verify_password},
    model::{
        CrudRepository, PaginatableRepository, ResourceTyped, check_access,
        entity::{UserEntity, UserEntityCreateUpdate},
    },
    web::{
        AppState, AuthenticatedUser, ErrorResponse, RequestContext, UserRole, ValidatedJson,
        WebError, WebResult,
        dto::account::{RenameBody, RoleBody, SigninBody, SignupBody},
        middlewares::{self, AUTH_TOKEN},
        routes::{PaginationQuery, db, found},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/me", get(user_me_handler))
        .route("/page", get(user_list_handler))
        .route("/{id}", put(user_update_handler).delete(user_delete_handler))
        .route("/{id}/role", put(user_role_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/signup", post(user_signup_handler))
        .route("/signin", post(user_signin_handler))
        .route("/signout", post(user_signout_handler))
        .merge(protected)
        .with_state(state)
}

async fn set_session_cookie(cookies: &Cookies, user: &UserEntity) -> WebResult<()> {
    let app = Config::get_or_init(false).await.app();
    let claims = UserClaims::for_user(user.id(), app.session_hours());
    let token = auth::generate_token(claims, app.jwt())
        .map_err(|e| WebError::server_crypt_error(e.into()))?;

    let mut cookie = Cookie::new(AUTH_TOKEN, token);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookies.add(cookie);
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signup",
    request_body = SignupBody,
    description = "Registers a new trainee and signs them in",
    responses(
        (status = 200, description = "User created successfully", body = UserEntity),
        (status = 400, description = "Invalid username or password", body = ErrorResponse),
        (status = 409, description = "User already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account"
)]
pub async fn user_signup_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    ValidatedJson(payload): ValidatedJson<SignupBody>,
) -> WebResult<impl IntoResponse> {
    let admin = AuthenticatedUser::admin();
    let taken = UserEntity::find_by_username(state.pool(), &admin, &payload.username)
        .await
        .map_err(db::<UserEntity>)?
        .is_some();

    if taken {
        return Err(WebError::registration_conflict());
    }

    let hash = hash_password(&payload.password).map_err(WebError::server_crypt_error)?;
    let payload = UserEntityCreateUpdate {
        username: payload.username,
        password_hash: hash,
        role: UserRole::Trainee,
    };

    let created = UserEntity::create(state.pool(), &admin, payload)
        .await
        .map_err(|e| {
            // lost a race against another signup with the same name
            if e.is_unique_violation() {
                WebError::registration_conflict()
            } else {
                db::<UserEntity>(e)
            }
        })?;

    set_session_cookie(&cookies, &created).await?;
    tracing::info!(user_id = %created.id(), "trainee signed up");

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signin",
    description = "Authorizes user in the system",
    request_body = SigninBody,
    responses(
        (status = 200, description = "User signed in", body = UserEntity),
        (status = 401, description = "Credentials invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
)]
pub async fn user_signin_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    ValidatedJson(payload): ValidatedJson<SigninBody>,
) -> WebResult<impl IntoResponse> {
    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_username(state.pool(), &admin, &payload.username)
        .await
        .map_err(db::<UserEntity>)?
        .ok_or_else(WebError::auth_invalid_credentials)?;

    let is_verified =
        verify_password(found.hash(), &payload.password).map_err(WebError::server_crypt_error)?;

    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    set_session_cookie(&cookies, &found).await?;

    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signout",
    description = "Drops the session cookie",
    responses(
        (status = 200, description = "Signed out"),
    ),
    tag = "account",
)]
pub async fn user_signout_handler(cookies: Cookies) -> WebResult<impl IntoResponse> {
    let mut cookie = Cookie::from(AUTH_TOKEN);
    cookie.set_path("/");
    cookies.remove(cookie);
    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/account/me",
    description = "Returns the signed in user",
    responses(
        (status = 200, description = "Current user", body = UserEntity),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
pub async fn user_me_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let me = found(UserEntity::find_by_id(state.pool(), user, user.user_id()).await)?;
    Ok((StatusCode::OK, Json(me)))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/page",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<UserEntity>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
pub async fn user_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(UserEntity::get_resource_type())?;

    let users = UserEntity::page(state.pool(), user, page.limit(), page.offset())
        .await
        .map_err(db::<UserEntity>)?;

    Ok((StatusCode::OK, Json(users)))
}

#[utoipa::path(
    put,
    path = "/api/v1/account/{id}",
    request_body = RenameBody,
    params(
        ("id" = Uuid, Path, description = "ID of the user to rename")
    ),
    responses(
        (status = 200, description = "User updated successfully", body = UserEntity),
        (status = 400, description = "Invalid username", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You don't have enough permissions to do this", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Username is taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
pub async fn user_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RenameBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let target = found(UserEntity::find_by_id(state.pool(), user, id).await)?;
    check_access(state.pool(), user, &target, user.user_id())
        .await
        .map_err(db::<UserEntity>)?;

    let conflict = UserEntity::find_by_username(state.pool(), user, &payload.username)
        .await
        .map_err(db::<UserEntity>)?
        .is_some_and(|other| other.id() != target.id());

    if conflict {
        return Err(WebError::registration_conflict());
    }

    let payload = UserEntityCreateUpdate {
        username: payload.username,
        password_hash: String::new(), // not in use
        role: target.role(),
    };

    let updated = target
        .update(state.pool(), user, payload)
        .await
        .map_err(db::<UserEntity>)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    put,
    path = "/api/v1/account/{id}/role",
    request_body = RoleBody,
    description = "Changes the role of a user",
    params(
        ("id" = Uuid, Path, description = "ID of the user")
    ),
    responses(
        (status = 200, description = "Role changed", body = UserEntity),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only admins may change roles", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
pub async fn user_role_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RoleBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(UserEntity::get_resource_type())?;

    let target = found(UserEntity::find_by_id(state.pool(), user, id).await)?;
    let updated = target
        .set_role(state.pool(), user, payload.role)
        .await
        .map_err(db::<UserEntity>)?;

    tracing::info!(user_id = %id, role = %payload.role, "role changed");
    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/account/{id}",
    description = "Deletes specified user. Mentors still leading cohorts or calls cannot be deleted",
    params(
        ("id" = Uuid, Path, description = "ID of the user to delete")
    ),
    responses(
        (status = 200, description = "User deleted successfully"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "User still mentors a cohort or call", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
pub async fn user_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let target = found(UserEntity::find_by_id(state.pool(), user, id).await)?;
    check_access(state.pool(), user, &target, user.user_id())
        .await
        .map_err(db::<UserEntity>)?;

    target
        .delete(state.pool(), user)
        .await
        .map_err(db::<UserEntity>)?;

    Ok(StatusCode::OK)
}
