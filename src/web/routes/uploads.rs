use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::post,
};

use crate::{
    Config,
    utils::uploads::{UploadError, checked_extension, store_file},
    web::{AppState, ErrorResponse, RequestContext, WebResult, dto::uploads::UploadResponse, middlewares},
};

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn routes<S>(state: AppState, config: &'static Config) -> Router<S> {
    Router::new()
        .route("/", post(uploads_create_handler))
        .layer(DefaultBodyLimit::max(
            config.uploads().max_bytes() + MULTIPART_OVERHEAD,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn multipart_error(error: MultipartError, limit: usize) -> UploadError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge { limit }
    } else {
        UploadError::Multipart(error)
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/uploads/",
    description = "Stores the multipart field `file` and returns its public URL",
    request_body(content_type = "multipart/form-data", description = "A single `file` field"),
    responses(
        (status = 201, description = "File stored", body = UploadResponse),
        (status = 400, description = "No file field or malformed body", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Extension not allowed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "uploads",
    security(
        ("cookie" = [])
    )
)]
pub async fn uploads_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let uploads = Config::get_or_init(false).await.uploads();
    let limit = uploads.max_bytes();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let extension = checked_extension(&file_name, uploads.allowed_extensions())?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limit))? {
            if bytes.len() + chunk.len() > limit {
                return Err(UploadError::TooLarge { limit }.into());
            }
            bytes.extend_from_slice(&chunk);
        }

        let stored = store_file(state.uploads_dir(), &extension, &bytes).await?;
        tracing::info!(
            user_id = %user.user_id(),
            name = %stored.stored_name,
            size = stored.size,
            "file uploaded"
        );
        return Ok((StatusCode::CREATED, Json(UploadResponse::from(stored))));
    }

    Err(UploadError::MissingFile.into())
}
