use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Path};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::post;
use axum::{Form, Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Deserialize;

use crate::auth::Session;
use crate::error::AppError;
use crate::models::Upload;
use crate::render;
use crate::services::ViewState;
use crate::state::AppState;

#[derive(Deserialize)]
struct CreateTodoForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct SignInForm {
    username: String,
    id_token: String,
}

pub fn router(state: AppState) -> Router {
    let upload_limit = state.upload_limit_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/", get(index))
        .route("/state", get(view_state))
        .route("/todos", post(create_todo))
        .route("/todos/{id}/delete", post(delete_todo))
        .route("/upload", post(upload).layer(DefaultBodyLimit::max(upload_limit)))
        .route("/sign-in", post(sign_in))
        .route("/sign-out", post(sign_out))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn index(State(state): State<AppState>) -> Result<Response, AppError> {
    let user = match state.gate.require().await {
        Ok(user) => user,
        Err(AppError::Unauthorized) => {
            return Ok((StatusCode::UNAUTHORIZED, Html(render::sign_in_page())).into_response());
        }
        Err(e) => return Err(e),
    };
    state.view.mount().await?;
    let snapshot = state.view.snapshot().await;
    Ok(Html(render::page(&snapshot, &user)).into_response())
}

async fn view_state(State(state): State<AppState>) -> Result<Json<ViewState>, AppError> {
    state.gate.require().await?;
    state.view.mount().await?;
    Ok(Json(state.view.snapshot().await))
}

async fn create_todo(
    State(state): State<AppState>,
    Form(form): Form<CreateTodoForm>,
) -> Result<Redirect, AppError> {
    state.gate.require().await?;
    state.view.mount().await?;
    state.view.set_name(form.name).await;
    state.view.set_description(form.description).await;
    state.view.create().await?;
    Ok(Redirect::to("/"))
}

async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    state.gate.require().await?;
    state.view.mount().await?;
    state.view.delete(&id).await?;
    Ok(Redirect::to("/"))
}

/// Keeps axum's 413 when an upload runs past the body limit.
fn multipart_error(context: &str, e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(format!("{}: {}", context, e.body_text()))
    }
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    state.gate.require().await?;
    state.view.mount().await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Malformed upload", e))?
    {
        match field.name() {
            Some("name") => {
                let name = field.text().await.map_err(|e| multipart_error("Failed to read name", e))?;
                state.view.set_name(name).await;
            }
            Some("description") => {
                let description = field
                    .text()
                    .await
                    .map_err(|e| multipart_error("Failed to read description", e))?;
                state.view.set_description(description).await;
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Failed to read upload", e))?;
                upload = Some(Upload { file_name, content_type, bytes: bytes.to_vec() });
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("Upload is missing a file field".to_string()))?;
    state.view.upload_and_attach(upload).await?;
    Ok(Redirect::to("/"))
}

async fn sign_in(
    State(state): State<AppState>,
    Form(form): Form<SignInForm>,
) -> Result<Redirect, AppError> {
    state
        .gate
        .sign_in(Session { username: form.username, id_token: form.id_token })
        .await?;
    Ok(Redirect::to("/"))
}

async fn sign_out(State(state): State<AppState>) -> Redirect {
    if state.gate.sign_out().await.is_some() {
        state.view.unmount().await;
    }
    Redirect::to("/")
}
