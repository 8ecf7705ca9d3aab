use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension,
    Json,
};
use serde::Deserialize;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{CreateUserRequest, Period, User, WinnerOutcome},
    error::{AppError, Result},
    repository::DEFAULT_PAGE_SIZE,
};

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

impl PeriodQuery {
    /// Defaults to the current month.
    fn resolve(&self) -> Result<Period> {
        match self.period.as_deref() {
            Some(raw) => raw.parse(),
            None => Ok(Period::containing(chrono::Utc::now())),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

pub async fn monthly_winner(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<WinnerOutcome>> {
    let period = query.resolve()?;

    let outcome = state.service_context.winner_service
        .get_winner(&current.actor(), period)
        .await?;

    Ok(Json(outcome))
}

pub async fn compute_monthly_winner(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<WinnerOutcome>> {
    let period = query.resolve()?;

    let outcome = state.service_context.winner_service
        .compute_winner(&current.actor(), period)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No posts were made in {}", period)))?;

    Ok(Json(outcome))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<User>>> {
    let users = state.service_context.user_service
        .list_users(&current.actor(), params.limit, params.offset)
        .await?;

    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = state.service_context.user_service
        .create_user(&current.actor(), request)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn set_user_active(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<User>> {
    let user = state.service_context.user_service
        .set_active(&current.actor(), id, request.active)
        .await?;

    Ok(Json(user))
}
