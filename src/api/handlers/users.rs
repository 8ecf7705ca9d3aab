use axum::{
    extract::State,
    http::StatusCode,
    Extension,
    Json,
};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{ChangePasswordRequest, UpdateProfileRequest, User},
    error::Result,
};

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<User>> {
    let user = state.service_context.user_service
        .get_user(current.user.id)
        .await?;

    Ok(Json(user))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<User>> {
    let user = state.service_context.user_service
        .update_profile(&current.actor(), request)
        .await?;

    Ok(Json(user))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    state.service_context.user_service
        .change_password(&current.actor(), request)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
