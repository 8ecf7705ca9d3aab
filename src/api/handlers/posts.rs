use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension,
    Json,
};
use serde::Deserialize;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{CreatePostRequest, Post, PostFilter, PostView, UpdatePostRequest, VoteOutcome},
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub value: i64,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(filter): Query<PostFilter>,
) -> Result<Json<Vec<PostView>>> {
    let posts = state.service_context.post_service
        .list_posts(&current.actor(), &filter)
        .await?;

    Ok(Json(posts))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Post>> {
    let post = state.service_context.post_service
        .get_post(&current.actor(), id)
        .await?;

    Ok(Json(post))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(request): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>)> {
    let post = state.service_context.post_service
        .create_post(&current.actor(), request)
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<Post>> {
    let post = state.service_context.post_service
        .update_post(&current.actor(), id, request)
        .await?;

    Ok(Json(post))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.service_context.post_service
        .delete_post(&current.actor(), id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn vote(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteOutcome>> {
    let outcome = state.service_context.vote_service
        .cast_vote(&current.actor(), id, request.value)
        .await?;

    Ok(Json(outcome))
}

pub async fn retract_vote(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<VoteOutcome>> {
    let outcome = state.service_context.vote_service
        .retract_vote(&current.actor(), id)
        .await?;

    Ok(Json(outcome))
}

pub async fn tally(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<VoteOutcome>> {
    let outcome = state.service_context.vote_service
        .tally(&current.actor(), id)
        .await?;

    Ok(Json(outcome))
}
