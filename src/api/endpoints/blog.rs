//! Blog endpoints.
//!
//! Reads accept a slug or an id in the same path segment; writes take
//! the id.
//!
//! - `GET|POST /api/blog`
//! - `GET|PUT|DELETE /api/blog/:key`
//! - `POST /api/blog/:key/publish`

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::error::{parse_id, ApiError};
use crate::api::types::ApiContext;
use crate::blog::{self, BlogPostInput, BlogPostPatch};
use crate::models::{BlogPost, BlogPostFilter, Page, PostStatus};

#[derive(Debug, Default, Deserialize)]
pub struct BlogQuery {
    pub status: Option<PostStatus>,
    pub tag: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// `GET /api/blog` — published posts unless `status` is given.
pub async fn list(
    State(ctx): State<ApiContext>,
    query: Result<Query<BlogQuery>, QueryRejection>,
) -> Result<Json<Vec<BlogPost>>, ApiError> {
    let Query(query) = query?;
    let filter = BlogPostFilter {
        status: Some(query.status.unwrap_or(PostStatus::Published)),
        tag: query.tag,
        page: Page::new(query.limit, query.offset),
    };
    let conn = ctx.core.open_db()?;
    Ok(Json(blog::list_posts(&conn, &filter)?))
}

/// `POST /api/blog`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<BlogPostInput>, JsonRejection>,
) -> Result<(StatusCode, Json<BlogPost>), ApiError> {
    let Json(input) = payload?;
    let conn = ctx.core.open_db()?;
    let post = blog::create_post(&conn, input)?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// `GET /api/blog/:key` — by slug, falling back to id.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(key): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(blog::find_post(&conn, key.trim())?))
}

/// `PUT /api/blog/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<BlogPostPatch>, JsonRejection>,
) -> Result<Json<BlogPost>, ApiError> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    let conn = ctx.core.open_db()?;
    Ok(Json(blog::update_post(&conn, &id, patch)?))
}

/// `POST /api/blog/:id/publish`
pub async fn publish(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(blog::publish_post(&conn, &id)?))
}

/// `DELETE /api/blog/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    blog::delete_post(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
