//! Generic axum handlers for a [`CrudResource`] family.
//!
//! | Method   | Path                   | Body                 | Data                      |
//! |----------|------------------------|----------------------|---------------------------|
//! | `GET`    | `/{family}`            |                      | `[Dto]`                   |
//! | `POST`   | `/{family}`            | `Create`             | `Dto`                     |
//! | `POST`   | `/{family}/paginated`  | `PaginatedRequest`   | `PaginatedResult<Dto>`    |
//! | `POST`   | `/{family}/count`      | `CountRequest`       | `u64`                     |
//! | `GET`    | `/{family}/options`    |                      | `[SelectOption]`          |
//! | `DELETE` | `/{family}/bulk`       | `BulkDeleteRequest`  | `[Uuid]`                  |
//! | `GET`    | `/{family}/{id}`       |                      | `Dto`                     |
//! | `PUT`    | `/{family}/{id}`       | `Update`             | `Dto`                     |
//! | `DELETE` | `/{family}/{id}`       |                      | `Uuid`                    |
//!
//! Every response body is a [`ResponseEnvelope`].

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, State},
    http::HeaderMap,
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use super::traits::CrudResource;
use crate::envelope::ResponseEnvelope;
use crate::errors::ApiError;
use crate::filtering::calculate_content_range;
use crate::models::{BulkDeleteRequest, CountRequest, PaginatedRequest, PaginatedResult, SelectOption};

/// `Json` whose rejection is a `Failure` envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct EnvelopeJson<T>(pub T);

/// `Path` whose rejection is a `Failure` envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct IdPath<T>(pub T);

type EnvelopeResult<T> = Result<Json<ResponseEnvelope<T>>, ApiError>;

/// Routes of one family, mounted at `/{RESOURCE_NAME_PLURAL}`.
pub fn crud_router<R: CrudResource>() -> Router<DatabaseConnection> {
    let routes = Router::new()
        .route("/", get(get_all_handler::<R>).post(create_one_handler::<R>))
        .route("/paginated", post(get_paginated_handler::<R>))
        .route("/count", post(count_handler::<R>))
        .route("/options", get(options_handler::<R>))
        .route("/bulk", delete(delete_many_handler::<R>))
        .route(
            "/{id}",
            get(get_one_handler::<R>)
                .put(update_one_handler::<R>)
                .delete(delete_one_handler::<R>),
        );
    Router::new().nest(&format!("/{}", R::RESOURCE_NAME_PLURAL), routes)
}

pub async fn get_all_handler<R: CrudResource>(State(db): State<DatabaseConnection>) -> EnvelopeResult<Vec<R>> {
    let items = R::get_all(&db).await?;
    Ok(Json(ResponseEnvelope::success(items)))
}

pub async fn get_paginated_handler<R: CrudResource>(
    State(db): State<DatabaseConnection>,
    EnvelopeJson(request): EnvelopeJson<PaginatedRequest>,
) -> Result<(HeaderMap, Json<ResponseEnvelope<PaginatedResult<R>>>), ApiError> {
    let page = R::get_paginated(&db, request).await?;
    let headers = calculate_content_range(&page, R::RESOURCE_NAME_PLURAL);
    Ok((headers, Json(ResponseEnvelope::success(page))))
}

pub async fn count_handler<R: CrudResource>(
    State(db): State<DatabaseConnection>,
    EnvelopeJson(request): EnvelopeJson<CountRequest>,
) -> EnvelopeResult<u64> {
    let total = R::count(&db, &request.filters).await?;
    Ok(Json(ResponseEnvelope::success(total)))
}

pub async fn options_handler<R: CrudResource>(
    State(db): State<DatabaseConnection>,
) -> EnvelopeResult<Vec<SelectOption>> {
    let options = R::options(&db).await?;
    Ok(Json(ResponseEnvelope::success(options)))
}

pub async fn get_one_handler<R: CrudResource>(
    State(db): State<DatabaseConnection>,
    IdPath(id): IdPath<Uuid>,
) -> EnvelopeResult<R> {
    let item = R::get_one(&db, id).await?;
    Ok(Json(ResponseEnvelope::success(item)))
}

pub async fn create_one_handler<R: CrudResource>(
    State(db): State<DatabaseConnection>,
    EnvelopeJson(create): EnvelopeJson<R::CreateModel>,
) -> EnvelopeResult<R> {
    Ok(Json(R::create(&db, create).await?))
}

pub async fn update_one_handler<R: CrudResource>(
    State(db): State<DatabaseConnection>,
    IdPath(id): IdPath<Uuid>,
    EnvelopeJson(update): EnvelopeJson<R::UpdateModel>,
) -> EnvelopeResult<R> {
    Ok(Json(R::update(&db, id, update).await?))
}

pub async fn delete_one_handler<R: CrudResource>(
    State(db): State<DatabaseConnection>,
    IdPath(id): IdPath<Uuid>,
) -> EnvelopeResult<Uuid> {
    Ok(Json(R::delete(&db, id).await?))
}

pub async fn delete_many_handler<R: CrudResource>(
    State(db): State<DatabaseConnection>,
    EnvelopeJson(request): EnvelopeJson<BulkDeleteRequest>,
) -> EnvelopeResult<Vec<Uuid>> {
    Ok(Json(R::delete_many(&db, request.ids).await?))
}
