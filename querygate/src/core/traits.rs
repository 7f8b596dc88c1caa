use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, FromQueryResult, IntoActiveModel, PaginatorTrait, QueryFilter, SqlErr,
    entity::prelude::RelationDef,
};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::envelope::{Messages, ResponseEnvelope};
use crate::filtering::{FieldResolver, QuerySpecification, SortKey, SpecificationBuilder};
use crate::models::{FilterCriterion, PaginatedRequest, PaginatedResult, SelectOption, SortCriterion};
use crate::validation::{Validatable, ValidationErrors};

pub trait MergeIntoActiveModel<ActiveModelType> {
    /// Merge this update model into an existing active model
    ///
    /// # Errors
    ///
    /// Returns a `DbErr` if the merge operation fails due to data conversion issues.
    fn merge_into_activemodel(self, existing: ActiveModelType) -> Result<ActiveModelType, DbErr>;
}

/// A business entity exposed through the generic CRUD routes.
///
/// `Self` is the DTO sent to clients. Implementors declare the entity's
/// field allow-list, its default order and the relations to join; every
/// operation below is provided.
///
/// Write operations return envelopes: payload validation, store-side checks
/// and unique-key violations come back as `Failure` values. A `DbErr` only
/// escapes for a missing single item (`RecordNotFound`) or a real database
/// fault.
#[async_trait]
pub trait CrudResource: Serialize + Sized + Send + Sync + 'static {
    type EntityType: EntityTrait<Model = Self::ModelType> + Sync;
    type ModelType: FromQueryResult
        + IntoActiveModel<Self::ActiveModelType>
        + Into<Self>
        + Send
        + Sync
        + 'static;
    type ActiveModelType: ActiveModelTrait<Entity = Self::EntityType>
        + ActiveModelBehavior
        + Send
        + Sync;
    type ColumnType: ColumnTrait;
    type CreateModel: Into<Self::ActiveModelType>
        + DeserializeOwned
        + Validatable
        + Send
        + Sync
        + 'static;
    type UpdateModel: MergeIntoActiveModel<Self::ActiveModelType>
        + DeserializeOwned
        + Validatable
        + Send
        + Sync
        + 'static;

    const ID_COLUMN: Self::ColumnType;
    const RESOURCE_NAME_SINGULAR: &'static str;
    /// Route segment and cache family, e.g. `suppliers`.
    const RESOURCE_NAME_PLURAL: &'static str;
    const DEFAULT_PAGE_SIZE: u64 = 10;
    const MAX_PAGE_SIZE: u64 = 100;

    /// Fields clients may filter and sort on.
    fn fields() -> FieldResolver;

    /// Order used when the request names no sort, or an unknown one.
    fn default_sort() -> SortKey;

    /// Relations joined into list, paginated and count queries.
    #[must_use]
    fn eager_loads() -> Vec<RelationDef> {
        Vec::new()
    }

    fn id(&self) -> Uuid;

    /// Display text for select inputs.
    fn label(&self) -> String;

    /// Store-side checks run before an insert, e.g. uniqueness.
    async fn check_create(
        _db: &DatabaseConnection,
        _create: &Self::CreateModel,
    ) -> Result<ValidationErrors, DbErr> {
        Ok(ValidationErrors::new())
    }

    /// Store-side checks run before an update of `id`.
    async fn check_update(
        _db: &DatabaseConnection,
        _id: Uuid,
        _update: &Self::UpdateModel,
    ) -> Result<ValidationErrors, DbErr> {
        Ok(ValidationErrors::new())
    }

    #[must_use]
    fn specification(
        db: &DatabaseConnection,
        filters: &[FilterCriterion],
        sorting: Option<&[SortCriterion]>,
    ) -> QuerySpecification {
        let fields = Self::fields();
        SpecificationBuilder::new(&fields, db.get_database_backend(), Self::default_sort())
            .eager_loads(Self::eager_loads())
            .tie_breaker(Self::ID_COLUMN)
            .build(filters, sorting)
    }

    async fn get_all(db: &DatabaseConnection) -> Result<Vec<Self>, DbErr> {
        let models = Self::specification(db, &[], None)
            .apply(Self::EntityType::find())
            .all(db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn get_paginated(
        db: &DatabaseConnection,
        request: PaginatedRequest,
    ) -> Result<PaginatedResult<Self>, DbErr> {
        let request = request.normalized(Self::DEFAULT_PAGE_SIZE, Self::MAX_PAGE_SIZE);
        let select = Self::specification(db, &request.filters, request.sorting.as_deref())
            .apply(Self::EntityType::find());

        let paginator = select.paginate(db, request.page_size);
        let total_count = paginator.num_items().await?;
        // pages past the end are answered without a query; their offset may
        // not even be representable by the store
        let models = match request.offset() {
            Some(offset) if offset < total_count => paginator.fetch_page(request.page_number - 1).await?,
            _ => Vec::new(),
        };

        Ok(PaginatedResult::new(
            models.into_iter().map(Into::into).collect(),
            request.page_number,
            request.page_size,
            total_count,
        ))
    }

    async fn count(db: &DatabaseConnection, filters: &[FilterCriterion]) -> Result<u64, DbErr> {
        let select = Self::specification(db, filters, None).apply_filter(Self::EntityType::find());
        PaginatorTrait::count(select, db).await
    }

    async fn options(db: &DatabaseConnection) -> Result<Vec<SelectOption>, DbErr> {
        let items = Self::get_all(db).await?;
        Ok(items
            .iter()
            .map(|item| SelectOption {
                id: item.id(),
                label: item.label(),
            })
            .collect())
    }

    async fn get_one(db: &DatabaseConnection, id: Uuid) -> Result<Self, DbErr> {
        let model = Self::EntityType::find()
            .filter(Self::ID_COLUMN.eq(id))
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("{} not found", Self::RESOURCE_NAME_SINGULAR)))?;
        Ok(model.into())
    }

    async fn create(
        db: &DatabaseConnection,
        create_model: Self::CreateModel,
    ) -> Result<ResponseEnvelope<Self>, DbErr> {
        let mut errors = create_model.validate();
        if errors.is_empty() {
            errors.merge(Self::check_create(db, &create_model).await?);
        }
        if !errors.is_empty() {
            return Ok(ResponseEnvelope::failure(errors.into_messages()));
        }

        let active_model: Self::ActiveModelType = create_model.into();
        match active_model.insert(db).await {
            Ok(model) => Ok(ResponseEnvelope::success(model.into())),
            Err(err) => constraint_failure(err),
        }
    }

    async fn update(
        db: &DatabaseConnection,
        id: Uuid,
        update_model: Self::UpdateModel,
    ) -> Result<ResponseEnvelope<Self>, DbErr> {
        let model = Self::EntityType::find()
            .filter(Self::ID_COLUMN.eq(id))
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("{} not found", Self::RESOURCE_NAME_SINGULAR)))?;

        let mut errors = update_model.validate();
        if errors.is_empty() {
            errors.merge(Self::check_update(db, id, &update_model).await?);
        }
        if !errors.is_empty() {
            return Ok(ResponseEnvelope::failure(errors.into_messages()));
        }

        let existing: Self::ActiveModelType = model.into_active_model();
        let updated_model = update_model.merge_into_activemodel(existing)?;
        match updated_model.update(db).await {
            Ok(model) => Ok(ResponseEnvelope::success(model.into())),
            Err(err) => constraint_failure(err),
        }
    }

    async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<ResponseEnvelope<Uuid>, DbErr> {
        let res = match Self::EntityType::delete_many()
            .filter(Self::ID_COLUMN.eq(id))
            .exec(db)
            .await
        {
            Ok(res) => res,
            Err(err) => return constraint_failure(err),
        };
        match res.rows_affected {
            0 => Err(DbErr::RecordNotFound(format!(
                "{} not found",
                Self::RESOURCE_NAME_SINGULAR
            ))),
            _ => Ok(ResponseEnvelope::success(id)),
        }
    }

    /// Delete every id independently.
    ///
    /// Ids that do not parse, do not exist or cannot be deleted get a message
    /// keyed by the id as sent, and the remaining ids are still attempted,
    /// even after a database fault. The data is the list of deleted ids.
    async fn delete_many(
        db: &DatabaseConnection,
        ids: Vec<String>,
    ) -> Result<ResponseEnvelope<Vec<Uuid>>, DbErr> {
        let mut deleted = Vec::with_capacity(ids.len());
        let mut messages = Messages::new();

        for raw in ids {
            let Ok(id) = Uuid::parse_str(raw.trim()) else {
                messages.add(raw, "Invalid identifier");
                continue;
            };
            match Self::delete(db, id).await {
                Ok(envelope) if envelope.is_success() => deleted.push(id),
                Ok(envelope) => messages.extend(
                    envelope
                        .messages
                        .entity_messages()
                        .iter()
                        .map(|message| (raw.clone(), message.clone()))
                        .collect(),
                ),
                Err(DbErr::RecordNotFound(message)) => messages.add(raw, message),
                Err(err) => {
                    tracing::error!(
                        resource = Self::RESOURCE_NAME_PLURAL,
                        %id,
                        error = ?err,
                        "bulk delete failed for one id"
                    );
                    messages.add(raw, format!("{} could not be deleted", Self::RESOURCE_NAME_SINGULAR));
                }
            }
        }

        if deleted.is_empty() && !messages.is_empty() {
            tracing::debug!(
                resource = Self::RESOURCE_NAME_PLURAL,
                "bulk delete removed nothing"
            );
            return Ok(ResponseEnvelope::failure(messages));
        }
        Ok(ResponseEnvelope::partial_success(deleted, messages))
    }
}

/// Turn a constraint violation raised by the store into a `Failure`
/// envelope. Any other error is passed through.
fn constraint_failure<T>(err: DbErr) -> Result<ResponseEnvelope<T>, DbErr> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!(%detail, "unique constraint violation");
            Ok(ResponseEnvelope::failure_message(
                "A record with the same unique value already exists",
            ))
        }
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
            tracing::debug!(%detail, "foreign key constraint violation");
            Ok(ResponseEnvelope::failure_message(
                "The record references, or is referenced by, another record",
            ))
        }
        _ => Err(err),
    }
}
