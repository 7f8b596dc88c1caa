use async_trait::async_trait;
use chrono::{DateTime, Utc};
use querygate::{
    CrudResource, FieldDef, FieldResolver, MergeIntoActiveModel, SortKey, Validatable,
    ValidationError, ValidationErrors, validation::validators,
};
use sea_orm::{ActiveValue::Set, entity::prelude::*};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Message attached to `numContribuinte` when the number is taken.
pub const DUPLICATE_TAX_NUMBER: &str = "já existe";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub nome: String,
    #[sea_orm(unique)]
    pub num_contribuinte: String,
    pub country_id: Uuid,
    pub active: bool,
    pub rating: f64,
    pub created_on: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::country::Entity",
        from = "Column::CountryId",
        to = "super::country::Column::Id"
    )]
    Country,
    #[sea_orm(has_many = "super::vehicle::Entity")]
    Vehicles,
}

impl Related<super::country::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Country.def()
    }
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    pub nome: String,
    pub num_contribuinte: String,
    pub country_id: Uuid,
    pub active: bool,
    pub rating: f64,
    pub created_on: DateTime<Utc>,
}

impl From<Model> for Supplier {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            nome: model.nome,
            num_contribuinte: model.num_contribuinte,
            country_id: model.country_id,
            active: model.active,
            rating: model.rating,
            created_on: model.created_on,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierCreate {
    pub nome: String,
    pub num_contribuinte: String,
    pub country_id: Uuid,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub rating: f64,
    /// Defaults to now; set explicitly when importing historical records.
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,
}

const fn default_active() -> bool {
    true
}

fn validate_tax_number(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    validators::validate_length("numContribuinte", value, Some(9), Some(9))?;
    if value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("numContribuinte", "Must contain only digits"))
    }
}

impl Validatable for SupplierCreate {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.check(validators::validate_required("nome", &self.nome));
        errors.check(validators::validate_length("nome", &self.nome, None, Some(200)));
        errors.check(validate_tax_number(&self.num_contribuinte));
        errors.check(validators::validate_range("rating", self.rating, Some(0.0), Some(5.0)));
        errors
    }
}

impl From<SupplierCreate> for ActiveModel {
    fn from(create: SupplierCreate) -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            nome: Set(create.nome.trim().to_string()),
            num_contribuinte: Set(create.num_contribuinte.trim().to_string()),
            country_id: Set(create.country_id),
            active: Set(create.active),
            rating: Set(create.rating),
            created_on: Set(create.created_on.unwrap_or_else(Utc::now)),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierUpdate {
    pub nome: Option<String>,
    pub num_contribuinte: Option<String>,
    pub country_id: Option<Uuid>,
    pub active: Option<bool>,
    pub rating: Option<f64>,
}

impl Validatable for SupplierUpdate {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Some(nome) = &self.nome {
            errors.check(validators::validate_required("nome", nome));
        }
        if let Some(number) = &self.num_contribuinte {
            errors.check(validate_tax_number(number));
        }
        if let Some(rating) = self.rating {
            errors.check(validators::validate_range("rating", rating, Some(0.0), Some(5.0)));
        }
        errors
    }
}

impl MergeIntoActiveModel<ActiveModel> for SupplierUpdate {
    fn merge_into_activemodel(self, mut existing: ActiveModel) -> Result<ActiveModel, DbErr> {
        if let Some(nome) = self.nome {
            existing.nome = Set(nome.trim().to_string());
        }
        if let Some(number) = self.num_contribuinte {
            existing.num_contribuinte = Set(number.trim().to_string());
        }
        if let Some(country_id) = self.country_id {
            existing.country_id = Set(country_id);
        }
        if let Some(active) = self.active {
            existing.active = Set(active);
        }
        if let Some(rating) = self.rating {
            existing.rating = Set(rating);
        }
        Ok(existing)
    }
}

async fn tax_number_taken(
    db: &DatabaseConnection,
    number: &str,
    except: Option<Uuid>,
) -> Result<bool, DbErr> {
    let mut query = Entity::find().filter(Column::NumContribuinte.eq(number.trim()));
    if let Some(id) = except {
        query = query.filter(Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

#[async_trait]
impl CrudResource for Supplier {
    type EntityType = Entity;
    type ModelType = Model;
    type ActiveModelType = ActiveModel;
    type ColumnType = Column;
    type CreateModel = SupplierCreate;
    type UpdateModel = SupplierUpdate;

    const ID_COLUMN: Column = Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "supplier";
    const RESOURCE_NAME_PLURAL: &'static str = "suppliers";

    fn fields() -> FieldResolver {
        FieldResolver::new(vec![
            FieldDef::identifier("id", Column::Id),
            FieldDef::text("nome", Column::Nome).sortable(),
            FieldDef::text("numContribuinte", Column::NumContribuinte).sortable(),
            FieldDef::identifier("countryId", Column::CountryId),
            FieldDef::boolean("active", Column::Active),
            FieldDef::numeric("rating", Column::Rating).sortable(),
            FieldDef::date("createdOn", Column::CreatedOn).sortable(),
            FieldDef::text("countryName", super::country::Column::Nome).sortable(),
            FieldDef::text("countryCode", super::country::Column::Code),
        ])
    }

    fn default_sort() -> SortKey {
        SortKey::desc(Column::CreatedOn)
    }

    fn eager_loads() -> Vec<RelationDef> {
        vec![Relation::Country.def()]
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn label(&self) -> String {
        format!("{} ({})", self.nome, self.num_contribuinte)
    }

    async fn check_create(
        db: &DatabaseConnection,
        create: &SupplierCreate,
    ) -> Result<ValidationErrors, DbErr> {
        let mut errors = ValidationErrors::new();
        if tax_number_taken(db, &create.num_contribuinte, None).await? {
            errors.add(ValidationError::new("numContribuinte", DUPLICATE_TAX_NUMBER));
        }
        Ok(errors)
    }

    async fn check_update(
        db: &DatabaseConnection,
        id: Uuid,
        update: &SupplierUpdate,
    ) -> Result<ValidationErrors, DbErr> {
        let mut errors = ValidationErrors::new();
        if let Some(number) = &update.num_contribuinte
            && tax_number_taken(db, number, Some(id)).await?
        {
            errors.add(ValidationError::new("numContribuinte", DUPLICATE_TAX_NUMBER));
        }
        Ok(errors)
    }
}
