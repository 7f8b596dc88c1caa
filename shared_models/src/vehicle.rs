use chrono::{DateTime, Datelike, Utc};
use querygate::{
    CrudResource, FieldDef, FieldResolver, MergeIntoActiveModel, SortKey, Validatable,
    ValidationErrors, validation::validators,
};
use sea_orm::{ActiveValue::Set, entity::prelude::*};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub mileage: i64,
    pub supplier_id: Option<Uuid>,
    pub active: bool,
    pub created_on: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "super::maintenance_record::Entity")]
    MaintenanceRecords,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::maintenance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaintenanceRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub mileage: i64,
    pub supplier_id: Option<Uuid>,
    pub active: bool,
    pub created_on: DateTime<Utc>,
}

impl From<Model> for Vehicle {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            plate: model.plate,
            brand: model.brand,
            model: model.model,
            year: model.year,
            mileage: model.mileage,
            supplier_id: model.supplier_id,
            active: model.active,
            created_on: model.created_on,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleCreate {
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub mileage: i64,
    #[serde(default)]
    pub supplier_id: Option<Uuid>,
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,
}

fn latest_model_year() -> i32 {
    Utc::now().year() + 1
}

impl Validatable for VehicleCreate {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.check(validators::validate_length("plate", self.plate.trim(), Some(4), Some(12)));
        errors.check(validators::validate_required("brand", &self.brand));
        errors.check(validators::validate_required("model", &self.model));
        errors.check(validators::validate_range("year", self.year, Some(1950), Some(latest_model_year())));
        errors.check(validators::validate_range("mileage", self.mileage, Some(0), None));
        errors
    }
}

impl From<VehicleCreate> for ActiveModel {
    fn from(create: VehicleCreate) -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            plate: Set(create.plate.trim().to_ascii_uppercase()),
            brand: Set(create.brand.trim().to_string()),
            model: Set(create.model.trim().to_string()),
            year: Set(create.year),
            mileage: Set(create.mileage),
            supplier_id: Set(create.supplier_id),
            active: Set(true),
            created_on: Set(create.created_on.unwrap_or_else(Utc::now)),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUpdate {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub mileage: Option<i64>,
    pub supplier_id: Option<Uuid>,
    pub active: Option<bool>,
}

impl Validatable for VehicleUpdate {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Some(brand) = &self.brand {
            errors.check(validators::validate_required("brand", brand));
        }
        if let Some(model) = &self.model {
            errors.check(validators::validate_required("model", model));
        }
        if let Some(mileage) = self.mileage {
            errors.check(validators::validate_range("mileage", mileage, Some(0), None));
        }
        errors
    }
}

impl MergeIntoActiveModel<ActiveModel> for VehicleUpdate {
    fn merge_into_activemodel(self, mut existing: ActiveModel) -> Result<ActiveModel, DbErr> {
        if let Some(brand) = self.brand {
            existing.brand = Set(brand.trim().to_string());
        }
        if let Some(model) = self.model {
            existing.model = Set(model.trim().to_string());
        }
        if let Some(mileage) = self.mileage {
            existing.mileage = Set(mileage);
        }
        if let Some(supplier_id) = self.supplier_id {
            existing.supplier_id = Set(Some(supplier_id));
        }
        if let Some(active) = self.active {
            existing.active = Set(active);
        }
        Ok(existing)
    }
}

impl CrudResource for Vehicle {
    type EntityType = Entity;
    type ModelType = Model;
    type ActiveModelType = ActiveModel;
    type ColumnType = Column;
    type CreateModel = VehicleCreate;
    type UpdateModel = VehicleUpdate;

    const ID_COLUMN: Column = Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "vehicle";
    const RESOURCE_NAME_PLURAL: &'static str = "vehicles";
    const MAX_PAGE_SIZE: u64 = 250;

    fn fields() -> FieldResolver {
        FieldResolver::new(vec![
            FieldDef::identifier("id", Column::Id),
            FieldDef::text("plate", Column::Plate).sortable(),
            FieldDef::text("brand", Column::Brand).sortable(),
            FieldDef::text("model", Column::Model).sortable(),
            FieldDef::numeric("year", Column::Year).sortable(),
            FieldDef::numeric("mileage", Column::Mileage).sortable(),
            FieldDef::identifier("supplierId", Column::SupplierId),
            FieldDef::boolean("active", Column::Active),
            FieldDef::date("createdOn", Column::CreatedOn).sortable(),
            FieldDef::text("supplierName", super::supplier::Column::Nome).sortable(),
        ])
    }

    fn default_sort() -> SortKey {
        SortKey::desc(Column::CreatedOn)
    }

    fn eager_loads() -> Vec<RelationDef> {
        vec![Relation::Supplier.def()]
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn label(&self) -> String {
        format!("{} {} {}", self.plate, self.brand, self.model)
    }
}
