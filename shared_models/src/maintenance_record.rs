use chrono::{DateTime, Utc};
use querygate::{
    CrudResource, FieldDef, FieldResolver, MergeIntoActiveModel, SortKey, Validatable,
    ValidationErrors, validation::validators,
};
use sea_orm::{ActiveValue::Set, entity::prelude::*};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "maintenance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub description: String,
    pub cost: f64,
    pub performed_on: DateTime<Utc>,
    pub completed: bool,
    pub created_on: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id",
        on_delete = "Cascade"
    )]
    Vehicle,
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRecord {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub description: String,
    pub cost: f64,
    pub performed_on: DateTime<Utc>,
    pub completed: bool,
    pub created_on: DateTime<Utc>,
}

impl From<Model> for MaintenanceRecord {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            vehicle_id: model.vehicle_id,
            description: model.description,
            cost: model.cost,
            performed_on: model.performed_on,
            completed: model.completed,
            created_on: model.created_on,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRecordCreate {
    pub vehicle_id: Uuid,
    pub description: String,
    #[serde(default)]
    pub cost: f64,
    pub performed_on: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
}

impl Validatable for MaintenanceRecordCreate {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.check(validators::validate_required("description", &self.description));
        errors.check(validators::validate_length("description", &self.description, None, Some(2000)));
        errors.check(validators::validate_range("cost", self.cost, Some(0.0), None));
        errors
    }
}

impl From<MaintenanceRecordCreate> for ActiveModel {
    fn from(create: MaintenanceRecordCreate) -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            vehicle_id: Set(create.vehicle_id),
            description: Set(create.description.trim().to_string()),
            cost: Set(create.cost),
            performed_on: Set(create.performed_on),
            completed: Set(create.completed),
            created_on: Set(Utc::now()),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRecordUpdate {
    pub description: Option<String>,
    pub cost: Option<f64>,
    pub performed_on: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
}

impl Validatable for MaintenanceRecordUpdate {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Some(description) = &self.description {
            errors.check(validators::validate_required("description", description));
        }
        if let Some(cost) = self.cost {
            errors.check(validators::validate_range("cost", cost, Some(0.0), None));
        }
        errors
    }
}

impl MergeIntoActiveModel<ActiveModel> for MaintenanceRecordUpdate {
    fn merge_into_activemodel(self, mut existing: ActiveModel) -> Result<ActiveModel, DbErr> {
        if let Some(description) = self.description {
            existing.description = Set(description.trim().to_string());
        }
        if let Some(cost) = self.cost {
            existing.cost = Set(cost);
        }
        if let Some(performed_on) = self.performed_on {
            existing.performed_on = Set(performed_on);
        }
        if let Some(completed) = self.completed {
            existing.completed = Set(completed);
        }
        Ok(existing)
    }
}

impl CrudResource for MaintenanceRecord {
    type EntityType = Entity;
    type ModelType = Model;
    type ActiveModelType = ActiveModel;
    type ColumnType = Column;
    type CreateModel = MaintenanceRecordCreate;
    type UpdateModel = MaintenanceRecordUpdate;

    const ID_COLUMN: Column = Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "maintenance record";
    const RESOURCE_NAME_PLURAL: &'static str = "maintenance-records";
    const DEFAULT_PAGE_SIZE: u64 = 25;

    fn fields() -> FieldResolver {
        FieldResolver::new(vec![
            FieldDef::identifier("id", Column::Id),
            FieldDef::identifier("vehicleId", Column::VehicleId),
            FieldDef::text("description", Column::Description),
            FieldDef::numeric("cost", Column::Cost).sortable(),
            FieldDef::date("performedOn", Column::PerformedOn).sortable(),
            FieldDef::boolean("completed", Column::Completed),
            FieldDef::date("createdOn", Column::CreatedOn).sortable(),
            FieldDef::text("vehiclePlate", super::vehicle::Column::Plate).sortable(),
        ])
    }

    fn default_sort() -> SortKey {
        SortKey::desc(Column::PerformedOn)
    }

    fn eager_loads() -> Vec<RelationDef> {
        vec![Relation::Vehicle.def()]
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn label(&self) -> String {
        format!("{} ({})", self.description, self.performed_on.format("%Y-%m-%d"))
    }
}
