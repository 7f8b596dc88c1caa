use chrono::{DateTime, Utc};
use querygate::{
    CrudResource, FieldDef, FieldResolver, MergeIntoActiveModel, SortKey, Validatable,
    ValidationErrors, validation::validators,
};
use sea_orm::{ActiveValue::Set, entity::prelude::*};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "countries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub nome: String,
    #[sea_orm(unique)]
    pub code: String,
    pub created_on: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::supplier::Entity")]
    Suppliers,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Suppliers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: Uuid,
    pub nome: String,
    pub code: String,
    pub created_on: DateTime<Utc>,
}

impl From<Model> for Country {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            nome: model.nome,
            code: model.code,
            created_on: model.created_on,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountryCreate {
    pub nome: String,
    pub code: String,
}

impl Validatable for CountryCreate {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.check(validators::validate_required("nome", &self.nome));
        errors.check(validators::validate_length("code", self.code.trim(), Some(2), Some(2)));
        errors
    }
}

impl From<CountryCreate> for ActiveModel {
    fn from(create: CountryCreate) -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            nome: Set(create.nome.trim().to_string()),
            code: Set(create.code.trim().to_ascii_uppercase()),
            created_on: Set(Utc::now()),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountryUpdate {
    pub nome: Option<String>,
    pub code: Option<String>,
}

impl Validatable for CountryUpdate {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Some(nome) = &self.nome {
            errors.check(validators::validate_required("nome", nome));
        }
        if let Some(code) = &self.code {
            errors.check(validators::validate_length("code", code.trim(), Some(2), Some(2)));
        }
        errors
    }
}

impl MergeIntoActiveModel<ActiveModel> for CountryUpdate {
    fn merge_into_activemodel(self, mut existing: ActiveModel) -> Result<ActiveModel, DbErr> {
        if let Some(nome) = self.nome {
            existing.nome = Set(nome.trim().to_string());
        }
        if let Some(code) = self.code {
            existing.code = Set(code.trim().to_ascii_uppercase());
        }
        Ok(existing)
    }
}

impl CrudResource for Country {
    type EntityType = Entity;
    type ModelType = Model;
    type ActiveModelType = ActiveModel;
    type ColumnType = Column;
    type CreateModel = CountryCreate;
    type UpdateModel = CountryUpdate;

    const ID_COLUMN: Column = Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "country";
    const RESOURCE_NAME_PLURAL: &'static str = "countries";

    fn fields() -> FieldResolver {
        FieldResolver::new(vec![
            FieldDef::identifier("id", Column::Id),
            FieldDef::text("nome", Column::Nome).sortable(),
            FieldDef::text("code", Column::Code).sortable(),
            FieldDef::date("createdOn", Column::CreatedOn).sortable(),
        ])
    }

    fn default_sort() -> SortKey {
        SortKey::asc(Column::Nome)
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn label(&self) -> String {
        self.nome.clone()
    }
}
