//! Fleet-management sample domain.
//!
//! Four families served through the generic CRUD routes: countries,
//! suppliers (joined to their country), vehicles (joined to their
//! supplier) and maintenance records (joined to their vehicle).

pub mod country;
pub mod maintenance_record;
pub mod supplier;
pub mod vehicle;

use axum::Router;
use querygate::crud_router;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema};

pub use country::{Country, CountryCreate, CountryUpdate};
pub use maintenance_record::{MaintenanceRecord, MaintenanceRecordCreate, MaintenanceRecordUpdate};
pub use supplier::{Supplier, SupplierCreate, SupplierUpdate};
pub use vehicle::{Vehicle, VehicleCreate, VehicleUpdate};

/// Every fleet family, ready to serve.
pub fn router(db: DatabaseConnection) -> Router {
    Router::new()
        .merge(crud_router::<Country>())
        .merge(crud_router::<Supplier>())
        .merge(crud_router::<Vehicle>())
        .merge(crud_router::<MaintenanceRecord>())
        .with_state(db)
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let mut statement = Schema::new(backend).create_table_from_entity(entity);
    db.execute(backend.build(statement.if_not_exists())).await?;
    Ok(())
}

/// Create the fleet tables, parents first.
///
/// # Errors
///
/// Returns the first `DbErr` raised by the store.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, country::Entity).await?;
    create_table(db, supplier::Entity).await?;
    create_table(db, vehicle::Entity).await?;
    create_table(db, maintenance_record::Entity).await?;
    tracing::debug!("fleet schema ready");
    Ok(())
}
