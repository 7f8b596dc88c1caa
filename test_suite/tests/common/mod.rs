#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use querygate::ResponseEnvelope;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, Database, DatabaseConnection, DbErr};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_models::{country, supplier, vehicle};
use tower::ServiceExt;
use uuid::Uuid;

pub use shared_models::{Country, MaintenanceRecord, Supplier, Vehicle};

fn test_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string())
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(&test_database_url()).await?;
    shared_models::create_schema(&db).await?;
    Ok(db)
}

pub fn setup_test_app(db: DatabaseConnection) -> Router {
    shared_models::router(db)
}

/// 2024-01-01 00:00:00 UTC plus `days`.
pub fn day(days: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(days)
}

pub async fn seed_country(db: &DatabaseConnection, nome: &str, code: &str) -> Uuid {
    let model = country::ActiveModel {
        id: Set(Uuid::new_v4()),
        nome: Set(nome.to_string()),
        code: Set(code.to_string()),
        created_on: Set(day(0)),
    }
    .insert(db)
    .await
    .expect("Failed to insert country");
    model.id
}

pub async fn seed_supplier(
    db: &DatabaseConnection,
    country_id: Uuid,
    nome: &str,
    num_contribuinte: &str,
    created_on: DateTime<Utc>,
) -> Uuid {
    let model = supplier::ActiveModel {
        id: Set(Uuid::new_v4()),
        nome: Set(nome.to_string()),
        num_contribuinte: Set(num_contribuinte.to_string()),
        country_id: Set(country_id),
        active: Set(true),
        rating: Set(3.0),
        created_on: Set(created_on),
    }
    .insert(db)
    .await
    .expect("Failed to insert supplier");
    model.id
}

pub async fn seed_vehicle(
    db: &DatabaseConnection,
    supplier_id: Option<Uuid>,
    plate: &str,
    year: i32,
    created_on: DateTime<Utc>,
) -> Uuid {
    let model = vehicle::ActiveModel {
        id: Set(Uuid::new_v4()),
        plate: Set(plate.to_string()),
        brand: Set("Renault".to_string()),
        model: Set("Clio".to_string()),
        year: Set(year),
        mileage: Set(10_000),
        supplier_id: Set(supplier_id),
        active: Set(true),
        created_on: Set(created_on),
    }
    .insert(db)
    .await
    .expect("Failed to insert vehicle");
    model.id
}

/// Portugal plus three suppliers: Ana Silva (oldest), Bruno, Mariana (newest).
pub async fn seed_suppliers(db: &DatabaseConnection) -> Uuid {
    let portugal = seed_country(db, "Portugal", "PT").await;
    seed_supplier(db, portugal, "Ana Silva", "500000001", day(0)).await;
    seed_supplier(db, portugal, "Bruno", "500000002", day(1)).await;
    seed_supplier(db, portugal, "Mariana", "500000003", day(2)).await;
    portugal
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn envelope<T: DeserializeOwned>(&self) -> ResponseEnvelope<T> {
        serde_json::from_value(self.body.clone()).expect("Body is not a response envelope")
    }

    pub fn data<T: DeserializeOwned>(&self) -> T {
        self.envelope::<T>().data.expect("Envelope carries no data")
    }
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> TestResponse {
    send_raw(app, method, uri, body.map(|value| value.to_string())).await
}

pub async fn send_raw(app: &Router, method: &str, uri: &str, body: Option<String>) -> TestResponse {
    let mut request = Request::builder().method(method).uri(uri);
    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    let request = request
        .body(body.map_or_else(Body::empty, Body::from))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            panic!("Response is not JSON: {}", String::from_utf8_lossy(&bytes))
        })
    };

    TestResponse { status, headers, body }
}
