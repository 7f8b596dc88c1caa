/*!
# Query Benchmarks

Specification building and paginated execution against sqlite.

## Usage

```bash
cargo bench --bench query_benchmarks

# Only the in-memory specification benchmarks
cargo bench --bench query_benchmarks -- "Specification"

# Quick run with fewer samples
cargo bench --bench query_benchmarks -- --quick
```

HTML reports are generated in `target/criterion/report/index.html`.
*/

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use querygate::{
    CrudResource, FieldDef, FieldResolver, FilterCriterion, MergeIntoActiveModel,
    PaginatedRequest, SortCriterion, SortKey, Validatable,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, Database, DatabaseConnection, DbBackend,
    QueryTrait, Schema, entity::prelude::*,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::runtime::Runtime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "benchmark_posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub published: bool,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkPost {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub published: bool,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Model> for BenchmarkPost {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            author: model.author,
            published: model.published,
            view_count: model.view_count,
            created_at: model.created_at,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BenchmarkPostCreate {
    pub title: String,
    pub author: String,
}

impl Validatable for BenchmarkPostCreate {}

impl From<BenchmarkPostCreate> for ActiveModel {
    fn from(create: BenchmarkPostCreate) -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            title: Set(create.title),
            author: Set(create.author),
            published: Set(false),
            view_count: Set(0),
            created_at: Set(Utc::now()),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BenchmarkPostUpdate {
    pub title: Option<String>,
}

impl Validatable for BenchmarkPostUpdate {}

impl MergeIntoActiveModel<ActiveModel> for BenchmarkPostUpdate {
    fn merge_into_activemodel(self, mut existing: ActiveModel) -> Result<ActiveModel, DbErr> {
        if let Some(title) = self.title {
            existing.title = Set(title);
        }
        Ok(existing)
    }
}

impl CrudResource for BenchmarkPost {
    type EntityType = Entity;
    type ModelType = Model;
    type ActiveModelType = ActiveModel;
    type ColumnType = Column;
    type CreateModel = BenchmarkPostCreate;
    type UpdateModel = BenchmarkPostUpdate;

    const ID_COLUMN: Column = Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "benchmark post";
    const RESOURCE_NAME_PLURAL: &'static str = "benchmark-posts";

    fn fields() -> FieldResolver {
        FieldResolver::new(vec![
            FieldDef::identifier("id", Column::Id),
            FieldDef::text("title", Column::Title).sortable(),
            FieldDef::text("author", Column::Author).sortable(),
            FieldDef::boolean("published", Column::Published),
            FieldDef::numeric("viewCount", Column::ViewCount).sortable(),
            FieldDef::date("createdAt", Column::CreatedAt).sortable(),
        ])
    }

    fn default_sort() -> SortKey {
        SortKey::desc(Column::CreatedAt)
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn label(&self) -> String {
        self.title.clone()
    }
}

fn get_database_url() -> String {
    std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("BENCHMARK_DATABASE_URL"))
        .unwrap_or_else(|_| "sqlite::memory:".to_string())
}

async fn setup_benchmark_db(record_count: usize) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(&get_database_url()).await?;
    let backend = db.get_database_backend();
    let mut table = Schema::new(backend).create_table_from_entity(Entity);
    db.execute(backend.build(table.if_not_exists())).await?;

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    for i in 0..record_count {
        let offset = i64::try_from(i).unwrap_or(i64::MAX);
        ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(format!("Benchmark Post Title {i}")),
            author: Set(format!("Author{}", i % 10)),
            published: Set(i % 2 == 0),
            view_count: Set(i32::try_from(i * 10).unwrap_or(i32::MAX)),
            created_at: Set(start + ChronoDuration::hours(offset)),
        }
        .insert(&db)
        .await?;
    }

    Ok(db)
}

fn criteria() -> Vec<(&'static str, Vec<FilterCriterion>)> {
    vec![
        ("none", Vec::new()),
        ("text", vec![FilterCriterion::new("title", "Title 4")]),
        (
            "mixed",
            vec![
                FilterCriterion::new("author", "Author3"),
                FilterCriterion::new("published", "true"),
                FilterCriterion::new("viewCount_gte", "500"),
                FilterCriterion::new("createdAt_lt", "2024-01-10"),
            ],
        ),
        (
            "ignored",
            vec![
                FilterCriterion::new("unknown", "x"),
                FilterCriterion::new("title", "   "),
                FilterCriterion::new("viewCount", "many"),
            ],
        ),
    ]
}

fn bench_specification(c: &mut Criterion) {
    let fields = BenchmarkPost::fields();
    let sorting = [SortCriterion::asc("viewCount")];

    let mut group = c.benchmark_group("Specification");
    for (name, filters) in criteria() {
        group.bench_with_input(BenchmarkId::new("build_and_render", name), &filters, |b, filters| {
            b.iter(|| {
                let spec = querygate::SpecificationBuilder::new(
                    &fields,
                    DbBackend::Sqlite,
                    BenchmarkPost::default_sort(),
                )
                .tie_breaker(Column::Id)
                .build(std::hint::black_box(filters), Some(&sorting[..]));
                spec.apply(Entity::find()).build(DbBackend::Sqlite).to_string()
            });
        });
    }
    group.finish();
}

fn bench_paginated_execution(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    for size in [100, 1000] {
        let db = rt.block_on(setup_benchmark_db(size)).unwrap();

        let mut group = c.benchmark_group(format!("Paginated Execution ({size} records)"));
        group.measurement_time(Duration::from_secs(8));

        for (name, filters) in criteria() {
            let mut request = PaginatedRequest::new(2, 20).sort(SortCriterion::desc("viewCount"));
            request.filters = filters;
            group.bench_with_input(BenchmarkId::new("get_paginated", name), &request, |b, request| {
                b.iter(|| {
                    rt.block_on(std::hint::black_box(BenchmarkPost::get_paginated(
                        &db,
                        request.clone(),
                    )))
                    .unwrap()
                });
            });
        }

        group.bench_with_input(BenchmarkId::new("count", size), &size, |b, _| {
            let filters = [FilterCriterion::new("published", "true")];
            b.iter(|| rt.block_on(BenchmarkPost::count(&db, &filters)).unwrap());
        });
        group.finish();
    }
}

fn configure_criterion() -> Criterion {
    Criterion::default()
        .sample_size(30)
        .measurement_time(std::time::Duration::from_secs(5))
        .warm_up_time(std::time::Duration::from_secs(1))
        .with_plots()
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = bench_specification, bench_paginated_execution
}
criterion_main!(benches);
