//! Loader: syncs every accepted puzzle in the store into the `solutions` table.

use chrono::NaiveDate;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::db::{create_pool, ensure_database, ensure_schema};
use crate::errors::PipelineError;
use crate::models::puzzle::PuzzleRecord;
use crate::store::Store;

/// A store entry ready to be written to `solutions`.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionUpsert {
    pub game_date: NaiveDate,
    pub game_id: Option<i32>,
    pub editor: Option<String>,
    pub categories: Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub upserted: usize,
    pub skipped: usize,
}

/// Selects the entries whose status is the accepted sentinel.
/// Everything else, including documents that are not objects, is skipped.
pub fn accepted_upserts(store: &Store) -> (Vec<SolutionUpsert>, usize) {
    let mut upserts = Vec::new();
    let mut skipped = 0;

    for (date, document) in store.iter() {
        let record = match PuzzleRecord::from_document(document) {
            Ok(record) if record.is_accepted() => record,
            Ok(record) => {
                debug!("Skipping {date}: status {:?}", record.status);
                skipped += 1;
                continue;
            }
            Err(e) => {
                debug!("Skipping {date}: {e}");
                skipped += 1;
                continue;
            }
        };

        if let Some(issue) = record.category_shape_issue() {
            warn!("Puzzle {date} has unexpected categories: {issue}");
        }

        upserts.push(SolutionUpsert {
            game_date: *date,
            game_id: record.id,
            editor: record.editor,
            categories: record.categories,
        });
    }

    (upserts, skipped)
}

/// Upserts all rows in one transaction. Any failure rolls back every upsert
/// of this call.
pub async fn upsert_solutions(pool: &PgPool, rows: &[SolutionUpsert]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for row in rows {
        sqlx::query(
            r#"
            INSERT INTO solutions (game_date, game_id, editor, categories, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (game_date) DO UPDATE SET
                game_id = EXCLUDED.game_id,
                editor = EXCLUDED.editor,
                categories = EXCLUDED.categories,
                created_at = NOW()
            "#,
        )
        .bind(row.game_date)
        .bind(row.game_id)
        .bind(row.editor.as_deref())
        .bind(&row.categories)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Runs the full load against a pool whose database and schema already exist.
pub async fn load_store(pool: &PgPool, store: &Store) -> Result<LoadReport, PipelineError> {
    let (rows, skipped) = accepted_upserts(store);
    upsert_solutions(pool, &rows).await?;

    let report = LoadReport {
        upserted: rows.len(),
        skipped,
    };
    info!(
        "Upserted {} solutions, skipped {}",
        report.upserted, report.skipped
    );
    Ok(report)
}

/// The `load` pipeline: read the store, ensure database and schema, upsert.
/// The store file must exist; nothing touches the database until it is read.
/// Steps that already succeeded are not undone when a later one fails.
pub async fn run(config: &Config) -> Result<LoadReport, PipelineError> {
    let store = Store::load_existing(&config.solutions_file)?;
    info!(
        "Loaded {} entries from {}",
        store.len(),
        config.solutions_file.display()
    );

    ensure_database(
        config.connect_options(),
        config.maintenance_options(),
        &config.db_name,
    )
    .await?;

    let pool = create_pool(config.connect_options()).await?;
    ensure_schema(&pool).await?;

    let report = load_store(&pool, &store).await;
    pool.close().await;
    report
}
