use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgConnection, PgPool};
use tracing::{debug, info};

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(options: PgConnectOptions) -> Result<PgPool, sqlx::Error> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Makes sure database `name` exists. Returns true when it was created.
///
/// Connecting to the target directly is tried first, so a role without access
/// to the maintenance database still works once the target exists. Only when
/// that fails is `pg_database` checked through the maintenance connection.
pub async fn ensure_database(
    target: PgConnectOptions,
    maintenance: PgConnectOptions,
    name: &str,
) -> Result<bool, sqlx::Error> {
    match PgConnection::connect_with(&target).await {
        Ok(conn) => {
            conn.close().await?;
            debug!("Database {name} is reachable");
            return Ok(false);
        }
        Err(e) => debug!("Cannot connect to {name} ({e}), checking via maintenance database"),
    }

    let mut conn = PgConnection::connect_with(&maintenance).await?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(name)
            .fetch_one(&mut conn)
            .await?;

    if !exists {
        // Identifiers cannot be bound as parameters.
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(name)))
            .execute(&mut conn)
            .await?;
        info!("Created database {name}");
    }

    conn.close().await?;
    Ok(!exists)
}

/// Creates the `solutions` table and its indexes if missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS solutions (
            id          SERIAL PRIMARY KEY,
            game_date   DATE NOT NULL UNIQUE,
            game_id     INTEGER,
            editor      TEXT,
            categories  JSONB,
            created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_solutions_game_date ON solutions (game_date)")
        .execute(pool)
        .await?;

    // GIN for `categories @> ...` containment lookups
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_solutions_categories ON solutions USING GIN (categories)",
    )
    .execute(pool)
    .await?;

    info!("Schema for solutions is in place");
    Ok(())
}

/// Double-quotes a Postgres identifier, escaping embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Maintenance options that can never connect.
    fn unreachable_maintenance() -> PgConnectOptions {
        PgConnectOptions::new()
            .host("127.0.0.1")
            .port(1)
            .database("postgres")
    }

    #[tokio::test]
    async fn test_ensure_database_fails_when_nothing_is_reachable() {
        let target = PgConnectOptions::new()
            .host("127.0.0.1")
            .port(1)
            .database("connections");
        assert!(ensure_database(target, unreachable_maintenance(), "connections")
            .await
            .is_err());
    }

    #[ignore]
    #[tokio::test]
    async fn test_existing_target_skips_maintenance_database() {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
        let target: PgConnectOptions = url.parse().unwrap();
        let name = target.get_database().unwrap_or("postgres").to_string();

        let created = ensure_database(target, unreachable_maintenance(), &name)
            .await
            .unwrap();
        assert!(!created);
    }

    #[test]
    fn test_quote_ident_plain() {
        assert_eq!(quote_ident("connections"), "\"connections\"");
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(
            quote_ident("x\"; DROP DATABASE postgres; --"),
            "\"x\"\"; DROP DATABASE postgres; --\""
        );
    }
}
