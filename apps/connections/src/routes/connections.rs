use axum::{
    extract::{Path, State},
    Json,
};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::puzzle::{parse_puzzle_date, ConnectionsGame, SolutionRow};
use crate::state::AppState;

/// GET /v1/connections/:date
pub async fn handle_get_game(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<ConnectionsGame>, AppError> {
    let game_date = parse_puzzle_date(&date).ok_or_else(|| {
        AppError::Validation("Invalid date format. Expected YYYY-MM-DD".to_string())
    })?;

    let row = find_solution(&state.db, game_date)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No game data found for date {date}")))?;

    Ok(Json(ConnectionsGame::from(row)))
}

pub async fn find_solution(
    pool: &PgPool,
    game_date: chrono::NaiveDate,
) -> Result<Option<SolutionRow>, sqlx::Error> {
    sqlx::query_as::<_, SolutionRow>(
        "SELECT id, game_date, game_id, editor, categories, created_at FROM solutions WHERE game_date = $1",
    )
    .bind(game_date)
    .fetch_optional(pool)
    .await
}
