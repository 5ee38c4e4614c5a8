use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Status value that marks a fetched puzzle as eligible for the database.
pub const ACCEPTED_STATUS: &str = "OK";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a strict `YYYY-MM-DD` date.
///
/// The input must be exactly four digits, a dash, two digits, a dash and two
/// digits, and it must name a real calendar day. `2024-1-05` and `2024-13-45`
/// are both rejected.
pub fn parse_puzzle_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    if bytes.len() != 10 {
        return None;
    }
    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

pub fn format_puzzle_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// One fetched puzzle, as read back out of the store.
///
/// Only the fields the loader needs are typed. `categories` stays an opaque
/// JSON value since it is written to the database as-is.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PuzzleRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i32>,
    #[serde(default)]
    pub editor: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub categories: Value,
}

impl PuzzleRecord {
    pub fn from_document(document: &Value) -> serde_json::Result<Self> {
        PuzzleRecord::deserialize(document)
    }

    pub fn is_accepted(&self) -> bool {
        self.status.as_deref() == Some(ACCEPTED_STATUS)
    }

    /// Decodes the categories into their expected shape.
    /// Returns `None` when the blob does not look like a list of categories.
    pub fn typed_categories(&self) -> Option<Vec<Category>> {
        Vec::<Category>::deserialize(&self.categories).ok()
    }

    /// Describes why the categories deviate from four groups of four words,
    /// or `None` if they match.
    pub fn category_shape_issue(&self) -> Option<String> {
        let Some(categories) = self.typed_categories() else {
            return Some("categories is not a list of category objects".to_string());
        };
        if categories.is_empty() {
            return Some("categories is empty".to_string());
        }
        categories
            .iter()
            .find(|c| c.words.len() != WORDS_PER_CATEGORY)
            .map(|c| {
                format!(
                    "category '{}' has {} words, expected {WORDS_PER_CATEGORY}",
                    c.title,
                    c.words.len()
                )
            })
    }
}

pub const WORDS_PER_CATEGORY: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub title: String,
    #[serde(default)]
    pub level: Option<i64>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub words: Vec<String>,
}

/// Accepts any JSON value for `id`; anything that is not an integer fitting
/// in an `INTEGER` column becomes `None`.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_i64().and_then(|n| i32::try_from(n).ok()))
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SolutionRow {
    pub id: i32,
    pub game_date: NaiveDate,
    pub game_id: Option<i32>,
    pub editor: Option<String>,
    pub categories: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Response body of `GET /v1/connections/:date`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionsGame {
    pub id: Option<i32>,
    pub print_date: String,
    pub editor: Option<String>,
    pub categories: Value,
}

impl From<SolutionRow> for ConnectionsGame {
    fn from(row: SolutionRow) -> Self {
        Self {
            id: row.game_id,
            print_date: format_puzzle_date(row.game_date),
            editor: row.editor,
            categories: row.categories.unwrap_or(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_puzzle_date_accepts_valid_dates() {
        assert_eq!(
            parse_puzzle_date("2024-10-01"),
            NaiveDate::from_ymd_opt(2024, 10, 1)
        );
        assert_eq!(
            parse_puzzle_date("2024-02-29"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn test_parse_puzzle_date_rejects_malformed_input() {
        for raw in [
            "2024-13-45",
            "2023-02-29",
            "2024-1-05",
            "24-10-01",
            "2024/10/01",
            "2024-10-01 ",
            " 2024-10-01",
            "2024-10-1a",
            "20241001",
            "",
            "+024-10-01",
        ] {
            assert!(parse_puzzle_date(raw).is_none(), "accepted {raw:?}");
        }
    }

    #[test]
    fn test_record_from_document() {
        let doc = json!({
            "id": 478,
            "editor": "Wyna Liu",
            "status": "OK",
            "categories": [{"title": "FRUIT", "level": 1, "difficulty": "Easy",
                            "words": ["APPLE", "PEAR", "PLUM", "FIG"]}]
        });
        let record = PuzzleRecord::from_document(&doc).unwrap();
        assert_eq!(record.id, Some(478));
        assert_eq!(record.editor.as_deref(), Some("Wyna Liu"));
        assert!(record.is_accepted());
        assert_eq!(record.category_shape_issue(), None);
        assert_eq!(record.typed_categories().unwrap()[0].words[3], "FIG");
    }

    #[test]
    fn test_invalid_id_becomes_none() {
        let record = PuzzleRecord::from_document(&json!({"id": "abc", "status": "OK"})).unwrap();
        assert_eq!(record.id, None);
        let record = PuzzleRecord::from_document(&json!({"id": 9_000_000_000_i64})).unwrap();
        assert_eq!(record.id, None);
        let record = PuzzleRecord::from_document(&json!({})).unwrap();
        assert_eq!(record.id, None);
        assert_eq!(record.categories, Value::Null);
    }

    #[test]
    fn test_missing_or_other_status_is_not_accepted() {
        let missing = PuzzleRecord::from_document(&json!({"id": 1})).unwrap();
        assert!(!missing.is_accepted());
        let error = PuzzleRecord::from_document(&json!({"status": "ERROR"})).unwrap();
        assert!(!error.is_accepted());
        let lowercase = PuzzleRecord::from_document(&json!({"status": "ok"})).unwrap();
        assert!(!lowercase.is_accepted());
    }

    #[test]
    fn test_category_shape_issue_reports_short_group() {
        let record = PuzzleRecord::from_document(&json!({
            "categories": [{"title": "BIRDS", "words": ["OWL", "JAY"]}]
        }))
        .unwrap();
        let issue = record.category_shape_issue().unwrap();
        assert!(issue.contains("BIRDS"));
        assert!(issue.contains("2 words"));
    }

    #[test]
    fn test_category_shape_issue_reports_non_list() {
        let record = PuzzleRecord::from_document(&json!({"categories": "nope"})).unwrap();
        assert!(record.category_shape_issue().is_some());
    }

    #[test]
    fn test_connections_game_from_row() {
        let row = SolutionRow {
            id: 1,
            game_date: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
            game_id: Some(478),
            editor: Some("Wyna Liu".to_string()),
            categories: Some(json!([])),
            created_at: Utc::now(),
        };
        let game = ConnectionsGame::from(row);
        assert_eq!(game.print_date, "2024-10-01");
        assert_eq!(game.id, Some(478));
        assert_eq!(game.categories, json!([]));
    }
}
