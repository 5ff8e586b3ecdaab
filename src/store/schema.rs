// src/store/schema.rs

use std::collections::HashSet;

use sqlx::PgPool;

/// Physical column names behind the logical question-bank fields.
///
/// The bank went through a column rename; each field prefers the current
/// name and falls back to the legacy one. A field whose column exists under
/// neither name is `None` and reads as unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    pub question_type: Option<&'static str>,
    pub text: Option<&'static str>,
    pub format: Option<&'static str>,
    pub image: Option<&'static str>,
    pub answer_type: Option<&'static str>,
    pub audio: Option<&'static str>,
    pub difficulty: Option<&'static str>,
    pub category: Option<&'static str>,
    pub time_limit: Option<&'static str>,
    pub active: Option<&'static str>,
    pub option_text: Option<&'static str>,
    pub option_image: Option<&'static str>,
    pub option_order: Option<&'static str>,
}

/// (current, legacy) column names per logical field.
const QUESTION_TYPE: (&str, Option<&str>) = ("question_type", Some("questionType"));
const TEXT: (&str, Option<&str>) = ("question_text", Some("questionText"));
const FORMAT: (&str, Option<&str>) = ("question_format", Some("questionFormat"));
const IMAGE: (&str, Option<&str>) = ("question_image", Some("questionImage"));
const ANSWER_TYPE: (&str, Option<&str>) = ("answer_type", Some("answerType"));
const AUDIO: (&str, Option<&str>) = ("audio_link", Some("audioLink"));
const DIFFICULTY: (&str, Option<&str>) = ("difficulty", None);
const CATEGORY: (&str, Option<&str>) = ("category", None);
const TIME_LIMIT: (&str, Option<&str>) = ("time_limit", Some("timeLimit"));
const ACTIVE: (&str, Option<&str>) = ("is_active", Some("isActive"));
const OPTION_TEXT: (&str, Option<&str>) = ("option_text", Some("text"));
const OPTION_IMAGE: (&str, Option<&str>) = ("option_image", Some("image"));
const OPTION_ORDER: (&str, Option<&str>) = ("option_order", None);

fn pick(
    columns: &HashSet<String>,
    (current, legacy): (&'static str, Option<&'static str>),
) -> Option<&'static str> {
    if columns.contains(current) {
        return Some(current);
    }
    legacy.filter(|name| columns.contains(*name))
}

impl FieldMap {
    pub fn resolve(question_columns: &HashSet<String>, option_columns: &HashSet<String>) -> Self {
        Self {
            question_type: pick(question_columns, QUESTION_TYPE),
            text: pick(question_columns, TEXT),
            format: pick(question_columns, FORMAT),
            image: pick(question_columns, IMAGE),
            answer_type: pick(question_columns, ANSWER_TYPE),
            audio: pick(question_columns, AUDIO),
            difficulty: pick(question_columns, DIFFICULTY),
            category: pick(question_columns, CATEGORY),
            time_limit: pick(question_columns, TIME_LIMIT),
            active: pick(question_columns, ACTIVE),
            option_text: pick(option_columns, OPTION_TEXT),
            option_image: pick(option_columns, OPTION_IMAGE),
            option_order: pick(option_columns, OPTION_ORDER),
        }
    }

    /// The layout created by the bundled migrations.
    pub fn current() -> Self {
        Self {
            question_type: Some(QUESTION_TYPE.0),
            text: Some(TEXT.0),
            format: Some(FORMAT.0),
            image: Some(IMAGE.0),
            answer_type: Some(ANSWER_TYPE.0),
            audio: Some(AUDIO.0),
            difficulty: Some(DIFFICULTY.0),
            category: Some(CATEGORY.0),
            time_limit: Some(TIME_LIMIT.0),
            active: Some(ACTIVE.0),
            option_text: Some(OPTION_TEXT.0),
            option_image: Some(OPTION_IMAGE.0),
            option_order: Some(OPTION_ORDER.0),
        }
    }

    /// Reads the live column sets once and resolves the map from them.
    pub async fn probe(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let question_columns = table_columns(pool, "questions").await?;
        let option_columns = table_columns(pool, "question_options").await?;
        let fields = Self::resolve(&question_columns, &option_columns);

        if fields != Self::current() {
            tracing::warn!("Question bank uses a legacy or partial layout: {:?}", fields);
        }

        Ok(fields)
    }
}

impl Default for FieldMap {
    fn default() -> Self {
        Self::current()
    }
}

async fn table_columns(pool: &PgPool, table: &str) -> Result<HashSet<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT column_name::TEXT
        FROM information_schema.columns
        WHERE table_schema = current_schema() AND table_name = $1
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// Quotes an identifier so camelCase legacy names survive Postgres folding.
pub fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
