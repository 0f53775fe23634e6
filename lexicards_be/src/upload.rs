//! Bulk import: turning an uploaded CSV or JSON file into rows, checking the
//! rows before anything is written, and mapping valid rows onto card payloads.

use crate::models::{CardPayload, CardType, Difficulty, value_text};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// One parsed line of an upload, keyed by column name
pub type Row = Map<String, Value>;

pub const REQUIRED_FIELDS: [&str; 3] = ["word", "translation", "language"];
const MAX_LANGUAGE_LEN: usize = 50;

pub const TEMPLATE_CSV: &str = r#"word,translation,language,type,example,notes
libro,book,Spanish,noun,"Estoy leyendo un libro.","Masculine noun"
correr,to run,Spanish,verb,"Me gusta correr por la mañana.",Regular -er verb
feliz,happy,Spanish,adjective,"Estoy muy feliz hoy.",Common adjective
la maison,the house,French,noun,"J'habite dans une grande maison.",Feminine noun
manger,to eat,French,verb,"Nous mangeons ensemble.",Regular -er verb
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Json,
}

impl UploadFormat {
    /// Spreadsheets and anything else unknown map to `None`
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let content_type = content_type.to_ascii_lowercase();
        if content_type.contains("csv") || content_type.contains("text") {
            Some(UploadFormat::Csv)
        } else if content_type.contains("json") {
            Some(UploadFormat::Json)
        } else {
            None
        }
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Error parsing file: {0}")]
    Csv(#[from] csv::Error),
    #[error("Error parsing file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Error parsing file: expected an array of objects")]
    NotRows,
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),
}

pub fn parse_rows(body: &[u8], format: UploadFormat) -> Result<Vec<Row>, ParseError> {
    let rows = match format {
        UploadFormat::Csv => parse_csv(body)?,
        UploadFormat::Json => parse_json(body)?,
    };
    // column presence is judged on the first row only
    if let Some(first) = rows.first() {
        let missing: Vec<_> = REQUIRED_FIELDS
            .into_iter()
            .filter(|column| !first.contains_key(*column))
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::MissingColumns(missing));
        }
    }
    Ok(rows)
}

fn parse_csv(body: &[u8]) -> Result<Vec<Row>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body);
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(column, cell)| (column.to_string(), Value::String(cell.to_string())))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn parse_json(body: &[u8]) -> Result<Vec<Row>, ParseError> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                _ => Err(ParseError::NotRows),
            })
            .collect(),
        _ => Err(ParseError::NotRows),
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadStats {
    pub total: usize,
    pub nouns: usize,
    pub verbs: usize,
    pub adjectives: usize,
    pub others: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub stats: UploadStats,
}

/// The textual form of a cell; `null`, a missing key and an empty string all count as absent
fn cell(row: &Row, field: &str) -> Option<String> {
    value_text(row.get(field)?).filter(|text| !text.is_empty())
}

pub fn validate_rows(rows: &[Row]) -> ValidationReport {
    let mut errors = Vec::new();
    let mut stats = UploadStats {
        total: rows.len(),
        ..Default::default()
    };

    for (index, row) in rows.iter().enumerate() {
        // +1 for 1-based rows, +1 for the header line
        let line = index + 2;
        for field in REQUIRED_FIELDS {
            if cell(row, field).is_none_or(|value| value.trim().is_empty()) {
                errors.push(format!("Row {line}: Missing \"{field}\""));
            }
        }
        // measured in UTF-16 code units, as the browser client measures it
        if cell(row, "language")
            .is_some_and(|language| language.encode_utf16().count() > MAX_LANGUAGE_LEN)
        {
            errors.push(format!("Row {line}: Language name too long"));
        }

        let raw_type = cell(row, "type");
        let card_type = raw_type.as_deref().and_then(CardType::parse);
        if let (Some(raw), None) = (&raw_type, card_type) {
            errors.push(format!(
                "Row {line}: Invalid type \"{raw}\". Must be: noun, verb, adjective, phrase, other"
            ));
        }
        // phrase rows are counted in no bucket, matching the upload page's summary
        match card_type {
            Some(CardType::Noun) => stats.nouns += 1,
            Some(CardType::Verb) => stats.verbs += 1,
            Some(CardType::Adjective) => stats.adjectives += 1,
            Some(CardType::Phrase) => {}
            Some(CardType::Other) | None => stats.others += 1,
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        stats,
    }
}

/// Maps a validated row onto a new card for `user_id`, due for review a day from `now`
pub fn import_payload(row: &Row, user_id: &str, now: DateTime<Utc>) -> CardPayload {
    CardPayload {
        user_id: Some(user_id.to_string()),
        word: cell(row, "word"),
        translation: cell(row, "translation"),
        language: cell(row, "language"),
        card_type: cell(row, "type").as_deref().and_then(CardType::parse),
        example: cell(row, "example"),
        notes: cell(row, "notes"),
        learned: Some(false),
        last_reviewed: None,
        next_review: Some(now + Duration::hours(24)),
        interval_index: Some(0),
        difficulty: Some(Difficulty::Medium),
    }
}
