use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

/// Part of speech recorded on a card
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Noun,
    Verb,
    Adjective,
    Phrase,
    #[default]
    Other,
}

impl CardType {
    /// Case-insensitive lookup, `None` for anything outside the five known types
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "noun" => Some(CardType::Noun),
            "verb" => Some(CardType::Verb),
            "adjective" => Some(CardType::Adjective),
            "phrase" => Some(CardType::Phrase),
            "other" => Some(CardType::Other),
            _ => None,
        }
    }
}

/// Accepts any casing. Blank, `null` and unknown values become `other`.
impl<'de> Deserialize<'de> for CardType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = lenient_text(deserializer)?;
        Ok(text.as_deref().and_then(CardType::parse).unwrap_or_default())
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Accepts any casing. Blank, `null` and unknown values become `medium`.
impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = lenient_text(deserializer)?;
        Ok(text.as_deref().and_then(Difficulty::parse).unwrap_or_default())
    }
}

/// The textual form of a scalar JSON value: strings as-is, numbers and
/// booleans printed, `null` as `None`. Composite values print as JSON.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Reads a field that should be text but may arrive as a number or boolean,
/// as spreadsheet cells do. Arrays and objects are rejected.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Array(_) => Err(de::Error::invalid_type(de::Unexpected::Seq, &"text")),
        Value::Object(_) => Err(de::Error::invalid_type(de::Unexpected::Map, &"text")),
        scalar => Ok(value_text(&scalar)),
    }
}

///a single vocabulary flashcard
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub language: String,
    #[serde(rename = "type", default)]
    pub card_type: CardType,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub learned: bool,
    #[serde(default)]
    pub last_reviewed: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub next_review: DateTime<Utc>,
    #[serde(default)]
    pub interval_index: u32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl Flashcard {
    pub fn new(id: String, payload: CardPayload, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: payload.user_id.unwrap_or_default(),
            word: payload.word.unwrap_or_default(),
            translation: payload.translation.unwrap_or_default(),
            language: payload.language.unwrap_or_default(),
            card_type: payload.card_type.unwrap_or_default(),
            example: payload.example.unwrap_or_default(),
            notes: payload.notes.unwrap_or_default(),
            learned: payload.learned.unwrap_or(false),
            last_reviewed: payload.last_reviewed.flatten(),
            next_review: payload.next_review.unwrap_or(now),
            interval_index: payload.interval_index.unwrap_or(0),
            created_at: now,
            difficulty: payload.difficulty.unwrap_or_default(),
        }
    }

    /// Overwrites every field the payload carries, leaves the rest alone.
    /// `id` and `createdAt` are not part of the payload and never change.
    pub fn apply(&mut self, payload: CardPayload) {
        if let Some(user_id) = payload.user_id {
            self.user_id = user_id;
        }
        if let Some(word) = payload.word {
            self.word = word;
        }
        if let Some(translation) = payload.translation {
            self.translation = translation;
        }
        if let Some(language) = payload.language {
            self.language = language;
        }
        if let Some(card_type) = payload.card_type {
            self.card_type = card_type;
        }
        if let Some(example) = payload.example {
            self.example = example;
        }
        if let Some(notes) = payload.notes {
            self.notes = notes;
        }
        if let Some(learned) = payload.learned {
            self.learned = learned;
        }
        if let Some(last_reviewed) = payload.last_reviewed {
            self.last_reviewed = last_reviewed;
        }
        if let Some(next_review) = payload.next_review {
            self.next_review = next_review;
        }
        if let Some(interval_index) = payload.interval_index {
            self.interval_index = interval_index;
        }
        if let Some(difficulty) = payload.difficulty {
            self.difficulty = difficulty;
        }
    }

    pub fn is_due(&self, at: DateTime<Utc>) -> bool {
        self.next_review <= at
    }
}

/// The client supplied part of a card, used for create, batch-create and partial update.
/// Unknown keys (including `id` and `createdAt`) are ignored.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardPayload {
    #[serde(default, deserialize_with = "lenient_text")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub word: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub translation: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub language: Option<String>,
    #[serde(rename = "type")]
    pub card_type: Option<CardType>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub example: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub notes: Option<String>,
    pub learned: Option<bool>,
    // outer None: key absent, Some(None): explicit null
    #[serde(default, deserialize_with = "nullable")]
    pub last_reviewed: Option<Option<DateTime<Utc>>>,
    pub next_review: Option<DateTime<Utc>>,
    pub interval_index: Option<u32>,
    pub difficulty: Option<Difficulty>,
}

impl CardPayload {
    /// Decodes one entry of a batch request. Anything that is not a JSON object,
    /// or whose fields have the wrong shape, is a failed item.
    pub fn from_batch_item(item: serde_json::Value) -> Option<Self> {
        if !item.is_object() {
            return None;
        }
        serde_json::from_value(item)
            .map_err(|err| log::warn!("Rejecting batch item: {err}"))
            .ok()
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_cards: u32,
    pub learned_cards: u32,
    pub review_due: u32,
    pub streak: u32,
    pub last_active: DateTime<Utc>,
}

impl UserStats {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            total_cards: 0,
            learned_cards: 0,
            review_due: 0,
            streak: 0,
            last_active: now,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub stats: UserStats,
}
