use crate::models::{CardPayload, Flashcard, User, UserStats};
use crate::storage::{Storage, StorageError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Everything the mock backend persists, written as one JSON document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub cards: Vec<Flashcard>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub batches: Vec<serde_json::Value>,
}

/// What a mutation decided: `Commit` persists the draft, `Discard` drops it
enum Mutation<R> {
    Commit(R),
    Discard(R),
}

#[derive(Debug, Clone, Default)]
pub struct CardFilter {
    pub user_id: Option<String>,
    pub next_review_lte: Option<DateTime<Utc>>,
}

impl CardFilter {
    fn matches(&self, card: &Flashcard) -> bool {
        let user_ok = self
            .user_id
            .as_deref()
            .is_none_or(|user_id| card.user_id == user_id);
        let due_ok = self.next_review_lte.is_none_or(|at| card.is_due(at));
        user_ok && due_ok
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub created: usize,
    pub failed: usize,
    pub cards: Vec<Flashcard>,
}

/// The repository every route talks to. All access goes through one mutex so a
/// mutation and its write finish before anyone else sees the document.
pub struct MockStore {
    document: Mutex<Document>,
    storage: Box<dyn Storage>,
}

impl MockStore {
    pub fn open(storage: Box<dyn Storage>) -> Result<Self, StorageError> {
        let document = storage.load()?.unwrap_or_else(|| {
            log::info!("No stored document found, starting empty");
            Document::default()
        });
        log::info!(
            "Loaded {} cards and {} users",
            document.cards.len(),
            document.users.len()
        );
        Ok(Self {
            document: Mutex::new(document),
            storage,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Document> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `change` against a copy of the document. On `Commit` the copy is
    /// written out and swapped in; a failed write leaves the live document as it was.
    fn mutate<R>(
        &self,
        change: impl FnOnce(&mut Document) -> Mutation<R>,
    ) -> Result<R, StorageError> {
        let mut current = self.lock();
        let mut draft = current.clone();
        match change(&mut draft) {
            Mutation::Commit(result) => {
                self.storage.save(&draft)?;
                *current = draft;
                Ok(result)
            }
            Mutation::Discard(result) => Ok(result),
        }
    }

    pub fn list_cards(&self, filter: &CardFilter) -> Vec<Flashcard> {
        self.lock()
            .cards
            .iter()
            .filter(|card| filter.matches(card))
            .cloned()
            .collect()
    }

    pub fn get_card(&self, id: &str) -> Option<Flashcard> {
        self.lock().cards.iter().find(|card| card.id == id).cloned()
    }

    pub fn create_card(&self, payload: CardPayload) -> Result<Flashcard, StorageError> {
        self.mutate(|document| {
            let card = Flashcard::new(new_id("card"), payload, Utc::now());
            document.cards.push(card.clone());
            Mutation::Commit(card)
        })
    }

    /// `Ok(None)` if no card has this id
    pub fn update_card(
        &self,
        id: &str,
        payload: CardPayload,
    ) -> Result<Option<Flashcard>, StorageError> {
        self.mutate(
            |document| match document.cards.iter_mut().find(|card| card.id == id) {
                Some(card) => {
                    card.apply(payload);
                    Mutation::Commit(Some(card.clone()))
                }
                None => Mutation::Discard(None),
            },
        )
    }

    /// `Ok(false)` if no card has this id
    pub fn delete_card(&self, id: &str) -> Result<bool, StorageError> {
        self.mutate(|document| {
            match document.cards.iter().position(|card| card.id == id) {
                Some(index) => {
                    document.cards.remove(index);
                    Mutation::Commit(true)
                }
                None => Mutation::Discard(false),
            }
        })
    }

    /// Inserts every decoded payload; `None` entries are items that could not be
    /// decoded and only count towards `failed`. One write covers the batch.
    pub fn create_cards(
        &self,
        payloads: impl IntoIterator<Item = Option<CardPayload>>,
    ) -> Result<BatchResult, StorageError> {
        self.mutate(|document| {
            let now = Utc::now();
            let mut result = BatchResult {
                created: 0,
                failed: 0,
                cards: Vec::new(),
            };
            for payload in payloads {
                match payload {
                    Some(payload) => {
                        let card = Flashcard::new(new_id("card"), payload, now);
                        document.cards.push(card.clone());
                        result.cards.push(card);
                        result.created += 1;
                    }
                    None => result.failed += 1,
                }
            }
            if result.created > 0 {
                Mutation::Commit(result)
            } else {
                Mutation::Discard(result)
            }
        })
    }

    /// `Ok(None)` if the email is already registered
    pub fn register(&self, email: &str, name: &str) -> Result<Option<User>, StorageError> {
        self.mutate(|document| {
            if document.users.iter().any(|user| user.email == email) {
                return Mutation::Discard(None);
            }
            let user = new_user(email, name);
            document.users.push(user.clone());
            Mutation::Commit(Some(user))
        })
    }

    /// Finds the user by exact email, creating one named after the local part if absent
    pub fn login(&self, email: &str) -> Result<User, StorageError> {
        self.mutate(|document| {
            if let Some(user) = document.users.iter().find(|user| user.email == email) {
                return Mutation::Discard(user.clone());
            }
            let name = email.split('@').next().unwrap_or(email);
            let user = new_user(email, name);
            log::info!("Creating user {} on first login", user.id);
            document.users.push(user.clone());
            Mutation::Commit(user)
        })
    }

    /// The stored user with card counts recomputed from the current cards
    pub fn get_user(&self, id: &str, now: DateTime<Utc>) -> Option<User> {
        let document = self.lock();
        let mut user = document.users.iter().find(|user| user.id == id)?.clone();
        let owned = document.cards.iter().filter(|card| card.user_id == id);
        let (mut total, mut learned, mut due) = (0, 0, 0);
        for card in owned {
            total += 1;
            if card.learned {
                learned += 1;
            }
            if card.is_due(now) {
                due += 1;
            }
        }
        user.stats.total_cards = total;
        user.stats.learned_cards = learned;
        user.stats.review_due = due;
        Some(user)
    }
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

fn new_user(email: &str, name: &str) -> User {
    User {
        id: new_id("user"),
        email: email.to_string(),
        name: name.to_string(),
        avatar: None,
        stats: UserStats::empty(Utc::now()),
    }
}

#[cfg(test)]
impl MockStore {
    pub(crate) fn in_memory() -> Self {
        Self::open(Box::new(crate::storage::MemoryStorage::default()))
            .expect("memory storage always loads")
    }
}
