use crate::{
    db::{BatchResult, CardFilter, MockStore},
    error::ApiError,
    models::{CardPayload, Flashcard},
};
use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;

const CARD_NOT_FOUND: &str = "Card not found";

#[derive(Debug, Deserialize)]
pub(crate) struct CardQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
    /// only cards due at or before this instant
    #[serde(rename = "nextReview_lte")]
    next_review_lte: Option<DateTime<Utc>>,
}

impl From<CardQuery> for CardFilter {
    fn from(query: CardQuery) -> Self {
        Self {
            // an empty userId means no filter
            user_id: query.user_id.filter(|id| !id.is_empty()),
            next_review_lte: query.next_review_lte,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CardIdPath {
    card_id: String,
}

#[get("/cards")]
pub(crate) async fn list_cards(
    store: web::Data<MockStore>,
    query: web::Query<CardQuery>,
) -> web::Json<Vec<Flashcard>> {
    let filter = CardFilter::from(query.into_inner());
    web::Json(store.list_cards(&filter))
}

#[get("/cards/{card_id}")]
pub(crate) async fn get_card(
    store: web::Data<MockStore>,
    path: web::Path<CardIdPath>,
) -> Result<web::Json<Flashcard>, ApiError> {
    let CardIdPath { card_id } = path.into_inner();
    store
        .get_card(&card_id)
        .map(web::Json)
        .ok_or(ApiError::NotFound(CARD_NOT_FOUND))
}

#[post("/cards")]
pub(crate) async fn create_card(
    store: web::Data<MockStore>,
    payload: web::Json<CardPayload>,
) -> Result<HttpResponse, ApiError> {
    let card = store.create_card(payload.into_inner())?;
    log::info!("Created card {}", card.id);
    Ok(HttpResponse::Created().json(card))
}

#[put("/cards/{card_id}")]
pub(crate) async fn put_card(
    store: web::Data<MockStore>,
    path: web::Path<CardIdPath>,
    payload: web::Json<CardPayload>,
) -> Result<web::Json<Flashcard>, ApiError> {
    let CardIdPath { card_id } = path.into_inner();
    store
        .update_card(&card_id, payload.into_inner())?
        .map(web::Json)
        .ok_or(ApiError::NotFound(CARD_NOT_FOUND))
}

#[delete("/cards/{card_id}")]
pub(crate) async fn delete_card(
    store: web::Data<MockStore>,
    path: web::Path<CardIdPath>,
) -> Result<HttpResponse, ApiError> {
    let CardIdPath { card_id } = path.into_inner();
    if store.delete_card(&card_id)? {
        log::info!("Deleted card {card_id}");
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::NotFound(CARD_NOT_FOUND))
    }
}

/// The post body for batch-create. `cards` stays untyped so a non-array can be
/// rejected as a whole while bad items inside an array only count as failed.
#[derive(Debug, Deserialize)]
pub(crate) struct BatchForm {
    #[serde(default)]
    cards: serde_json::Value,
}

#[post("/cards/batch")]
pub(crate) async fn batch_create_cards(
    store: web::Data<MockStore>,
    form: web::Json<BatchForm>,
) -> Result<web::Json<BatchResult>, ApiError> {
    let serde_json::Value::Array(items) = form.into_inner().cards else {
        return Err(ApiError::BadRequest("Expected array of cards".to_string()));
    };
    let result = store.create_cards(items.into_iter().map(CardPayload::from_batch_item))?;
    log::info!(
        "Batch created {} cards, {} failed",
        result.created,
        result.failed
    );
    Ok(web::Json(result))
}
