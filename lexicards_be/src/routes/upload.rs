use crate::{
    db::{BatchResult, MockStore},
    error::ApiError,
    upload::{self, Row, TEMPLATE_CSV, UploadFormat, ValidationReport},
};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{self, ContentDisposition, DispositionParam, DispositionType},
    post, web,
};
use chrono::Utc;
use serde::Deserialize;

/// Reads the upload body in the format its content type names. A missing
/// content type is treated as CSV.
fn request_rows(request: &HttpRequest, body: &[u8]) -> Result<Vec<Row>, ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("text/csv");
    let format = UploadFormat::from_content_type(content_type)
        .ok_or_else(|| ApiError::UnsupportedMedia(content_type.to_string()))?;
    upload::parse_rows(body, format).map_err(|err| ApiError::BadRequest(err.to_string()))
}

#[post("/upload/validate")]
pub(crate) async fn validate_upload(
    request: HttpRequest,
    body: web::Bytes,
) -> Result<web::Json<ValidationReport>, ApiError> {
    let rows = request_rows(&request, &body)?;
    Ok(web::Json(upload::validate_rows(&rows)))
}

fn default_user() -> String {
    "demo".to_string()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImportQuery {
    #[serde(rename = "userId", default = "default_user")]
    user_id: String,
}

/// Validates the whole file first; nothing is created unless every row passes
#[post("/upload/import")]
pub(crate) async fn import_upload(
    request: HttpRequest,
    body: web::Bytes,
    query: web::Query<ImportQuery>,
    store: web::Data<MockStore>,
) -> Result<web::Json<BatchResult>, ApiError> {
    let rows = request_rows(&request, &body)?;
    let report = upload::validate_rows(&rows);
    if !report.is_valid {
        log::warn!("Rejected upload with {} errors", report.errors.len());
        return Err(ApiError::Validation(report));
    }
    let now = Utc::now();
    let user_id = &query.user_id;
    let result = store.create_cards(
        rows.iter()
            .map(|row| Some(upload::import_payload(row, user_id, now))),
    )?;
    log::info!("Imported {} cards for {user_id}", result.created);
    Ok(web::Json(result))
}

#[get("/upload/template")]
pub(crate) async fn upload_template() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(
                "flashcard-template.csv".to_string(),
            )],
        })
        .body(TEMPLATE_CSV)
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{store, test_app};
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    const CSV: &str = "word,translation,language,type\nlibro,book,Spanish,noun\ncorrer,to run,Spanish,verb\n";

    #[actix_web::test]
    async fn validate_reports_stats_without_storing() {
        let store = store();
        let app = test_app!(store);
        let request = test::TestRequest::post()
            .uri("/upload/validate")
            .insert_header(("content-type", "text/csv"))
            .set_payload(CSV)
            .to_request();
        let report: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(report["isValid"], true);
        assert_eq!(
            report["stats"],
            json!({ "total": 2, "nouns": 1, "verbs": 1, "adjectives": 0, "others": 0 })
        );
        assert!(store.list_cards(&Default::default()).is_empty());
    }

    #[actix_web::test]
    async fn validate_json_rows_with_errors() {
        let store = store();
        let app = test_app!(store);
        let request = test::TestRequest::post()
            .uri("/upload/validate")
            .set_json(json!([{ "word": "", "translation": "book", "language": "Spanish" }]))
            .to_request();
        let report: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(report["isValid"], false);
        assert_eq!(report["errors"], json!([r#"Row 2: Missing "word""#]));
    }

    #[actix_web::test]
    async fn missing_columns_are_400() {
        let store = store();
        let app = test_app!(store);
        let request = test::TestRequest::post()
            .uri("/upload/validate")
            .insert_header(("content-type", "text/csv"))
            .set_payload("word\nlibro\n")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(
            body["error"],
            "Missing required columns: translation, language"
        );
    }

    #[actix_web::test]
    async fn spreadsheets_are_unsupported() {
        let store = store();
        let app = test_app!(store);
        let request = test::TestRequest::post()
            .uri("/upload/validate")
            .insert_header(("content-type", "application/vnd.ms-excel"))
            .set_payload(vec![0xd0, 0xcf, 0x11, 0xe0])
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[actix_web::test]
    async fn import_creates_cards_with_defaults() {
        let store = store();
        let app = test_app!(store);
        let request = test::TestRequest::post()
            .uri("/upload/import?userId=user-9")
            .insert_header(("content-type", "text/csv"))
            .set_payload(CSV)
            .to_request();
        let result: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(result["created"], 2);
        assert_eq!(result["failed"], 0);
        let card = &result["cards"][0];
        assert_eq!(card["userId"], "user-9");
        assert_eq!(card["type"], "noun");
        assert_eq!(card["learned"], false);
        assert_eq!(card["intervalIndex"], 0);
        assert_eq!(card["difficulty"], "medium");

        let request = test::TestRequest::get()
            .uri("/cards?userId=user-9")
            .to_request();
        let cards: Vec<Value> = test::call_and_read_body_json(&app, request).await;
        assert_eq!(cards.len(), 2);
    }

    #[actix_web::test]
    async fn invalid_import_is_422_and_stores_nothing() {
        let store = store();
        let app = test_app!(store);
        let request = test::TestRequest::post()
            .uri("/upload/import")
            .insert_header(("content-type", "text/csv"))
            .set_payload("word,translation,language,type\nlibro,book,Spanish,thing\n")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let report: Value = test::read_body_json(response).await;
        assert_eq!(report["isValid"], false);
        assert!(store.list_cards(&Default::default()).is_empty());
    }

    #[actix_web::test]
    async fn template_is_csv_attachment() {
        let store = store();
        let app = test_app!(store);
        let request = test::TestRequest::get().uri("/upload/template").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("flashcard-template.csv"));
        let body = test::read_body(response).await;
        assert!(body.starts_with(b"word,translation,language,type,example,notes"));
    }
}
