//! School directory API routes.
//!
//! Intake accepts the add-school form as `multipart/form-data`; listing and
//! lookup return JSON records with a resolved `image_url`.

use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::{Bytes, BytesMut};
use schooldir_common::paths::resolve_image_url;
use schooldir_common::RecordId;
use schooldir_db::models::SchoolRecord;
use schooldir_db::queries::schools::RecordFilter;
use serde::{Deserialize, Serialize};

use super::AppContext;
use crate::service::AddRecordError;
use crate::validation::{Candidate, ImageUpload, MAX_IMAGE_BYTES};

/// Request body cap for intake.
///
/// Image bytes past [`MAX_IMAGE_BYTES`] are read and dropped, so this only
/// bounds how much a client may send, not how much is held in memory.
pub const MAX_UPLOAD_BODY: usize = 32 * MAX_IMAGE_BYTES;

/// Image bytes kept per upload; one past the limit is enough for the size rule.
const IMAGE_BUFFER_CAP: usize = MAX_IMAGE_BYTES + 1;

/// Create school-related routes.
pub fn school_routes() -> Router<AppContext> {
    Router::new()
        .route(
            "/schools",
            get(list_schools)
                .post(add_school)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY)),
        )
        .route("/schools/:id", get(get_school))
        .route("/states", get(list_states))
        .route("/cities", get(list_cities))
}

// ============================================================================
// Response types
// ============================================================================

/// Outcome of an add-school submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddRecordResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl AddRecordResponse {
    fn created(id: RecordId) -> Self {
        Self {
            success: true,
            id: Some(id),
            errors: Vec::new(),
        }
    }

    fn failed(errors: Vec<String>) -> Self {
        Self {
            success: false,
            id: None,
            errors,
        }
    }
}

/// A stored record plus the URL its image can be fetched from.
#[derive(Debug, Serialize, Deserialize)]
pub struct SchoolResponse {
    #[serde(flatten)]
    pub record: SchoolRecord,
    pub image_url: String,
}

impl SchoolResponse {
    fn new(record: SchoolRecord, public_path: &str) -> Self {
        let image_url = resolve_image_url(&record.image, public_path);
        Self { record, image_url }
    }
}

fn status_for(err: &AddRecordError) -> StatusCode {
    match err {
        AddRecordError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AddRecordError::Conflict => StatusCode::CONFLICT,
        AddRecordError::Storage(_) | AddRecordError::Persistence(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn multipart_error(e: MultipartError) -> Response {
    tracing::debug!(error = %e, "Rejected malformed form submission");
    (
        e.status(),
        Json(AddRecordResponse::failed(vec![e.body_text()])),
    )
        .into_response()
}

fn multipart_rejection(rejection: MultipartRejection) -> Response {
    tracing::debug!(error = %rejection, "Rejected non-multipart submission");
    (
        rejection.status(),
        Json(AddRecordResponse::failed(vec![rejection.body_text()])),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// Stream an image field, keeping at most [`IMAGE_BUFFER_CAP`] bytes.
///
/// Returns the kept bytes and whether the request body limit cut the field
/// short. The limit is only tolerated once the image is already known to be
/// oversized; otherwise the error is returned.
async fn read_image(field: &mut Field<'_>) -> Result<(Bytes, bool), MultipartError> {
    let mut data = BytesMut::new();
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                let room = IMAGE_BUFFER_CAP.saturating_sub(data.len());
                data.extend_from_slice(&chunk[..chunk.len().min(room)]);
            }
            Ok(None) => return Ok((data.freeze(), false)),
            Err(e)
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE
                    && data.len() > MAX_IMAGE_BYTES =>
            {
                return Ok((data.freeze(), true));
            }
            Err(e) => return Err(e),
        }
    }
}

/// Read the add-school form into a candidate.
///
/// Unknown fields are ignored. `email_id` is accepted as an alias of `email`.
/// If the body limit is reached inside an oversized image, fields after the
/// image are not read.
async fn read_candidate(mut multipart: Multipart) -> Result<Candidate, MultipartError> {
    let mut candidate = Candidate::default();

    while let Some(mut field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let (data, cut_short) = read_image(&mut field).await?;
                candidate.image = Some(ImageUpload::new(file_name, content_type, data));
                if cut_short {
                    tracing::debug!("Body limit reached inside oversized image");
                    break;
                }
            }
            "name" => candidate.name = field.text().await?,
            "address" => candidate.address = field.text().await?,
            "city" => candidate.city = field.text().await?,
            "state" => candidate.state = field.text().await?,
            "contact" => candidate.contact = field.text().await?,
            "email" | "email_id" => candidate.email = field.text().await?,
            _ => {}
        }
    }

    Ok(candidate)
}

/// Add a school from a multipart form.
async fn add_school(
    State(ctx): State<AppContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => return multipart_rejection(rejection),
    };
    let candidate = match read_candidate(multipart).await {
        Ok(c) => c,
        Err(e) => return multipart_error(e),
    };

    match ctx.service.add_record(candidate).await {
        Ok(id) => (StatusCode::CREATED, Json(AddRecordResponse::created(id))).into_response(),
        Err(err) => (
            status_for(&err),
            Json(AddRecordResponse::failed(err.messages())),
        )
            .into_response(),
    }
}

/// List schools, optionally filtered by `state`, `city` and `search`.
async fn list_schools(
    State(ctx): State<AppContext>,
    Query(filter): Query<RecordFilter>,
) -> Json<Vec<SchoolResponse>> {
    let public_path = &ctx.config.storage.public_path;
    let records = ctx.service.list_records(&filter).await;
    Json(
        records
            .into_iter()
            .map(|record| SchoolResponse::new(record, public_path))
            .collect(),
    )
}

/// Fetch a single school.
async fn get_school(State(ctx): State<AppContext>, Path(id): Path<i64>) -> Response {
    match ctx.service.find_record(RecordId::from(id)).await {
        Some(record) => {
            Json(SchoolResponse::new(record, &ctx.config.storage.public_path)).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "School not found"})),
        )
            .into_response(),
    }
}

async fn list_states(State(ctx): State<AppContext>) -> Json<Vec<String>> {
    Json(ctx.service.list_distinct_states().await)
}

async fn list_cities(State(ctx): State<AppContext>) -> Json<Vec<String>> {
    Json(ctx.service.list_distinct_cities().await)
}
