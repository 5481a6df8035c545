//! Record intake and listing.
//!
//! [`RecordService`] ties validation, the uniqueness check, image storage and
//! the insert together. There is no transaction spanning the upload and the
//! insert; a failed insert is compensated by discarding the stored image.

use std::sync::Arc;

use schooldir_common::{Error, RecordId};
use schooldir_db::executor::QueryExecutor;
use schooldir_db::models::SchoolRecord;
use schooldir_db::queries::schools::{self, RecordFilter};
use tracing::{error, info, warn};

use crate::images::ImageStore;
use crate::validation::{self, Candidate};

pub const CONFLICT_MESSAGE: &str = "A school with this name already exists in this city";
pub const STORAGE_MESSAGE: &str = "Failed to upload image";
pub const PERSISTENCE_MESSAGE: &str = "Failed to add school";

/// Why a record was not added.
#[derive(Debug, thiserror::Error)]
pub enum AddRecordError {
    /// One or more field rules failed; nothing was stored.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A record with the same name and city already exists.
    #[error("{}", CONFLICT_MESSAGE)]
    Conflict,

    /// The image could not be stored.
    #[error("Image storage failed: {0}")]
    Storage(#[source] Error),

    /// The duplicate lookup or the insert failed.
    #[error("Persistence failed: {0}")]
    Persistence(#[source] Error),
}

impl AddRecordError {
    /// Messages safe to show to the submitter.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(messages) => messages.clone(),
            Self::Conflict => vec![CONFLICT_MESSAGE.to_string()],
            Self::Storage(_) => vec![STORAGE_MESSAGE.to_string()],
            Self::Persistence(_) => vec![PERSISTENCE_MESSAGE.to_string()],
        }
    }
}

/// School directory operations over a query executor and an image store.
#[derive(Clone)]
pub struct RecordService {
    executor: QueryExecutor,
    images: Arc<dyn ImageStore>,
}

impl RecordService {
    pub fn new(executor: QueryExecutor, images: Arc<dyn ImageStore>) -> Self {
        Self { executor, images }
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    pub fn images(&self) -> &Arc<dyn ImageStore> {
        &self.images
    }

    /// Validate, deduplicate, store the image, then insert.
    pub async fn add_record(&self, candidate: Candidate) -> Result<RecordId, AddRecordError> {
        let record = validation::validate(candidate).map_err(AddRecordError::Validation)?;

        let existing = self
            .executor
            .query(
                schools::FIND_BY_NAME_CITY,
                schools::name_city_params(&record.name, &record.city),
                schools::parse_id_column,
            )
            .await
            .map_err(|e| {
                error!(error = %e, name = %record.name, city = %record.city, "Duplicate check failed");
                AddRecordError::Persistence(e)
            })?;

        if let Some(id) = existing.first() {
            info!(existing_id = %id, name = %record.name, city = %record.city, "Rejected duplicate school");
            return Err(AddRecordError::Conflict);
        }

        let extension = record.image.extension();
        let data = record.image.data.clone();
        let reference = self
            .images
            .store(data, &record.name, &extension)
            .await
            .map_err(|e| {
                error!(error = %e, store = self.images.name(), "Image upload failed");
                AddRecordError::Storage(e)
            })?;

        let school = record.into_new_school(reference.clone());
        match self
            .executor
            .insert(schools::INSERT_SCHOOL, schools::insert_params(&school))
            .await
        {
            Ok(id) => {
                let id = RecordId::from(id);
                info!(%id, name = %school.name, city = %school.city, "Added school");
                Ok(id)
            }
            Err(e) => {
                error!(error = %e, name = %school.name, "Insert failed; discarding stored image");
                if let Err(discard_err) = self.images.discard(&reference).await {
                    warn!(error = %discard_err, reference = %reference, "Failed to discard image");
                }
                Err(AddRecordError::Persistence(e))
            }
        }
    }

    /// Records matching `filter`, newest first. Empty on failure.
    pub async fn list_records(&self, filter: &RecordFilter) -> Vec<SchoolRecord> {
        let (sql, params) = schools::build_list_query(filter);
        self.executor
            .query(sql, params, schools::parse_school_row)
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, ?filter, "Failed to list schools");
                Vec::new()
            })
    }

    /// Distinct non-empty states, ascending. Empty on failure.
    pub async fn list_distinct_states(&self) -> Vec<String> {
        self.distinct(schools::DISTINCT_STATES, "states").await
    }

    /// Distinct non-empty cities, ascending. Empty on failure.
    pub async fn list_distinct_cities(&self) -> Vec<String> {
        self.distinct(schools::DISTINCT_CITIES, "cities").await
    }

    /// A single record by id. `None` when absent or on failure.
    pub async fn find_record(&self, id: RecordId) -> Option<SchoolRecord> {
        self.executor
            .query(
                schools::SELECT_BY_ID,
                vec![id.get().into()],
                schools::parse_school_row,
            )
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, %id, "Failed to fetch school");
                Vec::new()
            })
            .into_iter()
            .next()
    }

    async fn distinct(&self, sql: &'static str, what: &str) -> Vec<String> {
        self.executor
            .query(sql, Vec::new(), schools::parse_text_column)
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to list distinct {what}");
                Vec::new()
            })
    }
}
