use crate::blob_store::BlobStore;
use crate::error::{AppError, StoreOperation};
use crate::row_store::RowStore;
use crate::types::{parse_timestamp, Decision, Request, RequestId, Status, TIMESTAMP_FORMAT};
use std::sync::Arc;

pub const HEADER: [&str; 9] = [
    "Timestamp",
    "Kitchen",
    "Employee Name",
    "Employee ID",
    "Photo URL",
    "Status",
    "Reviewed By",
    "Comments",
    "Request ID",
];

// 1-based sheet columns
pub const COL_TIMESTAMP: usize = 1;
pub const COL_SITE: usize = 2;
pub const COL_EMPLOYEE_NAME: usize = 3;
pub const COL_EMPLOYEE_ID: usize = 4;
pub const COL_PHOTO_URL: usize = 5;
pub const COL_STATUS: usize = 6;
pub const COL_REVIEWER: usize = 7;
pub const COL_COMMENT: usize = 8;
pub const COL_REQUEST_ID: usize = 9;

/// A validated photo ready for upload.
#[derive(Debug, Clone)]
pub struct Photo {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct NewRequest {
    pub site: String,
    pub employee_name: String,
    pub employee_id: String,
    pub photo: Photo,
}

/// A request together with the sheet row it was read from.
#[derive(Debug, Clone)]
struct Located {
    row_number: usize,
    request: Request,
}

/// Maps `Request`s onto rows of the row store and photos onto the blob store.
pub struct RequestRepository {
    rows: Arc<dyn RowStore>,
    blobs: Arc<dyn BlobStore>,
}

impl RequestRepository {
    pub fn new(rows: Arc<dyn RowStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { rows, blobs }
    }

    /// Writes the header into an empty sheet, or fills in the header cells a
    /// shorter, older header lacks. Fails with `Connection` when the sheet
    /// cannot be reached at all.
    pub async fn ensure_header(&self) -> Result<(), AppError> {
        let rows = self
            .rows
            .read_all_rows()
            .await
            .map_err(|e| AppError::Connection(e.to_string()))?;

        let Some(existing) = rows.first() else {
            tracing::info!("Empty request sheet, writing header row");
            return self
                .rows
                .append_row(HEADER.iter().map(|h| h.to_string()).collect())
                .await
                .map_err(|e| AppError::Connection(e.to_string()));
        };

        for column in existing.len() + 1..=HEADER.len() {
            tracing::info!("Adding missing header column {}", HEADER[column - 1]);
            self.rows
                .update_cell(1, column, HEADER[column - 1].to_string())
                .await
                .map_err(|e| AppError::Connection(e.to_string()))?;
        }
        Ok(())
    }

    /// Uploads the photo, then appends a Pending row. A photo whose row append
    /// fails stays in the blob store.
    pub async fn create(&self, new: NewRequest) -> Result<Request, AppError> {
        let photo_url = self
            .blobs
            .upload(new.photo.bytes, &new.photo.content_type)
            .await
            .map_err(|e| {
                tracing::error!("Photo upload failed: {}", e);
                AppError::store(StoreOperation::Upload, e)
            })?;

        let now = chrono::Local::now().naive_local();
        let timestamp_raw = now.format(TIMESTAMP_FORMAT).to_string();
        let request = Request {
            id: RequestId::generate(),
            timestamp: parse_timestamp(&timestamp_raw),
            timestamp_raw,
            site: new.site,
            employee_name: new.employee_name,
            employee_id: new.employee_id,
            photo_url,
            status: Status::Pending,
            reviewer: String::new(),
            comment: String::new(),
        };

        self.rows
            .append_row(to_row(&request))
            .await
            .map_err(|e| {
                tracing::error!(
                    "Row append failed for {} (photo already at {}): {}",
                    request.id,
                    request.photo_url,
                    e
                );
                AppError::store(StoreOperation::Append, e)
            })?;

        tracing::info!("Created request {} for site {}", request.id, request.site);
        Ok(request)
    }

    /// Every request in sheet order; empty when only the header exists.
    pub async fn list_all(&self) -> Result<Vec<Request>, AppError> {
        Ok(self
            .located()
            .await?
            .into_iter()
            .map(|located| located.request)
            .collect())
    }

    pub async fn find(&self, id: &RequestId) -> Result<Request, AppError> {
        Ok(self.locate(id).await?.request)
    }

    /// Records an admin decision. The id is resolved to its current row on
    /// every call; concurrent decisions on one row are last-write-wins.
    pub async fn set_decision(
        &self,
        id: &RequestId,
        decision: Decision,
        reviewer: &str,
    ) -> Result<Request, AppError> {
        let Located {
            row_number,
            mut request,
        } = self.locate(id).await?;

        let status = Status::from(decision);
        if request.status != Status::Pending && request.status != status {
            tracing::warn!(
                "Request {} overwrites earlier decision {} by {}",
                id,
                request.status,
                request.reviewer
            );
        }

        self.update(row_number, COL_STATUS, status.to_string()).await?;
        if let Err(e) = self
            .update(row_number, COL_REVIEWER, reviewer.to_string())
            .await
        {
            tracing::error!(
                "Request {} status set to {} but reviewer {} was not recorded",
                id,
                status,
                reviewer
            );
            return Err(e);
        }

        tracing::info!("Request {} marked {} by {}", id, status, reviewer);
        request.status = status;
        request.reviewer = reviewer.to_string();
        Ok(request)
    }

    pub async fn set_comment(&self, id: &RequestId, text: &str) -> Result<Request, AppError> {
        let Located {
            row_number,
            mut request,
        } = self.locate(id).await?;

        self.update(row_number, COL_COMMENT, text.to_string()).await?;

        tracing::info!("Comment saved on request {}", id);
        request.comment = text.to_string();
        Ok(request)
    }

    async fn update(&self, row: usize, column: usize, value: String) -> Result<(), AppError> {
        self.rows.update_cell(row, column, value).await.map_err(|e| {
            tracing::error!("Cell update ({}, {}) failed: {}", row, column, e);
            AppError::store(StoreOperation::Update, e)
        })
    }

    async fn locate(&self, id: &RequestId) -> Result<Located, AppError> {
        self.located()
            .await?
            .into_iter()
            .find(|located| &located.request.id == id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    async fn located(&self) -> Result<Vec<Located>, AppError> {
        let rows = self
            .rows
            .read_all_rows()
            .await
            .map_err(|e| AppError::store(StoreOperation::Read, e))?;

        if rows.len() < 2 {
            return Ok(Vec::new());
        }

        Ok(rows
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, cells)| cells.iter().any(|c| !c.trim().is_empty()))
            .map(|(index, cells)| {
                let row_number = index + 1;
                Located {
                    row_number,
                    request: from_row(row_number, cells),
                }
            })
            .collect())
    }
}

fn to_row(request: &Request) -> Vec<String> {
    vec![
        request.timestamp_raw.clone(),
        request.site.clone(),
        request.employee_name.clone(),
        request.employee_id.clone(),
        request.photo_url.clone(),
        request.status.to_string(),
        request.reviewer.clone(),
        request.comment.clone(),
        request.id.to_string(),
    ]
}

fn from_row(row_number: usize, cells: &[String]) -> Request {
    let cell = |column: usize| cells.get(column - 1).cloned().unwrap_or_default();

    let id = match cell(COL_REQUEST_ID).trim() {
        "" => RequestId::legacy(row_number),
        id => RequestId(id.to_string()),
    };
    let timestamp_raw = cell(COL_TIMESTAMP);

    Request {
        id,
        timestamp: parse_timestamp(&timestamp_raw),
        timestamp_raw,
        site: cell(COL_SITE),
        employee_name: cell(COL_EMPLOYEE_NAME),
        employee_id: cell(COL_EMPLOYEE_ID),
        photo_url: cell(COL_PHOTO_URL),
        status: Status::from(cell(COL_STATUS)),
        reviewer: cell(COL_REVIEWER),
        comment: cell(COL_COMMENT),
    }
}
