use crate::config::Config;
use crate::error::AppError;
use crate::image_processing::{decode_photo_payload, inspect_photo};
use crate::repository::{NewRequest, Photo, RequestRepository};
use crate::types::{Request, SubmissionForm, SITE_PLACEHOLDER};

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Checks that every field is filled in and that the photo is a real image.
/// Missing fields are all reported together.
pub fn validate(config: &Config, form: &SubmissionForm) -> Result<NewRequest, AppError> {
    let site = present(&form.site)
        .filter(|site| site != SITE_PLACEHOLDER && config.is_known_site(site));
    let employee_name = present(&form.employee_name);
    let employee_id = present(&form.employee_id);
    let photo = present(&form.photo);

    let mut missing = Vec::new();
    if site.is_none() {
        missing.push("site");
    }
    if employee_name.is_none() {
        missing.push("employee_name");
    }
    if employee_id.is_none() {
        missing.push("employee_id");
    }
    if photo.is_none() {
        missing.push("photo");
    }

    let (Some(site), Some(employee_name), Some(employee_id), Some(photo)) =
        (site, employee_name, employee_id, photo)
    else {
        return Err(AppError::Validation { missing });
    };

    let bytes = decode_photo_payload(&photo).map_err(AppError::InvalidPhoto)?;
    if bytes.len() > config.max_photo_bytes {
        return Err(AppError::InvalidPhoto(format!(
            "Photo is {} bytes, limit is {}",
            bytes.len(),
            config.max_photo_bytes
        )));
    }
    let info = inspect_photo(&bytes).map_err(AppError::InvalidPhoto)?;
    tracing::info!(
        "Photo accepted: {}x{} {} ({} bytes)",
        info.width,
        info.height,
        info.content_type,
        bytes.len()
    );

    Ok(NewRequest {
        site,
        employee_name,
        employee_id,
        photo: Photo {
            bytes,
            content_type: info.content_type.to_string(),
        },
    })
}

/// Validate then persist a new request
pub async fn submit(
    config: &Config,
    repository: &RequestRepository,
    form: SubmissionForm,
) -> Result<Request, AppError> {
    let new_request = validate(config, &form).map_err(|e| {
        tracing::warn!("Submission rejected: {}", e);
        e
    })?;
    repository.create(new_request).await
}
