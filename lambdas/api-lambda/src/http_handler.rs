use chrono::NaiveDate;
use hybb_shared::error::AppError;
use hybb_shared::reporting::{self, StatusQuery};
use hybb_shared::review::{self, ReviewQuery, ReviewView, Reviewer, ALL_OPTION};
use hybb_shared::submission;
use hybb_shared::types::{
    CommentRequest, Decision, RequestId, Status, SubmissionForm, SubmissionResponse,
    SITE_PLACEHOLDER,
};
use hybb_shared::AppState;
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use serde::Serialize;
use std::sync::Arc;

/// Main Lambda handler - routes submit, dashboard and admin endpoints
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    tracing::info!("HYBB API invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == Method::OPTIONS {
        return Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "GET,POST,PUT,OPTIONS")
            .header(
                "Access-Control-Allow-Headers",
                "Content-Type,X-Admin-Password,X-Reviewer",
            )
            .body(Body::Empty)
            .map_err(Box::new)?);
    }

    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let result = match (method, parts.as_slice()) {
        // --- SUBMIT REQUEST ---
        // GET /sites - site codes for the submission form
        (&Method::GET, ["sites"]) => json_response(
            StatusCode::OK,
            &serde_json::json!({
                "placeholder": SITE_PLACEHOLDER,
                "sites": state.config.sites,
            }),
        ),
        // POST /requests - submit a photo-backed request
        (&Method::POST, ["requests"]) => submit_request(&state, event.body()).await,

        // --- DASHBOARD ---
        // GET /dashboard/summary - per site and month counts
        (&Method::GET, ["dashboard", "summary"]) => purchase_summary(&state).await,
        // GET /dashboard/status?site=&date= - filtered request table
        (&Method::GET, ["dashboard", "status"]) => ticket_status(&state, &event).await,

        // --- ADMIN DASHBOARD ---
        (_, ["admin", ..]) => match authorize(&state, &event) {
            Ok(reviewer) => admin_route(&state, &event, &reviewer, method, &parts[1..]).await,
            Err(e) => Err(e),
        },

        _ => {
            tracing::warn!("⚠️ No route matched - Method: {} Path: {}", method, path);
            return not_found();
        }
    };

    match result {
        Ok(response) => Ok(response),
        Err(e) => error_response(&e),
    }
}

async fn admin_route(
    state: &AppState,
    event: &Request,
    reviewer: &Reviewer,
    method: &Method,
    parts: &[&str],
) -> Result<Response<Body>, AppError> {
    match (method, parts) {
        // GET /admin/requests?view=&site=&status=&q= - review listing
        (&Method::GET, ["requests"]) => {
            let query = review_query(event)?;
            let listing = review::list_for_review(&state.repository, &query).await?;
            let notice = listing.requests.is_empty().then_some("No matching requests found.");
            json_with_notice(StatusCode::OK, &listing, notice)
        }
        // POST /admin/requests/{id}/approve | /reject - record a decision
        (&Method::POST, ["requests", id, action @ ("approve" | "reject")]) => {
            let decision: Decision = action.parse().map_err(AppError::BadRequest)?;
            let request = review::decide(
                &state.repository,
                reviewer,
                &RequestId(id.to_string()),
                decision,
            )
            .await?;
            json_response(StatusCode::OK, &request)
        }
        // PUT /admin/requests/{id}/comment - save the comment text
        (&Method::PUT, ["requests", id, "comment"]) => {
            let body: CommentRequest = serde_json::from_slice(event.body())
                .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;
            let request = review::save_comment(
                &state.repository,
                reviewer,
                &RequestId(id.to_string()),
                &body.comment,
            )
            .await?;
            json_response(StatusCode::OK, &request)
        }
        _ => Err(AppError::NotFound(format!("admin route /{}", parts.join("/")))),
    }
}

async fn submit_request(state: &AppState, body: &[u8]) -> Result<Response<Body>, AppError> {
    let form: SubmissionForm = if body.is_empty() {
        SubmissionForm::default()
    } else {
        serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?
    };

    let request = submission::submit(&state.config, &state.repository, form).await?;
    json_response(
        StatusCode::CREATED,
        &SubmissionResponse {
            message: "Request submitted successfully!".to_string(),
            request,
        },
    )
}

async fn purchase_summary(state: &AppState) -> Result<Response<Body>, AppError> {
    let requests = state.repository.list_all().await?;
    let notice = requests.is_empty().then_some("No data available yet.");
    json_with_notice(
        StatusCode::OK,
        &reporting::purchase_summary(&requests),
        notice,
    )
}

async fn ticket_status(state: &AppState, event: &Request) -> Result<Response<Body>, AppError> {
    let date = match query_param(event, "date") {
        Some(raw) => Some(
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|_| AppError::BadRequest(format!("Invalid date: {}", raw)))?,
        ),
        None => None,
    };
    let query = StatusQuery {
        site: query_param(event, "site"),
        date,
    };

    let requests = state.repository.list_all().await?;
    let notice = requests.is_empty().then_some("No data available yet.");
    json_with_notice(
        StatusCode::OK,
        &reporting::status_view(requests, &query),
        notice,
    )
}

fn authorize(state: &AppState, event: &Request) -> Result<Reviewer, AppError> {
    let header = |name: &str| {
        event
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string()
    };
    state
        .gate
        .authorize(&header("X-Admin-Password"), &header("X-Reviewer"))
}

fn review_query(event: &Request) -> Result<ReviewQuery, AppError> {
    let view = match query_param(event, "view").as_deref() {
        None | Some("pending") => ReviewView::Pending,
        Some("all") => ReviewView::All,
        Some(other) => return Err(AppError::BadRequest(format!("Unknown view: {}", other))),
    };
    Ok(ReviewQuery {
        view,
        site: query_param(event, "site"),
        status: query_param(event, "status")
            .filter(|s| s != ALL_OPTION)
            .map(Status::from),
        search: query_param(event, "q"),
    })
}

fn query_param(event: &Request, name: &str) -> Option<String> {
    event
        .query_string_parameters_ref()
        .and_then(|params| params.first(name))
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Result<Response<Body>, AppError> {
    let body = serde_json::to_string(value)
        .map_err(|e| AppError::Internal(format!("Failed to encode response: {}", e)))?;
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(body.into())
        .map_err(|e| AppError::Internal(e.to_string()))
}

fn json_with_notice<T: Serialize>(
    status: StatusCode,
    value: &T,
    notice: Option<&str>,
) -> Result<Response<Body>, AppError> {
    let mut body = serde_json::to_value(value)
        .map_err(|e| AppError::Internal(format!("Failed to encode response: {}", e)))?;
    if let (Some(notice), Some(map)) = (notice, body.as_object_mut()) {
        map.insert("notice".to_string(), notice.into());
    }
    json_response(status, &body)
}

fn error_response(err: &AppError) -> Result<Response<Body>, Error> {
    if err.status_code().is_server_error() {
        tracing::error!("Request failed: {}", err);
    } else {
        tracing::info!("Request refused: {}", err);
    }
    Ok(Response::builder()
        .status(err.status_code())
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(err.to_body().to_string().into())
        .map_err(Box::new)?)
}

fn not_found() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::json!({"error": "Not found"}).to_string().into())
        .map_err(Box::new)?)
}
