use crate::error::{AppError, AuthFailure};
use crate::repository::RequestRepository;
use crate::types::{Decision, Request, RequestId, Status, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const ALL_OPTION: &str = "All";
pub const PREVIEW_FAILED: &str = "Image preview failed.";

/// Shared-secret check in front of the admin views.
#[derive(Debug, Clone)]
pub struct AccessGate {
    secret: String,
}

/// Name recorded against admin decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reviewer(String);

impl Reviewer {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AccessGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// The password is checked first, so a wrong password is denied whatever
    /// reviewer name accompanies it.
    pub fn authorize(&self, password: &str, reviewer: &str) -> Result<Reviewer, AppError> {
        if password != self.secret {
            tracing::warn!("Admin access denied: wrong password");
            return Err(AppError::Auth(AuthFailure::BadPassword));
        }
        let reviewer = reviewer.trim();
        if reviewer.is_empty() {
            return Err(AppError::Auth(AuthFailure::MissingReviewer));
        }
        Ok(Reviewer(reviewer.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewView {
    #[default]
    Pending,
    All,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewQuery {
    pub view: ReviewView,
    pub site: Option<String>,
    pub status: Option<Status>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PhotoPreview {
    Available(String),
    Unavailable(String),
}

impl PhotoPreview {
    fn for_url(url: &str) -> Self {
        let url = url.trim();
        if url.starts_with("https://") || url.starts_with("http://") {
            PhotoPreview::Available(url.to_string())
        } else {
            PhotoPreview::Unavailable(PREVIEW_FAILED.to_string())
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewItem {
    #[serde(flatten)]
    pub request: Request,
    pub request_time: String,
    pub preview: PhotoPreview,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewListing {
    pub view: &'static str,
    pub site_options: Vec<String>,
    pub status_options: Vec<String>,
    pub requests: Vec<ReviewItem>,
}

/// "All" followed by the sorted distinct values.
pub fn options<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let distinct: BTreeSet<&str> = values.collect();
    std::iter::once(ALL_OPTION.to_string())
        .chain(distinct.into_iter().map(str::to_string))
        .collect()
}

fn display_time(request: &Request) -> String {
    NaiveDateTime::parse_from_str(&request.timestamp_raw, TIMESTAMP_FORMAT)
        .map(|ts| ts.format("%d %b %Y, %I:%M %p").to_string())
        .unwrap_or_else(|_| request.timestamp_raw.clone())
}

fn matches_search(request: &Request, needle: &str) -> bool {
    request.employee_name.to_lowercase().contains(needle)
        || request.employee_id.to_lowercase().contains(needle)
}

/// Applies the view, then the site/status/search filters. Options are taken
/// from the viewed set before the narrower filters run.
pub fn filter_for_review(requests: Vec<Request>, query: &ReviewQuery) -> ReviewListing {
    let viewed: Vec<Request> = match query.view {
        ReviewView::Pending => requests
            .into_iter()
            .filter(|r| r.status == Status::Pending)
            .collect(),
        ReviewView::All => requests,
    };

    let site_options = options(viewed.iter().map(|r| r.site.as_str()));
    let status_options = options(viewed.iter().map(|r| r.status.as_str()));

    let site = query.site.as_deref().filter(|s| *s != ALL_OPTION);
    let needle = query
        .search
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_lowercase);

    let requests = viewed
        .into_iter()
        .filter(|r| site.map_or(true, |site| r.site == site))
        .filter(|r| query.status.as_ref().map_or(true, |status| &r.status == status))
        .filter(|r| needle.as_deref().map_or(true, |needle| matches_search(r, needle)))
        .map(|request| ReviewItem {
            request_time: display_time(&request),
            preview: PhotoPreview::for_url(&request.photo_url),
            request,
        })
        .collect();

    ReviewListing {
        view: match query.view {
            ReviewView::Pending => "pending",
            ReviewView::All => "all",
        },
        site_options,
        status_options,
        requests,
    }
}

pub async fn list_for_review(
    repository: &RequestRepository,
    query: &ReviewQuery,
) -> Result<ReviewListing, AppError> {
    Ok(filter_for_review(repository.list_all().await?, query))
}

pub async fn decide(
    repository: &RequestRepository,
    reviewer: &Reviewer,
    id: &RequestId,
    decision: Decision,
) -> Result<Request, AppError> {
    repository.set_decision(id, decision, reviewer.as_str()).await
}

pub async fn save_comment(
    repository: &RequestRepository,
    reviewer: &Reviewer,
    id: &RequestId,
    comment: &str,
) -> Result<Request, AppError> {
    tracing::info!("{} commenting on {}", reviewer.as_str(), id);
    repository.set_comment(id, comment).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::tests::{header, repo_with, row};

    fn sample() -> Vec<Vec<String>> {
        vec![
            header(),
            row("2024-01-15 09:30:00", "WFD01", "Ravi Kumar", "E-100", "Pending", "a1"),
            row("2024-01-16 10:00:00", "HSR01", "Meena", "EMP-7", "Approved", "b2"),
            row("garbled", "HSR01", "Asha", "E-300", "Pending", "c3"),
            row("2024-02-01 18:45:00", "BSN01", "Kiran", "E-400", "Rejected", "d4"),
        ]
    }

    async fn listing(query: ReviewQuery) -> ReviewListing {
        let (repo, _, _) = repo_with(sample());
        list_for_review(&repo, &query).await.unwrap()
    }

    fn ids(listing: &ReviewListing) -> Vec<&str> {
        listing
            .requests
            .iter()
            .map(|item| item.request.id.as_str())
            .collect()
    }

    #[test]
    fn test_gate_denies_wrong_password_for_any_reviewer() {
        let gate = AccessGate::new("s3cret");
        for reviewer in ["alice", "", "   ", "admin"] {
            assert!(matches!(
                gate.authorize("wrong", reviewer),
                Err(AppError::Auth(AuthFailure::BadPassword))
            ));
        }
        assert!(matches!(
            gate.authorize("", "alice"),
            Err(AppError::Auth(AuthFailure::BadPassword))
        ));
    }

    #[test]
    fn test_gate_requires_reviewer_name() {
        let gate = AccessGate::new("s3cret");
        assert!(matches!(
            gate.authorize("s3cret", "  "),
            Err(AppError::Auth(AuthFailure::MissingReviewer))
        ));
        assert_eq!(gate.authorize("s3cret", " alice ").unwrap().as_str(), "alice");
    }

    #[tokio::test]
    async fn test_pending_view_and_options() {
        let listing = listing(ReviewQuery::default()).await;
        assert_eq!(ids(&listing), vec!["a1", "c3"]);
        assert_eq!(listing.site_options, vec!["All", "HSR01", "WFD01"]);
        assert_eq!(listing.status_options, vec!["All", "Pending"]);
    }

    #[tokio::test]
    async fn test_all_view_with_compound_filters() {
        let listing = listing(ReviewQuery {
            view: ReviewView::All,
            site: Some("HSR01".to_string()),
            status: Some(Status::Approved),
            search: None,
        })
        .await;
        assert_eq!(ids(&listing), vec!["b2"]);
        assert_eq!(
            listing.status_options,
            vec!["All", "Approved", "Pending", "Rejected"]
        );

        let all_sites = listing_all_with_site("All").await;
        assert_eq!(all_sites.len(), 4);
    }

    async fn listing_all_with_site(site: &str) -> Vec<ReviewItem> {
        listing(ReviewQuery {
            view: ReviewView::All,
            site: Some(site.to_string()),
            ..ReviewQuery::default()
        })
        .await
        .requests
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_on_name_or_id() {
        let by_name = listing(ReviewQuery {
            view: ReviewView::All,
            search: Some("RAVI".to_string()),
            ..ReviewQuery::default()
        })
        .await;
        assert_eq!(ids(&by_name), vec!["a1"]);

        let by_id = listing(ReviewQuery {
            view: ReviewView::All,
            search: Some("emp-".to_string()),
            ..ReviewQuery::default()
        })
        .await;
        assert_eq!(ids(&by_id), vec!["b2"]);

        let blank = listing(ReviewQuery {
            view: ReviewView::All,
            search: Some("  ".to_string()),
            ..ReviewQuery::default()
        })
        .await;
        assert_eq!(blank.requests.len(), 4);
    }

    #[tokio::test]
    async fn test_items_carry_display_time_and_preview() {
        let listing = listing(ReviewQuery::default()).await;
        let first = &listing.requests[0];
        assert_eq!(first.request_time, "15 Jan 2024, 09:30 AM");
        assert!(matches!(first.preview, PhotoPreview::Available(_)));

        let garbled = &listing.requests[1];
        assert_eq!(garbled.request_time, "garbled");
    }

    #[test]
    fn test_preview_falls_back_to_notice() {
        assert_eq!(
            PhotoPreview::for_url(""),
            PhotoPreview::Unavailable(PREVIEW_FAILED.to_string())
        );
        assert_eq!(
            PhotoPreview::for_url("drive-file-123"),
            PhotoPreview::Unavailable(PREVIEW_FAILED.to_string())
        );
    }

    #[tokio::test]
    async fn test_decide_and_comment_are_independent_writes() {
        let (repo, _, _) = repo_with(sample());
        let reviewer = AccessGate::new("pw").authorize("pw", "alice").unwrap();
        let id = RequestId("a1".to_string());

        decide(&repo, &reviewer, &id, Decision::Approved).await.unwrap();
        save_comment(&repo, &reviewer, &id, "ok").await.unwrap();

        let stored = repo.find(&id).await.unwrap();
        assert_eq!(stored.status, Status::Approved);
        assert_eq!(stored.reviewer, "alice");
        assert_eq!(stored.comment, "ok");

        let pending = list_for_review(&repo, &ReviewQuery::default()).await.unwrap();
        assert_eq!(ids(&pending), vec!["c3"]);
    }
}
