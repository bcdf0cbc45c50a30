use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const SITE_PLACEHOLDER: &str = "--Select--";

// ========== REQUEST ==========
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        RequestId(uuid::Uuid::new_v4().to_string())
    }

    /// Id for a row written before the Request ID column existed.
    pub fn legacy(row_number: usize) -> Self {
        RequestId(format!("row-{}", row_number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Pending,
    Approved,
    Rejected,
    /// Cell text the application never writes itself.
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Pending => "Pending",
            Status::Approved => "Approved",
            Status::Rejected => "Rejected",
            Status::Other(raw) => raw,
        }
    }
}

impl From<String> for Status {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "" | "Pending" => Status::Pending,
            "Approved" => Status::Approved,
            "Rejected" => Status::Rejected,
            _ => Status::Other(raw),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approved,
    Rejected,
}

impl From<Decision> for Status {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => Status::Approved,
            Decision::Rejected => Status::Rejected,
        }
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" | "approved" | "Approved" => Ok(Decision::Approved),
            "reject" | "rejected" | "Rejected" => Ok(Decision::Rejected),
            other => Err(format!("unknown decision: {}", other)),
        }
    }
}

/// One submitted, photo-backed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    /// `None` when the sheet cell could not be parsed.
    pub timestamp: Option<NaiveDateTime>,
    pub timestamp_raw: String,
    pub site: String,
    pub employee_name: String,
    pub employee_id: String,
    pub photo_url: String,
    pub status: Status,
    pub reviewer: String,
    pub comment: String,
}

impl Request {
    pub fn date(&self) -> Option<NaiveDate> {
        self.timestamp.map(|ts| ts.date())
    }
}

/// Lenient timestamp parsing for sheet cells; unknown shapes give `None`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ========== SUBMISSION ==========
#[derive(Debug, Default, Deserialize)]
pub struct SubmissionForm {
    pub site: Option<String>,
    pub employee_name: Option<String>,
    pub employee_id: Option<String>,
    /// Base64 camera capture, optionally as a `data:` URL.
    pub photo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub message: String,
    pub request: Request,
}

// ========== REVIEW ==========
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_cell_text() {
        assert_eq!(Status::from(String::new()), Status::Pending);
        assert_eq!(Status::from("Approved".to_string()), Status::Approved);
        assert_eq!(
            Status::from("On hold".to_string()),
            Status::Other("On hold".to_string())
        );
        assert_eq!(String::from(Status::Rejected), "Rejected");
    }

    #[test]
    fn test_status_serializes_as_plain_string() {
        let json = serde_json::to_string(&Status::Approved).unwrap();
        assert_eq!(json, "\"Approved\"");
        let back: Status = serde_json::from_str("\"Rejected\"").unwrap();
        assert_eq!(back, Status::Rejected);
    }

    #[test]
    fn test_parse_timestamp_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-01-15 09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T09:30:00+05:30"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-15").map(|ts| ts.date()),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_decision_from_path_segment() {
        assert_eq!("approve".parse::<Decision>(), Ok(Decision::Approved));
        assert_eq!("reject".parse::<Decision>(), Ok(Decision::Rejected));
        assert!("delete".parse::<Decision>().is_err());
    }
}
