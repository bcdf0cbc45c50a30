use crate::review::options;
use crate::types::Request;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub site: String,
    pub month: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub site: String,
    pub counts: Vec<u32>,
}

/// Months on the x axis, one series per site, zero where a site had nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryChart {
    pub months: Vec<String>,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseSummary {
    pub rows: Vec<SummaryRow>,
    pub chart: SummaryChart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Month {
    year: i32,
    month: u32,
}

impl Month {
    fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// e.g. "Jan 2024"
    fn label(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%b %Y").to_string())
            .unwrap_or_default()
    }
}

/// Counts requests per (site, calendar month). Requests without a parsed
/// timestamp are left out.
pub fn purchase_summary(requests: &[Request]) -> PurchaseSummary {
    let mut counts: BTreeMap<(String, Month), u32> = BTreeMap::new();
    for request in requests {
        if let Some(date) = request.date() {
            *counts
                .entry((request.site.clone(), Month::of(date)))
                .or_default() += 1;
        }
    }

    let months: BTreeSet<Month> = counts.keys().map(|(_, month)| *month).collect();
    let sites: BTreeSet<&str> = counts.keys().map(|(site, _)| site.as_str()).collect();

    let series = sites
        .iter()
        .map(|site| ChartSeries {
            site: site.to_string(),
            counts: months
                .iter()
                .map(|month| {
                    counts
                        .get(&(site.to_string(), *month))
                        .copied()
                        .unwrap_or(0)
                })
                .collect(),
        })
        .collect();

    let chart = SummaryChart {
        months: months.iter().map(Month::label).collect(),
        series,
    };

    let rows = counts
        .iter()
        .map(|((site, month), count)| SummaryRow {
            site: site.clone(),
            month: month.label(),
            count: *count,
        })
        .collect();

    PurchaseSummary { rows, chart }
}

#[derive(Debug, Clone, Default)]
pub struct StatusQuery {
    pub site: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub site_options: Vec<String>,
    pub requests: Vec<Request>,
}

/// Exact site and exact calendar date filters; with a date filter, rows whose
/// timestamp did not parse never match.
pub fn status_view(requests: Vec<Request>, query: &StatusQuery) -> StatusView {
    let site_options = options(requests.iter().map(|r| r.site.as_str()));
    let site = query.site.as_deref().filter(|s| *s != crate::review::ALL_OPTION);

    let requests = requests
        .into_iter()
        .filter(|r| site.map_or(true, |site| r.site == site))
        .filter(|r| query.date.map_or(true, |date| r.date() == Some(date)))
        .collect();

    StatusView {
        site_options,
        requests,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{parse_timestamp, RequestId, Status};

    fn request(id: &str, ts: &str, site: &str) -> Request {
        Request {
            id: RequestId(id.to_string()),
            timestamp: parse_timestamp(ts),
            timestamp_raw: ts.to_string(),
            site: site.to_string(),
            employee_name: "Ravi".to_string(),
            employee_id: "E-1".to_string(),
            photo_url: format!("https://blobs.local/{}.jpg", id),
            status: Status::Pending,
            reviewer: String::new(),
            comment: String::new(),
        }
    }

    #[test]
    fn test_summary_counts_per_site_and_month() {
        let requests = vec![
            request("1", "2024-01-03 08:00:00", "WFD01"),
            request("2", "2024-01-15 12:00:00", "WFD01"),
            request("3", "2024-01-31 23:59:59", "WFD01"),
            request("4", "2024-01-20 10:00:00", "BSN01"),
        ];

        let summary = purchase_summary(&requests);

        assert_eq!(
            summary.rows,
            vec![
                SummaryRow {
                    site: "BSN01".to_string(),
                    month: "Jan 2024".to_string(),
                    count: 1,
                },
                SummaryRow {
                    site: "WFD01".to_string(),
                    month: "Jan 2024".to_string(),
                    count: 3,
                },
            ]
        );
    }

    #[test]
    fn test_summary_excludes_unparsed_and_orders_months_chronologically() {
        let requests = vec![
            request("1", "2024-02-01 08:00:00", "HSR01"),
            request("2", "2023-12-15 12:00:00", "HSR01"),
            request("3", "not a time", "HSR01"),
            request("4", "2024-02-10 10:00:00", "MAR01"),
        ];

        let summary = purchase_summary(&requests);

        assert_eq!(summary.chart.months, vec!["Dec 2023", "Feb 2024"]);
        assert_eq!(
            summary.chart.series,
            vec![
                ChartSeries {
                    site: "HSR01".to_string(),
                    counts: vec![1, 1],
                },
                ChartSeries {
                    site: "MAR01".to_string(),
                    counts: vec![0, 1],
                },
            ]
        );
        let total: u32 = summary.rows.iter().map(|r| r.count).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_summary_of_nothing() {
        let summary = purchase_summary(&[]);
        assert!(summary.rows.is_empty());
        assert!(summary.chart.months.is_empty());
        assert!(summary.chart.series.is_empty());
    }

    #[test]
    fn test_status_view_matches_site_and_date_exactly() {
        let requests = vec![
            request("1", "2024-01-15 09:00:00", "HSR01"),
            request("2", "2024-01-15 21:00:00", "HSR01"),
            request("3", "2024-01-16 09:00:00", "HSR01"),
            request("4", "2024-01-15 09:00:00", "WFD01"),
            request("5", "broken", "HSR01"),
        ];

        let view = status_view(
            requests,
            &StatusQuery {
                site: Some("HSR01".to_string()),
                date: NaiveDate::from_ymd_opt(2024, 1, 15),
            },
        );

        let ids: Vec<&str> = view.requests.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(view.site_options, vec!["All", "HSR01", "WFD01"]);
    }

    #[test]
    fn test_status_view_without_filters_keeps_malformed_rows() {
        let requests = vec![
            request("1", "2024-01-15 09:00:00", "HSR01"),
            request("2", "broken", "WFD01"),
        ];

        let view = status_view(
            requests,
            &StatusQuery {
                site: Some("All".to_string()),
                date: None,
            },
        );
        assert_eq!(view.requests.len(), 2);
    }
}
