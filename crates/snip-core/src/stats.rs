use crate::repository::{ClickRecord, UrlRecord};
use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::Serialize;
use std::fmt::Display;

/// Status of a record at a given instant. Never stored; derived on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlStatus {
    Active,
    Expired,
}

impl Display for UrlStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlStatus::Active => f.write_str("Active"),
            UrlStatus::Expired => f.write_str("Expired"),
        }
    }
}

/// Per-record line of the statistics view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlSummary {
    pub shortcode: ShortCode,
    pub long_url: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub status: UrlStatus,
    pub click_count: usize,
    pub clicks: Vec<ClickRecord>,
}

/// Statistics over the full record set, evaluated at `generated_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlStats {
    pub generated_at: Timestamp,
    pub total_urls: usize,
    pub active_urls: usize,
    pub expired_urls: usize,
    pub total_clicks: usize,
    pub urls: Vec<UrlSummary>,
}

impl UrlStats {
    pub fn compute(records: &[UrlRecord], now: Timestamp) -> Self {
        let urls: Vec<UrlSummary> = records
            .iter()
            .map(|record| UrlSummary {
                shortcode: record.shortcode.clone(),
                long_url: record.long_url.clone(),
                created_at: record.created_at,
                expires_at: record.expires_at,
                status: if record.is_expired_at(now) {
                    UrlStatus::Expired
                } else {
                    UrlStatus::Active
                },
                click_count: record.clicks().len(),
                clicks: record.clicks().to_vec(),
            })
            .collect();

        let expired_urls = urls
            .iter()
            .filter(|u| u.status == UrlStatus::Expired)
            .count();

        Self {
            generated_at: now,
            total_urls: urls.len(),
            active_urls: urls.len() - expired_urls,
            expired_urls,
            total_clicks: urls.iter().map(|u| u.click_count).sum(),
            urls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RecordId;
    use jiff::SignedDuration;

    fn record(code: &str, created_at: Timestamp, validity_mins: i64) -> UrlRecord {
        UrlRecord::new(
            RecordId::new(created_at, 0),
            ShortCode::new_unchecked(code),
            format!("https://{code}.example"),
            created_at,
            created_at + SignedDuration::from_mins(validity_mins),
        )
    }

    #[test]
    fn counts_statuses_and_clicks() {
        let t0 = Timestamp::from_second(1_700_000_000).unwrap();
        let mut short_lived = record("short", t0, 1);
        short_lived.push_click(ClickRecord::new(t0, "direct"));
        let mut long_lived = record("long", t0, 60);
        long_lived.push_click(ClickRecord::new(t0, "redirect"));
        long_lived.push_click(ClickRecord::new(t0, "redirect"));

        let stats = UrlStats::compute(
            &[short_lived, long_lived],
            t0 + SignedDuration::from_mins(5),
        );

        assert_eq!(stats.total_urls, 2);
        assert_eq!(stats.expired_urls, 1);
        assert_eq!(stats.active_urls, 1);
        assert_eq!(stats.total_clicks, 3);
        assert_eq!(stats.urls[0].status, UrlStatus::Expired);
        assert_eq!(stats.urls[1].status, UrlStatus::Active);
        assert_eq!(stats.urls[1].click_count, 2);
    }

    #[test]
    fn empty_record_set() {
        let stats = UrlStats::compute(&[], Timestamp::UNIX_EPOCH);
        assert_eq!(stats.total_urls, 0);
        assert_eq!(stats.total_clicks, 0);
        assert!(stats.urls.is_empty());
    }
}
