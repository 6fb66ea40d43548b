//! Per-camera read requests and the join-all fan-out over them.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use futures::future::join_all;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, Request, Url};
use tracing::{Instrument, debug, warn};

use crate::error::{PipelineError, SourceError};
use crate::model::{DateRange, SourceId, SourceOutcome, SourceResult};
use crate::parser::parse_counts;

/// The single read endpoint all sources are queried through.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base: Url,
    source_type: String,
}

impl Endpoint {
    /// Validates `base_url` as an absolute http(s) URL.
    pub fn parse(base_url: &str, source_type: &str) -> Result<Self, PipelineError> {
        let invalid = |reason: String| PipelineError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };

        let base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
        }

        Ok(Self {
            base,
            source_type: source_type.to_string(),
        })
    }

    /// `<base>?type=<type>&id=<id>&start=<YYYY-MM-DD>&stop=<YYYY-MM-DD>`
    pub fn url_for(&self, source: SourceId, range: &DateRange) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("type", &self.source_type)
            .append_pair("id", &source.to_string())
            .append_pair("start", &range.start_param())
            .append_pair("stop", &range.stop_param());
        url
    }
}

/// Fetches and parses the records of one source.
///
/// # Errors
///
/// Any [`SourceError`]: non-success status, empty or malformed body, or a
/// network failure while sending or reading.
pub async fn fetch_source<C: HttpClient + ?Sized>(
    client: &C,
    endpoint: &Endpoint,
    source: SourceId,
    range: &DateRange,
) -> Result<SourceResult, SourceError> {
    let mut req = Request::new(Method::GET, endpoint.url_for(source, range));
    req.headers_mut()
        .insert(ACCEPT, HeaderValue::from_static("application/json"));

    let resp = client.execute(req).await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }

    let body = resp.bytes().await?;
    debug!(bytes = body.len(), "Response received, parsing");

    let records = parse_counts(&body)?;
    Ok(SourceResult { source, records })
}

/// Issues one request per source concurrently and waits for every one of them
/// to settle. Outcomes are returned in `sources` order; a failing source never
/// affects the others.
#[tracing::instrument(skip_all, fields(range = %range, source_count = sources.len()))]
pub async fn fetch_all<C: HttpClient + ?Sized>(
    client: &C,
    endpoint: &Endpoint,
    sources: &[SourceId],
    range: &DateRange,
) -> Vec<SourceOutcome> {
    let requests = sources.iter().map(|&source| {
        let span = tracing::info_span!("fetch_source", %source);

        async move {
            let result = fetch_source(client, endpoint, source, range).await;
            match &result {
                Ok(fetched) => debug!(records = fetched.records.len(), "Source fetched"),
                Err(SourceError::Status(code)) => {
                    warn!(status = code, "Source returned non-success status")
                }
                Err(e) => warn!(error = %e, "Source unavailable"),
            }
            SourceOutcome { source, result }
        }
        .instrument(span)
    });

    join_all(requests).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
        )
    }

    #[test]
    fn test_url_for_appends_query() {
        let endpoint = Endpoint::parse("http://localhost:5678/webhook/vehicle_count/all", "camera").unwrap();
        let url = endpoint.url_for(SourceId(3), &range());
        assert_eq!(
            url.as_str(),
            "http://localhost:5678/webhook/vehicle_count/all?type=camera&id=3&start=2024-05-01&stop=2024-05-03"
        );
    }

    #[test]
    fn test_endpoint_rejects_relative_url() {
        let err = Endpoint::parse("/webhook/vehicle_count/all", "camera").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_endpoint_rejects_non_http_scheme() {
        let err = Endpoint::parse("ftp://example.com/counts", "camera").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidBaseUrl { ref reason, .. } if reason.contains("ftp")));
    }
}
