use std::time::{Duration, Instant};

use http::Extensions;
use reqwest::Url;
use reqwest_middleware::{Middleware, Next};
use tracing::debug;

const API_KEY_PARAM: &str = "api_key";
const REDACTED: &str = "***";

/// Logs every upstream request at `debug` with the API key masked.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RequestLogMiddleware;

#[async_trait::async_trait]
impl Middleware for RequestLogMiddleware {
    async fn handle(
        &self,
        req: reqwest::Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        let method = req.method().clone();
        let url = redact_url(req.url());
        let start = Instant::now();

        let result = next.run(req, extensions).await;
        let elapsed_ms = elapsed_millis(start.elapsed());
        match &result {
            Ok(resp) => debug!(
                %method,
                url = %url,
                status = resp.status().as_u16(),
                elapsed_ms,
                "upstream request"
            ),
            Err(err) => debug!(
                %method,
                url = %url,
                elapsed_ms,
                "upstream request failed: {err}"
            ),
        }
        result
    }
}

/// Whole milliseconds in `elapsed`, saturating at `u64::MAX`.
fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

pub(crate) fn redact_url(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| k == API_KEY_PARAM) {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == API_KEY_PARAM {
                REDACTED.to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_millis_saturates_instead_of_wrapping() {
        assert_eq!(elapsed_millis(Duration::from_millis(250)), 250);
        assert_eq!(elapsed_millis(Duration::from_micros(1_999)), 1);
        assert_eq!(elapsed_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn redact_url_masks_api_key() {
        let url = Url::parse(
            "https://api.fda.gov/drug/label.json?search=x&count=openfda.unii&api_key=secret",
        )
        .unwrap();
        let out = redact_url(&url);
        assert!(!out.contains("secret"));
        assert!(out.contains("api_key=***") || out.contains("api_key=%2A%2A%2A"));
        assert!(out.contains("count=openfda.unii"));
    }

    #[test]
    fn redact_url_leaves_keyless_urls_untouched() {
        let raw = "https://rxnav.nlm.nih.gov/REST/rxcui.json?idtype=UNII_CODE&id=9ndf7jz4m3";
        let url = Url::parse(raw).unwrap();
        assert_eq!(redact_url(&url), raw);
    }
}
