use std::borrow::Cow;

use serde::Deserialize;
use tracing::debug;

use crate::error::OfdaError;

const OPENFDA_BASE: &str = "https://api.fda.gov";
const OPENFDA_API: &str = "openfda";
const OPENFDA_BASE_ENV: &str = "OFDA_OPENFDA_BASE";
const LABEL_PATH: &str = "drug/label.json";

pub(crate) const BRAND_NAME_FIELD: &str = "openfda.brand_name";
pub(crate) const BRAND_NAME_EXACT_FIELD: &str = "openfda.brand_name.exact";
pub(crate) const UNII_FIELD: &str = "openfda.unii";

pub struct OpenFdaClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
    api_key: Option<String>,
}

impl OpenFdaClient {
    pub fn new(api_key: Option<String>) -> Result<Self, OfdaError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: crate::sources::env_base(OPENFDA_BASE, OPENFDA_BASE_ENV),
            api_key: api_key.filter(|v| !v.is_empty()),
        })
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(base: String, api_key: Option<String>) -> Result<Self, OfdaError> {
        Ok(Self {
            client: crate::sources::build_client()?,
            base: Cow::Owned(base),
            api_key: api_key.filter(|v| !v.is_empty()),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        crate::sources::join_endpoint(self.base.as_ref(), path)
    }

    /// Runs a count aggregation over drug labels.
    ///
    /// `Ok(None)` means openFDA had nothing to aggregate: a 404, or a success
    /// status whose body carries an `error` object instead of `results`.
    pub async fn label_count(
        &self,
        search: &str,
        count_field: &str,
    ) -> Result<Option<OpenFdaCountResponse>, OfdaError> {
        let url = self.endpoint(LABEL_PATH);
        let mut req = self
            .client
            .get(&url)
            .query(&[("search", search), ("count", count_field)]);
        if let Some(key) = self.api_key.as_deref() {
            req = req.query(&[("api_key", key)]);
        }

        let (status, bytes) = crate::sources::send_limited(req, OPENFDA_API).await?;
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(search, count_field, "openFDA returned 404; treating as no matches");
            return Ok(None);
        }
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(OfdaError::Api {
                api: OPENFDA_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }

        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|source| OfdaError::ApiJson {
                api: OPENFDA_API.to_string(),
                source,
            })?;

        if let Some(error) = value.get("error").and_then(serde_json::Value::as_object) {
            let code = error
                .get("code")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            debug!(search, count_field, code, "openFDA returned no aggregation");
            return Ok(None);
        }

        serde_json::from_value::<OpenFdaCountResponse>(value)
            .map(Some)
            .map_err(|source| OfdaError::ApiJson {
                api: OPENFDA_API.to_string(),
                source,
            })
    }
}

/// Joins `(field:value)` clauses with `AND`.
///
/// Values must already be query-safe; see [`crate::sanitize`].
pub(crate) fn search_expression(clauses: &[(&str, &str)]) -> String {
    clauses
        .iter()
        .map(|(field, value)| format!("({field}:{value})"))
        .collect::<Vec<_>>()
        .join(" AND ")
}

#[derive(Debug, Deserialize)]
pub struct OpenFdaCountResponse {
    #[serde(default, deserialize_with = "crate::utils::serde::null_as_default")]
    pub results: Vec<OpenFdaCountBucket>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenFdaCountBucket {
    pub term: String,
}
