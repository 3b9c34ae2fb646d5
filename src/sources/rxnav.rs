use std::borrow::Cow;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::OfdaError;

const RXNAV_BASE: &str = "https://rxnav.nlm.nih.gov/REST";
const RXNAV_API: &str = "rxnav";
const RXNAV_BASE_ENV: &str = "OFDA_RXNAV_BASE";

pub(crate) const UNII_ID_TYPE: &str = "UNII_CODE";
pub(crate) const NAMES_PROPERTY_GROUP: &str = "names";

pub struct RxNavClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
}

impl RxNavClient {
    pub fn new() -> Result<Self, OfdaError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: crate::sources::env_base(RXNAV_BASE, RXNAV_BASE_ENV),
        })
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(base: String) -> Result<Self, OfdaError> {
        Ok(Self {
            client: crate::sources::build_client()?,
            base: Cow::Owned(base),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        crate::sources::join_endpoint(self.base.as_ref(), path)
    }

    async fn get_json_optional<T: DeserializeOwned>(
        &self,
        req: reqwest_middleware::RequestBuilder,
    ) -> Result<Option<T>, OfdaError> {
        let (status, bytes) = crate::sources::send_limited(req, RXNAV_API).await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(OfdaError::Api {
                api: RXNAV_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| OfdaError::ApiJson {
                api: RXNAV_API.to_string(),
                source,
            })
    }

    /// `GET /rxcui.json?idtype=..&id=..`
    pub async fn rxcui_by_id(
        &self,
        id_type: &str,
        id: &str,
    ) -> Result<Option<RxcuiResponse>, OfdaError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(OfdaError::InvalidArgument(format!(
                "An identifier is required for an RxCUI lookup by {id_type}"
            )));
        }

        let url = self.endpoint("rxcui.json");
        self.get_json_optional(
            self.client
                .get(&url)
                .query(&[("idtype", id_type), ("id", id)]),
        )
        .await
    }

    /// `GET /rxcui/{rxcui}/allProperties.json?prop=..`
    pub async fn all_properties(
        &self,
        rxcui: &str,
        prop: &str,
    ) -> Result<Option<AllPropertiesResponse>, OfdaError> {
        let rxcui = rxcui.trim();
        // The RxCUI is a path segment, so it must not carry `/`, `?` or `%`.
        if !crate::utils::query::is_safe_term(rxcui) {
            return Err(OfdaError::InvalidArgument(format!(
                "RxCUI must be alphanumeric, got '{rxcui}'"
            )));
        }

        let url = self.endpoint(&format!("rxcui/{rxcui}/allProperties.json"));
        self.get_json_optional(self.client.get(&url).query(&[("prop", prop)]))
            .await
    }
}

#[derive(Debug, Deserialize)]
pub struct RxcuiResponse {
    #[serde(rename = "idGroup", default)]
    pub id_group: Option<RxNavIdGroup>,
}

#[derive(Debug, Deserialize)]
pub struct RxNavIdGroup {
    #[serde(
        rename = "rxnormId",
        default,
        deserialize_with = "crate::utils::serde::null_as_default"
    )]
    pub rxnorm_id: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AllPropertiesResponse {
    #[serde(rename = "propConceptGroup", default)]
    pub prop_concept_group: Option<RxNavPropConceptGroup>,
}

#[derive(Debug, Deserialize)]
pub struct RxNavPropConceptGroup {
    #[serde(
        rename = "propConcept",
        default,
        deserialize_with = "crate::utils::serde::null_as_default"
    )]
    pub prop_concept: Vec<RxNavPropConcept>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RxNavPropConcept {
    #[serde(rename = "propValue", default)]
    pub prop_value: Option<String>,
}
