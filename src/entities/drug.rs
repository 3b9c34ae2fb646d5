use std::collections::HashMap;

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::OfdaError;
use crate::sources::openfda::{
    BRAND_NAME_EXACT_FIELD, BRAND_NAME_FIELD, OpenFdaClient, UNII_FIELD, search_expression,
};
use crate::sources::rxnav::{NAMES_PROPERTY_GROUP, RxNavClient, UNII_ID_TYPE};
use crate::transform;
use crate::utils::query::{is_safe_term, sanitize};

const OPENFDA_API_KEY_ENV: &str = "OPENFDA_API_KEY";

/// Upper bound on concurrent brand-name lookups in one search.
const BRAND_LOOKUP_CONCURRENCY: usize = 16;

/// Drug identity assembled from openFDA labels and RxNorm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugRecord {
    pub unii: String,
    pub brand_name: String,
    pub generic_name: String,
    pub rxcui: String,
    pub active_ingredients: Vec<String>,
}

/// Resolves free-text drug names into [`DrugRecord`]s.
///
/// A search runs three stages:
///
/// 1. one openFDA count aggregation finds the UNIIs whose labels carry a
///    matching brand name;
/// 2. one aggregation per UNII recovers the exact brand name. These run
///    concurrently and all of them finish before stage 3 starts;
/// 3. per UNII, RxNav maps the UNII to an RxCUI and the RxCUI to its names.
///
/// Nothing is cached between calls.
pub struct DrugService {
    openfda: OpenFdaClient,
    rxnav: RxNavClient,
}

impl DrugService {
    /// `api_key` is sent verbatim on every openFDA request. An empty key is
    /// not sent at all.
    pub fn new(api_key: impl Into<String>) -> Result<Self, OfdaError> {
        Ok(Self {
            openfda: OpenFdaClient::new(Some(api_key.into()))?,
            rxnav: RxNavClient::new()?,
        })
    }

    /// Builds a service keyed from `OPENFDA_API_KEY`, or keyless if unset.
    pub fn from_env() -> Result<Self, OfdaError> {
        Ok(Self {
            openfda: OpenFdaClient::new(std::env::var(OPENFDA_API_KEY_ENV).ok())?,
            rxnav: RxNavClient::new()?,
        })
    }

    #[cfg(test)]
    fn new_for_test(
        openfda_base: String,
        rxnav_base: String,
        api_key: Option<String>,
    ) -> Result<Self, OfdaError> {
        Ok(Self {
            openfda: OpenFdaClient::new_for_test(openfda_base, api_key)?,
            rxnav: RxNavClient::new_for_test(rxnav_base)?,
        })
    }

    /// Resolves `name` into drug records.
    ///
    /// Record order follows no particular UNII order; use
    /// [`DrugService::search_sorted`] when it matters. UNIIs without an RxCUI
    /// or without any RxNorm name produce no record. An RxNav transport or
    /// status failure for one UNII drops that UNII only. An unparseable RxNav
    /// body fails the search once every UNII has finished. openFDA failures
    /// fail the whole search.
    pub async fn search(&self, name: &str) -> Result<Vec<DrugRecord>, OfdaError> {
        let uniis = self.get_uniis_by_name(name).await?;
        if uniis.is_empty() {
            debug!(name, "No UNIIs matched; skipping brand and RxNorm lookups");
            return Ok(Vec::new());
        }

        let brand_names = self.get_brand_names_by_name_and_uniis(name, &uniis).await?;
        debug!(
            uniis = uniis.len(),
            brand_names = brand_names.len(),
            "Resolved brand names"
        );

        let completions = brand_names.into_iter().map(|(unii, brand_name)| async move {
            let result = self.complete_record(&unii, &brand_name).await;
            (unii, result)
        });

        let mut records = Vec::new();
        let mut parse_error: Option<OfdaError> = None;
        for (unii, result) in join_all(completions).await {
            match result {
                Ok(Some(record)) => records.push(record),
                Ok(None) => debug!(unii = %unii, "No RxNorm identity; dropping UNII"),
                Err(err) if err.is_parse_error() => {
                    warn!(unii = %unii, "RxNav response could not be parsed: {err}");
                    parse_error.get_or_insert(err);
                }
                Err(err) => warn!(unii = %unii, "RxNav lookup failed; dropping UNII: {err}"),
            }
        }
        if let Some(err) = parse_error {
            return Err(err);
        }

        debug!(name, records = records.len(), "Search complete");
        Ok(records)
    }

    /// [`DrugService::search`] with records ordered by UNII.
    pub async fn search_sorted(&self, name: &str) -> Result<Vec<DrugRecord>, OfdaError> {
        let mut records = self.search(name).await?;
        records.sort_by(|a, b| a.unii.cmp(&b.unii));
        Ok(records)
    }

    /// UNIIs of labels whose brand name matches the sanitized `name`.
    pub async fn get_uniis_by_name(&self, name: &str) -> Result<Vec<String>, OfdaError> {
        let term = sanitize(name);
        if term.is_empty() {
            debug!(name, "Search term is empty after sanitizing");
            return Ok(Vec::new());
        }

        let search = search_expression(&[(BRAND_NAME_FIELD, term.as_str())]);
        let resp = self.openfda.label_count(&search, UNII_FIELD).await?;
        Ok(transform::drug::unii_terms(resp))
    }

    /// Maps each UNII to the first exact brand name matching `name`, or `""`.
    ///
    /// Lookups run concurrently and the map is returned only once every one
    /// has finished. If any lookup fails, the first failure is returned.
    pub async fn get_brand_names_by_name_and_uniis(
        &self,
        name: &str,
        uniis: &[String],
    ) -> Result<HashMap<String, String>, OfdaError> {
        let term = sanitize(name);
        if term.is_empty() {
            return Ok(HashMap::new());
        }

        let lookups = uniis
            .iter()
            .filter(|unii| {
                let safe = is_safe_term(unii);
                if !safe {
                    warn!(unii = %unii, "Skipping UNII with characters outside [A-Za-z0-9-]");
                }
                safe
            })
            .map(|unii| {
                let term = term.as_str();
                async move {
                    let search =
                        search_expression(&[(UNII_FIELD, unii.as_str()), (BRAND_NAME_FIELD, term)]);
                    let resp = self
                        .openfda
                        .label_count(&search, BRAND_NAME_EXACT_FIELD)
                        .await;
                    (unii.clone(), resp)
                }
            });

        let results: Vec<_> = stream::iter(lookups)
            .buffer_unordered(BRAND_LOOKUP_CONCURRENCY)
            .collect()
            .await;

        let mut out = HashMap::with_capacity(results.len());
        for (unii, resp) in results {
            out.insert(unii, transform::drug::first_term(resp?));
        }
        Ok(out)
    }

    /// First RxCUI RxNav maps `unii` to, if any.
    pub async fn get_concept_id_by_unii(&self, unii: &str) -> Result<Option<String>, OfdaError> {
        let resp = self.rxnav.rxcui_by_id(UNII_ID_TYPE, unii).await?;
        Ok(transform::drug::first_rxcui(resp))
    }

    /// RxNorm names of `rxcui` in upstream order; empty when RxNav has none.
    pub async fn get_generic_names_by_concept_id(
        &self,
        rxcui: &str,
    ) -> Result<Vec<String>, OfdaError> {
        let resp = self
            .rxnav
            .all_properties(rxcui, NAMES_PROPERTY_GROUP)
            .await?;
        Ok(transform::drug::property_values(resp))
    }

    async fn complete_record(
        &self,
        unii: &str,
        brand_name: &str,
    ) -> Result<Option<DrugRecord>, OfdaError> {
        let Some(rxcui) = self.get_concept_id_by_unii(unii).await? else {
            return Ok(None);
        };
        let names = self.get_generic_names_by_concept_id(&rxcui).await?;
        Ok(transform::drug::drug_record(unii, brand_name, &rxcui, &names))
    }
}
