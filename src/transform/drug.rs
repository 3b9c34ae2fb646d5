use std::collections::HashSet;

use tracing::warn;

use crate::entities::drug::DrugRecord;
use crate::sources::openfda::OpenFdaCountResponse;
use crate::sources::rxnav::{AllPropertiesResponse, RxcuiResponse};

/// UNII terms from a count aggregation, first occurrence wins.
///
/// Terms that could not be embedded verbatim in a follow-up openFDA query are
/// dropped.
pub(crate) fn unii_terms(resp: Option<OpenFdaCountResponse>) -> Vec<String> {
    let Some(resp) = resp else {
        return Vec::new();
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(resp.results.len());
    for bucket in resp.results {
        let term = bucket.term.trim();
        if !crate::utils::query::is_safe_term(term) {
            warn!(unii = term, "Skipping UNII with characters outside [A-Za-z0-9-]");
            continue;
        }
        if seen.insert(term.to_string()) {
            out.push(term.to_string());
        }
    }
    out
}

/// First aggregation term, or `""` when openFDA had no aggregation.
pub(crate) fn first_term(resp: Option<OpenFdaCountResponse>) -> String {
    resp.and_then(|r| r.results.into_iter().next())
        .map(|bucket| bucket.term)
        .unwrap_or_default()
}

pub(crate) fn first_rxcui(resp: Option<RxcuiResponse>) -> Option<String> {
    resp?
        .id_group?
        .rxnorm_id
        .into_iter()
        .map(|id| id.trim().to_string())
        .find(|id| !id.is_empty())
}

pub(crate) fn property_values(resp: Option<AllPropertiesResponse>) -> Vec<String> {
    let Some(group) = resp.and_then(|r| r.prop_concept_group) else {
        return Vec::new();
    };
    group
        .prop_concept
        .into_iter()
        .filter_map(|concept| concept.prop_value)
        .filter(|value| !value.trim().is_empty())
        .collect()
}

/// Assembles a record, or `None` when there is no generic name to report.
pub(crate) fn drug_record(
    unii: &str,
    brand_name: &str,
    rxcui: &str,
    names: &[String],
) -> Option<DrugRecord> {
    let active_ingredients: Vec<String> = names.iter().map(|n| n.to_uppercase()).collect();
    let generic_name = active_ingredients.first()?.clone();

    Some(DrugRecord {
        unii: unii.to_string(),
        brand_name: brand_name.to_uppercase(),
        rxcui: rxcui.to_string(),
        generic_name,
        active_ingredients,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_response(value: serde_json::Value) -> Option<OpenFdaCountResponse> {
        Some(serde_json::from_value(value).expect("valid count response"))
    }

    #[test]
    fn unii_terms_dedupes_and_drops_unsafe_terms() {
        let resp = count_response(serde_json::json!({
            "results": [
                {"term": "9ndf7jz4m3", "count": 4},
                {"term": "bad term)", "count": 2},
                {"term": "9ndf7jz4m3", "count": 1},
                {"term": "362O9ITL9D", "count": 1}
            ]
        }));
        assert_eq!(unii_terms(resp), vec!["9ndf7jz4m3", "362O9ITL9D"]);
        assert!(unii_terms(None).is_empty());
    }

    #[test]
    fn first_term_defaults_to_empty() {
        let resp = count_response(serde_json::json!({
            "results": [{"term": "Xarelto"}, {"term": "XARELTO STARTER PACK"}]
        }));
        assert_eq!(first_term(resp), "Xarelto");
        assert_eq!(first_term(None), "");
        assert_eq!(first_term(count_response(serde_json::json!({}))), "");
    }

    #[test]
    fn first_rxcui_takes_first_identifier() {
        let resp: RxcuiResponse = serde_json::from_value(serde_json::json!({
            "idGroup": {"rxnormId": ["1114195", "999"]}
        }))
        .unwrap();
        assert_eq!(first_rxcui(Some(resp)).as_deref(), Some("1114195"));

        let empty: RxcuiResponse =
            serde_json::from_value(serde_json::json!({"idGroup": {"id": "FOO"}})).unwrap();
        assert_eq!(first_rxcui(Some(empty)), None);
        assert_eq!(first_rxcui(None), None);
    }

    #[test]
    fn property_values_keep_order_and_skip_blanks() {
        let resp: AllPropertiesResponse = serde_json::from_value(serde_json::json!({
            "propConceptGroup": {"propConcept": [
                {"propValue": "rivaroxaban"},
                {"propValue": " "},
                {"propName": "no value"},
                {"propValue": "Rivaroxaban Oral Product"}
            ]}
        }))
        .unwrap();
        assert_eq!(
            property_values(Some(resp)),
            vec!["rivaroxaban", "Rivaroxaban Oral Product"]
        );
        assert!(property_values(None).is_empty());
    }

    #[test]
    fn drug_record_uppercases_names() {
        let names = vec!["rivaroxaban".to_string()];
        let record = drug_record("9ndf7jz4m3", "Xarelto", "1114195", &names).unwrap();
        assert_eq!(record.unii, "9ndf7jz4m3");
        assert_eq!(record.brand_name, "XARELTO");
        assert_eq!(record.rxcui, "1114195");
        assert_eq!(record.generic_name, "RIVAROXABAN");
        assert_eq!(record.active_ingredients, vec!["RIVAROXABAN"]);
    }

    #[test]
    fn drug_record_requires_a_generic_name() {
        assert!(drug_record("9ndf7jz4m3", "Xarelto", "1114195", &[]).is_none());
    }

    #[test]
    fn drug_record_keeps_empty_brand_name() {
        let names = vec!["rivaroxaban".to_string()];
        let record = drug_record("9ndf7jz4m3", "", "1114195", &names).unwrap();
        assert_eq!(record.brand_name, "");
    }
}
