use serde::{Deserialize, Deserializer};

/// Deserializes an explicit JSON `null` as `T::default()`.
///
/// Pair with `#[serde(default)]` so a missing key behaves the same way. RxNav
/// in particular answers `"propConceptGroup": null` for unknown concepts.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "super::null_as_default")]
        values: Vec<String>,
    }

    #[test]
    fn null_missing_and_present_values() {
        let row: Row = serde_json::from_str(r#"{"values": null}"#).unwrap();
        assert!(row.values.is_empty());

        let row: Row = serde_json::from_str("{}").unwrap();
        assert!(row.values.is_empty());

        let row: Row = serde_json::from_str(r#"{"values": ["a", "b"]}"#).unwrap();
        assert_eq!(row.values, vec!["a", "b"]);
    }
}
