//! Upstream body decoding.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::error::CollectError;

/// Decodes a JSON array of records.
///
/// Unknown fields in each object are ignored; how missing fields are handled
/// is up to the record type.
///
/// # Errors
///
/// Returns [`CollectError::Decode`] if the body is not valid JSON or not an
/// array of objects matching the record schema.
pub fn decode_records<R: DeserializeOwned>(body: &[u8]) -> Result<Vec<R>, CollectError> {
    let records = serde_json::from_slice::<Vec<R>>(body)?;
    tracing::debug!(records = records.len(), bytes = body.len(), "Decoded upstream payload");
    Ok(records)
}

/// Deserializes a string field, reading `null` as the empty string.
///
/// Use with `#[serde(default, deserialize_with = "shared::decode::null_as_empty")]`.
///
/// # Errors
///
/// Returns an error if the value is neither a string nor `null`.
pub fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    null_as_default(deserializer)
}

/// Deserializes any defaultable field, reading `null` as `T::default()`.
///
/// Use on nested objects that the upstream sometimes sends as `null`.
///
/// # Errors
///
/// Returns an error if the value is neither `null` nor a valid `T`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        #[serde(default, deserialize_with = "null_as_empty")]
        name: String,
        #[serde(default)]
        count: u32,
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Point {
        #[serde(default)]
        x: u32,
    }

    #[derive(Debug, Deserialize)]
    struct Placed {
        #[serde(default, deserialize_with = "null_as_default")]
        point: Point,
    }

    #[test]
    fn test_decode_array() {
        let rows: Vec<Row> = decode_records(br#"[{"name":"a","count":1},{"name":"b"}]"#).unwrap();
        assert_eq!(
            rows,
            vec![
                Row {
                    name: "a".to_string(),
                    count: 1
                },
                Row {
                    name: "b".to_string(),
                    count: 0
                },
            ]
        );
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let rows: Vec<Row> = decode_records(br#"[{"name":"a","extra":{"x":1}}]"#).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "a");
    }

    #[test]
    fn test_null_string_reads_as_empty() {
        let rows: Vec<Row> = decode_records(br#"[{"name":null,"count":2}]"#).unwrap();
        assert_eq!(rows[0].name, "");
        assert_eq!(rows[0].count, 2);
    }

    #[test]
    fn test_null_object_reads_as_default() {
        let rows: Vec<Placed> =
            decode_records(br#"[{"point":null},{"point":{"x":4}},{}]"#).unwrap();
        assert_eq!(rows[0].point, Point::default());
        assert_eq!(rows[1].point, Point { x: 4 });
        assert_eq!(rows[2].point, Point::default());
    }

    #[test]
    fn test_wrong_type_for_object_is_still_an_error() {
        let result: Result<Vec<Placed>, _> = decode_records(br#"[{"point":"here"}]"#);
        assert!(matches!(result, Err(CollectError::Decode(_))));
    }

    #[test]
    fn test_empty_array() {
        let rows: Vec<Row> = decode_records(b"[]").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let result: Result<Vec<Row>, _> = decode_records(b"[{\"name\":");
        assert!(matches!(result, Err(CollectError::Decode(_))));
    }

    #[test]
    fn test_non_array_is_an_error() {
        let result: Result<Vec<Row>, _> = decode_records(br#"{"message":"rate limited"}"#);
        assert!(matches!(result, Err(CollectError::Decode(_))));
    }
}
