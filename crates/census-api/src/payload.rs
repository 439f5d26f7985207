//! Response payload checks and extraction

use serde_json::Value;
use url::Url;

use crate::error::{CensusError, Result};

/// Namespace and collection of a Census query URL.
///
/// The service ID segment, a format specifier and the verb are skipped.
/// Returns `None` if the path does not look like a Census query.
pub fn get_components(url: &Url) -> Option<(String, Option<String>)> {
    let mut components: Vec<&str> = url.path().split('/').skip(1).collect();
    if components.first()?.starts_with("s:") {
        components.remove(0);
    }
    if matches!(components.first(), Some(&"xml") | Some(&"json")) {
        components.remove(0);
    }
    if components.is_empty() {
        return None;
    }
    components.remove(0);
    if components.last() == Some(&"") {
        components.pop();
    }
    match components.as_slice() {
        [namespace] => Some((namespace.to_string(), None)),
        [namespace, collection] => Some((namespace.to_string(), Some(collection.to_string()))),
        _ => None,
    }
}

/// Check a response body for API-level errors.
///
/// The Census API reports most failures with a 200 status and either an
/// `error` message or an `errorCode`/`errorMessage` pair.
pub fn check_response(data: &Value, url: &Url) -> Result<()> {
    let redacted = redact(url);

    if let Some(msg) = data.get("error") {
        let msg = msg.as_str().map(str::to_string).unwrap_or_else(|| msg.to_string());
        if msg == "No data found." {
            let (namespace, collection) =
                get_components(url).ok_or_else(|| CensusError::Unknown(msg.clone()))?;
            return Err(CensusError::UnknownCollection {
                namespace,
                collection,
            });
        }
        if msg == "Bad request syntax." {
            return Err(CensusError::BadRequestSyntax { url: redacted });
        }
        if msg == "service_unavailable" {
            return Err(CensusError::ServiceUnavailable { url: redacted });
        }
        if msg.starts_with("Provided Service ID is not registered.") {
            return Err(CensusError::InvalidServiceId);
        }
        if msg.starts_with("Missing Service ID.") {
            return Err(CensusError::MissingServiceId);
        }
        return Err(CensusError::Unknown(msg));
    }

    if let Some(code) = data.get("errorCode").and_then(Value::as_str) {
        let message = data.get("errorMessage").and_then(Value::as_str);
        return Err(match (code, message) {
            ("SERVER_ERROR", Some(msg)) if msg.starts_with("INVALID_SEARCH_TERM") => {
                CensusError::InvalidSearchTerm {
                    message: msg["INVALID_SEARCH_TERM".len()..]
                        .trim_start_matches(':')
                        .trim()
                        .to_string(),
                    url: redacted,
                }
            }
            ("SERVER_ERROR", Some(msg)) => CensusError::Server {
                message: msg.to_string(),
                url: redacted,
            },
            ("SERVER_ERROR", None) => CensusError::Server {
                message: "Unknown server error".to_string(),
                url: redacted,
            },
            (code, _) => CensusError::Unknown(format!("unknown error code: {}", code)),
        });
    }

    Ok(())
}

/// Return the `<collection>_list` array of a response
pub fn extract_payload(data: &Value, collection: &str) -> Result<Vec<Value>> {
    let key = format!("{}_list", collection);
    match data.get(&key) {
        Some(Value::Array(list)) => Ok(list.clone()),
        _ => Err(CensusError::Payload(format!(
            "missing key \"{}\" in payload",
            key
        ))),
    }
}

/// Return the first element of the `<collection>_list` array, or `None`
/// when the server returned no matches
pub fn extract_single(data: &Value, collection: &str) -> Result<Option<Value>> {
    let mut list = extract_payload(data, collection)?;
    if list.len() > 1 {
        tracing::debug!(
            collection,
            count = list.len(),
            "Single result requested but payload has multiple"
        );
    }
    if list.is_empty() {
        return Ok(None);
    }
    Ok(Some(list.swap_remove(0)))
}

/// Read the `returned` count of a `count` verb response
pub fn extract_count(data: &Value) -> Result<u64> {
    let count = data
        .get("count")
        .ok_or_else(|| CensusError::Payload("missing key \"count\" in payload".to_string()))?;
    match count {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| CensusError::Payload(format!("invalid count value: {}", count)))
}

/// URL with the service ID segment masked, for logs and error messages
pub fn redact(url: &Url) -> String {
    let mut redacted = url.clone();
    let segments: Vec<String> = url
        .path()
        .split('/')
        .skip(1)
        .map(|s| {
            if s.starts_with("s:") {
                "s:***".to_string()
            } else {
                s.to_string()
            }
        })
        .collect();
    redacted.set_path(&segments.join("/"));
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_get_components() {
        let u = url("https://census.daybreakgames.com/s:example/get/ps2:v2/character?name.first_lower=x");
        assert_eq!(
            get_components(&u),
            Some(("ps2:v2".to_string(), Some("character".to_string())))
        );

        let u = url("https://census.daybreakgames.com/s:example/json/get/ps2:v2/");
        assert_eq!(get_components(&u), Some(("ps2:v2".to_string(), None)));

        let u = url("http://localhost:1234/count/ps2:v2/item");
        assert_eq!(
            get_components(&u),
            Some(("ps2:v2".to_string(), Some("item".to_string())))
        );
    }

    #[test]
    fn test_check_response_no_data() {
        let u = url("https://census.daybreakgames.com/s:example/get/ps2:v2/charakter");
        let err = check_response(&json!({"error": "No data found."}), &u).unwrap_err();
        assert!(matches!(
            err,
            CensusError::UnknownCollection { ref namespace, collection: Some(ref c) }
                if namespace == "ps2:v2" && c == "charakter"
        ));
    }

    #[test]
    fn test_check_response_classification() {
        let u = url("https://census.daybreakgames.com/s:example/get/ps2:v2/character");

        let err = check_response(&json!({"error": "Bad request syntax."}), &u).unwrap_err();
        assert!(matches!(err, CensusError::BadRequestSyntax { .. }));

        let err = check_response(&json!({"error": "service_unavailable"}), &u).unwrap_err();
        assert!(matches!(err, CensusError::ServiceUnavailable { .. }));

        let err = check_response(
            &json!({"error": "Provided Service ID is not registered.  A valid Service ID is required."}),
            &u,
        )
        .unwrap_err();
        assert!(matches!(err, CensusError::InvalidServiceId));

        let err = check_response(&json!({"error": "Missing Service ID.  A valid Service ID is required."}), &u)
            .unwrap_err();
        assert!(matches!(err, CensusError::MissingServiceId));

        let err = check_response(
            &json!({"errorCode": "SERVER_ERROR", "errorMessage": "INVALID_SEARCH_TERM: Invalid search term: battle_rank.value."}),
            &u,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CensusError::InvalidSearchTerm { ref message, .. }
                if message == "Invalid search term: battle_rank.value."
        ));

        let err = check_response(&json!({"errorCode": "SERVER_ERROR"}), &u).unwrap_err();
        assert!(matches!(err, CensusError::Server { .. }));

        let err = check_response(&json!({"errorCode": "NEW_AND_EXCITING"}), &u).unwrap_err();
        assert!(matches!(err, CensusError::Unknown(_)));

        assert!(check_response(&json!({"character_list": [], "returned": 0}), &u).is_ok());
    }

    #[test]
    fn test_extract_single() {
        let data = json!({"character_list": [{"character_id": "1"}, {"character_id": "2"}]});
        let first = extract_single(&data, "character").unwrap().unwrap();
        assert_eq!(first["character_id"], "1");

        let empty = json!({"character_list": []});
        assert!(extract_single(&empty, "character").unwrap().is_none());

        let wrong = json!({"item_list": []});
        assert!(matches!(
            extract_single(&wrong, "character"),
            Err(CensusError::Payload(_))
        ));
    }

    #[test]
    fn test_extract_count() {
        assert_eq!(extract_count(&json!({"count": 42})).unwrap(), 42);
        assert_eq!(extract_count(&json!({"count": "7"})).unwrap(), 7);
        assert!(extract_count(&json!({})).is_err());
    }

    #[test]
    fn test_redact_service_id() {
        let u = url("https://census.daybreakgames.com/s:secret/get/ps2:v2/character?c:limit=2");
        let redacted = redact(&u);
        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("/s:***/get/ps2:v2/character"));
    }
}
