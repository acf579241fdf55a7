//! `getUserAccess` response conversion.

use serde_json::Value;

use sheetshop_core::AccessGrant;

use super::cell_text;

const SUCCESS: &str = "success";

/// Convert a `getUserAccess` body into a grant.
///
/// Only `{status: "success", access: [...]}` carries entitlements. Any other
/// shape (error status, missing or non-array `access`, a bare array) means
/// the user owns nothing. Numeric tokens are stringified so a product ID
/// typed as a number in the sheet still matches.
#[must_use]
pub fn convert_access(body: &Value) -> AccessGrant {
    let success = body
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|status| status == SUCCESS);

    if !success {
        tracing::debug!("Access response without success status; treating as no access");
        return AccessGrant::none();
    }

    match body.get("access") {
        Some(Value::Array(tokens)) => AccessGrant::from_tokens(
            tokens
                .iter()
                .filter(|token| !token.is_array() && !token.is_object())
                .map(cell_text),
        ),
        _ => AccessGrant::none(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sheetshop_core::ProductId;

    use super::*;

    #[test]
    fn test_success_response_grants_tokens() {
        let grant = convert_access(&json!({"status": "success", "access": [" ABC ", "p2"]}));
        assert!(grant.grants(&ProductId::new("abc")));
        assert!(grant.grants(&ProductId::new("P2")));
        assert!(!grant.grants(&ProductId::new("p3")));
    }

    #[test]
    fn test_all_token_grants_everything() {
        let grant = convert_access(&json!({"status": "success", "access": ["ALL"]}));
        assert!(grant.is_wildcard());
        assert!(grant.grants(&ProductId::new("whatever")));
    }

    #[test]
    fn test_numeric_tokens_stringified() {
        let grant = convert_access(&json!({"status": "success", "access": [5, null]}));
        assert!(grant.grants(&ProductId::new("5")));
        assert_eq!(grant.len(), 1);
    }

    #[test]
    fn test_other_shapes_mean_no_access() {
        for body in [
            json!({"status": "error", "access": ["abc"]}),
            json!({"access": ["abc"]}),
            json!({"status": "success"}),
            json!({"status": "success", "access": "abc"}),
            json!(["abc"]),
            json!(null),
        ] {
            assert!(convert_access(&body).is_empty(), "{body}");
        }
    }
}
