//! Session parameter extraction.
//!
//! The application root page embeds a script block tagged
//! `data-id="_gd"` whose single assignment carries a JSON-compatible
//! object literal with the values every batch request must present. The
//! right-hand side of that assignment is parsed strictly as JSON -
//! server content is never evaluated as code, and any divergence from
//! JSON is a parse error.

use serde::Deserialize;

use crate::error::DiscoveryError;

/// Opening of the script tag that carries the parameter block.
pub const PARAMETER_MARKER: &str = r#"<script data-id="_gd""#;

const SCRIPT_CLOSE: &str = "</script>";

/// Per-instance values discovered from the application root page.
///
/// Absent at construction, populated exactly once by discovery, read by
/// every batch call thereafter.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionParams {
    /// Application identifier; names the RPC path segment.
    #[serde(rename = "qwAQke")]
    pub app_id: String,

    /// Identifier of the backend that processes executions.
    #[serde(rename = "cfb2h")]
    pub backend: String,

    /// Anti-forgery token, sent as the `f.sid` query parameter.
    #[serde(rename = "FdrFJe")]
    pub csrf_token: String,

    /// User-scoped anti-forgery token. Only set when an authenticated
    /// session cookie was present on the root page fetch; `None`
    /// otherwise.
    #[serde(rename = "SNlM0e", default)]
    pub user_csrf: Option<String>,
}

/// Extract [`SessionParams`] from the root page body.
///
/// Locates the marker-tagged script block, isolates the right-hand side
/// of its assignment (first `=` through the final `;`) and parses it as
/// JSON.
///
/// # Errors
///
/// [`DiscoveryError::MarkerNotFound`] if no marker-tagged script block
/// exists; [`DiscoveryError::MalformedParams`] if the assignment cannot
/// be isolated, fails to parse as JSON, or lacks a required field.
pub fn extract_session_params(page: &str) -> Result<SessionParams, DiscoveryError> {
    let block = parameter_block(page).ok_or(DiscoveryError::MarkerNotFound)?;

    let literal = assignment_rhs(block).ok_or_else(|| {
        DiscoveryError::MalformedParams("no assignment in parameter block".to_string())
    })?;

    let mut params: SessionParams = serde_json::from_str(literal)
        .map_err(|e| DiscoveryError::MalformedParams(e.to_string()))?;

    // An empty user token means "no authenticated session", same as absent.
    if params.user_csrf.as_deref() == Some("") {
        params.user_csrf = None;
    }

    Ok(params)
}

/// Text of the marker-tagged script block, tags excluded.
fn parameter_block(page: &str) -> Option<&str> {
    let marker = page.find(PARAMETER_MARKER)?;
    let open_end = marker + page[marker..].find('>')? + 1;
    let close = open_end + page[open_end..].find(SCRIPT_CLOSE)?;
    Some(&page[open_end..close])
}

/// Right-hand side of the block's assignment: first `=` up to the last `;`.
fn assignment_rhs(block: &str) -> Option<&str> {
    let eq = block.find('=')?;
    let semi = block.rfind(';')?;
    if semi <= eq {
        return None;
    }
    Some(block[eq + 1..semi].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Root page fixture with the given parameter object literal.
    fn page_with(literal: &str) -> String {
        format!(
            "<!doctype html><html><head>\
             <script nonce=\"n\">var unrelated = 1;</script>\
             <script data-id=\"_gd\" nonce=\"n\">window.WIZ_global_data = {literal};</script>\
             </head><body></body></html>"
        )
    }

    #[test]
    fn test_extract_all_fields() {
        let page = page_with(
            r#"{"FdrFJe":"-84291337","cfb2h":"boq_demo_20260801.00_p0","qwAQke":"DemoUi","SNlM0e":"user-token"}"#,
        );
        let params = extract_session_params(&page).unwrap();

        assert_eq!(params.app_id, "DemoUi");
        assert_eq!(params.backend, "boq_demo_20260801.00_p0");
        assert_eq!(params.csrf_token, "-84291337");
        assert_eq!(params.user_csrf.as_deref(), Some("user-token"));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let page = page_with(
            r#"{"FdrFJe":"t","cfb2h":"b","qwAQke":"App","extra":[1,2,3],"Im6cmf":"/_/DemoUi"}"#,
        );
        let params = extract_session_params(&page).unwrap();
        assert_eq!(params.app_id, "App");
    }

    #[test]
    fn test_missing_user_csrf_is_none() {
        let page = page_with(r#"{"FdrFJe":"t","cfb2h":"b","qwAQke":"App"}"#);
        let params = extract_session_params(&page).unwrap();
        assert_eq!(params.user_csrf, None);
    }

    #[test]
    fn test_null_user_csrf_is_none() {
        let page = page_with(r#"{"FdrFJe":"t","cfb2h":"b","qwAQke":"App","SNlM0e":null}"#);
        let params = extract_session_params(&page).unwrap();
        assert_eq!(params.user_csrf, None);
    }

    #[test]
    fn test_empty_user_csrf_is_none() {
        let page = page_with(r#"{"FdrFJe":"t","cfb2h":"b","qwAQke":"App","SNlM0e":""}"#);
        let params = extract_session_params(&page).unwrap();
        assert_eq!(params.user_csrf, None);
    }

    #[test]
    fn test_marker_not_found() {
        let page = "<!doctype html><html><head><script>var x = {};</script></head></html>";
        assert!(matches!(
            extract_session_params(page),
            Err(DiscoveryError::MarkerNotFound)
        ));
    }

    #[test]
    fn test_malformed_literal() {
        let page = page_with("{not json at all");
        assert!(matches!(
            extract_session_params(&page),
            Err(DiscoveryError::MalformedParams(_))
        ));
    }

    #[test]
    fn test_missing_required_field() {
        // no qwAQke
        let page = page_with(r#"{"FdrFJe":"t","cfb2h":"b"}"#);
        let err = extract_session_params(&page).unwrap_err();
        match err {
            DiscoveryError::MalformedParams(msg) => assert!(msg.contains("qwAQke")),
            other => panic!("expected MalformedParams, got {other:?}"),
        }
    }

    #[test]
    fn test_block_without_assignment() {
        let page = "<script data-id=\"_gd\">no assignment here</script>";
        assert!(matches!(
            extract_session_params(page),
            Err(DiscoveryError::MalformedParams(_))
        ));
    }

    #[test]
    fn test_never_evaluates_script_content() {
        // A JavaScript-literal block that is not valid JSON must fail,
        // not be interpreted.
        let page = page_with(r#"{FdrFJe:'t',cfb2h:'b',qwAQke:'App'}"#);
        assert!(matches!(
            extract_session_params(&page),
            Err(DiscoveryError::MalformedParams(_))
        ));
    }
}
