//! `Set-Cookie` parsing.
//!
//! Splits a `Set-Cookie` header into its primary name/value pair and a
//! map of secondary attributes (`Path`, `Domain`, `Expires`, ...).
//! Attributes without a value (`Secure`, `HttpOnly`) map to the empty
//! string.

use std::collections::HashMap;

/// One parsed `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value (empty when the header carried none).
    pub value: String,
    /// Secondary attributes, keyed as sent by the server.
    pub attributes: HashMap<String, String>,
}

/// Parse a raw `Set-Cookie` header value.
pub fn parse_set_cookie(raw: &str) -> Cookie {
    let mut parts = raw.split("; ");
    // split always yields at least one (possibly empty) part
    let (name, value) = split_pair(parts.next().unwrap_or(""));

    let attributes = parts
        .map(split_pair)
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    Cookie {
        name: name.to_string(),
        value: value.to_string(),
        attributes,
    }
}

/// Split `key=value` into its halves; a part with no `=` maps to an
/// empty value.
fn split_pair(part: &str) -> (&str, &str) {
    match part.split_once('=') {
        Some((key, value)) => (key, value),
        None => (part, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_and_value() {
        let cookie = parse_set_cookie("NID=511=abcdef");
        assert_eq!(cookie.name, "NID");
        // the value keeps everything after the first '='
        assert_eq!(cookie.value, "511=abcdef");
        assert!(cookie.attributes.is_empty());
    }

    #[test]
    fn test_parse_attributes() {
        let cookie =
            parse_set_cookie("SID=xyz; Path=/; Domain=.example.com; Expires=Wed, 01 Jan 2031 00:00:00 GMT");
        assert_eq!(cookie.name, "SID");
        assert_eq!(cookie.value, "xyz");
        assert_eq!(cookie.attributes.get("Path").map(String::as_str), Some("/"));
        assert_eq!(
            cookie.attributes.get("Domain").map(String::as_str),
            Some(".example.com")
        );
        assert_eq!(
            cookie.attributes.get("Expires").map(String::as_str),
            Some("Wed, 01 Jan 2031 00:00:00 GMT")
        );
    }

    #[test]
    fn test_valueless_attribute_maps_to_empty_string() {
        let cookie = parse_set_cookie("token=1; Secure; HttpOnly");
        assert_eq!(cookie.attributes.get("Secure").map(String::as_str), Some(""));
        assert_eq!(
            cookie.attributes.get("HttpOnly").map(String::as_str),
            Some("")
        );
    }

    #[test]
    fn test_cookie_without_value() {
        let cookie = parse_set_cookie("flag; Path=/");
        assert_eq!(cookie.name, "flag");
        assert_eq!(cookie.value, "");
        assert_eq!(cookie.attributes.get("Path").map(String::as_str), Some("/"));
    }
}
