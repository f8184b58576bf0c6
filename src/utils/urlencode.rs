//! Percent-encoding for path segments and query values

use url::form_urlencoded;

/// Percent-encode a single URL component.
///
/// Spaces become `%20` rather than `+` so the result is valid in both path
/// segments and query values.
pub fn encode_component(value: &str) -> String {
    // form_urlencoded already escapes a literal '+' as %2B, so every '+' left
    // in the output stands for a space.
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Join already-encoded `key=value` pairs into a query string
pub fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_values_untouched() {
        assert_eq!(encode_component("Fox"), "Fox");
        assert_eq!(encode_component("idle_2"), "idle_2");
    }

    #[test]
    fn test_reserved_characters_escaped() {
        assert_eq!(encode_component("Clothes/Robe"), "Clothes%2FRobe");
        assert_eq!(encode_component("#ff0000"), "%23ff0000");
        assert_eq!(encode_component("a b"), "a%20b");
        assert_eq!(encode_component("a+b"), "a%2Bb");
        assert_eq!(encode_component("x&y=z"), "x%26y%3Dz");
    }

    #[test]
    fn test_query_join() {
        let params = vec![
            ("add_skin".to_string(), "Hat".to_string()),
            ("top_text".to_string(), "hi there".to_string()),
        ];
        assert_eq!(encode_query(&params), "add_skin=Hat&top_text=hi%20there");
    }
}
