//! Credential redaction for log lines, error messages and CSV artifacts.
//!
//! The access token is a bearer credential carried in query strings, so any
//! URL or free text that may embed it passes through here before it leaves
//! the process.

/// Query parameters whose values are credentials.
pub const SENSITIVE_PARAMS: &[&str] = &["access_token", "api_key"];

/// Replacement written in place of a credential.
pub const MASK: &str = "***";

/// Mask the value of every sensitive `key=value` pair found in `text`.
///
/// Works on full URLs, bare query strings and free text that happens to
/// contain such a pair. Matching is case-insensitive on the key; the value
/// ends at the next `&`, `"`, `'`, `<`, `#` or whitespace.
pub fn redact_url_fragments(text: &str) -> String {
    let lower = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    while cursor < text.len() {
        let next = SENSITIVE_PARAMS
            .iter()
            .filter_map(|param| {
                let needle = format!("{}=", param);
                lower[cursor..]
                    .find(&needle)
                    .map(|pos| (cursor + pos, needle.len()))
            })
            .min_by_key(|(pos, _)| *pos);

        let Some((start, needle_len)) = next else {
            out.push_str(&text[cursor..]);
            break;
        };

        let value_start = start + needle_len;
        let value_end = text[value_start..]
            .find(|c: char| matches!(c, '&' | '"' | '\'' | '<' | '#') || c.is_whitespace())
            .map(|offset| value_start + offset)
            .unwrap_or(text.len());

        out.push_str(&text[cursor..value_start]);
        if value_end > value_start {
            out.push_str(MASK);
        }
        cursor = value_end;
    }

    out
}

/// Mask every literal occurrence of `secret` in `text`.
///
/// Empty secrets leave the text untouched.
pub fn redact_secret(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, MASK)
}

/// Apply both URL-fragment and literal-secret redaction.
pub fn redact(text: &str, secret: &str) -> String {
    redact_secret(&redact_url_fragments(text), secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_full_url() {
        let url = "https://eo.example/geoserver/ows?access_token=abc123&SERVICE=WPS";
        assert_eq!(
            redact_url_fragments(url),
            "https://eo.example/geoserver/ows?access_token=***&SERVICE=WPS"
        );
    }

    #[test]
    fn test_redact_multiple_params() {
        let url = "https://eo.example/api/base/search?username=u&api_key=k1&limit=1&ACCESS_TOKEN=t2";
        let redacted = redact_url_fragments(url);
        assert!(!redacted.contains("k1"));
        assert!(!redacted.contains("t2"));
        assert!(redacted.contains("username=u"));
        assert!(redacted.contains("limit=1"));
    }

    #[test]
    fn test_redact_value_at_end_and_in_xml() {
        assert_eq!(
            redact_url_fragments("href&access_token=tok"),
            "href&access_token=***"
        );
        assert_eq!(
            redact_url_fragments(r#"<a href="x?access_token=tok">"#),
            r#"<a href="x?access_token=***">"#
        );
    }

    #[test]
    fn test_no_sensitive_params() {
        let text = "nothing to see here";
        assert_eq!(redact_url_fragments(text), text);
    }

    #[test]
    fn test_redact_secret_literal() {
        assert_eq!(redact_secret("key tok in text", "tok"), "key *** in text");
        assert_eq!(redact_secret("abc", ""), "abc");
    }

    #[test]
    fn test_redact_combined() {
        let text = "failed for https://h/x?access_token=s3cr3t (token s3cr3t)";
        let redacted = redact(text, "s3cr3t");
        assert!(!redacted.contains("s3cr3t"));
    }
}
