use regex::Regex;
use std::sync::OnceLock;

use crate::error::PublishError;

fn push_url_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"api\.powerbi\.com/beta/[a-z0-9-]+/datasets/([a-z0-9-]+)/").ok())
        .as_ref()
}

/// Extract the dataset id from a push URL of the form
/// `https://api.powerbi.com/beta/<tenant>/datasets/<dataset>/rows?key=<key>`.
pub fn parse_dataset_id(push_url: &str) -> Result<String, PublishError> {
    push_url_pattern()
        .and_then(|re| re.captures(push_url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| PublishError::DatasetId(push_url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_push_url() {
        let url = "https://api.powerbi.com/beta/30834dbb-f907-42d3-9bbb-0c00c6094c93/datasets/8f2b6c1e-aa10-4e3b-9d3c-5b1e2f7a9c01/rows?key=abc%3D";
        assert_eq!(
            parse_dataset_id(url).unwrap(),
            "8f2b6c1e-aa10-4e3b-9d3c-5b1e2f7a9c01"
        );
    }

    #[test]
    fn test_parse_rejects_other_hosts() {
        let err = parse_dataset_id("https://example.com/datasets/abc/rows").unwrap_err();
        assert!(err.to_string().contains("dataset id"), "got: {err}");
    }

    #[test]
    fn test_parse_requires_rows_segment() {
        assert!(parse_dataset_id("https://api.powerbi.com/beta/tenant/datasets/abc").is_err());
    }

    #[test]
    fn test_parse_rejects_uppercase_ids() {
        assert!(parse_dataset_id("https://api.powerbi.com/beta/tenant/datasets/ABC/rows").is_err());
    }
}
