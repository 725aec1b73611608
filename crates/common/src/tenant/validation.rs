//! 租户字段验证
//!
//! slug 即公开的 `tenant_id`，出现在 URL 中：3 到 50 个字符，只允许小写字母、数字和连字符。
//! logo 地址必须是可解析的 http(s) URL，注册和更新使用同一条规则。

use validator::{ValidateUrl, ValidationError};

pub const SLUG_MIN_LEN: usize = 3;
pub const SLUG_MAX_LEN: usize = 50;

/// 检查 slug 是否合法
pub fn is_valid_slug(slug: &str) -> bool {
    (SLUG_MIN_LEN..=SLUG_MAX_LEN).contains(&slug.len())
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// 供 `#[validate(custom(function = "validate_slug"))]` 使用
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        let mut err = ValidationError::new("slug");
        err.message = Some(
            "must be 3-50 characters of lowercase letters, digits or hyphens".into(),
        );
        Err(err)
    }
}

/// 检查 logo 地址是否为 http(s) URL
pub fn is_valid_logo_url(value: &str) -> bool {
    let http_scheme = value
        .split_once("://")
        .is_some_and(|(scheme, _)| {
            scheme.eq_ignore_ascii_case("https") || scheme.eq_ignore_ascii_case("http")
        });
    http_scheme && value.validate_url()
}

/// 供 `#[validate(custom(function = "validate_logo_url"))]` 使用
pub fn validate_logo_url(value: &str) -> Result<(), ValidationError> {
    if is_valid_logo_url(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("url");
        err.message = Some("must be an http(s) URL".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_slugs() {
        for slug in ["abc", "jane-doe", "studio-42", &"a".repeat(50)] {
            assert!(is_valid_slug(slug), "{slug} should be valid");
        }
    }

    #[test]
    fn test_invalid_slugs() {
        for slug in ["ab", "Jane", "jane_doe", "jane doe", "émile", "", &"a".repeat(51)] {
            assert!(!is_valid_slug(slug), "{slug} should be invalid");
        }
        assert!(validate_slug("UPPER").is_err());
    }

    #[test]
    fn test_logo_urls() {
        for url in ["https://cdn.example.com/logo.png", "http://example.com/a.svg", "HTTPS://example.com/x"] {
            assert!(is_valid_logo_url(url), "{url} should be valid");
        }
        for url in [
            "ftp://files.example.com/logo.png",
            "javascript:alert(1)",
            "https://",
            "https://exa mple.com/logo.png",
            "not a url",
            "",
        ] {
            assert!(!is_valid_logo_url(url), "{url} should be invalid");
        }
        assert!(validate_logo_url("data:image/png;base64,AAAA").is_err());
    }
}
