//! Pre-issuance checks on content type and size.

use std::collections::HashSet;

use super::config::MediaConfig;
use super::error::MediaError;

/// Exact-match membership test; no wildcards or MIME parameters.
#[must_use]
pub fn content_type_allowed(allowed: &HashSet<String>, content_type: &str) -> bool {
    allowed.contains(content_type)
}

/// `requested` may not exceed `ceiling`.
#[must_use]
pub fn size_allowed(requested: u64, ceiling: u64) -> bool {
    requested <= ceiling
}

/// Reject a content type outside the configured allow-list.
pub fn check_content_type(config: &MediaConfig, content_type: &str) -> Result<(), MediaError> {
    if content_type_allowed(&config.allowed_content_types, content_type) {
        Ok(())
    } else {
        Err(MediaError::invalid_content_type(content_type))
    }
}

/// Reject a requested size above the configured ceiling.
pub fn check_size(config: &MediaConfig, requested: u64) -> Result<(), MediaError> {
    if size_allowed(requested, config.max_file_size) {
        Ok(())
    } else {
        Err(MediaError::size_exceeded(requested, config.max_file_size))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("image/jpeg", true)]
    #[case("image/png", true)]
    #[case("image/webp", true)]
    #[case("image/JPEG", false)]
    #[case("image/jpeg; charset=binary", false)]
    #[case("image/*", false)]
    #[case("", false)]
    fn test_content_type_exact_match(#[case] content_type: &str, #[case] allowed: bool) {
        let config = MediaConfig::new();
        assert_eq!(
            content_type_allowed(&config.allowed_content_types, content_type),
            allowed
        );
    }

    #[rstest]
    #[case(0, 10, true)]
    #[case(10, 10, true)]
    #[case(11, 10, false)]
    #[case(u64::MAX, u64::MAX, true)]
    fn test_size_bounds(#[case] requested: u64, #[case] ceiling: u64, #[case] allowed: bool) {
        assert_eq!(size_allowed(requested, ceiling), allowed);
    }

    #[test]
    fn test_check_errors() {
        let config = MediaConfig::new().with_max_file_size(100);

        assert!(check_content_type(&config, "image/png").is_ok());
        assert!(matches!(
            check_content_type(&config, "text/html"),
            Err(MediaError::InvalidContentType { .. })
        ));

        assert!(check_size(&config, 100).is_ok());
        assert!(matches!(
            check_size(&config, 101),
            Err(MediaError::SizeExceeded { requested: 101, max: 100 })
        ));
    }
}
