//! Runtime version comparison for feature gates.

/// First quorum release that ships the GraphQL endpoint
pub const GRAPHQL_MIN_VERSION: (u32, u32, u32) = (2, 6, 0);

/// Parse `major.minor.patch` out of a version string.
///
/// A leading `v` and any pre-release/build suffix are ignored, missing
/// components count as 0. Returns `None` if the major component is not a
/// number.
pub fn parse_version(version: &str) -> Option<(u32, u32, u32)> {
    let trimmed = version.trim().trim_start_matches('v');
    let core = trimmed.split(['-', '+']).next().unwrap_or_default();
    let mut parts = core.split('.');

    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let patch = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    Some((major, minor, patch))
}

/// True if `version` is at or above `minimum`. Unparseable versions fail the gate.
pub fn is_at_least(version: &str, minimum: (u32, u32, u32)) -> bool {
    parse_version(version).map_or(false, |v| v >= minimum)
}

/// True if the quorum version supports `--graphql`
pub fn supports_graphql(quorum_version: &str) -> bool {
    is_at_least(quorum_version, GRAPHQL_MIN_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("2.6.0"), Some((2, 6, 0)));
        assert_eq!(parse_version("v2.5"), Some((2, 5, 0)));
        assert_eq!(parse_version("2.7.0-rc1"), Some((2, 7, 0)));
        assert_eq!(parse_version("latest"), None);
    }

    #[test]
    fn test_graphql_gate() {
        assert!(supports_graphql("2.6.0"));
        assert!(supports_graphql("20.10.0"));
        assert!(!supports_graphql("2.5.0"));
        assert!(!supports_graphql("garbage"));
    }
}
