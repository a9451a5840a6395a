use semver::{Version, VersionReq};
use thiserror::Error;

use crate::host::{HostApi, HostError};

/// `SearchPostsInTeam` first shipped with this server release.
pub const DEFAULT_MIN_SERVER_VERSION: &str = "5.10.0";

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("could not read the server version: {0}")]
    Host(#[from] HostError),
    #[error("failed to parse server version `{version}`: {source}")]
    ParseServerVersion {
        version: String,
        #[source]
        source: semver::Error,
    },
    #[error("invalid minimum server version `{version}`: {source}")]
    ParseRequirement {
        version: String,
        #[source]
        source: semver::Error,
    },
    #[error("this plugin requires Mattermost v{required} or later (server is v{actual})")]
    Unsupported { required: String, actual: String },
}

pub fn check_server_version(server_version: &str, min_version: &str) -> Result<(), ActivationError> {
    let requirement = VersionReq::parse(&format!(">={min_version}")).map_err(|source| {
        ActivationError::ParseRequirement { version: min_version.to_owned(), source }
    })?;
    let version = parse_server_version(server_version)?;

    if !requirement.matches(&version) {
        return Err(ActivationError::Unsupported {
            required: min_version.to_owned(),
            actual: server_version.trim().to_owned(),
        });
    }

    Ok(())
}

/// Queries the host for its version and checks it against `min_version`.
/// Returns the reported version on success.
pub async fn ensure_compatible<H>(host: &H, min_version: &str) -> Result<String, ActivationError>
where
    H: HostApi + ?Sized,
{
    let server_version = host.server_version().await?;
    check_server_version(&server_version, min_version)?;
    Ok(server_version)
}

fn parse_server_version(raw: &str) -> Result<Version, ActivationError> {
    let trimmed = raw.trim();
    let normalized = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(normalized).map_err(|source| ActivationError::ParseServerVersion {
        version: raw.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{check_server_version, ensure_compatible, ActivationError, DEFAULT_MIN_SERVER_VERSION};
    use crate::host::{HostOperation, InMemoryHost};

    #[test]
    fn accepts_minimum_and_newer_versions() {
        assert!(check_server_version("5.10.0", DEFAULT_MIN_SERVER_VERSION).is_ok());
        assert!(check_server_version("5.12.3", DEFAULT_MIN_SERVER_VERSION).is_ok());
        assert!(check_server_version("v9.4.1", DEFAULT_MIN_SERVER_VERSION).is_ok());
    }

    #[test]
    fn rejects_older_versions() {
        let error = check_server_version("5.9.9", DEFAULT_MIN_SERVER_VERSION)
            .expect_err("5.9.9 is below the minimum");
        assert!(matches!(error, ActivationError::Unsupported { .. }));
        assert_eq!(
            error.to_string(),
            "this plugin requires Mattermost v5.10.0 or later (server is v5.9.9)"
        );
    }

    #[test]
    fn rejects_unparseable_server_versions() {
        let error = check_server_version("latest", DEFAULT_MIN_SERVER_VERSION)
            .expect_err("non-semver version");
        assert!(matches!(error, ActivationError::ParseServerVersion { .. }));
    }

    #[test]
    fn rejects_invalid_requirements() {
        let error = check_server_version("5.10.0", "five").expect_err("bad requirement");
        assert!(matches!(error, ActivationError::ParseRequirement { .. }));
    }

    #[tokio::test]
    async fn ensure_compatible_queries_the_host() {
        let host = InMemoryHost::new("5.10.0");
        let version = ensure_compatible(&host, DEFAULT_MIN_SERVER_VERSION).await.expect("ok");
        assert_eq!(version, "5.10.0");
        assert_eq!(host.calls(), vec![HostOperation::ServerVersion]);
    }

    #[tokio::test]
    async fn ensure_compatible_surfaces_host_failures() {
        let host = InMemoryHost::new("5.10.0").failing(HostOperation::ServerVersion);
        let error = ensure_compatible(&host, DEFAULT_MIN_SERVER_VERSION).await.expect_err("fails");
        assert!(matches!(error, ActivationError::Host(_)));
    }
}
