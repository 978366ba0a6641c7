/// Route prefix used when `API_PREFIX` isn't set.
pub const DEFAULT_API_PREFIX: &str = "/api/minio";

/// The scope that is always requested from the provider.
pub const OIDC_SCOPE_OPENID: &str = "openid";

pub(crate) const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";
pub(crate) const RESPONSE_TYPE_CODE: &str = "code";

pub(crate) const STS_ACTION_ASSUME_ROLE_WITH_WEB_IDENTITY: &str = "AssumeRoleWithWebIdentity";
pub(crate) const STS_API_VERSION: &str = "2011-06-15";

/// Filestash backend type for S3-compatible storage.
pub(crate) const FILESTASH_BACKEND_S3: &str = "s3";
pub(crate) const FILESTASH_SESSION_PATH: &str = "/api/session";
