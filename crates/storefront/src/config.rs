//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `ADMIN_USERNAME` - Admin panel login name
//! - `ADMIN_PASSWORD_HASH` - Argon2 PHC string (generate with `atiga admin hash-password`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STORAGE_BACKEND` - `local`, `cloudinary`, or `supabase` (default: local)
//! - `UPLOAD_DIR` - Local backend directory (default: crates/storefront/uploads)
//! - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET` - required for cloudinary
//! - `CLOUDINARY_SIGNATURE_ALGORITHM` - `sha1` or `sha256` (default: sha1, the account default)
//! - `SUPABASE_URL`, `SUPABASE_SERVICE_ROLE_KEY` - required for supabase
//! - `SUPABASE_STORAGE_BUCKET` - Supabase bucket (default: images)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// The single admin credential
    pub admin: AdminConfig,
    /// Where uploaded product images go
    pub storage: StorageConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    pub log_format: LogFormat,
}

/// Admin panel credential.
#[derive(Clone)]
pub struct AdminConfig {
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: SecretString,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Image storage backend selection.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// Files on local disk, served under `/uploads`.
    Local { upload_dir: PathBuf },
    Cloudinary(CloudinaryConfig),
    Supabase(SupabaseConfig),
}

/// Cloudinary upload API credentials.
///
/// Implements `Debug` manually to redact the API secret.
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: SecretString,
    pub signature_algorithm: SignatureAlgorithm,
}

/// Hash used for Cloudinary request signatures.
///
/// Must match the account setting; new accounts sign with SHA-1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl SignatureAlgorithm {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            other => Err(ConfigError::InvalidEnvVar(
                "CLOUDINARY_SIGNATURE_ALGORITHM".to_string(),
                format!("unknown algorithm '{other}' (expected sha1 or sha256)"),
            )),
        }
    }

    /// Value of the `signature_algorithm` upload parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("signature_algorithm", &self.signature_algorithm)
            .finish()
    }
}

/// Supabase Storage credentials.
///
/// Implements `Debug` manually to redact the service role key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abc.supabase.co`
    pub url: Url,
    pub service_role_key: SecretString,
    pub bucket: String,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("service_role_key", &"[REDACTED]")
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;

        let admin = AdminConfig::from_env()?;
        let storage = StorageConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            admin,
            storage,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            log_format: parse_log_format(get_optional_env("LOG_FORMAT").as_deref()),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl AdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let username = get_required_env("ADMIN_USERNAME")?;
        if username.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "ADMIN_USERNAME".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let password_hash = get_required_env("ADMIN_PASSWORD_HASH")?;
        validate_password_hash(&password_hash, "ADMIN_PASSWORD_HASH")?;

        Ok(Self {
            username,
            password_hash: SecretString::from(password_hash),
        })
    }

    /// Expose the stored hash for verification.
    #[must_use]
    pub fn password_hash(&self) -> &str {
        self.password_hash.expose_secret()
    }
}

impl StorageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        match get_env_or_default("STORAGE_BACKEND", "local")
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "local" => Ok(Self::Local {
                upload_dir: PathBuf::from(get_env_or_default(
                    "UPLOAD_DIR",
                    "crates/storefront/uploads",
                )),
            }),
            "cloudinary" => Ok(Self::Cloudinary(CloudinaryConfig {
                cloud_name: get_required_env("CLOUDINARY_CLOUD_NAME")?,
                api_key: get_required_env("CLOUDINARY_API_KEY")?,
                api_secret: get_validated_secret("CLOUDINARY_API_SECRET")?,
                signature_algorithm: SignatureAlgorithm::parse(&get_env_or_default(
                    "CLOUDINARY_SIGNATURE_ALGORITHM",
                    "sha1",
                ))?,
            })),
            "supabase" => {
                let raw_url = get_required_env("SUPABASE_URL")?;
                let url = Url::parse(&raw_url).map_err(|e| {
                    ConfigError::InvalidEnvVar("SUPABASE_URL".to_string(), e.to_string())
                })?;
                Ok(Self::Supabase(SupabaseConfig {
                    url,
                    service_role_key: get_validated_secret("SUPABASE_SERVICE_ROLE_KEY")?,
                    bucket: get_env_or_default("SUPABASE_STORAGE_BUCKET", "images"),
                }))
            }
            other => Err(ConfigError::InvalidEnvVar(
                "STORAGE_BACKEND".to_string(),
                format!("unknown backend '{other}' (expected local, cloudinary, or supabase)"),
            )),
        }
    }

    /// Short backend name for logs.
    #[must_use]
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::Cloudinary(_) => "cloudinary",
            Self::Supabase(_) => "supabase",
        }
    }

    /// Origin that serves stored images, for the CSP `img-src` directive.
    #[must_use]
    pub fn image_origin(&self) -> Option<String> {
        match self {
            Self::Local { .. } => None,
            Self::Cloudinary(_) => Some("https://res.cloudinary.com".to_string()),
            Self::Supabase(cfg) => Some(cfg.url.origin().ascii_serialization()),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_log_format(value: Option<&str>) -> LogFormat {
    match value {
        Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
        _ => LogFormat::Text,
    }
}

/// The admin hash must be a parseable PHC string, not a plaintext password.
fn validate_password_hash(value: &str, var_name: &str) -> Result<(), ConfigError> {
    argon2::PasswordHash::new(value).map(|_| ()).map_err(|e| {
        ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("not an argon2 PHC string ({e}); run `atiga admin hash-password`"),
        )
    })
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the key from the provider dashboard."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a provider secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FAKE_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHRzYWx0$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

    fn local_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/atiga"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            admin: AdminConfig {
                username: "admin".to_string(),
                password_hash: SecretString::from(FAKE_HASH),
            },
            storage: StorageConfig::Local {
                upload_dir: PathBuf::from("uploads"),
            },
            sentry_dsn: None,
            sentry_environment: None,
            log_format: LogFormat::Text,
        }
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-api-secret-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let err = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_password_hash() {
        assert!(validate_password_hash("hunter2", "ADMIN_PASSWORD_HASH").is_err());
        assert!(validate_password_hash(FAKE_HASH, "ADMIN_PASSWORD_HASH").is_ok());
    }

    #[test]
    fn test_parse_log_format() {
        assert_eq!(parse_log_format(Some("json")), LogFormat::Json);
        assert_eq!(parse_log_format(Some("JSON")), LogFormat::Json);
        assert_eq!(parse_log_format(Some("pretty")), LogFormat::Text);
        assert_eq!(parse_log_format(None), LogFormat::Text);
    }

    #[test]
    fn test_socket_addr() {
        let config = local_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_https());
    }

    #[test]
    fn test_image_origin() {
        assert_eq!(local_config().storage.image_origin(), None);

        let supabase = StorageConfig::Supabase(SupabaseConfig {
            url: Url::parse("https://abc.supabase.co").unwrap(),
            service_role_key: SecretString::from("k"),
            bucket: "images".to_string(),
        });
        assert_eq!(supabase.image_origin().as_deref(), Some("https://abc.supabase.co"));
        assert_eq!(supabase.backend_name(), "supabase");
    }

    #[test]
    fn test_signature_algorithm_parse() {
        assert_eq!(SignatureAlgorithm::parse("").unwrap(), SignatureAlgorithm::Sha1);
        assert_eq!(SignatureAlgorithm::parse("SHA1").unwrap(), SignatureAlgorithm::Sha1);
        assert_eq!(SignatureAlgorithm::parse(" sha256 ").unwrap(), SignatureAlgorithm::Sha256);
        assert!(matches!(
            SignatureAlgorithm::parse("md5"),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "CLOUDINARY_SIGNATURE_ALGORITHM"
        ));
        assert_eq!(SignatureAlgorithm::default().as_str(), "sha1");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let cloudinary = CloudinaryConfig {
            cloud_name: "atiga".to_string(),
            api_key: "123456789".to_string(),
            api_secret: SecretString::from("super_secret_cloudinary_value"),
            signature_algorithm: SignatureAlgorithm::Sha1,
        };
        let output = format!("{cloudinary:?}");
        assert!(output.contains("atiga"));
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("super_secret_cloudinary_value"));

        let admin = format!("{:?}", local_config().admin);
        assert!(admin.contains("admin"));
        assert!(!admin.contains("argon2id"));
    }
}
