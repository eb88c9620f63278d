use crate::utils::validation::has_known_signature;
use std::env;
use validator::{Validate, ValidationError};

/// Default maximum upload size: 10 MiB
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Extra room on top of `max_file_size` for multipart headers and boundaries
pub const MULTIPART_OVERHEAD: usize = 10 * 1024 * 1024;

/// Limits applied to every uploaded file section
#[derive(Debug, Clone, Validate)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes (default: 10 MiB)
    #[validate(range(min = 1, message = "Maximum file size must be at least one byte"))]
    pub max_file_size: usize,

    /// Permitted extensions, lower case with a leading dot (default: [".jpg"])
    #[validate(
        length(min = 1, message = "At least one extension must be permitted"),
        custom(function = "validate_permitted_extensions")
    )]
    pub permitted_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            permitted_extensions: vec![".jpg".to_string()],
        }
    }
}

impl UploadConfig {
    pub fn new<I, S>(max_file_size: usize, permitted_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            max_file_size,
            permitted_extensions: permitted_extensions
                .into_iter()
                .filter_map(|ext| normalize_extension(ext.as_ref()))
                .collect(),
        }
    }

    /// Load upload limits from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        let max_file_size = env::var("MAX_FILE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.max_file_size);

        match env::var("PERMITTED_EXTENSIONS") {
            Ok(list) => Self::new(max_file_size, list.split(',')),
            Err(_) => Self {
                max_file_size,
                ..default
            },
        }
    }

    /// Case-insensitive membership test; `extension` includes the leading dot
    pub fn permits(&self, extension: &str) -> bool {
        self.permitted_extensions
            .iter()
            .any(|permitted| permitted.eq_ignore_ascii_case(extension))
    }
}

/// Turns "JPG", ".Jpg" or " .jpg " into ".jpg"; blank entries are dropped
pub fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_ascii_lowercase()))
}

fn validate_permitted_extensions(extensions: &Vec<String>) -> Result<(), ValidationError> {
    for ext in extensions {
        if !has_known_signature(ext) {
            let mut err = ValidationError::new("unknown_signature");
            err.message = Some(format!("No content signature registered for '{}'", ext).into());
            return Err(err);
        }
    }
    Ok(())
}

/// Process-wide settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub upload: UploadConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://uploads.db?mode=rwc".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            upload: UploadConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),

            host: env::var("HOST").unwrap_or(default.host),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            upload: UploadConfig::from_env(),
        }
    }

    /// In-memory database, default limits
    pub fn development() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            ..Self::default()
        }
    }
}
