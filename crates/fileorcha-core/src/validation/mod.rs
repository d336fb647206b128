//! Validation modules

pub mod filename;
pub mod rules;

pub use filename::sanitize_filename;
pub use rules::{
    normalize_slug, validate_downloads, validate_expiry, validate_slug, ValidationError,
    ValidationRules, DEFAULT_MAX_FILE_SIZE_BYTES, MAX_DOWNLOADS, MAX_EXPIRY_MINUTES,
    MIN_DOWNLOADS, MIN_EXPIRY_MINUTES,
};
