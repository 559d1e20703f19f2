// SPDX-FileCopyrightText: 2026 Notorium Contributors
// SPDX-License-Identifier: Apache-2.0

//! Audio URL admission filter.
//!
//! Decides whether a caller-supplied URL is an acceptable audio source
//! before it is handed to the transcription backend:
//! - Absolute URL with a host
//! - Path extension on the audio allow-list (case-insensitive)
//! - https scheme when running in production mode
//! - Trusted-storage hosts exempt from host policy (scheme and extension
//!   rules still apply)

use crate::config::AdmissionConfig;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Reasons an audio URL is refused.
#[derive(Debug, Error, Clone)]
pub enum AdmissionError {
    #[error("Not an absolute URL: {0}")]
    NotAbsolute(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("URL path has no file extension: {0}")]
    MissingExtension(String),

    #[error("Extension {ext:?} is not an accepted audio format")]
    ExtensionNotAllowed { ext: String },

    #[error("Insecure scheme {scheme:?} refused in production mode")]
    InsecureScheme { scheme: String },
}

/// Result of an admission check.
#[derive(Debug, Clone)]
pub enum AdmissionResult {
    /// URL is admitted
    Admitted,
    /// URL is refused
    Refused(AdmissionError),
}

impl AdmissionResult {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionResult::Admitted)
    }

    pub fn error(&self) -> Option<&AdmissionError> {
        match self {
            AdmissionResult::Admitted => None,
            AdmissionResult::Refused(e) => Some(e),
        }
    }
}

/// Audio URL validator.
pub struct AudioUrlValidator {
    config: AdmissionConfig,
}

impl AudioUrlValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: AdmissionConfig) -> Self {
        Self { config }
    }

    /// Boolean admission contract: true iff the candidate is an acceptable
    /// audio source. Never panics; any parse failure maps to false.
    pub fn is_valid_audio_url(&self, candidate: &str) -> bool {
        self.validate(candidate).is_admitted()
    }

    /// Full admission check with the refusal reason preserved.
    pub fn validate(&self, candidate: &str) -> AdmissionResult {
        let parsed = match Url::parse(candidate) {
            Ok(u) => u,
            Err(_) => {
                debug!(url = %candidate, "Refused: not an absolute URL");
                return AdmissionResult::Refused(AdmissionError::NotAbsolute(
                    candidate.to_string(),
                ));
            }
        };

        let host = match parsed.host_str() {
            Some(h) => h.to_lowercase(),
            None => {
                debug!(url = %candidate, "Refused: no host");
                return AdmissionResult::Refused(AdmissionError::MissingHost(
                    candidate.to_string(),
                ));
            }
        };

        // Extension comes from the path component only; query and fragment
        // are already excluded here, so "?v=1.2" can never supply one.
        let ext = match path_extension(parsed.path()) {
            Some(e) => e,
            None => {
                debug!(url = %candidate, "Refused: no file extension in path");
                return AdmissionResult::Refused(AdmissionError::MissingExtension(
                    candidate.to_string(),
                ));
            }
        };

        if !self.config.allowed_extensions.iter().any(|a| a == &ext) {
            debug!(url = %candidate, ext = %ext, "Refused: extension not allowed");
            return AdmissionResult::Refused(AdmissionError::ExtensionNotAllowed { ext });
        }

        // Production HTTPS rule applies to every host, trusted storage
        // included; the carve-out below exempts host policy only.
        if self.config.require_https && parsed.scheme() != "https" {
            debug!(url = %candidate, scheme = %parsed.scheme(), "Refused: insecure scheme");
            return AdmissionResult::Refused(AdmissionError::InsecureScheme {
                scheme: parsed.scheme().to_string(),
            });
        }

        if self.is_trusted_host(&host) {
            debug!(url = %candidate, host = %host, "Admitted: trusted storage host");
            return AdmissionResult::Admitted;
        }

        debug!(url = %candidate, host = %host, ext = %ext, "Admitted");
        AdmissionResult::Admitted
    }

    /// Whether the host is a trusted storage host or a subdomain of one.
    fn is_trusted_host(&self, host: &str) -> bool {
        self.config.trusted_hosts.iter().any(|trusted| {
            let trusted = trusted.to_lowercase();
            host == trusted || host.ends_with(&format!(".{trusted}"))
        })
    }
}

/// Extract the lowercase extension from a URL path: the substring after the
/// last `.`. Returns None when the path has no dot or the dot is trailing.
fn path_extension(path: &str) -> Option<String> {
    let (_, ext) = path.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_validator() -> AudioUrlValidator {
        AudioUrlValidator::new(AdmissionConfig::default())
    }

    fn production_validator() -> AudioUrlValidator {
        AudioUrlValidator::new(AdmissionConfig {
            require_https: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_accepts_allowed_extensions() {
        let validator = default_validator();

        for ext in ["mp3", "wav", "ogg", "m4a", "aac", "webm"] {
            let url = format!("https://example.com/lecture.{ext}");
            assert!(validator.is_valid_audio_url(&url), "{ext} should be accepted");
        }
    }

    #[test]
    fn test_extension_matching_is_case_insensitive() {
        let validator = default_validator();

        assert!(validator.is_valid_audio_url("https://example.com/lecture.MP3"));
        assert!(validator.is_valid_audio_url("https://example.com/lecture.Wav"));
    }

    #[test]
    fn test_rejects_disallowed_extension() {
        let validator = default_validator();

        let result = validator.validate("https://example.com/file.exe");
        assert!(!result.is_admitted());
        assert!(matches!(
            result.error(),
            Some(AdmissionError::ExtensionNotAllowed { .. })
        ));
    }

    #[test]
    fn test_rejects_relative_and_garbage_input() {
        let validator = default_validator();

        assert!(!validator.is_valid_audio_url("lecture.mp3"));
        assert!(!validator.is_valid_audio_url("/uploads/lecture.mp3"));
        assert!(!validator.is_valid_audio_url("not a url at all"));
        assert!(!validator.is_valid_audio_url(""));
    }

    #[test]
    fn test_rejects_missing_extension() {
        let validator = default_validator();

        let result = validator.validate("https://example.com/lecture");
        assert!(matches!(
            result.error(),
            Some(AdmissionError::MissingExtension(_))
        ));

        // Root path, no extension
        assert!(!validator.is_valid_audio_url("https://example.com/"));
    }

    #[test]
    fn test_query_dot_does_not_supply_extension() {
        let validator = default_validator();

        // Dot only in the query string
        assert!(!validator.is_valid_audio_url("https://example.com/lecture?v=1.2"));

        // Extension in path, dotted query ignored
        assert!(validator.is_valid_audio_url("https://example.com/lecture.mp3?v=1.2"));
    }

    #[test]
    fn test_production_requires_https() {
        let validator = production_validator();

        assert!(!validator.is_valid_audio_url("http://example.com/lecture.mp3"));
        assert!(validator.is_valid_audio_url("https://example.com/lecture.mp3"));

        let result = validator.validate("http://example.com/lecture.mp3");
        assert!(matches!(
            result.error(),
            Some(AdmissionError::InsecureScheme { .. })
        ));
    }

    #[test]
    fn test_non_production_allows_http() {
        let validator = default_validator();

        assert!(validator.is_valid_audio_url("http://localhost:9099/lecture.mp3"));
    }

    #[test]
    fn test_trusted_storage_host_admitted() {
        let validator = default_validator();

        assert!(validator.is_valid_audio_url(
            "https://firebasestorage.googleapis.com/v0/b/notorium/o/lecture.mp3"
        ));

        // Subdomains of the trusted host count too
        assert!(validator.is_valid_audio_url(
            "https://storage.firebasestorage.googleapis.com/lecture.m4a"
        ));
    }

    #[test]
    fn test_trusted_host_still_subject_to_https_rule() {
        let validator = production_validator();

        assert!(!validator
            .is_valid_audio_url("http://firebasestorage.googleapis.com/lecture.mp3"));
    }

    #[test]
    fn test_trusted_host_still_subject_to_extension_rule() {
        let validator = default_validator();

        assert!(!validator
            .is_valid_audio_url("https://firebasestorage.googleapis.com/lecture.pdf"));
    }

    #[test]
    fn test_hostile_schemes_rejected() {
        let validator = production_validator();

        assert!(!validator.is_valid_audio_url("javascript:alert(1)"));
        assert!(!validator.is_valid_audio_url("file:///etc/passwd.mp3"));
        assert!(!validator.is_valid_audio_url("data:audio/mp3;base64,AAAA"));
    }

    #[test]
    fn test_path_extension() {
        assert_eq!(path_extension("/lecture.mp3"), Some("mp3".to_string()));
        assert_eq!(path_extension("/a/b/lecture.MP3"), Some("mp3".to_string()));
        assert_eq!(path_extension("/lecture"), None);
        assert_eq!(path_extension("/"), None);
        assert_eq!(path_extension("/lecture."), None);
    }
}
