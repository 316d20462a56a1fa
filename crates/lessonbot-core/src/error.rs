use thiserror::Error;

/// Application-wide error types for Lessonbot.
#[derive(Error, Debug)]
pub enum AppError {
    /// Persisted settings file exists but could not be read or parsed.
    #[error("Settings file {path} is unreadable: {reason}")]
    SettingsUnreadable { path: String, reason: String },

    /// Required settings are still missing after merging all sources.
    #[error("Missing required settings: {}", .0.join(", "))]
    MissingSettings(Vec<String>),

    /// Settings file could not be written back after resolution.
    #[error("Failed to write settings file {path}: {reason}")]
    SettingsWrite { path: String, reason: String },

    /// A value does not belong to its enumerated domain.
    #[error("Invalid {field} '{value}' (expected one of: {expected})")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// Driver binary could not be located or started for one browser family.
    #[error("Driver error for {browser}: {reason}")]
    Driver {
        browser: &'static str,
        reason: String,
    },

    /// The control session could not be created for one browser family.
    #[error("Session not created for {browser}: {reason}")]
    SessionNotCreated {
        browser: &'static str,
        reason: String,
    },

    /// Every browser in the fallback order failed to start.
    #[error("No usable browser found (supported: {})", .0.join(", "))]
    NoBrowserAvailable(Vec<String>),

    /// Navigation or page-source readout failed on a live session.
    #[error("Fetch error: {0}")]
    Fetch(String),
}

impl AppError {
    /// Returns true if this error ends the run.
    ///
    /// Per-browser failures are expected (most machines have only one or two
    /// of the supported browsers installed) and are absorbed by the fallback
    /// walk; a failed fetch is reported but the session is still released.
    pub fn is_fatal(&self) -> bool {
        match self {
            AppError::SettingsUnreadable { .. }
            | AppError::MissingSettings(_)
            | AppError::SettingsWrite { .. }
            | AppError::NoBrowserAvailable(_) => true,
            AppError::InvalidValue { .. }
            | AppError::Driver { .. }
            | AppError::SessionNotCreated { .. }
            | AppError::Fetch(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(AppError::MissingSettings(vec!["password".into()]).is_fatal());
        assert!(
            AppError::SettingsUnreadable {
                path: "settings.json".into(),
                reason: "bad json".into(),
            }
            .is_fatal()
        );
        assert!(AppError::NoBrowserAvailable(vec!["brave".into()]).is_fatal());
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(
            !AppError::Driver {
                browser: "firefox",
                reason: "geckodriver not found".into(),
            }
            .is_fatal()
        );
        assert!(
            !AppError::SessionNotCreated {
                browser: "chrome",
                reason: "session rejected".into(),
            }
            .is_fatal()
        );
        assert!(!AppError::Fetch("navigation failed".into()).is_fatal());
    }
}
