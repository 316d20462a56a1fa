use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::AppError;
use crate::models::{Browser, LoginMethod};

/// Default location of the persisted settings record, relative to the
/// working directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Fully resolved run settings.
///
/// Construction goes through [`resolve`], so holding a value of this type
/// means every required field is present and enumerated fields are within
/// their domains.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub username: String,
    pub password: String,
    pub browser: Browser,
    pub login_method: LoginMethod,
    pub lesson_id: u32,
}

/// Settings supplied on the command line.
///
/// Fields left `None` were not given and never override a stored value;
/// this is what keeps an empty CLI run from blanking out the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub username: Option<String>,
    pub password: Option<String>,
    pub browser: Option<Browser>,
    pub login_method: Option<LoginMethod>,
    pub lesson_id: Option<u32>,
    /// Leave the password out of the settings file written after resolution.
    pub stealth: bool,
}

/// On-disk shape of the settings record.
///
/// Every field is optional so a partial file from an earlier run (or a
/// stealth run that dropped the password) still parses; enumerated fields
/// stay raw strings here and are validated separately, because an
/// out-of-domain value must be dropped with a warning rather than fail the
/// whole parse.
#[derive(Debug, Default, serde::Deserialize)]
struct StoredSettings {
    username: Option<String>,
    password: Option<String>,
    browser: Option<String>,
    login_method: Option<String>,
    lesson_id: Option<u32>,
}

/// Serialized view written back after every successful resolution.
/// Field declaration order is the stable key order of the file.
#[derive(serde::Serialize)]
struct StoredSettingsOut<'a> {
    browser: &'a str,
    lesson_id: u32,
    login_method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    username: &'a str,
}

/// Merge the persisted record at `path` with the CLI `overrides` into one
/// complete [`Settings`] value.
///
/// CLI values take precedence over stored ones. On success the merged
/// settings are written back to `path` (without the password when
/// `overrides.stealth` is set), so a partial file can be corrected
/// interactively across runs. Fails without touching the file when the
/// record is unparseable or required fields remain missing after the merge.
pub fn resolve(overrides: &Overrides, path: &Path) -> Result<Settings, AppError> {
    let stored = load_stored(path)?;

    let username = overrides.username.clone().or(stored.username);
    let password = overrides.password.clone().or(stored.password);
    let browser = overrides
        .browser
        .or_else(|| valid_or_warn::<Browser>(stored.browser, path));
    let login_method = overrides
        .login_method
        .or_else(|| valid_or_warn::<LoginMethod>(stored.login_method, path));
    let lesson_id = overrides.lesson_id.or(stored.lesson_id);

    let mut missing = Vec::new();
    if username.is_none() {
        missing.push("username".to_string());
    }
    if password.is_none() {
        missing.push("password".to_string());
    }
    if browser.is_none() {
        missing.push("browser".to_string());
    }
    if login_method.is_none() {
        missing.push("login_method".to_string());
    }
    if lesson_id.is_none() {
        missing.push("lesson_id".to_string());
    }

    match (username, password, browser, login_method, lesson_id) {
        (Some(username), Some(password), Some(browser), Some(login_method), Some(lesson_id)) => {
            let settings = Settings {
                username,
                password,
                browser,
                login_method,
                lesson_id,
            };
            persist(&settings, overrides.stealth, path)?;
            Ok(settings)
        }
        _ => Err(AppError::MissingSettings(missing)),
    }
}

/// Read the stored record. A missing file is an empty record; an existing
/// file that cannot be read or parsed is fatal, so a corrupted record is
/// never silently overwritten.
fn load_stored(path: &Path) -> Result<StoredSettings, AppError> {
    if !path.exists() {
        return Ok(StoredSettings::default());
    }
    let raw = fs::read_to_string(path).map_err(|err| AppError::SettingsUnreadable {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|err| AppError::SettingsUnreadable {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

/// Validate an enumerated field read from the file. Out-of-domain values
/// are dropped with a warning; the field then counts as absent.
fn valid_or_warn<T: FromStr<Err = AppError>>(raw: Option<String>, path: &Path) -> Option<T> {
    let raw = raw?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!("{}: dropping stored value: {err}", path.display());
            None
        }
    }
}

fn persist(settings: &Settings, stealth: bool, path: &Path) -> Result<(), AppError> {
    let out = StoredSettingsOut {
        browser: settings.browser.as_str(),
        lesson_id: settings.lesson_id,
        login_method: settings.login_method.as_str(),
        password: if stealth {
            None
        } else {
            Some(&settings.password)
        },
        username: &settings.username,
    };
    let mut body =
        serde_json::to_string_pretty(&out).map_err(|err| AppError::SettingsWrite {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
    body.push('\n');
    fs::write(path, body).map_err(|err| AppError::SettingsWrite {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}
