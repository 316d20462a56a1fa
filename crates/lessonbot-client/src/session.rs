use std::path::{Path, PathBuf};
use std::time::Duration;

use thirtyfour::prelude::*;
use thirtyfour::Capabilities;
use thirtyfour::common::capabilities::firefox::FirefoxPreferences;

use lessonbot_core::{AppError, Browser};

use crate::driver::DriverServer;

/// Flags applied to every browser family at launch.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a visible window.
    pub headless: bool,
    /// Value for the browser's preferred-content-language setting.
    pub accept_language: String,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            accept_language: "de".to_string(),
        }
    }
}

/// Wait applied to page loads after navigation. Session creation itself has
/// no caller-specified timeout.
const PAGE_LOAD_WAIT: Duration = Duration::from_secs(3);

/// A live browser-control session plus the driver process behind it.
///
/// The session is exclusively owned and scoped to one run: fetch at most
/// one page through it, then release it with [`Session::quit`]. Dropping
/// the value without quitting still kills the driver process, but the
/// browser is only closed cleanly by `quit`.
pub struct Session {
    driver: WebDriver,
    browser: Browser,
    _server: DriverServer,
}

impl Session {
    /// Try to construct a session for a single browser family.
    ///
    /// Builds the family's option set, provisions its driver, and asks the
    /// driver for a session. Each step reports a per-family error; none of
    /// them aborts the overall acquisition (see [`crate::acquire`]).
    pub async fn launch(browser: Browser, options: &LaunchOptions) -> Result<Self, AppError> {
        let caps = build_capabilities(browser, options)?;
        let server = DriverServer::start(browser).await?;
        let driver = WebDriver::new(server.url(), caps)
            .await
            .map_err(|err| AppError::SessionNotCreated {
                browser: browser.as_str(),
                reason: first_line(&err.to_string()).to_string(),
            })?;
        tracing::info!("{browser}: browser session created");
        Ok(Self {
            driver,
            browser,
            _server: server,
        })
    }

    /// Navigate to `url` and return the rendered page source.
    pub async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.driver
            .set_implicit_wait_timeout(PAGE_LOAD_WAIT)
            .await
            .map_err(fetch_err)?;
        self.driver.goto(url).await.map_err(fetch_err)?;
        self.driver.source().await.map_err(fetch_err)
    }

    /// Terminate the session and the driver process behind it.
    pub async fn quit(self) {
        let Session {
            driver,
            browser,
            _server,
        } = self;
        if let Err(err) = driver.quit().await {
            tracing::warn!("{browser}: session quit failed: {err}");
        }
        // _server drops here and kills the driver process.
    }
}

fn fetch_err(err: WebDriverError) -> AppError {
    AppError::Fetch(first_line(&err.to_string()).to_string())
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or(message)
}

/// Build the option set for one browser family.
///
/// All families get private browsing, no translation prompts, quiet
/// logging, and the preferred content language; Brave additionally needs
/// an explicit executable path because chromedriver cannot locate it on
/// its own. Every other family resolves its executable automatically.
fn build_capabilities(browser: Browser, options: &LaunchOptions) -> Result<Capabilities, AppError> {
    let binary = match browser {
        Browser::Brave => Some(find_brave_binary().ok_or_else(|| AppError::Driver {
            browser: browser.as_str(),
            reason: "Brave executable not found (set BRAVE_BIN to override)".to_string(),
        })?),
        _ => None,
    };
    caps_for(browser, binary.as_deref(), options).map_err(|err| AppError::SessionNotCreated {
        browser: browser.as_str(),
        reason: first_line(&err.to_string()).to_string(),
    })
}

fn caps_for(
    browser: Browser,
    binary: Option<&Path>,
    options: &LaunchOptions,
) -> WebDriverResult<Capabilities> {
    match browser {
        Browser::Firefox => {
            let mut caps = DesiredCapabilities::firefox();
            // Called "-private" on Firefox rather than "--incognito".
            caps.add_arg("-private")?;
            if options.headless {
                caps.add_arg("-headless")?;
            }
            let mut prefs = FirefoxPreferences::new();
            prefs.set("intl.accept_languages", &options.accept_language)?;
            caps.set_preferences(prefs)?;
            Ok(caps.into())
        }
        Browser::Edge => {
            let mut caps = DesiredCapabilities::edge();
            for arg in chromium_args(options) {
                caps.add_arg(&arg)?;
            }
            Ok(caps.into())
        }
        Browser::Brave | Browser::Chromium | Browser::Chrome => {
            let mut caps = DesiredCapabilities::chrome();
            for arg in chromium_args(options) {
                caps.add_arg(&arg)?;
            }
            if let Some(path) = binary {
                caps.set_binary(&path.to_string_lossy())?;
            }
            Ok(caps.into())
        }
    }
}

/// Shared flags for the Chromium-derived families.
fn chromium_args(options: &LaunchOptions) -> Vec<String> {
    let mut args = vec![
        "--incognito".to_string(),
        "--disable-translate".to_string(),
        "--disable-logging".to_string(),
        format!("--lang={}", options.accept_language),
    ];
    if options.headless {
        args.push("--headless=new".to_string());
    }
    args
}

/// Locate the Brave executable.
///
/// Honours an explicit override via `BRAVE_BIN`, then checks well-known
/// install locations, then falls back to a PATH lookup.
fn find_brave_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("BRAVE_BIN") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    let candidates: &[&str] = &[
        "/usr/bin/brave-browser",
        "/usr/bin/brave",
        "/opt/brave.com/brave/brave-browser",
        "/snap/bin/brave",
        "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
        "C:/Program Files/BraveSoftware/Brave-Browser/Application/brave.exe",
    ];

    candidates
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .or_else(|| which::which("brave-browser").ok())
        .or_else(|| which::which("brave").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chromium_args_headless_toggle() {
        let headless = chromium_args(&LaunchOptions::default());
        assert!(headless.contains(&"--headless=new".to_string()));
        assert!(headless.contains(&"--incognito".to_string()));
        assert!(headless.contains(&"--lang=de".to_string()));

        let headed = chromium_args(&LaunchOptions {
            headless: false,
            ..LaunchOptions::default()
        });
        assert!(!headed.iter().any(|a| a.contains("headless")));
    }

    #[test]
    fn test_first_line_truncates_multiline_errors() {
        assert_eq!(first_line("session not created\nstacktrace line"), "session not created");
        assert_eq!(first_line("single"), "single");
        assert_eq!(first_line(""), "");
    }
}
