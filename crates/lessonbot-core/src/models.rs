use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// A supported browser family.
///
/// The declaration order doubles as the fallback order: when no preference
/// is given, or the preferred browser cannot be started, candidates are
/// tried from `Brave` down to `Edge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    Brave,
    Chromium,
    Chrome,
    Firefox,
    Edge,
}

impl Browser {
    /// Fixed fallback order, most preferred first.
    pub const FALLBACK_ORDER: [Browser; 5] = [
        Browser::Brave,
        Browser::Chromium,
        Browser::Chrome,
        Browser::Firefox,
        Browser::Edge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Brave => "brave",
            Browser::Chromium => "chromium",
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
            Browser::Edge => "edge",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Browser {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "brave" => Ok(Browser::Brave),
            "chromium" => Ok(Browser::Chromium),
            "chrome" => Ok(Browser::Chrome),
            "firefox" => Ok(Browser::Firefox),
            "edge" => Ok(Browser::Edge),
            other => Err(AppError::InvalidValue {
                field: "browser",
                value: other.to_string(),
                expected: "brave, chromium, chrome, firefox, edge",
            }),
        }
    }
}

/// How the user authenticates against the booking portal.
///
/// `Sso` is the federated university login, `Local` a portal-local account.
/// No login flow consumes this yet; the value is validated and persisted so
/// a future enrolment step finds it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMethod {
    Sso,
    Local,
}

impl LoginMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginMethod::Sso => "sso",
            LoginMethod::Local => "local",
        }
    }
}

impl fmt::Display for LoginMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoginMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sso" => Ok(LoginMethod::Sso),
            "local" => Ok(LoginMethod::Local),
            other => Err(AppError::InvalidValue {
                field: "login method",
                value: other.to_string(),
                expected: "sso, local",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_round_trip() {
        for browser in Browser::FALLBACK_ORDER {
            assert_eq!(browser.as_str().parse::<Browser>().unwrap(), browser);
        }
    }

    #[test]
    fn test_browser_rejects_unknown() {
        let err = "netscape".parse::<Browser>().unwrap_err();
        assert!(err.to_string().contains("netscape"));
        assert!(err.to_string().contains("brave"));
    }

    #[test]
    fn test_fallback_order_is_stable() {
        let names: Vec<_> = Browser::FALLBACK_ORDER
            .iter()
            .map(|b| b.as_str())
            .collect();
        assert_eq!(names, ["brave", "chromium", "chrome", "firefox", "edge"]);
    }

    #[test]
    fn test_login_method_round_trip() {
        assert_eq!("sso".parse::<LoginMethod>().unwrap(), LoginMethod::Sso);
        assert_eq!("local".parse::<LoginMethod>().unwrap(), LoginMethod::Local);
        assert!("oauth".parse::<LoginMethod>().is_err());
    }
}
