use std::future::Future;

use lessonbot_core::{AppError, Browser};

use crate::session::{LaunchOptions, Session};

/// Acquire a working browser session.
///
/// Tries the preferred family first when one is given, then walks the
/// fixed fallback order, stopping at the first success. Per-family
/// failures are logged and absorbed; only exhaustion of the whole order
/// is an error, naming every supported family.
pub async fn acquire(
    preferred: Option<Browser>,
    options: &LaunchOptions,
) -> Result<Session, AppError> {
    acquire_with(preferred, |browser| Session::launch(browser, options)).await
}

/// The acquisition policy, decoupled from real session construction so the
/// ordering and exhaustion behavior can be exercised without a browser.
///
/// `launch` returns a discriminated result per attempt; a failed preferred
/// browser is not retried during the fallback walk (falling back is
/// trying an alternative, not retrying the same candidate).
async fn acquire_with<T, F, Fut>(preferred: Option<Browser>, mut launch: F) -> Result<T, AppError>
where
    F: FnMut(Browser) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    if let Some(browser) = preferred {
        tracing::info!("trying preferred browser {browser}");
        match launch(browser).await {
            Ok(session) => return Ok(session),
            Err(err) => tracing::warn!("{browser} unavailable: {err}"),
        }
    }

    for browser in Browser::FALLBACK_ORDER {
        if preferred == Some(browser) {
            continue;
        }
        tracing::info!("trying fallback browser {browser}");
        match launch(browser).await {
            Ok(session) => return Ok(session),
            Err(err) => tracing::warn!("{browser} unavailable: {err}"),
        }
    }

    Err(AppError::NoBrowserAvailable(
        Browser::FALLBACK_ORDER
            .iter()
            .map(|b| b.as_str().to_string())
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    fn unavailable(browser: Browser) -> AppError {
        AppError::SessionNotCreated {
            browser: browser.as_str(),
            reason: "no binary".to_string(),
        }
    }

    #[tokio::test]
    async fn test_exhaustion_names_every_browser() {
        let result: Result<Browser, _> =
            acquire_with(None, |browser| async move { Err(unavailable(browser)) }).await;

        match result {
            Err(AppError::NoBrowserAvailable(named)) => {
                assert_eq!(named, ["brave", "chromium", "chrome", "firefox", "edge"]);
            }
            other => panic!("expected NoBrowserAvailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_preferred_failure_falls_back_in_order() {
        let attempts = RefCell::new(Vec::new());

        let result = acquire_with(Some(Browser::Firefox), |browser| {
            attempts.borrow_mut().push(browser);
            async move {
                if browser == Browser::Chromium {
                    Ok(browser)
                } else {
                    Err(unavailable(browser))
                }
            }
        })
        .await;

        // The second fallback entry wins; the failed first entry never does.
        assert_eq!(result.unwrap(), Browser::Chromium);
        assert_eq!(
            attempts.into_inner(),
            [Browser::Firefox, Browser::Brave, Browser::Chromium]
        );
    }

    #[tokio::test]
    async fn test_preferred_is_not_retried_during_fallback() {
        let attempts = RefCell::new(Vec::new());

        let result: Result<Browser, _> = acquire_with(Some(Browser::Chrome), |browser| {
            attempts.borrow_mut().push(browser);
            async move { Err(unavailable(browser)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(
            attempts.into_inner(),
            [
                Browser::Chrome,
                Browser::Brave,
                Browser::Chromium,
                Browser::Firefox,
                Browser::Edge,
            ]
        );
    }

    #[tokio::test]
    async fn test_preferred_success_short_circuits() {
        let attempts = RefCell::new(Vec::new());

        let result = acquire_with(Some(Browser::Edge), |browser| {
            attempts.borrow_mut().push(browser);
            async move { Ok(browser) }
        })
        .await;

        assert_eq!(result.unwrap(), Browser::Edge);
        assert_eq!(attempts.into_inner(), [Browser::Edge]);
    }

    #[tokio::test]
    async fn test_no_preference_starts_at_the_top() {
        let attempts = RefCell::new(Vec::new());

        let result = acquire_with(None, |browser| {
            attempts.borrow_mut().push(browser);
            async move { Ok(browser) }
        })
        .await;

        assert_eq!(result.unwrap(), Browser::Brave);
        assert_eq!(attempts.into_inner(), [Browser::Brave]);
    }
}
