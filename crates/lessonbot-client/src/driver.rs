use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use lessonbot_core::{AppError, Browser};

/// How long a freshly spawned driver gets to start accepting connections.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
const STARTUP_POLL: Duration = Duration::from_millis(200);

/// A locally spawned WebDriver server process.
///
/// The child is killed when this value is dropped, so a half-constructed
/// session never leaks a driver process.
pub struct DriverServer {
    child: Child,
    port: u16,
    url: String,
}

impl DriverServer {
    /// Locate the driver binary serving `browser` and start it on a free
    /// loopback port, waiting until it accepts connections.
    pub async fn start(browser: Browser) -> Result<Self, AppError> {
        let name = driver_binary(browser);
        let binary = which::which(name).map_err(|_| AppError::Driver {
            browser: browser.as_str(),
            reason: format!("{name} not found on PATH"),
        })?;
        let port = free_port(browser)?;

        let mut cmd = Command::new(&binary);
        match browser {
            Browser::Firefox => {
                cmd.arg("--port").arg(port.to_string());
            }
            // The Chromium-derived drivers share chromedriver's flag syntax.
            _ => {
                cmd.arg(format!("--port={port}"));
                cmd.arg("--log-level=SEVERE");
            }
        }
        let child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| AppError::Driver {
                browser: browser.as_str(),
                reason: format!("failed to start {}: {err}", binary.display()),
            })?;

        let mut server = Self {
            child,
            port,
            url: format!("http://127.0.0.1:{port}"),
        };
        server.wait_ready(browser).await?;
        tracing::debug!("{browser}: {name} listening on port {port}");
        Ok(server)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn wait_ready(&mut self, browser: Browser) -> Result<(), AppError> {
        let deadline = tokio::time::Instant::now() + STARTUP_TIMEOUT;
        loop {
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                return Ok(());
            }
            if let Ok(Some(status)) = self.child.try_wait() {
                return Err(AppError::Driver {
                    browser: browser.as_str(),
                    reason: format!("driver exited early with {status}"),
                });
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(AppError::Driver {
                    browser: browser.as_str(),
                    reason: "driver did not become ready in time".to_string(),
                });
            }
            tokio::time::sleep(STARTUP_POLL).await;
        }
    }
}

impl Drop for DriverServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Driver executable serving a browser family.
fn driver_binary(browser: Browser) -> &'static str {
    match browser {
        Browser::Brave | Browser::Chromium | Browser::Chrome => "chromedriver",
        Browser::Firefox => "geckodriver",
        Browser::Edge => "msedgedriver",
    }
}

/// Ask the OS for an unused port by binding to port 0 and releasing it.
fn free_port(browser: Browser) -> Result<u16, AppError> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).map_err(|err| AppError::Driver {
        browser: browser.as_str(),
        reason: format!("no free loopback port: {err}"),
    })?;
    let port = listener
        .local_addr()
        .map_err(|err| AppError::Driver {
            browser: browser.as_str(),
            reason: err.to_string(),
        })?
        .port();
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_binary_per_family() {
        assert_eq!(driver_binary(Browser::Brave), "chromedriver");
        assert_eq!(driver_binary(Browser::Chromium), "chromedriver");
        assert_eq!(driver_binary(Browser::Chrome), "chromedriver");
        assert_eq!(driver_binary(Browser::Firefox), "geckodriver");
        assert_eq!(driver_binary(Browser::Edge), "msedgedriver");
    }

    #[test]
    fn test_free_port_is_bindable() {
        let port = free_port(Browser::Chrome).unwrap();
        assert!(port > 0);
        // The port was released and can be taken again.
        TcpListener::bind(("127.0.0.1", port)).unwrap();
    }
}
