use anyhow::anyhow;
use headless_chrome::util::Timeout;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ScraperConfig;
use crate::utils::error::LookupError;

/// Something that can render a JavaScript page and hand back element text.
///
/// Every call to [`RenderEngine::open`] acquires a fresh session; dropping the
/// session releases whatever the engine allocated for it.
pub trait RenderEngine: Send + Sync {
    fn open(&self) -> Result<Box<dyn RenderSession>, LookupError>;
}

pub trait RenderSession {
    fn load(&mut self, url: &str) -> Result<(), LookupError>;

    /// Blocks until at least one element matches `selector`, or fails with
    /// [`LookupError::Timeout`] once `timeout` has passed.
    fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), LookupError>;

    /// Text content of every element matching `selector`, in document order.
    fn texts(&mut self, selector: &str) -> Result<Vec<String>, LookupError>;
}

/// Launches one headless Chrome per session.
#[derive(Debug, Clone)]
pub struct ChromeEngine {
    chrome_path: Option<PathBuf>,
    headless: bool,
    user_agent: String,
}

impl ChromeEngine {
    pub fn new(config: &ScraperConfig, user_agent: impl Into<String>) -> Self {
        Self {
            chrome_path: config.chrome_path.as_ref().map(PathBuf::from),
            headless: config.headless,
            user_agent: user_agent.into(),
        }
    }

    fn launch_options(&self) -> Result<LaunchOptions<'static>, LookupError> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(self.headless)
            .sandbox(false) // Often needed in containerized environments
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
            ])
            .build()
            .map_err(|e| LookupError::render("failed to create launch options", anyhow!("{}", e)))?;

        if let Some(chrome_path) = &self.chrome_path {
            launch_options.path = Some(chrome_path.clone());
        }

        Ok(launch_options)
    }
}

impl RenderEngine for ChromeEngine {
    fn open(&self) -> Result<Box<dyn RenderSession>, LookupError> {
        let browser = Browser::new(self.launch_options()?)
            .map_err(|e| LookupError::render("failed to launch browser", e))?;

        let tab = browser
            .new_tab()
            .map_err(|e| LookupError::render("failed to create tab", e))?;

        tab.set_user_agent(&self.user_agent, None, None)
            .map_err(|e| LookupError::render("failed to set user agent", e))?;

        tracing::debug!("Browser session opened");
        Ok(Box::new(ChromeSession { tab, _browser: browser }))
    }
}

struct ChromeSession {
    tab: Arc<Tab>,
    // Dropped after the tab; kills the Chrome process.
    _browser: Browser,
}

impl RenderSession for ChromeSession {
    fn load(&mut self, url: &str) -> Result<(), LookupError> {
        self.tab
            .navigate_to(url)
            .map_err(|e| LookupError::render(format!("navigation to {} failed", url), e))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| LookupError::render(format!("page load of {} failed", url), e))?;
        Ok(())
    }

    fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), LookupError> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map(|_| ())
            .map_err(|e| wait_error(selector, timeout, e))
    }

    fn texts(&mut self, selector: &str) -> Result<Vec<String>, LookupError> {
        // Chart labels are SVG, which has no innerText; read textContent instead.
        let selector_literal = serde_json::to_string(selector)
            .map_err(|e| LookupError::render("failed to encode selector", e))?;
        let js_code = format!(
            "JSON.stringify(Array.from(document.querySelectorAll({}), el => el.textContent || ''))",
            selector_literal
        );

        let result = self
            .tab
            .evaluate(&js_code, false)
            .map_err(|e| {
                LookupError::render(format!("reading '{}' elements failed", selector), e)
            })?;

        match result.value {
            Some(serde_json::Value::String(json)) => serde_json::from_str(&json)
                .map_err(|e| LookupError::render("failed to decode element text", e)),
            other => Err(LookupError::render(
                "unexpected evaluation result",
                anyhow!("expected a JSON string, got {:?}", other),
            )),
        }
    }
}

/// Only an expired wait is a timeout; anything else is a browser fault.
fn wait_error(selector: &str, timeout: Duration, err: anyhow::Error) -> LookupError {
    if err.is::<Timeout>() {
        tracing::debug!("Waiting for '{}' timed out", selector);
        LookupError::Timeout(format!(
            "no '{}' element after {}s",
            selector,
            timeout.as_secs()
        ))
    } else {
        LookupError::render(format!("waiting for '{}' failed", selector), err)
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(true) {
            tracing::debug!("Closing tab failed: {}", e);
        }
        tracing::debug!("Browser session released");
    }
}
