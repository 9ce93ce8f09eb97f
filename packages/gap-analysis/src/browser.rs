//! Headless Chrome page loading.
//!
//! `headless_chrome` is synchronous, so every load runs inside
//! `tokio::task::spawn_blocking`. Each [`ChromePageLoader::load`] call
//! launches its own browser and drops it before returning, on success and
//! error alike; no Chrome process outlives the call that started it.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{BrowserError, BrowserResult};

/// A page as the browser saw it after scripts ran.
#[derive(Debug, Clone, Default)]
pub struct LoadedPage {
    pub html: String,
    pub title: String,
    /// URL after redirects (CAPTCHA interstitials show up here)
    pub final_url: String,
}

/// Loads a URL in a real browser engine.
///
/// Mocked in tests with `testing::MockPageLoader`.
#[async_trait]
pub trait PageLoader: Send + Sync {
    /// Navigate, wait for the load to finish, sleep `settle`, then snapshot the DOM.
    async fn load(
        &self,
        url: &str,
        user_agent: Option<&str>,
        settle: Duration,
    ) -> BrowserResult<LoadedPage>;

    fn name(&self) -> &str {
        "unknown"
    }
}

const NETWORK_IDLE_POLL: Duration = Duration::from_millis(100);

/// Chrome launch settings.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Explicit Chrome binary; `headless_chrome` searches well-known paths otherwise
    pub chrome_path: Option<PathBuf>,
    /// Force the sandbox off. It is also disabled automatically inside containers.
    pub disable_sandbox: bool,
    /// Quiet period with no network responses that counts as idle. Default: 500ms.
    pub network_idle: Duration,
    /// Upper bound on the idle wait; pages that poll forever still load. Default: 10s.
    pub network_idle_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            disable_sandbox: false,
            network_idle: Duration::from_millis(500),
            network_idle_timeout: Duration::from_secs(10),
        }
    }
}

impl BrowserConfig {
    /// Read `CHROME_PATH` and container markers from the environment.
    pub fn from_env() -> Self {
        Self {
            chrome_path: std::env::var("CHROME_PATH").ok().map(PathBuf::from),
            disable_sandbox: is_container(),
            ..Self::default()
        }
    }

    pub fn with_chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }
}

/// Block until no response has arrived for `window`, or until `max_wait`
/// has passed. Returns whether the network went quiet.
pub(crate) fn wait_for_network_idle(
    last_response: &Mutex<Instant>,
    window: Duration,
    max_wait: Duration,
    poll: Duration,
) -> bool {
    let started = Instant::now();
    loop {
        let last = match last_response.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        };
        if last.elapsed() >= window {
            return true;
        }
        if started.elapsed() >= max_wait {
            return false;
        }
        std::thread::sleep(poll.min(window));
    }
}

fn is_container() -> bool {
    std::env::var("GAPSCAN_CONTAINER").is_ok() || std::path::Path::new("/.dockerenv").exists()
}

/// Launch a headless Chrome. Blocking; call from `spawn_blocking`.
pub fn launch_browser(config: &BrowserConfig) -> BrowserResult<headless_chrome::Browser> {
    let options = headless_chrome::LaunchOptions::default_builder()
        .sandbox(!config.disable_sandbox)
        .path(config.chrome_path.clone())
        .build()
        .map_err(|e| BrowserError::Launch(format!("invalid launch options: {}", e)))?;

    headless_chrome::Browser::new(options).map_err(|e| BrowserError::Launch(e.to_string()))
}

/// [`PageLoader`] backed by a fresh Chrome process per call.
#[derive(Debug, Clone, Default)]
pub struct ChromePageLoader {
    config: BrowserConfig,
}

impl ChromePageLoader {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    fn load_blocking(
        config: &BrowserConfig,
        url: &str,
        user_agent: Option<&str>,
        settle: Duration,
    ) -> BrowserResult<LoadedPage> {
        let browser = launch_browser(config)?;
        let tab = browser
            .new_tab()
            .map_err(|e| BrowserError::Launch(format!("failed to open tab: {}", e)))?;

        if let Some(ua) = user_agent {
            tab.set_user_agent(ua, Some("en-US,en;q=0.9"), None)
                .map_err(|e| BrowserError::Launch(format!("failed to set user agent: {}", e)))?;
        }

        let navigation_error = |e: anyhow::Error| BrowserError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        };
        let last_response = Arc::new(Mutex::new(Instant::now()));
        let tracker = last_response.clone();
        tab.register_response_handling(
            "gapscan_network_idle",
            Box::new(move |_params, _fetch_body| {
                if let Ok(mut last) = tracker.lock() {
                    *last = Instant::now();
                }
            }),
        )
        .map_err(|e| BrowserError::Launch(format!("failed to watch network: {}", e)))?;

        tab.navigate_to(url).map_err(navigation_error)?;
        tab.wait_until_navigated().map_err(navigation_error)?;

        let idle = wait_for_network_idle(
            &last_response,
            config.network_idle,
            config.network_idle_timeout,
            NETWORK_IDLE_POLL,
        );
        if !idle {
            debug!(url = %url, "Network never went idle; snapshotting anyway");
        }
        let _ = tab.deregister_response_handling("gapscan_network_idle");

        // Late scripts still mutate the DOM after the load event.
        std::thread::sleep(settle);

        let html = tab
            .get_content()
            .map_err(|e| BrowserError::Content(e.to_string()))?;
        let title = tab.get_title().unwrap_or_default();
        let final_url = tab.get_url();

        Ok(LoadedPage {
            html,
            title,
            final_url,
        })
    }
}

#[async_trait]
impl PageLoader for ChromePageLoader {
    async fn load(
        &self,
        url: &str,
        user_agent: Option<&str>,
        settle: Duration,
    ) -> BrowserResult<LoadedPage> {
        let config = self.config.clone();
        let url_owned = url.to_string();
        let ua_owned = user_agent.map(str::to_string);

        debug!(url = %url, settle_ms = settle.as_millis() as u64, "Loading page in headless Chrome");

        tokio::task::spawn_blocking(move || {
            Self::load_blocking(&config, &url_owned, ua_owned.as_deref(), settle)
        })
        .await
        .map_err(|e| BrowserError::Task(e.to_string()))?
    }

    fn name(&self) -> &str {
        "chrome"
    }
}
