use std::{ffi::OsStr, thread, time::Duration};

use anyhow::{anyhow, Context, Result};
use headless_chrome::{Browser, LaunchOptions};

use crate::config::RenderSettings;

/// Produces the markup of a page after client-side scripts have run.
pub trait PageRenderer {
    fn render(&self, url: &str) -> Result<String>;
}

/// Headless Chrome, one fresh browser per `render` call.
pub struct ChromeRenderer {
    settings: RenderSettings,
    ready_selector: String,
}

impl ChromeRenderer {
    pub fn new(settings: RenderSettings, ready_selector: impl Into<String>) -> Self {
        Self {
            settings,
            ready_selector: ready_selector.into(),
        }
    }

    fn launch(&self) -> Result<Browser> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .args(vec![OsStr::new("--disable-dev-shm-usage")])
            .idle_browser_timeout(self.settings.wait_timeout + self.settings.settle_delay + IDLE_SLACK)
            .build()
            .map_err(|err| anyhow!("invalid chrome launch options: {err}"))?;
        Browser::new(options).context("failed to launch headless chrome")
    }
}

const IDLE_SLACK: Duration = Duration::from_secs(30);

impl PageRenderer for ChromeRenderer {
    fn render(&self, url: &str) -> Result<String> {
        // The browser process is killed when `browser` drops, on every return path.
        let browser = self.launch()?;
        tracing::debug!("chrome launched");

        let tab = browser.new_tab().context("failed to open tab")?;
        tab.set_default_timeout(self.settings.wait_timeout);
        tab.navigate_to(url)
            .with_context(|| format!("navigation failed for {url}"))?;

        tracing::debug!(selector = %self.ready_selector, "waiting for listing table");
        tab.wait_for_element_with_custom_timeout(&self.ready_selector, self.settings.wait_timeout)
            .with_context(|| {
                format!(
                    "{} did not appear within {:?}",
                    self.ready_selector, self.settings.wait_timeout
                )
            })?;

        thread::sleep(self.settings.settle_delay);

        tab.get_content()
            .with_context(|| format!("unable to read rendered markup for {url}"))
    }
}

/// Renders `url`, turning any failure into empty markup so the run carries on
/// with zero events.
pub fn render_or_empty(renderer: &dyn PageRenderer, url: &str) -> String {
    match renderer.render(url) {
        Ok(html) => {
            tracing::info!(url, bytes = html.len(), "rendered listing page");
            html
        }
        Err(err) => {
            tracing::warn!(url, error = %format!("{err:#}"), "render failed; no events this run");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Fixed(&'static str);

    impl PageRenderer for Fixed {
        fn render(&self, _url: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct TimesOut {
        calls: Cell<usize>,
    }

    impl PageRenderer for TimesOut {
        fn render(&self, url: &str) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            Err(anyhow!("table#x did not appear within 10s")).context(format!("render {url}"))
        }
    }

    #[test]
    fn passes_markup_through() {
        assert_eq!(render_or_empty(&Fixed("<html></html>"), "https://x"), "<html></html>");
    }

    #[test]
    fn failure_becomes_empty_markup() {
        let renderer = TimesOut { calls: Cell::new(0) };
        assert_eq!(render_or_empty(&renderer, "https://x"), "");
        assert_eq!(renderer.calls.get(), 1, "no retries");
    }

    #[test]
    fn default_settings_bound_the_wait() {
        let settings = RenderSettings::default();
        assert_eq!(settings.wait_timeout, Duration::from_secs(10));
        assert_eq!(settings.settle_delay, Duration::from_secs(2));
    }
}
