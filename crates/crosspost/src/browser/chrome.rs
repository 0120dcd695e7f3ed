//! chromiumoxide implementation of the page driver.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde_json::json;
use tokio::task::JoinHandle;

use super::{BrowserLauncher, ElementHandle, Locator, PageDriver, Pick, Probe, StoredCookie};
use crate::error::BrowserError;
use crate::platforms::Platform;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const WINDOW: (u32, u32) = (1920, 1080);

const STEALTH_SCRIPT: &str = r"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
Object.defineProperty(navigator, 'languages', { get: () => ['fr-FR', 'fr', 'en'] });
";

/// Shared in-page resolver. Takes a JSON spec, returns a handle id, a count or null.
const RESOLVER_SCRIPT: &str = r#"(function (spec) {
  const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
  const visible = (el) => {
    const r = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    return r.width > 0 && r.height > 0 && style.visibility !== 'hidden' && style.display !== 'none';
  };
  const enabled = (el) => !el.disabled && el.getAttribute('aria-disabled') !== 'true';
  let nodes = [];
  switch (spec.kind) {
    case 'structural':
      nodes = Array.from(document.querySelectorAll(spec.css));
      break;
    case 'text':
      nodes = Array.from(document.querySelectorAll(spec.scope))
        .filter((el) => norm(el.textContent).includes(spec.text));
      break;
    case 'aria':
      nodes = Array.from(document.querySelectorAll('[aria-label]')).filter((el) => {
        const label = el.getAttribute('aria-label') || '';
        return spec.exact ? label === spec.label : label.includes(spec.label);
      });
      break;
    case 'probe':
      nodes = Array.from(document.querySelectorAll('button, [role="button"], a, input[type="submit"]'))
        .filter((el) => {
          const hay = norm(el.textContent) + ' ' + (el.getAttribute('aria-label') || '') + ' ' + (el.value || '');
          return spec.keywords.some((k) => hay.includes(k));
        });
      break;
  }
  if (spec.mode === 'count') return nodes.length;
  const pool = nodes.filter((el) => (!spec.visible || visible(el)) && (!spec.enabled || enabled(el)));
  if (pool.length === 0) return null;
  const el = spec.pick === 'last' ? pool[pool.length - 1] : pool[0];
  if (!el.getAttribute('data-crosspost-handle')) {
    el.setAttribute('data-crosspost-handle', spec.handle);
  }
  return el.getAttribute('data-crosspost-handle');
})"#;

/// Launches a stealth-configured Chromium per attempt.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    user_agent: String,
}

impl Default for ChromeLauncher {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ChromeLauncher {
    /// Create a launcher with the default desktop user agent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn config(&self, headless: bool) -> Result<BrowserConfig, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-infobars")
            .arg(format!("--window-size={},{}", WINDOW.0, WINDOW.1))
            .arg("--lang=fr-FR")
            .arg(format!("--user-agent={}", self.user_agent))
            .window_size(WINDOW.0, WINDOW.1)
            .viewport(Viewport {
                width: WINDOW.0,
                height: WINDOW.1,
                ..Viewport::default()
            });
        if !headless {
            builder = builder.with_head();
        }
        builder.build().map_err(BrowserError::Launch)
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(
        &self,
        platform: Platform,
        headless: bool,
    ) -> Result<Box<dyn PageDriver>, BrowserError> {
        tracing::info!(platform = %platform, headless, "Launching browser");

        let config = self.config(headless)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
            .await?;

        Ok(Box::new(ChromePage {
            browser: Mutex::new(Some(browser)),
            handler: Some(handle),
            page,
            counter: AtomicU64::new(0),
        }))
    }
}

/// One page of a running Chromium.
pub struct ChromePage {
    // Only touched from `close(&mut self)`; the mutex keeps the page `Sync`.
    browser: Mutex<Option<Browser>>,
    handler: Option<JoinHandle<()>>,
    page: Page,
    counter: AtomicU64,
}

impl ChromePage {
    fn next_handle(&self) -> String {
        format!("h{}", self.counter.fetch_add(1, Ordering::Relaxed))
    }

    async fn resolve(
        &self,
        locator: &Locator,
        probe: Probe,
        count: bool,
    ) -> Result<serde_json::Value, BrowserError> {
        let mut spec = locator_spec(locator);
        if let Some(obj) = spec.as_object_mut() {
            obj.insert("mode".into(), json!(if count { "count" } else { "find" }));
            obj.insert("visible".into(), json!(probe.visible));
            obj.insert("enabled".into(), json!(probe.enabled));
            obj.insert("handle".into(), json!(self.next_handle()));
        }
        let script = format!("{RESOLVER_SCRIPT}({spec})");
        self.evaluate(&script).await
    }

    async fn element(
        &self,
        handle: &ElementHandle,
    ) -> Result<chromiumoxide::element::Element, BrowserError> {
        Ok(self.page.find_element(handle.selector()).await?)
    }
}

fn locator_spec(locator: &Locator) -> serde_json::Value {
    let pick = match locator.pick() {
        Pick::First => "first",
        Pick::Last => "last",
    };
    match locator {
        Locator::Structural { css, .. } => json!({ "kind": "structural", "css": css, "pick": pick }),
        Locator::TextMatch { scope, text, .. } => {
            json!({ "kind": "text", "scope": scope, "text": text, "pick": pick })
        }
        Locator::AriaLabel { label, exact, .. } => {
            json!({ "kind": "aria", "label": label, "exact": exact, "pick": pick })
        }
        Locator::ScriptProbe { keywords } => {
            json!({ "kind": "probe", "keywords": keywords, "pick": pick })
        }
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        tracing::debug!(url, "Navigating");
        self.page.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn wait_for_navigation(&self) -> Result<(), BrowserError> {
        self.page.wait_for_navigation().await?;
        Ok(())
    }

    async fn find(
        &self,
        locator: &Locator,
        probe: Probe,
    ) -> Result<Option<ElementHandle>, BrowserError> {
        let value = self.resolve(locator, probe, false).await?;
        Ok(value.as_str().map(ElementHandle::new))
    }

    async fn count(&self, locator: &Locator) -> Result<usize, BrowserError> {
        let value = self.resolve(locator, Probe::ATTACHED, true).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), BrowserError> {
        self.element(element).await?.click().await?;
        Ok(())
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<(), BrowserError> {
        self.element(element).await?.type_str(text).await?;
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> Result<(), BrowserError> {
        let script = format!(
            r"(function () {{
                const el = document.querySelector({selector});
                if (!el) return false;
                el.focus();
                if ('value' in el) {{ el.value = ''; }} else {{ el.textContent = ''; }}
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                return true;
            }})()",
            selector = json!(element.selector())
        );
        self.evaluate(&script).await?;
        Ok(())
    }

    async fn attach_files(
        &self,
        element: &ElementHandle,
        files: &[PathBuf],
    ) -> Result<(), BrowserError> {
        let mut paths = Vec::with_capacity(files.len());
        for file in files {
            paths.push(std::fs::canonicalize(file)?.to_string_lossy().into_owned());
        }
        let node = self.element(element).await?;
        let params = SetFileInputFilesParams::builder()
            .files(paths)
            .backend_node_id(node.backend_node_id)
            .build()
            .map_err(BrowserError::Request)?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn text_of(&self, element: &ElementHandle) -> Result<Option<String>, BrowserError> {
        Ok(self.element(element).await?.inner_text().await?)
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, BrowserError> {
        let result = self.page.evaluate(script).await?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let params = ScreenshotParams::builder().full_page(true).build();
        self.page.save_screenshot(params, path).await?;
        tracing::info!(path = %path.display(), "Screenshot saved");
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<StoredCookie>, BrowserError> {
        let cookies = self.page.get_cookies().await?;
        Ok(cookies
            .into_iter()
            .map(|c| StoredCookie {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                secure: c.secure,
                http_only: c.http_only,
            })
            .collect())
    }

    async fn set_cookies(&self, cookies: &[StoredCookie]) -> Result<(), BrowserError> {
        let mut params = Vec::with_capacity(cookies.len());
        for cookie in cookies {
            let param = CookieParam::builder()
                .name(cookie.name.clone())
                .value(cookie.value.clone())
                .domain(cookie.domain.clone())
                .path(cookie.path.clone())
                .secure(cookie.secure)
                .http_only(cookie.http_only)
                .build()
                .map_err(BrowserError::Request)?;
            params.push(param);
        }
        self.page.set_cookies(params).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        let browser = match self.browser.get_mut() {
            Ok(slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(mut browser) = browser {
            if let Err(e) = browser.close().await {
                tracing::warn!(error = %e, "Browser close failed");
            }
            let _ = browser.wait().await;
        }
        if let Some(handle) = self.handler.take() {
            handle.await?;
        }
        tracing::debug!("Browser closed");
        Ok(())
    }
}
