use crate::surface::{ScriptValue, Surface};
use crate::{Error, Result};
use chromiumoxide::browser::Browser;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// The page of a running Chrome, driven over the DevTools protocol
pub struct ChromeSurface {
    // Keeps the CDP connection open for as long as the surface lives
    _browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl ChromeSurface {
    /// Connect to Chrome listening on `debugging_port` and take over its
    /// first tab (or open a blank one).
    pub async fn connect(debugging_port: u16) -> Result<Self> {
        let endpoint = format!("http://localhost:{}", debugging_port);
        tracing::info!("Connecting to Chrome on port {}", debugging_port);

        // Chrome may still be starting up
        let (browser, mut handler) = {
            let mut attempts_left = CONNECT_ATTEMPTS;
            loop {
                tracing::debug!("Attempting CDP connection to {}...", endpoint);
                match Browser::connect(&endpoint).await {
                    Ok(connection) => break connection,
                    Err(e) => {
                        attempts_left -= 1;
                        if attempts_left == 0 {
                            return Err(Error::Cdp(format!(
                                "Failed to connect to Chrome after {} attempts: {}",
                                CONNECT_ATTEMPTS, e
                            )));
                        }
                        tracing::debug!("CDP connection failed, retrying ({} left)", attempts_left);
                        tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                    }
                }
            }
        };

        // The handler has to be polled for any command to complete
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error (continuing): {}", e);
                }
            }
        });

        // Give Chrome a moment to register its initial tab
        tokio::time::sleep(CONNECT_RETRY_DELAY).await;

        let page = match browser.pages().await?.into_iter().next() {
            Some(page) => page,
            None => {
                tracing::debug!("No open tab, creating one");
                browser.new_page("about:blank").await?
            }
        };
        tracing::info!("CDP connection established");

        Ok(Self {
            _browser: browser,
            page,
            handler_task,
        })
    }
}

#[async_trait::async_trait]
impl Surface for ChromeSurface {
    async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.page.url().await?)
    }

    async fn evaluate(&self, script: &str) -> Result<ScriptValue> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| Error::Script(e.to_string()))?;
        Ok(ScriptValue::from(result.value().cloned()))
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| Error::Navigation(format!("{}: {}", url, e)))?;
        Ok(())
    }
}

impl Drop for ChromeSurface {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}
