use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::prelude::*;

use crate::configuration::BrowserSettings;

/// Starts browser sessions.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn open_session(&self) -> anyhow::Result<Box<dyn BrowserSession>>;
}

/// One exclusively owned browser window.
#[async_trait]
pub trait BrowserSession: Send {
    async fn goto(&mut self, url: &str) -> anyhow::Result<()>;

    /// PNG of the current viewport.
    async fn screenshot_png(&mut self) -> anyhow::Result<Vec<u8>>;

    async fn quit(&mut self) -> anyhow::Result<()>;
}

/// Chrome driven over WebDriver.
pub struct Droid {
    settings: BrowserSettings,
}

impl Droid {
    pub fn new(settings: BrowserSettings) -> Self {
        Droid { settings }
    }
}

#[async_trait]
impl Browser for Droid {
    async fn open_session(&self) -> anyhow::Result<Box<dyn BrowserSession>> {
        let mut caps = DesiredCapabilities::chrome();
        if self.settings.headless {
            caps.set_headless()?;
        }
        caps.add_arg(&format!(
            "--window-size={},{}",
            self.settings.window_width, self.settings.window_height
        ))?;

        let driver = WebDriver::new(&self.settings.webdriver_url, caps).await?;
        let timeout = Duration::from_secs(self.settings.page_load_timeout_secs);
        if let Err(e) = driver.set_page_load_timeout(timeout).await {
            // The session exists at this point, so it must not leak
            if let Err(quit_err) = driver.quit().await {
                log::error!("Failed to quit browser session: {:?}", quit_err);
            }
            return Err(e.into());
        }

        Ok(Box::new(DroidSession {
            driver: Some(driver),
        }))
    }
}

pub struct DroidSession {
    driver: Option<WebDriver>,
}

impl DroidSession {
    fn driver(&self) -> anyhow::Result<&WebDriver> {
        self.driver
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Browser session already quit"))
    }
}

#[async_trait]
impl BrowserSession for DroidSession {
    async fn goto(&mut self, url: &str) -> anyhow::Result<()> {
        self.driver()?.goto(url).await?;
        Ok(())
    }

    async fn screenshot_png(&mut self) -> anyhow::Result<Vec<u8>> {
        Ok(self.driver()?.screenshot_as_png().await?)
    }

    async fn quit(&mut self) -> anyhow::Result<()> {
        match self.driver.take() {
            Some(driver) => Ok(driver.quit().await?),
            None => Ok(()),
        }
    }
}
