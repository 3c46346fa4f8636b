use std::sync::Arc;

use crate::domain::business::BusinessRecord;

use super::{Browser, BrowserSession, ImageHost};

/// Attaches a hosted screenshot of each business's website.
///
/// One browser session serves a whole batch and is quit once the batch is done.
/// Failures are per record: a page that will not load is still screenshotted
/// (and flagged `navigation_failed`), and a record whose screenshot cannot be
/// captured or uploaded just goes without `screenshot_url`. Nothing is retried.
pub struct ScreenshotEnricher {
    browser: Arc<dyn Browser>,
    image_host: Arc<dyn ImageHost>,
    fallback_url: String,
}

impl ScreenshotEnricher {
    pub fn new(
        browser: Arc<dyn Browser>,
        image_host: Arc<dyn ImageHost>,
        fallback_url: String,
    ) -> Self {
        ScreenshotEnricher {
            browser,
            image_host,
            fallback_url,
        }
    }

    /// Returns the same records, in order. Fails only if no browser session
    /// could be started.
    pub async fn enrich(
        &self,
        mut records: Vec<BusinessRecord>,
    ) -> anyhow::Result<Vec<BusinessRecord>> {
        if records.is_empty() {
            return Ok(records);
        }

        let mut session = self.browser.open_session().await?;

        let total = records.len();
        for (i, record) in records.iter_mut().enumerate() {
            log::info!("---Processing {}/{}---", i + 1, total);
            self.add_screenshot_link(session.as_mut(), record).await;
        }

        if let Err(e) = session.quit().await {
            log::error!("Failed to quit browser session: {:?}", e);
        }

        Ok(records)
    }

    async fn add_screenshot_link(
        &self,
        session: &mut dyn BrowserSession,
        record: &mut BusinessRecord,
    ) {
        let url = record
            .website
            .clone()
            .unwrap_or_else(|| self.fallback_url.clone());

        log::info!("Loading URL [{}]", url);
        if let Err(e) = session.goto(&url).await {
            log::warn!("Exception while loading url {}: {:?}", url, e);
            record.navigation_failed = true;
        }

        log::info!("Taking screenshot");
        let image = match session.screenshot_png().await {
            Ok(image) => image,
            Err(e) => {
                log::error!("Failed to take screenshot of {}: {:?}", url, e);
                return;
            }
        };

        log::info!("Uploading screenshot");
        match self.image_host.upload_image(image).await {
            Ok(link) => record.screenshot_url = Some(link),
            Err(e) => log::error!("Failed to upload screenshot of {}: {:?}", url, e),
        }
    }
}
