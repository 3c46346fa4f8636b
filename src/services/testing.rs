//! Mock collaborators for exercising the watcher, the dedup filter and the
//! screenshot enricher without Postgres, Google, Imgur or a WebDriver.

use std::{
    collections::{HashSet, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::anyhow;
use async_trait::async_trait;

use crate::{
    dal::BusinessStore,
    domain::business::{BusinessRecord, GeoPoint},
};

use super::{Browser, BrowserSession, CoordinateSource, ImageHost, SearchProvider};

pub fn business(place_id: &str, website: Option<&str>) -> BusinessRecord {
    let record = BusinessRecord::new(
        place_id,
        &format!("Business {}", place_id),
        "1 Main St",
        GeoPoint::new(40.0, -74.0),
    );
    match website {
        Some(w) => record.with_website(w),
        None => record,
    }
}

#[derive(Default)]
pub struct MockStore {
    pub records: Mutex<Vec<BusinessRecord>>,
    pub find_calls: Mutex<Vec<(String, i64)>>,
    pub add_calls: AtomicUsize,
}

impl MockStore {
    pub fn with_websites(websites: &[&str]) -> Self {
        let store = MockStore::default();
        {
            let mut records = store.records.lock().unwrap();
            for (i, w) in websites.iter().enumerate() {
                records.push(business(&format!("stored-{}", i), Some(w)));
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl BusinessStore for MockStore {
    async fn count(&self) -> anyhow::Result<i64> {
        Ok(self.len() as i64)
    }

    async fn find_website_matches(
        &self,
        pattern: &str,
        limit: i64,
    ) -> anyhow::Result<Vec<String>> {
        self.find_calls
            .lock()
            .unwrap()
            .push((pattern.to_string(), limit));

        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.website.clone())
            .filter(|w| w.contains(pattern))
            .take(limit as usize)
            .collect())
    }

    async fn add(&self, records: &[BusinessRecord]) -> anyhow::Result<()> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        self.records.lock().unwrap().extend_from_slice(records);
        Ok(())
    }
}

/// Returns scripted responses in order. Once the script runs out every search
/// fails, so a watcher under test backs off instead of spinning.
#[derive(Default)]
pub struct MockSearchProvider {
    responses: Mutex<VecDeque<anyhow::Result<Vec<BusinessRecord>>>>,
    pub points: Mutex<Vec<GeoPoint>>,
    delay: Duration,
}

impl MockSearchProvider {
    /// Every search takes `delay` to answer, counted as a call from the start.
    pub fn slow(delay: Duration) -> Self {
        MockSearchProvider {
            delay,
            ..Default::default()
        }
    }

    pub fn push_results(&self, records: Vec<BusinessRecord>) {
        self.responses.lock().unwrap().push_back(Ok(records));
    }

    pub fn push_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(anyhow!(message.to_string())));
    }

    pub fn calls(&self) -> usize {
        self.points.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn filtered_search(&self, point: GeoPoint) -> anyhow::Result<Vec<BusinessRecord>> {
        self.points.lock().unwrap().push(point);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no scripted search response")))
    }
}

pub struct FixedPoint(pub GeoPoint);

impl CoordinateSource for FixedPoint {
    fn next_point(&mut self) -> GeoPoint {
        self.0
    }
}

#[derive(Default)]
pub struct MockBrowser {
    pub opened: AtomicUsize,
    pub quit: Arc<AtomicUsize>,
    pub visited: Arc<Mutex<Vec<String>>>,
    pub failing_urls: HashSet<String>,
    pub failing_screenshots: HashSet<String>,
    pub fail_to_open: bool,
}

impl MockBrowser {
    pub fn failing_navigation(urls: &[&str]) -> Self {
        MockBrowser {
            failing_urls: urls.iter().map(|u| u.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn quit_count(&self) -> usize {
        self.quit.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn open_session(&self) -> anyhow::Result<Box<dyn BrowserSession>> {
        if self.fail_to_open {
            return Err(anyhow!("webdriver unreachable"));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MockSession {
            current_url: None,
            quit: self.quit.clone(),
            visited: self.visited.clone(),
            failing_urls: self.failing_urls.clone(),
            failing_screenshots: self.failing_screenshots.clone(),
        }))
    }
}

struct MockSession {
    current_url: Option<String>,
    quit: Arc<AtomicUsize>,
    visited: Arc<Mutex<Vec<String>>>,
    failing_urls: HashSet<String>,
    failing_screenshots: HashSet<String>,
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn goto(&mut self, url: &str) -> anyhow::Result<()> {
        self.visited.lock().unwrap().push(url.to_string());
        if self.failing_urls.contains(url) {
            return Err(anyhow!("net::ERR_NAME_NOT_RESOLVED at {}", url));
        }
        self.current_url = Some(url.to_string());
        Ok(())
    }

    async fn screenshot_png(&mut self) -> anyhow::Result<Vec<u8>> {
        let page = self
            .current_url
            .clone()
            .unwrap_or_else(|| "about:blank".to_string());
        let last_visited = self.visited.lock().unwrap().last().cloned();
        if let Some(url) = last_visited {
            if self.failing_screenshots.contains(&url) {
                return Err(anyhow!("screenshot failed for {}", url));
            }
        }
        Ok(page.into_bytes())
    }

    async fn quit(&mut self) -> anyhow::Result<()> {
        self.quit.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Echoes the uploaded bytes into the returned link, failing for any payload
/// listed in `rejected`.
#[derive(Default)]
pub struct MockImageHost {
    pub rejected: HashSet<Vec<u8>>,
    pub uploads: AtomicUsize,
}

impl MockImageHost {
    pub fn rejecting(pages: &[&str]) -> Self {
        MockImageHost {
            rejected: pages.iter().map(|p| p.as_bytes().to_vec()).collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ImageHost for MockImageHost {
    async fn upload_image(&self, image: Vec<u8>) -> anyhow::Result<String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.rejected.contains(&image) {
            return Err(anyhow!("Upload rejected with status 400"));
        }
        Ok(format!(
            "https://i.imgur.com/{}.png",
            String::from_utf8_lossy(&image)
        ))
    }
}
