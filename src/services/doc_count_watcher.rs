use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle, time};

use crate::{configuration::WatcherSettings, dal::BusinessStore};

use super::{dedup, CoordinateSource, ScreenshotEnricher, SearchProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatcherState {
    Running,
    Paused,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WatcherStats {
    /// Store population at the last check, if any check happened yet.
    pub doc_count: Option<i64>,
    pub cycles_completed: u64,
    pub records_added: u64,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

/// Keeps the business store at or above `min_doc_count`.
///
/// While running, the watcher checks the store population at every loop
/// boundary; when it is short it searches around the next coordinate, drops
/// businesses already stored, screenshots the rest and inserts them, and
/// repeats without pausing until the deficit is gone. Otherwise it sleeps
/// `poll_interval` and checks again.
///
/// An error anywhere in a cycle is logged and recorded in [`WatcherStats`],
/// then the watcher sleeps `failure_backoff` and carries on.
pub struct DocCountWatcher {
    coordinates: Box<dyn CoordinateSource>,
    search_provider: Arc<dyn SearchProvider>,
    store: Arc<dyn BusinessStore>,
    enricher: ScreenshotEnricher,
    min_doc_count: i64,
    autostart: bool,
    poll_interval: Duration,
    failure_backoff: Duration,
}

impl DocCountWatcher {
    pub fn new(
        coordinates: Box<dyn CoordinateSource>,
        search_provider: Arc<dyn SearchProvider>,
        store: Arc<dyn BusinessStore>,
        enricher: ScreenshotEnricher,
        settings: &WatcherSettings,
    ) -> Self {
        DocCountWatcher {
            coordinates,
            search_provider,
            store,
            enricher,
            min_doc_count: i64::try_from(settings.min_doc_count).unwrap_or(i64::MAX),
            autostart: settings.autostart,
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
            failure_backoff: Duration::from_secs(settings.failure_backoff_secs),
        }
    }

    /// Spawns the watch loop on the tokio runtime. It starts `Running` if
    /// `autostart` is set, `Paused` otherwise.
    pub fn start(self) -> WatcherHandle {
        let initial = match self.autostart {
            true => WatcherState::Running,
            false => WatcherState::Paused,
        };
        let (state_sender, state_receiver) = watch::channel(initial);
        let (stats_sender, stats_receiver) = watch::channel(WatcherStats::default());
        let (shutdown_sender, shutdown_receiver) = watch::channel(false);

        let task = tokio::spawn(self.run(state_receiver, shutdown_receiver, stats_sender));

        WatcherHandle {
            switch: WatcherSwitch {
                state: Arc::new(state_sender),
                stats: stats_receiver,
            },
            shutdown: shutdown_sender,
            task,
        }
    }

    async fn run(
        mut self,
        state: watch::Receiver<WatcherState>,
        mut shutdown: watch::Receiver<bool>,
        stats: watch::Sender<WatcherStats>,
    ) {
        log::info!(
            "Started doc count watcher with minimum {} docs",
            self.min_doc_count
        );

        loop {
            if shutdown_requested(&shutdown) {
                break;
            }

            let mut wait = self.poll_interval;
            if *state.borrow() == WatcherState::Running {
                match self.fill_deficit(&state, &shutdown, &stats).await {
                    Ok(()) => stats.send_modify(|s| s.consecutive_failures = 0),
                    Err(e) => {
                        log::error!("Acquisition cycle failed: {:?}", e);
                        stats.send_modify(|s| {
                            s.consecutive_failures += 1;
                            s.last_error = Some(format!("{:#}", e));
                        });
                        wait = self.failure_backoff;
                    }
                }
            }

            tokio::select! {
                _ = time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        log::info!("Stopped doc count watcher");
    }

    /// Runs cycles back to back while the store is short, the watcher is
    /// running and no shutdown was requested.
    async fn fill_deficit(
        &mut self,
        state: &watch::Receiver<WatcherState>,
        shutdown: &watch::Receiver<bool>,
        stats: &watch::Sender<WatcherStats>,
    ) -> anyhow::Result<()> {
        loop {
            if shutdown_requested(shutdown) || *state.borrow() != WatcherState::Running {
                return Ok(());
            }

            let doc_count = self.store.count().await?;
            stats.send_modify(|s| s.doc_count = Some(doc_count));
            if doc_count >= self.min_doc_count {
                return Ok(());
            }

            let added = self.run_cycle(doc_count).await?;
            stats.send_modify(|s| {
                s.cycles_completed += 1;
                s.records_added += added as u64;
                s.consecutive_failures = 0;
            });
        }
    }

    /// One search, filter, enrich and persist pass. Returns how many records
    /// were handed to the store.
    async fn run_cycle(&mut self, doc_count: i64) -> anyhow::Result<usize> {
        let point = self.coordinates.next_point();
        log::info!(
            "Doc count ({}) less than minimum ({}). Searching at {}",
            doc_count,
            self.min_doc_count,
            point
        );

        let new_items = self.search_provider.filtered_search(point).await?;
        log::info!("Search returned {} results", new_items.len());

        let filtered_items = dedup::filter_novel(self.store.as_ref(), new_items).await?;
        log::info!("After filtering, {} remain", filtered_items.len());
        if filtered_items.is_empty() {
            return Ok(0);
        }

        log::info!("Adding screenshot links");
        let enriched_items = self.enricher.enrich(filtered_items).await?;

        log::info!("Adding to database");
        self.store.add(&enriched_items).await?;

        Ok(enriched_items.len())
    }
}

/// Set by [`WatcherHandle::stop`], or implied once the handle is dropped.
fn shutdown_requested(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}

/// Cloneable control over a started watcher. Changes take effect at the
/// watcher's next loop boundary; a cycle in progress is never interrupted.
#[derive(Clone)]
pub struct WatcherSwitch {
    state: Arc<watch::Sender<WatcherState>>,
    stats: watch::Receiver<WatcherStats>,
}

impl WatcherSwitch {
    pub fn enable(&self) {
        if self.state.send_replace(WatcherState::Running) != WatcherState::Running {
            log::info!("Doc count watcher enabled");
        }
    }

    pub fn disable(&self) {
        if self.state.send_replace(WatcherState::Paused) != WatcherState::Paused {
            log::info!("Doc count watcher disabled");
        }
    }

    pub fn state(&self) -> WatcherState {
        *self.state.borrow()
    }

    pub fn stats(&self) -> WatcherStats {
        self.stats.borrow().clone()
    }
}

/// Owner of the watcher task. Dropping the handle stops the watcher at its
/// next loop boundary; [`WatcherHandle::stop`] also waits for it to finish.
pub struct WatcherHandle {
    switch: WatcherSwitch,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    pub fn switch(&self) -> WatcherSwitch {
        self.switch.clone()
    }

    pub fn enable(&self) {
        self.switch.enable();
    }

    pub fn disable(&self) {
        self.switch.disable();
    }

    pub async fn stop(self) -> anyhow::Result<()> {
        self.shutdown.send_replace(true);
        self.task.await?;
        Ok(())
    }
}

#[cfg(test)]
impl WatcherSwitch {
    pub(crate) fn standalone(initial: WatcherState) -> Self {
        let (state_sender, _) = watch::channel(initial);
        let (_, stats_receiver) = watch::channel(WatcherStats::default());

        WatcherSwitch {
            state: Arc::new(state_sender),
            stats: stats_receiver,
        }
    }
}
