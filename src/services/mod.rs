pub mod coordinates;
pub mod dedup;
pub mod doc_count_watcher;
pub mod droid;
pub mod image_host;
pub mod places_client;
pub mod screenshot_enricher;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinates::*;
pub use doc_count_watcher::*;
pub use droid::*;
pub use image_host::*;
pub use places_client::*;
pub use screenshot_enricher::*;
