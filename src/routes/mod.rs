pub mod default_route;
pub mod watcher_route;
