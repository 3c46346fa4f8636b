use std::{net::TcpListener, sync::Arc, time::Duration};

use env_logger::Env;
use places_scraper::{
    configuration::get_configuration,
    dal::PgBusinessStore,
    services::{
        BoundingBoxSampler, DocCountWatcher, Droid, GooglePlacesClient, ImgurClient,
        ScreenshotEnricher,
    },
    startup::run,
};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration()?;

    let pool_options = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(15 * 60)); // 15 minutes

    let connection_pool = pool_options.connect_lazy_with(configuration.database.with_db());
    sqlx::migrate!("./migrations").run(&connection_pool).await?;

    let store = Arc::new(PgBusinessStore::new(connection_pool));
    let places_client = Arc::new(GooglePlacesClient::new(configuration.places)?);
    let image_host = Arc::new(ImgurClient::new(configuration.imgur)?);
    let droid = Arc::new(Droid::new(configuration.browser.clone()));
    let enricher = ScreenshotEnricher::new(droid, image_host, configuration.browser.fallback_url);
    let coordinates = BoundingBoxSampler::new(&configuration.coordinates)?;

    let watcher = DocCountWatcher::new(
        Box::new(coordinates),
        places_client,
        store,
        enricher,
        &configuration.watcher,
    );
    let handle = watcher.start();

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(address)?;
    log::info!("Listening on {}", listener.local_addr()?);

    run(listener, handle.switch())?.await?;

    log::info!("Server stopped, waiting for the watcher to finish its cycle");
    handle.stop().await
}
