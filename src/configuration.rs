use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub places: PlacesSettings,
    pub imgur: ImgurSettings,
    pub browser: BrowserSettings,
    pub watcher: WatcherSettings,
    pub coordinates: CoordinateSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = match self.require_ssl {
            true => PgSslMode::Require,
            false => PgSslMode::Prefer,
        };

        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(&self.password)
            .port(self.port)
            .ssl_mode(ssl_mode)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.database_name)
    }
}

/// Google Places access plus the criteria every search result must meet.
#[derive(Deserialize, Clone, Debug)]
pub struct PlacesSettings {
    pub api_key: String,
    pub base_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub radius_meters: u32,
    pub keyword: Option<String>,
    pub place_type: Option<String>,
    pub min_rating: Option<f32>,
    pub min_user_ratings_total: Option<u32>,
    #[serde(default)]
    pub only_operational: bool,
    #[serde(default)]
    pub excluded_types: Vec<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ImgurSettings {
    pub client_id: String,
    pub upload_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub window_width: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub window_height: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub page_load_timeout_secs: u64,
    pub fallback_url: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct WatcherSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub min_doc_count: u64,
    pub autostart: bool,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub poll_interval_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub failure_backoff_secs: u64,
}

/// Bounding box the coordinate sampler draws probe points from.
#[derive(Deserialize, Clone, Debug)]
pub struct CoordinateSettings {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("No current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // e.g. `APP_WATCHER__MIN_DOC_COUNT=500` sets `Settings.watcher.min_doc_count`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}
