use std::path::PathBuf;
use std::time::Duration;

/// Default output root, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "data/raw";

/// Connect and read-inactivity timeout for dataset requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Write buffer used while streaming a response body to disk.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub timeout: Duration,
    pub chunk_size: usize,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            chunk_size: DEFAULT_CHUNK_SIZE,
            user_agent: format!("airbnb-fetch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    pub fn with_data_dir<P: Into<PathBuf>>(mut self, data_dir: P) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn get_city_dir(&self, city: &str) -> PathBuf {
        self.data_dir.join(city)
    }
}
