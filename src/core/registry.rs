use crate::core::config::Config;
use crate::error::{FetchError, Result};
use std::path::PathBuf;

/// Dataset files published for every city.
pub const FILE_KINDS: [&str; 2] = ["listings", "calendar"];

/// Snapshot directories on data.insideairbnb.com; each holds one file per kind.
const BUILTIN: &[(&str, &str)] = &[
    (
        "nyc",
        "https://data.insideairbnb.com/united-states/ny/new-york-city/2025-10-01/data",
    ),
    (
        "la",
        "https://data.insideairbnb.com/united-states/ca/los-angeles/2025-09-01/data",
    ),
    (
        "paris",
        "https://data.insideairbnb.com/france/ile-de-france/paris/2024-12-06/data",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityDatasets {
    pub city: String,
    pub files: Vec<(String, String)>,
}

/// Ordered city -> (file kind -> URL) mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetRegistry {
    cities: Vec<CityDatasets>,
}

/// One (city, file kind) pair and the paths it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub city: String,
    pub kind: String,
    pub url: String,
    pub compressed_path: PathBuf,
    pub decompressed_path: PathBuf,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (city, base_url) in BUILTIN {
            for kind in FILE_KINDS {
                registry = registry.with_file(city, kind, &format!("{base_url}/{kind}.csv.gz"));
            }
        }
        registry
    }

    /// Adds a file, appending the city if it is not registered yet.
    pub fn with_file(mut self, city: &str, kind: &str, url: &str) -> Self {
        let index = match self.cities.iter().position(|c| c.city == city) {
            Some(index) => index,
            None => {
                self.cities.push(CityDatasets {
                    city: city.to_string(),
                    files: Vec::new(),
                });
                self.cities.len() - 1
            }
        };
        let entry = &mut self.cities[index];

        match entry.files.iter_mut().find(|(k, _)| k == kind) {
            Some((_, existing)) => *existing = url.to_string(),
            None => entry.files.push((kind.to_string(), url.to_string())),
        }
        self
    }

    pub fn cities(&self) -> &[CityDatasets] {
        &self.cities
    }

    pub fn city_names(&self) -> Vec<String> {
        self.cities.iter().map(|c| c.city.clone()).collect()
    }

    pub fn task_count(&self) -> usize {
        self.cities.iter().map(|c| c.files.len()).sum()
    }

    /// Keeps only the named cities, in registry order. An empty selection keeps everything.
    pub fn select(&self, names: &[String]) -> Result<Self> {
        if names.is_empty() {
            return Ok(self.clone());
        }

        if let Some(unknown) = names
            .iter()
            .find(|name| !self.cities.iter().any(|c| &c.city == *name))
        {
            return Err(FetchError::UnknownCity {
                name: unknown.clone(),
                known: self.city_names(),
            });
        }

        Ok(Self {
            cities: self
                .cities
                .iter()
                .filter(|c| names.contains(&c.city))
                .cloned()
                .collect(),
        })
    }

    pub fn tasks_for(&self, city: &CityDatasets, config: &Config) -> Vec<DownloadTask> {
        let city_dir = config.get_city_dir(&city.city);
        city.files
            .iter()
            .map(|(kind, url)| DownloadTask {
                city: city.city.clone(),
                kind: kind.clone(),
                url: url.clone(),
                compressed_path: city_dir.join(format!("{kind}.csv.gz")),
                decompressed_path: city_dir.join(format!("{kind}.csv")),
            })
            .collect()
    }
}
