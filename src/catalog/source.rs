use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::{debug, info};

use super::{Catalog, CatalogError};

/// Where catalog snapshots come from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self) -> Result<Catalog, CatalogError>;

    fn location(&self) -> &str;
}

/// A fixed snapshot, handy for embedding and tests.
#[async_trait]
impl CatalogSource for Catalog {
    async fn fetch(&self) -> Result<Catalog, CatalogError> {
        Ok(self.clone())
    }

    fn location(&self) -> &str {
        "memory"
    }
}

pub struct FileCatalog {
    path: PathBuf,
    location: String,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let location = path.display().to_string();
        Self { path, location }
    }
}

#[async_trait]
impl CatalogSource for FileCatalog {
    async fn fetch(&self) -> Result<Catalog, CatalogError> {
        let bytes = tokio::fs::read(&self.path).await?;
        debug!("Read {} catalog bytes from {}", bytes.len(), self.location);
        Catalog::from_csv_reader(bytes.as_slice())
    }

    fn location(&self) -> &str {
        &self.location
    }
}

/// A published sheet fetched over HTTP(S) on every call.
pub struct HttpCatalog {
    url: String,
    client: reqwest::Client,
}

impl HttpCatalog {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn fetch(&self) -> Result<Catalog, CatalogError> {
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        debug!("Fetched {} catalog bytes from {}", bytes.len(), self.url);
        Catalog::from_csv_reader(bytes.as_ref())
    }

    fn location(&self) -> &str {
        &self.url
    }
}

/// `http://` and `https://` locations are fetched remotely; anything else is a file path.
pub fn source_from_location(
    location: &str,
    timeout: Duration,
) -> Result<Arc<dyn CatalogSource>, CatalogError> {
    let source: Arc<dyn CatalogSource> =
        if location.starts_with("http://") || location.starts_with("https://") {
            Arc::new(HttpCatalog::new(location, timeout)?)
        } else {
            Arc::new(FileCatalog::new(location))
        };

    info!("Using catalog source {}", source.location());

    Ok(source)
}
