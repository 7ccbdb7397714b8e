use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use super::error::FetchError;
use crate::orbit::OrbitalElements;

#[async_trait]
pub trait ElementsSource: Send + Sync {
    async fn fetch_elements(&self) -> Result<OrbitalElements, FetchError>;
}

/// Element-set endpoint serving a name line followed by the two element lines.
pub struct HttpElementsSource {
    client: reqwest::Client,
    url: String,
}

impl HttpElementsSource {
    pub fn new(url: String, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl ElementsSource for HttpElementsSource {
    async fn fetch_elements(&self) -> Result<OrbitalElements, FetchError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let text = response.text().await?;
        Ok(OrbitalElements::from_response(&text)?)
    }
}

/// Holds the most recently fetched element set. Absent until the first
/// successful refresh; failed refreshes keep whatever was there.
pub struct ElementsCache {
    source: Arc<dyn ElementsSource>,
    current: RwLock<Option<Arc<OrbitalElements>>>,
}

impl ElementsCache {
    pub fn new(source: Arc<dyn ElementsSource>) -> Self {
        Self {
            source,
            current: RwLock::new(None),
        }
    }

    pub fn current(&self) -> Option<Arc<OrbitalElements>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn refresh(&self) -> Result<(), FetchError> {
        match self.source.fetch_elements().await {
            Ok(elements) => {
                log::info!(
                    "orbital elements updated (norad {}, epoch {})",
                    elements.norad_id(),
                    elements.epoch()
                );
                *self.current.write().unwrap_or_else(PoisonError::into_inner) =
                    Some(Arc::new(elements));
                Ok(())
            }
            Err(e) => {
                log::error!("orbital elements refresh failed: {}", e);
                Err(e)
            }
        }
    }
}
