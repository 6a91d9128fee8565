use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use thiserror::Error;

use crate::data::{DataError, RegionPayload};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered {status}")]
    Status { status: reqwest::StatusCode, url: String },

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Źródło danych regionu. Wywoływane z wątku roboczego, stąd `Send + Sync`.
pub trait Transport: Send + Sync {
    fn fetch_region(&self, gid: &str) -> Result<RegionPayload, TransportError>;
}

/// `GET {base_url}/region/{gid}` przez blokującego klienta reqwest
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn region_url(&self, gid: &str) -> String {
        format!("{}/region/{}", self.base_url, gid)
    }
}

impl Transport for HttpTransport {
    fn fetch_region(&self, gid: &str) -> Result<RegionPayload, TransportError> {
        let url = self.region_url(gid);
        debug!("GET {url}");

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status { status, url });
        }

        let body = response.bytes()?;
        Ok(RegionPayload::from_slice(&body)?)
    }
}
