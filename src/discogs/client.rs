use crate::{config::DiscogsConfig, error::FetchError, pacer::Clock};
use reqwest::{
    Client, RequestBuilder, StatusCode,
    header::{AUTHORIZATION, RETRY_AFTER},
};
use serde::de::DeserializeOwned;
use std::{sync::Arc, time::Duration};
use url::Url;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Backoff used when a 429 carries no usable `Retry-After`.
pub const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

/// Authenticated Discogs HTTP client.
#[derive(Clone)]
pub struct DiscogsClient {
    http: Client,
    authorization: String,
    clock: Arc<dyn Clock>,
}

impl DiscogsClient {
    pub fn new(config: &DiscogsConfig, clock: Arc<dyn Clock>) -> Result<Self, FetchError> {
        let http = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self {
            http,
            authorization: config.authorization(),
            clock,
        })
    }

    /// A GET carrying the client's identification and credentials.
    pub fn request(&self, url: Url) -> RequestBuilder {
        self.http.get(url).header(AUTHORIZATION, &self.authorization)
    }

    /// Issues exactly one GET and decodes a 2xx body as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        let response = self.request(url.clone()).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            return Err(FetchError::RateLimited { retry_after });
        }

        if !status.is_success() {
            return Err(FetchError::RequestFailed {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        Ok(response.json::<T>().await?)
    }

    /// Calls [`get_json`](Self::get_json) up to `max_attempts` times.
    ///
    /// Only rate limiting is retried; every other failure is returned as is.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        max_attempts: u32,
    ) -> Result<T, FetchError> {
        for attempt in 1..=max_attempts {
            match self.get_json(url).await {
                Err(FetchError::RateLimited { retry_after }) => {
                    if attempt == max_attempts {
                        break;
                    }
                    let wait = retry_after.map_or(DEFAULT_RATE_LIMIT_WAIT, Duration::from_secs);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        wait_secs = wait.as_secs(),
                        "Rate limited. Waiting {} seconds before retry...",
                        wait.as_secs()
                    );
                    self.clock.sleep(wait).await;
                }
                other => return other,
            }
        }

        Err(FetchError::ExhaustedRetries {
            attempts: max_attempts,
        })
    }
}
