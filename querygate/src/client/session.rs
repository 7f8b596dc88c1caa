use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::error::ClientError;

/// Where requests go and who sends them.
///
/// Passed explicitly to [`RequestPipeline::new`](super::RequestPipeline::new),
/// so separate sessions (and tests) never share hidden state.
#[derive(Debug)]
pub struct Session {
    base_url: Url,
    /// Marked sensitive, so `Debug` never prints the token.
    authorization: Option<HeaderValue>,
}

impl Session {
    /// # Errors
    ///
    /// Returns `InvalidUrl` if `base_url` does not parse.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut url = Url::parse(base_url)?;

        // Joining relative paths keeps the last segment only with a trailing slash
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));

        Ok(Self {
            base_url: url,
            authorization: None,
        })
    }

    /// # Errors
    ///
    /// Returns `InvalidToken` if the token cannot travel in an HTTP header.
    pub fn with_bearer_token(mut self, token: SecretString) -> Result<Self, ClientError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| ClientError::InvalidToken)?;
        value.set_sensitive(true);
        self.authorization = Some(value);
        Ok(self)
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/suppliers/paginated`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` if the path cannot be joined.
    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Headers sent with every request.
    pub(crate) fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = &self.authorization {
            headers.insert(AUTHORIZATION, value.clone());
        }
        headers
    }
}
