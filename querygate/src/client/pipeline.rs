//! # Typed Request Client
//!
//! Every call goes through [`RequestPipeline::execute`]:
//!
//! 1. cacheable requests consult the shared [`RequestCache`]; a fresh entry
//!    is returned without touching the network, a stale one is returned at
//!    once while a background task refreshes it (unless the policy says
//!    [`StalePolicy::Refresh`])
//! 2. otherwise the request is sent under the [`retry`] policy
//! 3. the body must be a `{status, messages, data}` envelope, or the call
//!    fails with [`ClientError::InvalidResponseShape`]
//! 4. non-`Failure` envelopes of cacheable requests are stored
//!
//! A `Failure` envelope is a normal return value, whatever the HTTP status.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::cache::{Lookup, RequestCache};
use super::config::{CachePolicy, ClientConfig, StalePolicy};
use super::error::{ClientError, preview};
use super::retry::retry;
use super::session::Session;
use crate::envelope::ResponseEnvelope;

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Network,
    /// A fresh cache entry.
    Fresh,
    /// A stale cache entry; a refresh was scheduled.
    Stale,
}

/// An envelope and its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Served<T> {
    pub envelope: ResponseEnvelope<T>,
    pub source: Source,
}

impl<T> Served<T> {
    pub fn into_envelope(self) -> ResponseEnvelope<T> {
        self.envelope
    }
}

/// One remote call.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    body: Option<Value>,
    cacheable: bool,
}

impl Request {
    /// A cacheable `GET`.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
            cacheable: true,
        }
    }

    /// A cacheable, read-only `POST` such as `/{family}/paginated`.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if `body` cannot be turned into JSON.
    pub fn query<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, ClientError> {
        Ok(Self {
            method: Method::POST,
            path: path.into(),
            body: Some(serde_json::to_value(body)?),
            cacheable: true,
        })
    }

    /// An uncached mutation.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if `body` cannot be turned into JSON.
    pub fn mutation<B: Serialize>(
        method: Method,
        path: impl Into<String>,
        body: Option<&B>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            method,
            path: path.into(),
            body: body.map(serde_json::to_value).transpose()?,
            cacheable: false,
        })
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }

    #[must_use]
    pub fn cache_key(&self) -> String {
        RequestCache::key(&self.method, &self.path, self.body.as_ref())
    }
}

/// Per-call overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOptions {
    /// Skip the cache read; the response is still stored.
    pub force_refresh: bool,
    /// Neither read nor write the cache.
    pub no_cache: bool,
    /// Replaces the pipeline's cache policy for this call.
    pub cache_policy: Option<CachePolicy>,
}

impl RequestOptions {
    #[must_use]
    pub fn force_refresh() -> Self {
        Self {
            force_refresh: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn no_cache() -> Self {
        Self {
            no_cache: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_cache_policy(policy: CachePolicy) -> Self {
        Self {
            cache_policy: Some(policy),
            ..Self::default()
        }
    }
}

struct Inner {
    http: reqwest::Client,
    session: Session,
    config: ClientConfig,
    cache: Arc<RequestCache>,
}

/// The shared call path of every entity client. Cheap to clone.
#[derive(Clone)]
pub struct RequestPipeline {
    inner: Arc<Inner>,
}

impl RequestPipeline {
    /// Build a pipeline with its own cache.
    ///
    /// # Errors
    ///
    /// Returns `Config` for an invalid configuration and `Transport` if the
    /// HTTP client cannot be built.
    pub fn new(session: Session, config: ClientConfig) -> Result<Self, ClientError> {
        Self::with_cache(session, config, Arc::new(RequestCache::new()))
    }

    /// Build a pipeline on an existing, possibly shared, cache.
    ///
    /// # Errors
    ///
    /// See [`RequestPipeline::new`].
    pub fn with_cache(
        session: Session,
        config: ClientConfig,
        cache: Arc<RequestCache>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(session.default_headers())
            .build()?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                session,
                config,
                cache,
            }),
        })
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<RequestCache> {
        &self.inner.cache
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Run `request` through cache, retry and envelope validation.
    ///
    /// # Errors
    ///
    /// Transport failures (after retries), bodies that are not envelopes and
    /// envelopes whose `data` does not decode as `T`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: Request,
        options: RequestOptions,
    ) -> Result<Served<T>, ClientError> {
        self.run(request, options, None).await
    }

    /// [`execute`](Self::execute), abandoned as soon as `token` is cancelled.
    ///
    /// A cancelled call never writes the cache. The request may still reach
    /// the server.
    ///
    /// # Errors
    ///
    /// `Cancelled`, or any error of [`execute`](Self::execute).
    pub async fn execute_cancellable<T: DeserializeOwned>(
        &self,
        request: Request,
        options: RequestOptions,
        token: &CancellationToken,
    ) -> Result<Served<T>, ClientError> {
        tokio::select! {
            biased;
            () = token.cancelled() => {
                debug!("request cancelled");
                Err(ClientError::Cancelled)
            }
            result = self.run(request, options, Some(token)) => result,
        }
    }

    async fn run<T: DeserializeOwned>(
        &self,
        request: Request,
        options: RequestOptions,
        token: Option<&CancellationToken>,
    ) -> Result<Served<T>, ClientError> {
        let policy = options.cache_policy.unwrap_or(self.inner.config.cache);
        let key = (request.cacheable && !options.no_cache).then(|| request.cache_key());

        if let Some(key) = &key
            && !options.force_refresh
        {
            match self.inner.cache.get(key) {
                Lookup::Fresh(value) => {
                    debug!(key = %key, "cache hit");
                    return decode(value, Source::Fresh);
                }
                Lookup::Stale(value) if policy.on_stale == StalePolicy::ServeStale => {
                    debug!(key = %key, "serving stale entry, refreshing in background");
                    self.spawn_refresh(request, key.clone(), policy);
                    return decode(value, Source::Stale);
                }
                Lookup::Stale(_) | Lookup::Miss => {}
            }
        }

        let value = self.fetch(&request).await?;

        if token.is_some_and(CancellationToken::is_cancelled) {
            return Err(ClientError::Cancelled);
        }
        if let Some(key) = key
            && !is_failure(&value)
        {
            self.inner.cache.insert(key, value.clone(), &policy);
        }
        decode(value, Source::Network)
    }

    fn spawn_refresh(&self, request: Request, key: String, policy: CachePolicy) {
        let pipeline = self.clone();
        tokio::spawn(async move {
            match pipeline.fetch(&request).await {
                Ok(value) if !is_failure(&value) => pipeline.inner.cache.insert(key, value, &policy),
                Ok(_) => debug!(key = %key, "background refresh returned a failure envelope"),
                Err(err) => warn!(key = %key, error = %err, "background refresh failed"),
            }
        });
    }

    /// Send with retries; returns the validated envelope as JSON.
    async fn fetch(&self, request: &Request) -> Result<Value, ClientError> {
        retry(&self.inner.config.retry, || self.send_once(request)).await
    }

    async fn send_once(&self, request: &Request) -> Result<Value, ClientError> {
        let url = self.inner.session.url(&request.path)?;
        debug!("{} {url}", request.method);

        let mut builder = self.inner.http.request(request.method.clone(), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        parse_envelope(status, body)
    }
}

/// Accept any parseable envelope; otherwise classify the failure.
fn parse_envelope(status: StatusCode, body: String) -> Result<Value, ClientError> {
    let parsed = serde_json::from_str::<Value>(&body);
    match parsed {
        Ok(value) if is_envelope(&value) => Ok(value),
        _ if !status.is_success() => Err(ClientError::Status {
            status: status.as_u16(),
            body,
        }),
        Ok(_) => {
            error!(body = preview(&body), "response is not an envelope");
            Err(ClientError::InvalidResponseShape {
                message: "missing or unknown `status`".to_string(),
                body,
            })
        }
        Err(e) => {
            error!(body = preview(&body), "response is not JSON");
            Err(ClientError::InvalidResponseShape {
                message: format!("body is not JSON: {e}"),
                body,
            })
        }
    }
}

fn is_envelope(value: &Value) -> bool {
    let known_status = value
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|status| matches!(status, "Success" | "PartialSuccess" | "Failure"));
    known_status && value.get("messages").is_none_or(Value::is_object)
}

fn is_failure(value: &Value) -> bool {
    value.get("status").and_then(Value::as_str) == Some("Failure")
}

fn decode<T: DeserializeOwned>(value: Value, source: Source) -> Result<Served<T>, ClientError> {
    match serde_json::from_value::<ResponseEnvelope<T>>(value.clone()) {
        Ok(envelope) => Ok(Served { envelope, source }),
        Err(e) => Err(ClientError::Deserialization {
            message: e.to_string(),
            body: value.to_string(),
        }),
    }
}
