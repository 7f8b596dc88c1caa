use std::fmt;
use std::marker::PhantomData;

use reqwest::Method;
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use super::error::ClientError;
use super::pipeline::{Request, RequestOptions, RequestPipeline, Served};
use crate::envelope::ResponseEnvelope;
use crate::models::{
    BulkDeleteRequest, CountRequest, FilterCriterion, PaginatedRequest, PaginatedResult,
    SelectOption,
};

/// The operations of one family (`/suppliers`, `/vehicles`, ...) on top of a
/// shared [`RequestPipeline`].
///
/// Reads are cached. Writes bypass the cache and, unless the server answers
/// `Failure`, drop every cached response of the family so the next read
/// goes to the network.
///
/// ```rust,ignore
/// let suppliers: EntityClient<Supplier, SupplierCreate, SupplierUpdate> =
///     EntityClient::new(pipeline.clone(), "suppliers");
///
/// let page = suppliers
///     .paginated(&PaginatedRequest::new(1, 20).filter("nome", "Ana"), RequestOptions::default())
///     .await?;
/// ```
pub struct EntityClient<Dto, Create, Update> {
    pipeline: RequestPipeline,
    family: String,
    _types: PhantomData<fn() -> (Dto, Create, Update)>,
}

impl<Dto, Create, Update> Clone for EntityClient<Dto, Create, Update> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            family: self.family.clone(),
            _types: PhantomData,
        }
    }
}

impl<Dto, Create, Update> fmt::Debug for EntityClient<Dto, Create, Update> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityClient")
            .field("family", &self.family)
            .finish_non_exhaustive()
    }
}

impl<Dto, Create, Update> EntityClient<Dto, Create, Update>
where
    Dto: DeserializeOwned,
    Create: Serialize,
    Update: Serialize,
{
    pub fn new(pipeline: RequestPipeline, family: impl Into<String>) -> Self {
        Self {
            pipeline,
            family: family.into().trim_matches('/').to_string(),
            _types: PhantomData,
        }
    }

    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }

    #[must_use]
    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    fn path(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            format!("/{}", self.family)
        } else {
            format!("/{}/{suffix}", self.family)
        }
    }

    // ── Reads (cached) ──────────────────────────────────────────────

    /// # Errors
    ///
    /// See [`RequestPipeline::execute`].
    pub async fn list(&self, request_options: RequestOptions) -> Result<Served<Vec<Dto>>, ClientError> {
        self.pipeline
            .execute(Request::get(self.path("")), request_options)
            .await
    }

    /// # Errors
    ///
    /// See [`RequestPipeline::execute`].
    pub async fn paginated(
        &self,
        request: &PaginatedRequest,
        request_options: RequestOptions,
    ) -> Result<Served<PaginatedResult<Dto>>, ClientError> {
        self.pipeline
            .execute(Request::query(self.path("paginated"), request)?, request_options)
            .await
    }

    /// # Errors
    ///
    /// See [`RequestPipeline::execute`].
    pub async fn get(&self, id: Uuid, request_options: RequestOptions) -> Result<Served<Dto>, ClientError> {
        self.pipeline
            .execute(Request::get(self.path(&id.to_string())), request_options)
            .await
    }

    /// # Errors
    ///
    /// See [`RequestPipeline::execute`].
    pub async fn count(
        &self,
        filters: &[FilterCriterion],
        request_options: RequestOptions,
    ) -> Result<Served<u64>, ClientError> {
        let body = CountRequest {
            filters: filters.to_vec(),
        };
        self.pipeline
            .execute(Request::query(self.path("count"), &body)?, request_options)
            .await
    }

    /// `{id, label}` pairs for select inputs.
    ///
    /// # Errors
    ///
    /// See [`RequestPipeline::execute`].
    pub async fn options(
        &self,
        request_options: RequestOptions,
    ) -> Result<Served<Vec<SelectOption>>, ClientError> {
        self.pipeline
            .execute(Request::get(self.path("options")), request_options)
            .await
    }

    // ── Writes (uncached, invalidate the family) ────────────────────

    /// # Errors
    ///
    /// See [`RequestPipeline::execute`]. Validation failures come back as a
    /// `Failure` envelope, not as an error.
    pub async fn create(&self, create: &Create) -> Result<ResponseEnvelope<Dto>, ClientError> {
        self.mutate(Request::mutation(Method::POST, self.path(""), Some(create))?)
            .await
    }

    /// # Errors
    ///
    /// See [`EntityClient::create`].
    pub async fn update(&self, id: Uuid, update: &Update) -> Result<ResponseEnvelope<Dto>, ClientError> {
        self.mutate(Request::mutation(Method::PUT, self.path(&id.to_string()), Some(update))?)
            .await
    }

    /// # Errors
    ///
    /// See [`RequestPipeline::execute`].
    pub async fn delete(&self, id: Uuid) -> Result<ResponseEnvelope<Uuid>, ClientError> {
        self.mutate(Request::mutation(
            Method::DELETE,
            self.path(&id.to_string()),
            None::<&()>,
        )?)
        .await
    }

    /// Delete several ids; failed ids are listed per id in the messages of a
    /// `PartialSuccess` or `Failure` envelope.
    ///
    /// # Errors
    ///
    /// See [`RequestPipeline::execute`].
    pub async fn delete_many<I, S>(&self, ids: I) -> Result<ResponseEnvelope<Vec<Uuid>>, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let body = BulkDeleteRequest::new(ids);
        self.mutate(Request::mutation(Method::DELETE, self.path("bulk"), Some(&body))?)
            .await
    }

    /// Drop every cached response of this family.
    pub fn invalidate(&self) -> usize {
        self.pipeline.cache().invalidate_family(&self.family)
    }

    async fn mutate<T: DeserializeOwned>(&self, request: Request) -> Result<ResponseEnvelope<T>, ClientError> {
        let served = match self.pipeline.execute::<T>(request, RequestOptions::no_cache()).await {
            Ok(served) => served,
            Err(err) => {
                // the write may have been committed before the failure
                if err.may_have_reached_server() {
                    tracing::debug!(family = %self.family, error = %err, "write outcome unknown");
                    self.invalidate();
                }
                return Err(err);
            }
        };
        if !served.envelope.is_failure() {
            self.invalidate();
        }
        Ok(served.envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientConfig, Session};

    type Client = EntityClient<serde_json::Value, serde_json::Value, serde_json::Value>;

    #[test]
    fn test_paths_are_rooted_at_the_family() {
        let pipeline = RequestPipeline::new(
            Session::new("http://localhost:8000").unwrap(),
            ClientConfig::default(),
        )
        .unwrap();
        let client = Client::new(pipeline, "/suppliers/");

        assert_eq!(client.family(), "suppliers");
        assert_eq!(client.path(""), "/suppliers");
        assert_eq!(client.path("paginated"), "/suppliers/paginated");
        assert!(format!("{client:?}").contains("suppliers"));
    }
}
