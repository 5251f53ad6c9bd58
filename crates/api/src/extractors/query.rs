//! Query string extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::Query;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Field reported when the query string cannot be decoded at all.
pub const QUERY_FIELD: &str = "query";

/// Like [`Query`], with repeated keys (`selectedStatusList[]=a&...`) collected
/// into `Vec`s and rejections mapped to [`ApiError::Validation`].
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "Query string rejected");
                Err(ApiError::field(QUERY_FIELD))
            }
        }
    }
}
