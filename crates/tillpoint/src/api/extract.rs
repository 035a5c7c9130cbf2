//! Extractors whose rejections use the response envelope.

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;

use super::ApiError;
use crate::pagination::PageQuery;

/// JSON body; malformed bodies become a 400 envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters; unparsable values (e.g. a non-numeric id) become a 400 envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string; undecodable queries become a 400 envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `?page=&limit=` read as raw pairs, so repeated keys never reject the request.
impl<S> FromRequestParts<S> for PageQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ApiQuery(pairs) =
            ApiQuery::<Vec<(String, String)>>::from_request_parts(parts, state).await?;
        Ok(PageQuery::from_pairs(pairs))
    }
}
