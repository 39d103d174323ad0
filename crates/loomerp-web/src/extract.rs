//! Request extractors that reject with the API's JSON error body.
//!
//! axum's own `Json`, `Path` and `Query` rejections render as plain text;
//! these wrappers route them through `ApiError` so clients always get
//! `{"error": ..., "message": ...}`.

use axum::extract::{FromRequest, FromRequestParts, OptionalFromRequest, Request};
use axum::Json;
use loomerp_common::ApiError;
use serde::de::DeserializeOwned;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// No body (no `Content-Type`) extracts as `None`; a malformed one is still a 400.
impl<T, S> OptionalFromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let body = <Json<T> as OptionalFromRequest<S>>::from_request(req, state).await?;
        Ok(body.map(|Json(value)| ApiJson(value)))
    }
}
