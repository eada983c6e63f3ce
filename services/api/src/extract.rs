//! Request extractors whose rejections are reported as [`ApiError`]
//!
//! axum's own `Json`, `Path` and `Query` answer a bad body or parameter with
//! a plain-text 400/415/422. These wrappers turn every such rejection into a
//! JSON validation error.

use axum::extract::{
    FromRequest, FromRequestParts,
    multipart::MultipartRejection,
    rejection::{JsonRejection, PathRejection, QueryRejection},
};
use tracing::debug;

use crate::error::ApiError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

/// Query string parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected JSON body: {}", rejection);
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        debug!("Rejected path: {}", rejection);
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        debug!("Rejected query string: {}", rejection);
        ApiError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        debug!("Rejected multipart body: {}", rejection);
        ApiError::Validation(rejection.body_text())
    }
}
