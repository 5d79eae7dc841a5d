//! Request extractors whose rejections render through [`ApiError`].

use axum::extract::FromRequest;

use crate::error::ApiError;

/// [`axum::Json`], but a body that fails to parse is answered with a JSON
/// `400` instead of axum's plain-text rejection.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
