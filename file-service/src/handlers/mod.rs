pub mod files;
pub mod health;
pub mod login;

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

// Extractors whose rejections render as the service's JSON error body

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);
