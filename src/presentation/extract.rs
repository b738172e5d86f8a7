// JSON body extractor that reports rejections through HubError
use crate::application::error::HubError;
use axum::extract::FromRequest;

/// `axum::Json`, except malformed bodies answer 400 with the usual `{message}` body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(HubError))]
pub struct ApiJson<T>(pub T);
