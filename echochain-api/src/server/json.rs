use crate::server::ServerError;
use axum::{
    Json as AxumJson,
    extract::FromRequest,
    response::{IntoResponse, Response},
};
use axum_extra::TypedHeader;
use headers::ContentType;
use serde::Serialize;

/// Request/response JSON wrapper. Extraction routes axum's rejection through
/// `ServerError`, and a body that fails to serialize replies with the same
/// `{status, error}` shape every other error takes instead of axum's plain
/// text.
#[derive(FromRequest, Debug, Clone, Copy, Default)]
#[from_request(via(AxumJson), rejection(ServerError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        serde_json::to_vec(&self.0).map_or_else(
            |error| ServerError::JsonResponse(error).into_response(),
            |body| (TypedHeader(ContentType::json()), body).into_response(),
        )
    }
}
