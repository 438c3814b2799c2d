use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use salesdesk_products::ProductId;

/// Body of `PUT /pricing/tables/:id/items`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertItemRequest {
    pub product_id: ProductId,
    pub unit_price: Decimal,
}

/// List responses are wrapped as `{"items": [...]}`.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
}

pub fn list<T: Serialize>(items: Vec<T>) -> Response {
    axum::Json(ListResponse { items }).into_response()
}

pub fn ok<T: Serialize>(body: T) -> Response {
    axum::Json(body).into_response()
}

pub fn created<T: Serialize>(body: T) -> Response {
    (StatusCode::CREATED, axum::Json(body)).into_response()
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
