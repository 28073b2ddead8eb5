use actix_web::{web, HttpResponse};

use super::response::{ApiError, ApiResponse, DeliveryView};
use crate::domain::delivery::{CreateDelivery, DeliveryCommand, DeliveryCommandHandler, DeliveryId};

type Handler = web::Data<DeliveryCommandHandler>;

fn parse_id(raw: &str) -> Result<DeliveryId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::invalid_request(format!("Invalid delivery id: {raw}")))
}

pub async fn home() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Delivery API is running"
    }))
}

/// POST /api/delivery/start
pub async fn start_delivery(
    handler: Handler,
    request: web::Json<CreateDelivery>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();
    tracing::debug!(order_id = %request.order_id, items = request.items.len(), "Start delivery request");

    let delivery = handler.start_delivery(request).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::started(
        delivery.id(),
        "Delivery created and assigned",
    )))
}

/// GET /api/delivery/
pub async fn list_deliveries(handler: Handler) -> Result<HttpResponse, ApiError> {
    let deliveries: Vec<DeliveryView> = handler
        .list()
        .await?
        .into_iter()
        .map(DeliveryView::from)
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::ok(deliveries)))
}

/// GET /api/delivery/{id}
pub async fn get_delivery(
    handler: Handler,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let delivery = handler.get(id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(DeliveryView::from(delivery))))
}

async fn apply(
    handler: Handler,
    path: web::Path<String>,
    command: DeliveryCommand,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let delivery = handler.handle(id, command).await?;
    let message = format!("Delivery is now {}", delivery.status());

    Ok(HttpResponse::Ok().json(ApiResponse::ok(DeliveryView::from(delivery)).with_message(message)))
}

/// POST /api/delivery/{id}/pickup
pub async fn mark_picked_up(handler: Handler, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    apply(handler, path, DeliveryCommand::MarkPickedUp).await
}

/// POST /api/delivery/{id}/in-transit
pub async fn mark_in_transit(handler: Handler, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    apply(handler, path, DeliveryCommand::MarkInTransit).await
}

/// POST /api/delivery/{id}/deliver
pub async fn mark_delivered(handler: Handler, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    apply(handler, path, DeliveryCommand::MarkDelivered).await
}

/// POST /api/delivery/{id}/cancel
pub async fn cancel(handler: Handler, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    apply(handler, path, DeliveryCommand::Cancel).await
}
