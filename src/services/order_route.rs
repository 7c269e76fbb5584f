// sub-route "/orders"

use actix_web::web::{Data, Json, Path, Query};
use actix_web::{get, post, put, HttpResponse};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::ApiError;
use crate::services::db_utils::AppState;
use crate::services::messages::{
    ChangeOrderStatus, FetchOrder, FetchOrderByCode, FetchOrders, PlaceOrder, StatusChange,
};
use crate::services::payloads::{OrdersQuery, PlaceOrderBody, StatusBody};

#[post("")]
pub async fn place_order(
    state: Data<AppState>,
    body: Json<PlaceOrderBody>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner().validated()?;

    let order = state.query(PlaceOrder(body)).await?;
    Ok(HttpResponse::Created().json(order))
}

#[get("/track/{code}")]
pub async fn track_order(
    state: Data<AppState>,
    path: Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = state.query(FetchOrderByCode(path.into_inner())).await?;
    Ok(HttpResponse::Ok().json(order))
}

#[get("")]
pub async fn list_orders(
    user: AuthUser,
    state: Data<AppState>,
    query: Query<OrdersQuery>,
) -> Result<HttpResponse, ApiError> {
    let establishment_id = user.staff_establishment()?;
    let query = query.into_inner();

    let orders = state
        .query(FetchOrders {
            establishment_id,
            status: query.status,
            active_only: query.active.unwrap_or(false),
        })
        .await?;
    Ok(HttpResponse::Ok().json(orders))
}

#[get("/{order_id}")]
pub async fn get_order(
    user: AuthUser,
    state: Data<AppState>,
    path: Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let establishment_id = user.staff_establishment()?;

    let order = state
        .query(FetchOrder {
            establishment_id,
            order_id: path.into_inner(),
        })
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn change_status(
    user: AuthUser,
    state: &AppState,
    order_id: i64,
    change: StatusChange,
) -> Result<HttpResponse, ApiError> {
    let establishment_id = user.staff_establishment()?;

    let order = state
        .query(ChangeOrderStatus {
            establishment_id,
            order_id,
            role: user.role,
            change,
        })
        .await?;

    info!(order_id, by = user.user_id, status = %order.status, "order status changed");
    Ok(HttpResponse::Ok().json(order))
}

#[post("/{order_id}/advance")]
pub async fn advance_order(
    user: AuthUser,
    state: Data<AppState>,
    path: Path<i64>,
) -> Result<HttpResponse, ApiError> {
    change_status(user, &state, path.into_inner(), StatusChange::Advance).await
}

#[post("/{order_id}/cancel")]
pub async fn cancel_order(
    user: AuthUser,
    state: Data<AppState>,
    path: Path<i64>,
) -> Result<HttpResponse, ApiError> {
    change_status(user, &state, path.into_inner(), StatusChange::Cancel).await
}

#[put("/{order_id}/status")]
pub async fn set_order_status(
    user: AuthUser,
    state: Data<AppState>,
    path: Path<i64>,
    body: Json<StatusBody>,
) -> Result<HttpResponse, ApiError> {
    let change = StatusChange::Set(body.into_inner().status);
    change_status(user, &state, path.into_inner(), change).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionKeys;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};

    #[actix_web::test]
    async fn staff_endpoints_need_a_session() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(SessionKeys::new("test-secret", 60)))
                .service(
                    web::scope("/orders")
                        .service(list_orders)
                        .service(advance_order)
                        .service(set_order_status),
                ),
        )
        .await;

        let req = test::TestRequest::get().uri("/orders?active=true").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post().uri("/orders/4/advance").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::put()
            .uri("/orders/4/status")
            .set_json(serde_json::json!({"status": "ready"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
