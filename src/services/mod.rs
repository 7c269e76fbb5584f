use actix_web::{get, HttpResponse, Responder};

pub mod db_models;
pub mod db_utils;
pub mod insertable;
pub mod messages;
pub mod payloads;
pub mod pg_handling;
pub mod redis_handling;
pub mod views;

pub mod allergens_route;
pub mod auth_route;
pub mod catalog_route;
pub mod establishments_route;
pub mod menu_route;
pub mod order_route;
pub mod users_route;

#[get("/")]
pub async fn home_page() -> impl Responder {
    HttpResponse::Ok().body("QR ordering service")
}

#[get("/health")]
pub async fn healthcheck() -> impl Responder {
    HttpResponse::Ok().body("I'm alive!")
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn healthcheck_answers() {
        let app = test::init_service(App::new().service(home_page).service(healthcheck)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert!(resp.status().is_success());
        assert_eq!(test::read_body(resp).await, "I'm alive!");

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert!(resp.status().is_success());
    }
}
