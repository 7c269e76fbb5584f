use actix::{Addr, SyncArbiter};
use actix_cors::Cors;
use actix_web::web::Data;
use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use auth::{hash_password, SessionKeys};
use errors::{ApiError, StartupError};
use services::db_utils::{get_db_pool, AppState, PgActor};
use services::messages::EnsureSuperAdmin;
use settings::Settings;

mod auth;
mod errors;
mod menu;
mod order_flow;
mod schema;
mod services;
mod settings;
mod types;
mod validation;

fn init_pg_db(settings: &Settings) -> Result<Addr<PgActor>, StartupError> {
    let pool = get_db_pool(&settings.database_url)?;

    Ok(SyncArbiter::start(settings.pg_workers, move || {
        PgActor(pool.clone())
    }))
}

fn init_redis_db(settings: &Settings) -> Result<redis::Client, StartupError> {
    Ok(redis::Client::open(settings.redis_url.as_str())?)
}

async fn bootstrap_super_admin(
    pg_db: &Addr<PgActor>,
    settings: &Settings,
) -> Result<(), StartupError> {
    let (Some(email), Some(password)) = (
        settings.bootstrap_admin_email.as_deref(),
        settings.bootstrap_admin_password.as_deref(),
    ) else {
        return Ok(());
    };

    let email = validation::email(email)?;
    validation::password(password)?;

    let password = password.to_owned();
    let password_hash = web::block(move || hash_password(&password))
        .await
        .map_err(ApiError::from)?;

    let created = pg_db
        .send(EnsureSuperAdmin { email: email.clone(), password_hash })
        .await
        .map_err(ApiError::from)??;

    if created {
        info!(%email, "super-admin account created");
    }
    Ok(())
}

fn cors(origin: &str) -> Cors {
    if origin == "*" {
        Cors::permissive()
    } else {
        Cors::default()
            .allowed_origin(origin)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
    }
}

#[actix_web::main]
async fn main() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    dotenv().ok();
    let settings = Settings::load()?;

    let pg_db = init_pg_db(&settings)?;
    let redis_db = init_redis_db(&settings)?;
    bootstrap_super_admin(&pg_db, &settings).await?;

    let keys = Data::new(SessionKeys::new(
        &settings.jwt_secret,
        settings.session_ttl_secs,
    ));
    let bind_address = settings.bind_address.clone();
    let cors_origin = settings.cors_origin.clone();
    let state = Data::new(AppState { pg_db, redis_db, settings });

    info!(%bind_address, "starting HTTP server");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(keys.clone())
            .wrap(cors(&cors_origin))
            .wrap(middleware::Logger::default())
            .service(services::home_page)
            .service(services::healthcheck)
            .service(
                web::scope("/auth")
                    .service(services::auth_route::login)
                    .service(services::auth_route::logout)
                    .service(services::auth_route::register)
                    .service(services::auth_route::me)
            )
            .service(
                web::scope("/users")
                    .service(services::users_route::list_staff)
                    .service(services::users_route::deactivate_user)
            )
            .service(
                web::scope("/establishments")
                    .service(services::establishments_route::create_establishment)
                    .service(services::establishments_route::table_qr)
                    .service(services::establishments_route::update_establishment)
                    .service(services::establishments_route::get_establishment)
            )
            .service(
                web::scope("/categories")
                    .service(services::catalog_route::categories::list)
                    .service(services::catalog_route::categories::create)
                    .service(services::catalog_route::categories::update)
                    .service(services::catalog_route::categories::remove)
            )
            .service(
                web::scope("/products")
                    .service(services::catalog_route::products::list)
                    .service(services::catalog_route::products::fetch)
                    .service(services::catalog_route::products::create)
                    .service(services::catalog_route::products::update)
                    .service(services::catalog_route::products::remove)
                    .service(services::catalog_route::products::add_variant)
            )
            .service(
                web::scope("/variants")
                    .service(services::catalog_route::variants::update)
                    .service(services::catalog_route::variants::remove)
            )
            .service(
                web::scope("/allergens")
                    .service(services::allergens_route::list_allergens)
                    .service(services::allergens_route::create_allergen)
                    .service(services::allergens_route::update_allergen)
                    .service(services::allergens_route::delete_allergen)
            )
            .service(
                web::scope("/menu")
                    .service(services::menu_route::get_menu)
            )
            .service(
                web::scope("/orders")
                    .service(services::order_route::place_order)
                    .service(services::order_route::track_order)
                    .service(services::order_route::list_orders)
                    .service(services::order_route::get_order)
                    .service(services::order_route::advance_order)
                    .service(services::order_route::cancel_order)
                    .service(services::order_route::set_order_status)
            )
    })
        .bind(bind_address)?
        .run()
        .await?;

    Ok(())
}
