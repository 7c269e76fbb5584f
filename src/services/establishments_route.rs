// sub-route "/establishments"

use actix_web::web::{Data, Json, Path};
use actix_web::{get, post, put, HttpResponse};

use crate::auth::AuthUser;
use crate::errors::ApiError;
use crate::services::db_utils::AppState;
use crate::services::messages::{
    CreateEstablishment, FetchEstablishment, FetchEstablishmentBySlug, UpdateEstablishment,
};
use crate::services::payloads::{EstablishmentBody, EstablishmentUpdateBody};
use crate::services::redis_handling::drop_cached_menus;
use crate::services::views::{EstablishmentView, QrTarget};
use crate::types::Role;

/// Link a table's QR code opens.
pub fn qr_target_url(base_url: &str, slug: &str, table_number: i32) -> String {
    format!(
        "{}/m/{slug}?table={table_number}",
        base_url.trim_end_matches('/')
    )
}

#[post("")]
pub async fn create_establishment(
    user: AuthUser,
    state: Data<AppState>,
    body: Json<EstablishmentBody>,
) -> Result<HttpResponse, ApiError> {
    user.require_role(&[Role::SuperAdmin])?;
    let body = body.into_inner().validated()?;

    let created = state.query(CreateEstablishment(body)).await?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/{slug}")]
pub async fn get_establishment(
    state: Data<AppState>,
    path: Path<String>,
) -> Result<HttpResponse, ApiError> {
    let establishment = state
        .query(FetchEstablishmentBySlug(path.into_inner()))
        .await?;

    Ok(HttpResponse::Ok().json(EstablishmentView::from(establishment)))
}

#[put("/{establishment_id}")]
pub async fn update_establishment(
    user: AuthUser,
    state: Data<AppState>,
    path: Path<i64>,
    body: Json<EstablishmentUpdateBody>,
) -> Result<HttpResponse, ApiError> {
    let establishment_id = path.into_inner();
    user.ensure_manages(establishment_id)?;
    let body = body.into_inner().validated()?;

    let updated = state
        .query(UpdateEstablishment { establishment_id, body })
        .await?;

    // menu payload embeds name, currency and table count
    drop_cached_menus(&state, establishment_id).await;
    Ok(HttpResponse::Ok().json(updated))
}

#[get("/{establishment_id}/tables/{table_number}/qr")]
pub async fn table_qr(
    user: AuthUser,
    state: Data<AppState>,
    path: Path<(i64, i32)>,
) -> Result<HttpResponse, ApiError> {
    let (establishment_id, table_number) = path.into_inner();
    user.ensure_manages(establishment_id)?;

    let establishment = state.query(FetchEstablishment(establishment_id)).await?;
    if !(1..=establishment.table_count).contains(&table_number) {
        return Err(ApiError::validation(format!(
            "Table {table_number} does not exist, the establishment has {} tables",
            establishment.table_count
        )));
    }

    Ok(HttpResponse::Ok().json(QrTarget {
        table_number,
        url: qr_target_url(
            state.settings.public_base_url(),
            &establishment.slug,
            table_number,
        ),
    }))
}
