// sub-route "/allergens"

use actix_web::web::{Data, Json, Path};
use actix_web::{delete, get, post, put, HttpResponse};

use crate::auth::AuthUser;
use crate::errors::ApiError;
use crate::services::db_utils::AppState;
use crate::services::messages::{CreateAllergen, DeleteAllergen, FetchAllergens, UpdateAllergen};
use crate::services::payloads::AllergenBody;
use crate::services::redis_handling::drop_cached_menus;

#[get("")]
pub async fn list_allergens(
    user: AuthUser,
    state: Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let establishment_id = user.staff_establishment()?;

    let allergens = state.query(FetchAllergens(establishment_id)).await?;
    Ok(HttpResponse::Ok().json(allergens))
}

#[post("")]
pub async fn create_allergen(
    user: AuthUser,
    state: Data<AppState>,
    body: Json<AllergenBody>,
) -> Result<HttpResponse, ApiError> {
    let establishment_id = user.admin_establishment()?;
    let body = body.into_inner().validated()?;

    let created = state
        .query(CreateAllergen { establishment_id, body })
        .await?;

    drop_cached_menus(&state, establishment_id).await;
    Ok(HttpResponse::Created().json(created))
}

#[put("/{allergen_id}")]
pub async fn update_allergen(
    user: AuthUser,
    state: Data<AppState>,
    path: Path<i64>,
    body: Json<AllergenBody>,
) -> Result<HttpResponse, ApiError> {
    let establishment_id = user.admin_establishment()?;
    let body = body.into_inner().validated()?;

    let updated = state
        .query(UpdateAllergen {
            establishment_id,
            allergen_id: path.into_inner(),
            body,
        })
        .await?;

    drop_cached_menus(&state, establishment_id).await;
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/{allergen_id}")]
pub async fn delete_allergen(
    user: AuthUser,
    state: Data<AppState>,
    path: Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let establishment_id = user.admin_establishment()?;

    state
        .query(DeleteAllergen {
            establishment_id,
            allergen_id: path.into_inner(),
        })
        .await?;

    drop_cached_menus(&state, establishment_id).await;
    Ok(HttpResponse::NoContent().finish())
}
