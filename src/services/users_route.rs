// sub-route "/users"

use actix_web::web::{Data, Path};
use actix_web::{delete, get, HttpResponse};
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::ApiError;
use crate::services::db_utils::AppState;
use crate::services::messages::{DeactivateUser, FetchStaff};

#[get("")]
pub async fn list_staff(user: AuthUser, state: Data<AppState>) -> Result<HttpResponse, ApiError> {
    let establishment_id = user.admin_establishment()?;

    let staff = state.query(FetchStaff(establishment_id)).await?;
    Ok(HttpResponse::Ok().json(staff))
}

#[delete("/{user_id}")]
pub async fn deactivate_user(
    user: AuthUser,
    state: Data<AppState>,
    path: Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let establishment_id = user.admin_establishment()?;
    let user_id = path.into_inner();

    if user_id == user.user_id {
        return Err(ApiError::validation("You cannot deactivate your own account"));
    }

    state
        .query(DeactivateUser { establishment_id, user_id })
        .await?;

    info!(establishment_id, user_id, by = user.user_id, "user deactivated");
    Ok(HttpResponse::NoContent().finish())
}
