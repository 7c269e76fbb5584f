// sub-route "/auth"

use actix_web::web::{self, Data, Json};
use actix_web::{get, post, HttpResponse};
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, AuthUser, SessionKeys, DUMMY_PASSWORD_HASH};
use crate::errors::ApiError;
use crate::services::db_models::User;
use crate::services::db_utils::AppState;
use crate::services::messages::{AddUser, FetchUser, FetchUserByEmail};
use crate::services::payloads::{LoginBody, RegisterBody};
use crate::services::views::UserView;
use crate::types::Role;
use crate::validation;

#[derive(Serialize)]
struct SessionResponse {
    token: String,
    user: UserView,
}

/// Establishment the new account is bound to, given who is registering it.
pub fn registration_target(
    registrar: &AuthUser,
    role: Role,
    establishment_id: Option<i64>,
) -> Result<Option<i64>, ApiError> {
    match registrar.role {
        Role::SuperAdmin => match (role, establishment_id) {
            (Role::SuperAdmin, None) => Ok(None),
            (Role::SuperAdmin, Some(_)) => Err(ApiError::validation(
                "Super-admin accounts are not bound to an establishment",
            )),
            (_, Some(id)) => Ok(Some(id)),
            (_, None) => Err(ApiError::validation(
                "establishment_id is required for staff accounts",
            )),
        },
        Role::Admin => {
            if !role.is_staff() {
                return Err(ApiError::forbidden(
                    "Only the platform administrator can create super-admins",
                ));
            }
            let own = registrar.establishment()?;
            match establishment_id {
                Some(other) if other != own => Err(ApiError::forbidden(
                    "Cannot register staff for another establishment",
                )),
                _ => Ok(Some(own)),
            }
        }
        _ => Err(ApiError::forbidden("Only administrators can register users")),
    }
}

/// Account lookup for a login attempt; a missing account is not an error yet.
fn known_account(found: Result<User, ApiError>) -> Result<Option<User>, ApiError> {
    match found {
        Ok(user) => Ok(Some(user)),
        Err(ApiError::NotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

#[post("/register")]
pub async fn register(
    user: AuthUser,
    state: Data<AppState>,
    body: Json<RegisterBody>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner().validated()?;
    let establishment_id = registration_target(&user, body.role, body.establishment_id)?;

    let password = body.password;
    let password_hash = web::block(move || hash_password(&password)).await?;

    let created = state
        .query(AddUser {
            establishment_id,
            email: body.email,
            password_hash,
            full_name: body.full_name,
            role: body.role,
        })
        .await?;

    info!(registrar = user.user_id, user_id = created.id, "account created");
    Ok(HttpResponse::Created().json(created))
}

#[post("/login")]
pub async fn login(
    state: Data<AppState>,
    keys: Data<SessionKeys>,
    body: Json<LoginBody>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let email = validation::email(&body.email).map_err(|_| ApiError::Unauthenticated)?;

    let user = known_account(state.query(FetchUserByEmail(email)).await)?;

    // unknown emails still pay for a full key derivation
    let password = body.password;
    let stored = user
        .as_ref()
        .map_or_else(|| DUMMY_PASSWORD_HASH.to_owned(), |u| u.password_hash.clone());
    let verified = web::block(move || verify_password(&password, &stored)).await?;

    let user = match user {
        Some(user) if verified => user,
        Some(user) => {
            warn!(user_id = user.id, "login rejected");
            return Err(ApiError::Unauthenticated);
        }
        None => return Err(ApiError::Unauthenticated),
    };

    let token = keys.issue(user.id, user.establishment_id, user.role()?)?;
    let user = UserView::try_from(user)?;

    info!(user_id = user.id, role = %user.role, "login");
    Ok(HttpResponse::Ok()
        .cookie(keys.session_cookie(token.clone()))
        .json(SessionResponse { token, user }))
}

#[post("/logout")]
pub async fn logout() -> HttpResponse {
    HttpResponse::Ok()
        .cookie(SessionKeys::removal_cookie())
        .json("Logged out")
}

#[get("/me")]
pub async fn me(user: AuthUser, state: Data<AppState>) -> Result<HttpResponse, ApiError> {
    let view = state.query(FetchUser(user.user_id)).await?;
    Ok(HttpResponse::Ok().json(view))
}
