use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::web::Data;
use actix_web::{FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::services::db_utils::AppState;
use crate::services::messages::FetchUser;
use crate::services::views::UserView;
use crate::types::{Role, SESSION_COOKIE};

const HASH_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;

/// Stand-in hash checked when a login names an unknown account, so a miss
/// costs the same key stretching as a wrong password.
pub const DUMMY_PASSWORD_HASH: &str = "100000$00000000000000000000000000000000$0000000000000000000000000000000000000000000000000000000000000000";

fn derive(password: &[u8], salt: &[u8], iterations: u32) -> [u8; DIGEST_LEN] {
    let mut digest = [0_u8; DIGEST_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut digest);
    digest
}

fn hash_with(password: &str, iterations: u32) -> String {
    let salt = Uuid::new_v4();
    let digest = derive(password.as_bytes(), salt.as_bytes(), iterations);

    format!(
        "{iterations}${}${}",
        hex::encode(salt.as_bytes()),
        hex::encode(digest)
    )
}

/// PBKDF2-HMAC-SHA256 in the form `<iterations>$<salt>$<digest>`.
pub fn hash_password(password: &str) -> String {
    hash_with(password, HASH_ITERATIONS)
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(iterations), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let (Ok(iterations), Ok(salt), Ok(expected)) = (
        iterations.parse::<u32>(),
        hex::decode(salt),
        hex::decode(expected),
    ) else {
        return false;
    };

    if iterations == 0 || salt.len() != SALT_LEN {
        return false;
    }

    derive(password.as_bytes(), &salt, iterations)
        .as_slice()
        .ct_eq(expected.as_slice())
        .into()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub est: Option<i64>,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

/// Signing material for session tokens.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn issue(
        &self,
        user_id: i64,
        establishment_id: Option<i64>,
        role: Role,
    ) -> Result<String, ApiError> {
        let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
        let claims = Claims {
            sub: user_id.to_string(),
            est: establishment_id,
            role,
            iat: now,
            exp: now + self.ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| ApiError::Internal(format!("Failed to sign session: {err}")))
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, ApiError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        let user_id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| ApiError::Unauthenticated)?;

        Ok(AuthUser {
            user_id,
            establishment_id: data.claims.est,
            role: data.claims.role,
        })
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(CookieDuration::seconds(
                i64::try_from(self.ttl_secs).unwrap_or(i64::MAX),
            ))
            .finish()
    }

    pub fn removal_cookie() -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
        cookie.make_removal();
        cookie
    }
}

/// Authenticated staff member, taken from the session cookie or a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub establishment_id: Option<i64>,
    pub role: Role,
}

impl AuthUser {
    /// Identity claimed by the session token, before checking the account still exists.
    pub fn from_session(req: &HttpRequest) -> Result<Self, ApiError> {
        let keys = req
            .app_data::<Data<SessionKeys>>()
            .ok_or_else(|| ApiError::Internal("Session keys are not configured".into()))?;

        let token = req
            .cookie(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_owned())
            .or_else(|| bearer_token(req))
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthenticated)?;

        keys.verify(&token)
    }

    /// Re-reads identity from the stored account. Deactivated or vanished accounts lose the session.
    pub fn confirmed(stored: Result<UserView, ApiError>) -> Result<Self, ApiError> {
        match stored {
            Ok(user) => Ok(AuthUser {
                user_id: user.id,
                establishment_id: user.establishment_id,
                role: user.role,
            }),
            Err(ApiError::NotFound(_)) => Err(ApiError::Unauthenticated),
            Err(err) => Err(err),
        }
    }

    pub fn require_role(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "Role {} is not allowed to perform this action",
                self.role
            )))
        }
    }

    /// The establishment a staff member works for.
    pub fn establishment(&self) -> Result<i64, ApiError> {
        self.establishment_id
            .ok_or_else(|| ApiError::forbidden("Account is not bound to an establishment"))
    }

    pub fn staff_establishment(&self) -> Result<i64, ApiError> {
        self.require_role(&[Role::Admin, Role::Kitchen, Role::Waiter])?;
        self.establishment()
    }

    pub fn admin_establishment(&self) -> Result<i64, ApiError> {
        self.require_role(&[Role::Admin])?;
        self.establishment()
    }

    /// Admins manage their own establishment, the super-admin manages any.
    pub fn ensure_manages(&self, establishment_id: i64) -> Result<(), ApiError> {
        match self.role {
            Role::SuperAdmin => Ok(()),
            Role::Admin if self.establishment_id == Some(establishment_id) => Ok(()),
            _ => Err(ApiError::forbidden("Not allowed to manage this establishment")),
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_owned())
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claimed = Self::from_session(req);
        let state = req.app_data::<Data<AppState>>().cloned();

        Box::pin(async move {
            let claimed = claimed?;
            let state = state
                .ok_or_else(|| ApiError::Internal("Application state is not configured".into()))?;

            Self::confirmed(state.query(FetchUser(claimed.user_id)).await)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn keys() -> SessionKeys {
        SessionKeys::new("test-secret", 3600)
    }

    async fn extract(req: HttpRequest) -> Result<AuthUser, ApiError> {
        AuthUser::from_request(&req, &mut Payload::None).await
    }

    fn stored(role: Role, establishment_id: Option<i64>) -> UserView {
        UserView {
            id: 3,
            establishment_id,
            email: "waiter@example.com".into(),
            full_name: "Wes".into(),
            role,
            created_at: chrono::NaiveDateTime::default(),
        }
    }

    #[test]
    fn password_roundtrip() {
        let stored = hash_password("correct horse");

        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("wrong horse", &stored));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        assert_ne!(hash_with("pa55word", 1_000), hash_with("pa55word", 1_000));
    }

    #[test]
    fn dummy_hash_costs_a_full_check_and_never_matches() {
        let iterations = DUMMY_PASSWORD_HASH.split('$').next().unwrap();
        assert_eq!(iterations, HASH_ITERATIONS.to_string());

        assert!(!verify_password("", DUMMY_PASSWORD_HASH));
        assert!(!verify_password("pa55word", DUMMY_PASSWORD_HASH));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "10$zz$00"));
        assert!(!verify_password("x", "0$00$00"));
        assert!(!verify_password("x", "plain-text"));
        assert!(!verify_password("x", "10$00ff$00"));
    }

    #[test]
    fn token_carries_identity() {
        let keys = keys();
        let token = keys.issue(42, Some(7), Role::Kitchen).unwrap();

        assert_eq!(
            keys.verify(&token).unwrap(),
            AuthUser { user_id: 42, establishment_id: Some(7), role: Role::Kitchen }
        );
    }

    #[test]
    fn foreign_and_expired_tokens_are_rejected() {
        let token = SessionKeys::new("other-secret", 3600)
            .issue(1, None, Role::SuperAdmin)
            .unwrap();
        assert!(matches!(keys().verify(&token), Err(ApiError::Unauthenticated)));

        let stale = Claims {
            sub: "1".into(),
            est: None,
            role: Role::Admin,
            iat: 1_000,
            exp: 2_000,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &stale,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(matches!(keys().verify(&token), Err(ApiError::Unauthenticated)));
    }

    #[actix_web::test]
    async fn extractor_reads_cookie() {
        let keys = keys();
        let token = keys.issue(3, Some(9), Role::Waiter).unwrap();
        let req = TestRequest::default()
            .app_data(Data::new(keys))
            .cookie(Cookie::new(SESSION_COOKIE, token))
            .to_http_request();

        let user = AuthUser::from_session(&req).unwrap();
        assert_eq!(user.user_id, 3);
        assert_eq!(user.role, Role::Waiter);
    }

    #[actix_web::test]
    async fn extractor_reads_bearer_header() {
        let keys = keys();
        let token = keys.issue(5, Some(1), Role::Admin).unwrap();
        let req = TestRequest::default()
            .app_data(Data::new(keys))
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_http_request();

        assert_eq!(AuthUser::from_session(&req).unwrap().user_id, 5);
    }

    #[actix_web::test]
    async fn extractor_rejects_anonymous_requests() {
        let req = TestRequest::default()
            .app_data(Data::new(keys()))
            .to_http_request();

        assert!(matches!(extract(req).await, Err(ApiError::Unauthenticated)));
    }

    #[test]
    fn deactivated_accounts_lose_their_session() {
        assert!(matches!(
            AuthUser::confirmed(Err(ApiError::not_found("User not found"))),
            Err(ApiError::Unauthenticated)
        ));
        assert!(matches!(
            AuthUser::confirmed(Err(ApiError::Internal("pool down".into()))),
            Err(ApiError::Internal(_))
        ));
    }

    #[test]
    fn stored_account_overrides_token_claims() {
        let user = AuthUser::confirmed(Ok(stored(Role::Kitchen, Some(9)))).unwrap();
        assert_eq!(user, AuthUser { user_id: 3, establishment_id: Some(9), role: Role::Kitchen });
    }

    #[actix_web::test]
    async fn valid_token_alone_is_not_enough() {
        let keys = keys();
        let token = keys.issue(3, Some(9), Role::Waiter).unwrap();
        let req = TestRequest::default()
            .app_data(Data::new(keys))
            .cookie(Cookie::new(SESSION_COOKIE, token))
            .to_http_request();

        assert!(matches!(extract(req).await, Err(ApiError::Internal(_))));
    }

    #[test]
    fn access_helpers() {
        let admin = AuthUser { user_id: 1, establishment_id: Some(2), role: Role::Admin };
        let root = AuthUser { user_id: 2, establishment_id: None, role: Role::SuperAdmin };
        let waiter = AuthUser { user_id: 3, establishment_id: Some(2), role: Role::Waiter };

        assert!(admin.ensure_manages(2).is_ok());
        assert!(matches!(admin.ensure_manages(3), Err(ApiError::Forbidden(_))));
        assert!(root.ensure_manages(3).is_ok());
        assert!(waiter.ensure_manages(2).is_err());

        assert!(waiter.require_role(&[Role::Waiter, Role::Kitchen]).is_ok());
        assert!(waiter.require_role(&[Role::Admin]).is_err());

        assert_eq!(waiter.establishment().unwrap(), 2);
        assert!(root.establishment().is_err());

        assert_eq!(waiter.staff_establishment().unwrap(), 2);
        assert!(waiter.admin_establishment().is_err());
        assert_eq!(admin.admin_establishment().unwrap(), 2);
        assert!(root.staff_establishment().is_err());
    }

    #[test]
    fn removal_cookie_expires_session() {
        let cookie = SessionKeys::removal_cookie();
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
    }
}
