// sub-route "/menu"

use actix_web::web::{Data, Path, Query};
use actix_web::{get, HttpResponse};
use tracing::debug;

use crate::errors::ApiError;
use crate::services::db_models::Establishment;
use crate::services::db_utils::AppState;
use crate::services::messages::{FetchEstablishmentBySlug, FetchMenu};
use crate::services::payloads::MenuQuery;
use crate::services::redis_handling::{cache_menu, cached_menu};
use crate::services::views::MenuView;
use crate::validation;

/// Requested language when it is well-formed, otherwise the establishment default.
pub fn menu_language(requested: Option<&str>, establishment: &Establishment) -> String {
    requested
        .and_then(|lang| validation::language(lang).ok())
        .unwrap_or_else(|| establishment.default_language.clone())
}

/// Whether a cached default-language menu answers a request for `language`.
pub fn default_answers(default_menu: &MenuView, language: &str) -> bool {
    default_menu.language == language || !default_menu.languages.iter().any(|l| l == language)
}

#[get("/{slug}")]
pub async fn get_menu(
    state: Data<AppState>,
    path: Path<String>,
    query: Query<MenuQuery>,
) -> Result<HttpResponse, ApiError> {
    let establishment = state
        .query(FetchEstablishmentBySlug(path.into_inner()))
        .await?;
    let establishment_id = establishment.id;
    let language = menu_language(query.lang.as_deref(), &establishment);

    if let Some(menu) = cached_menu(&state, establishment_id, language.clone()).await {
        debug!(establishment_id, %language, "menu served from cache");
        return Ok(HttpResponse::Ok().json(menu));
    }

    // languages without any translation never get an entry of their own
    if language != establishment.default_language {
        let default_language = establishment.default_language.clone();
        if let Some(menu) = cached_menu(&state, establishment_id, default_language).await {
            if default_answers(&menu, &language) {
                debug!(establishment_id, %language, "default menu served from cache");
                return Ok(HttpResponse::Ok().json(menu));
            }
        }
    }

    let menu = state.query(FetchMenu { establishment, language }).await?;
    cache_menu(&state, establishment_id, menu.clone()).await;

    Ok(HttpResponse::Ok().json(menu))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::views::PublicEstablishment;

    fn establishment() -> Establishment {
        Establishment {
            id: 1,
            slug: "trattoria".into(),
            name: "Trattoria".into(),
            default_language: "it".into(),
            table_count: 10,
            currency: "EUR".into(),
            is_deleted: false,
            created_at: chrono::NaiveDateTime::default(),
        }
    }

    #[test]
    fn language_falls_back_to_default() {
        let est = establishment();

        assert_eq!(menu_language(Some("EN"), &est), "en");
        assert_eq!(menu_language(None, &est), "it");
        assert_eq!(menu_language(Some("e1"), &est), "it");
        assert_eq!(menu_language(Some(""), &est), "it");
    }

    #[test]
    fn cached_default_menu_answers_unknown_languages() {
        let menu = MenuView {
            establishment: PublicEstablishment {
                slug: "trattoria".into(),
                name: "Trattoria".into(),
                currency: "EUR".into(),
                table_count: 10,
            },
            language: "it".into(),
            languages: vec!["en".into(), "it".into()],
            categories: Vec::new(),
        };

        assert!(default_answers(&menu, "fr"));
        assert!(default_answers(&menu, "it"));
        assert!(!default_answers(&menu, "en"));
    }
}
