// sub-routes "/categories", "/products" and "/variants"

use actix_web::web::{Data, Json, Path, Query};
use actix_web::{delete, get, post, put, HttpResponse};

use crate::auth::AuthUser;
use crate::errors::ApiError;
use crate::services::db_utils::AppState;
use crate::services::messages::{
    CreateCategory, CreateProduct, CreateVariant, DeleteCategory, DeleteProduct, DeleteVariant,
    FetchCategories, FetchProduct, FetchProducts, UpdateCategory, UpdateProduct, UpdateVariant,
};
use crate::services::payloads::{CategoryBody, ProductBody, ProductsQuery, VariantBody};
use crate::services::redis_handling::drop_cached_menus;

pub mod categories {
    use super::*;

    #[get("")]
    pub async fn list(user: AuthUser, state: Data<AppState>) -> Result<HttpResponse, ApiError> {
        let establishment_id = user.staff_establishment()?;

        let categories = state.query(FetchCategories(establishment_id)).await?;
        Ok(HttpResponse::Ok().json(categories))
    }

    #[post("")]
    pub async fn create(
        user: AuthUser,
        state: Data<AppState>,
        body: Json<CategoryBody>,
    ) -> Result<HttpResponse, ApiError> {
        let establishment_id = user.admin_establishment()?;
        let body = body.into_inner().validated()?;

        let created = state
            .query(CreateCategory { establishment_id, body })
            .await?;

        drop_cached_menus(&state, establishment_id).await;
        Ok(HttpResponse::Created().json(created))
    }

    #[put("/{category_id}")]
    pub async fn update(
        user: AuthUser,
        state: Data<AppState>,
        path: Path<i64>,
        body: Json<CategoryBody>,
    ) -> Result<HttpResponse, ApiError> {
        let establishment_id = user.admin_establishment()?;
        let body = body.into_inner().validated()?;

        let updated = state
            .query(UpdateCategory {
                establishment_id,
                category_id: path.into_inner(),
                body,
            })
            .await?;

        drop_cached_menus(&state, establishment_id).await;
        Ok(HttpResponse::Ok().json(updated))
    }

    #[delete("/{category_id}")]
    pub async fn remove(
        user: AuthUser,
        state: Data<AppState>,
        path: Path<i64>,
    ) -> Result<HttpResponse, ApiError> {
        let establishment_id = user.admin_establishment()?;

        state
            .query(DeleteCategory {
                establishment_id,
                category_id: path.into_inner(),
            })
            .await?;

        drop_cached_menus(&state, establishment_id).await;
        Ok(HttpResponse::NoContent().finish())
    }
}

pub mod products {
    use super::*;

    #[get("")]
    pub async fn list(
        user: AuthUser,
        state: Data<AppState>,
        query: Query<ProductsQuery>,
    ) -> Result<HttpResponse, ApiError> {
        let establishment_id = user.staff_establishment()?;

        let products = state
            .query(FetchProducts {
                establishment_id,
                category_id: query.category_id,
            })
            .await?;
        Ok(HttpResponse::Ok().json(products))
    }

    #[get("/{product_id}")]
    pub async fn fetch(
        user: AuthUser,
        state: Data<AppState>,
        path: Path<i64>,
    ) -> Result<HttpResponse, ApiError> {
        let establishment_id = user.staff_establishment()?;

        let product = state
            .query(FetchProduct {
                establishment_id,
                product_id: path.into_inner(),
            })
            .await?;
        Ok(HttpResponse::Ok().json(product))
    }

    #[post("")]
    pub async fn create(
        user: AuthUser,
        state: Data<AppState>,
        body: Json<ProductBody>,
    ) -> Result<HttpResponse, ApiError> {
        let establishment_id = user.admin_establishment()?;
        let body = body.into_inner().validated()?;

        let created = state
            .query(CreateProduct { establishment_id, body })
            .await?;

        drop_cached_menus(&state, establishment_id).await;
        Ok(HttpResponse::Created().json(created))
    }

    #[put("/{product_id}")]
    pub async fn update(
        user: AuthUser,
        state: Data<AppState>,
        path: Path<i64>,
        body: Json<ProductBody>,
    ) -> Result<HttpResponse, ApiError> {
        let establishment_id = user.admin_establishment()?;
        let body = body.into_inner().validated()?;

        let updated = state
            .query(UpdateProduct {
                establishment_id,
                product_id: path.into_inner(),
                body,
            })
            .await?;

        drop_cached_menus(&state, establishment_id).await;
        Ok(HttpResponse::Ok().json(updated))
    }

    #[delete("/{product_id}")]
    pub async fn remove(
        user: AuthUser,
        state: Data<AppState>,
        path: Path<i64>,
    ) -> Result<HttpResponse, ApiError> {
        let establishment_id = user.admin_establishment()?;

        state
            .query(DeleteProduct {
                establishment_id,
                product_id: path.into_inner(),
            })
            .await?;

        drop_cached_menus(&state, establishment_id).await;
        Ok(HttpResponse::NoContent().finish())
    }

    #[post("/{product_id}/variants")]
    pub async fn add_variant(
        user: AuthUser,
        state: Data<AppState>,
        path: Path<i64>,
        body: Json<VariantBody>,
    ) -> Result<HttpResponse, ApiError> {
        let establishment_id = user.admin_establishment()?;
        let body = body.into_inner().validated()?;

        let created = state
            .query(CreateVariant {
                establishment_id,
                product_id: path.into_inner(),
                body,
            })
            .await?;

        drop_cached_menus(&state, establishment_id).await;
        Ok(HttpResponse::Created().json(created))
    }
}

pub mod variants {
    use super::*;

    #[put("/{variant_id}")]
    pub async fn update(
        user: AuthUser,
        state: Data<AppState>,
        path: Path<i64>,
        body: Json<VariantBody>,
    ) -> Result<HttpResponse, ApiError> {
        let establishment_id = user.admin_establishment()?;
        let body = body.into_inner().validated()?;

        let updated = state
            .query(UpdateVariant {
                establishment_id,
                variant_id: path.into_inner(),
                body,
            })
            .await?;

        drop_cached_menus(&state, establishment_id).await;
        Ok(HttpResponse::Ok().json(updated))
    }

    #[delete("/{variant_id}")]
    pub async fn remove(
        user: AuthUser,
        state: Data<AppState>,
        path: Path<i64>,
    ) -> Result<HttpResponse, ApiError> {
        let establishment_id = user.admin_establishment()?;

        state
            .query(DeleteVariant {
                establishment_id,
                variant_id: path.into_inner(),
            })
            .await?;

        drop_cached_menus(&state, establishment_id).await;
        Ok(HttpResponse::NoContent().finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionKeys;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};

    #[actix_web::test]
    async fn catalog_writes_need_a_session() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(SessionKeys::new("test-secret", 60)))
                .service(web::scope("/categories").service(categories::create))
                .service(web::scope("/variants").service(variants::remove)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/categories")
            .set_json(serde_json::json!({"translations": []}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::delete().uri("/variants/3").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
