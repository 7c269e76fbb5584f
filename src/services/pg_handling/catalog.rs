use std::collections::HashMap;

use actix::Handler;
use diesel::prelude::*;
use tracing::info;

use super::{
    find_category, find_product, find_variant, load_category_translations,
    load_product_translations, load_variant_translations, replace_category_translations,
    replace_product_translations, replace_variant_translations,
};
use crate::errors::ApiError;
use crate::services::db_models::{Category, Product, Variant};
use crate::services::db_utils::PgActor;
use crate::services::insertable::{
    NewCategory, NewProduct, NewVariant, ProductAllergenMapping, ProductChanges,
};
use crate::services::messages::{
    CreateCategory, CreateProduct, CreateVariant, DeleteCategory, DeleteProduct, DeleteVariant,
    FetchCategories, FetchProduct, FetchProducts, UpdateCategory, UpdateProduct, UpdateVariant,
};
use crate::services::payloads::ProductBody;
use crate::services::views::{CategoryAdminView, ProductAdminView, VariantAdminView};

fn variant_views(
    conn: &mut PgConnection,
    product_ids: &[i64],
) -> QueryResult<HashMap<i64, Vec<VariantAdminView>>> {
    use crate::schema::variants::dsl::{id, is_deleted, position, product_id, variants};

    let rows = variants
        .filter(product_id.eq_any(product_ids))
        .filter(is_deleted.eq(false))
        .order((position, id))
        .select(Variant::as_select())
        .load(conn)?;

    let ids: Vec<i64> = rows.iter().map(|v| v.id).collect();
    let mut translations = load_variant_translations(conn, &ids)?;

    let mut grouped: HashMap<i64, Vec<VariantAdminView>> = HashMap::new();
    for variant in rows {
        grouped.entry(variant.product_id).or_default().push(VariantAdminView {
            id: variant.id,
            product_id: variant.product_id,
            price: variant.price,
            position: variant.position,
            translations: translations.remove(&variant.id).unwrap_or_default(),
        });
    }
    Ok(grouped)
}

fn product_views(conn: &mut PgConnection, rows: Vec<Product>) -> QueryResult<Vec<ProductAdminView>> {
    use crate::schema::product_allergens::dsl::{allergen_id, product_allergens, product_id};

    let ids: Vec<i64> = rows.iter().map(|p| p.id).collect();
    let mut translations = load_product_translations(conn, &ids)?;
    let mut variants = variant_views(conn, &ids)?;

    let mut allergens: HashMap<i64, Vec<i64>> = HashMap::new();
    for (product, allergen) in product_allergens
        .filter(product_id.eq_any(&ids))
        .order((product_id, allergen_id))
        .select((product_id, allergen_id))
        .load::<(i64, i64)>(conn)?
    {
        allergens.entry(product).or_default().push(allergen);
    }

    Ok(rows
        .into_iter()
        .map(|product| ProductAdminView {
            id: product.id,
            category_id: product.category_id,
            price: product.price,
            image_url: product.image_url,
            is_available: product.is_available,
            position: product.position,
            translations: translations.remove(&product.id).unwrap_or_default(),
            allergen_ids: allergens.remove(&product.id).unwrap_or_default(),
            variants: variants.remove(&product.id).unwrap_or_default(),
        })
        .collect())
}

/// Every allergen id must be a live allergen of the same establishment.
fn check_allergens(conn: &mut PgConnection, est_id: i64, ids: &[i64]) -> Result<(), ApiError> {
    use crate::schema::allergens::dsl::{allergens, establishment_id, id, is_deleted};

    if ids.is_empty() {
        return Ok(());
    }

    let found = allergens
        .filter(id.eq_any(ids))
        .filter(establishment_id.eq(est_id))
        .filter(is_deleted.eq(false))
        .count()
        .get_result::<i64>(conn)?;

    if usize::try_from(found).unwrap_or_default() != ids.len() {
        return Err(ApiError::validation("Unknown allergen in allergen_ids"));
    }
    Ok(())
}

fn replace_allergen_links(conn: &mut PgConnection, owner_id: i64, ids: &[i64]) -> QueryResult<()> {
    use crate::schema::product_allergens::dsl::{product_allergens, product_id};

    diesel::delete(product_allergens.filter(product_id.eq(owner_id))).execute(conn)?;

    let links: Vec<ProductAllergenMapping> = ids
        .iter()
        .map(|allergen| ProductAllergenMapping { product_id: owner_id, allergen_id: *allergen })
        .collect();
    if !links.is_empty() {
        diesel::insert_into(product_allergens).values(&links).execute(conn)?;
    }
    Ok(())
}

fn product_changes(body: &ProductBody) -> ProductChanges {
    ProductChanges {
        category_id: body.category_id,
        price: body.price,
        image_url: body.image_url.clone(),
        is_available: body.is_available,
        position: body.position,
    }
}

impl Handler<FetchCategories> for PgActor {
    type Result = Result<Vec<CategoryAdminView>, ApiError>;

    fn handle(&mut self, msg: FetchCategories, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::categories::dsl::{categories, establishment_id, id, is_deleted, position};

        let mut conn = self.connection()?;

        let rows = categories
            .filter(establishment_id.eq(msg.0))
            .filter(is_deleted.eq(false))
            .order((position, id))
            .select(Category::as_select())
            .load(&mut conn)?;

        let ids: Vec<i64> = rows.iter().map(|c| c.id).collect();
        let mut translations = load_category_translations(&mut conn, &ids)?;

        Ok(rows
            .into_iter()
            .map(|category| CategoryAdminView {
                id: category.id,
                position: category.position,
                translations: translations.remove(&category.id).unwrap_or_default(),
            })
            .collect())
    }
}

impl Handler<CreateCategory> for PgActor {
    type Result = Result<CategoryAdminView, ApiError>;

    fn handle(&mut self, msg: CreateCategory, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::categories::dsl::categories;

        let mut conn = self.connection()?;

        conn.build_transaction().run(|trx_conn| {
            let category = diesel::insert_into(categories)
                .values(NewCategory {
                    establishment_id: msg.establishment_id,
                    position: msg.body.position,
                })
                .returning(Category::as_returning())
                .get_result(trx_conn)?;

            replace_category_translations(trx_conn, category.id, &msg.body.translations)?;

            info!(category_id = category.id, "category created");
            Ok(CategoryAdminView {
                id: category.id,
                position: category.position,
                translations: msg.body.translations.clone(),
            })
        })
    }
}

impl Handler<UpdateCategory> for PgActor {
    type Result = Result<CategoryAdminView, ApiError>;

    fn handle(&mut self, msg: UpdateCategory, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::categories::dsl::{categories, id, position};

        let mut conn = self.connection()?;

        conn.build_transaction().run(|trx_conn| {
            find_category(trx_conn, msg.establishment_id, msg.category_id)?;

            diesel::update(categories.filter(id.eq(msg.category_id)))
                .set(position.eq(msg.body.position))
                .execute(trx_conn)?;

            replace_category_translations(trx_conn, msg.category_id, &msg.body.translations)?;

            Ok(CategoryAdminView {
                id: msg.category_id,
                position: msg.body.position,
                translations: msg.body.translations.clone(),
            })
        })
    }
}

impl Handler<DeleteCategory> for PgActor {
    type Result = Result<(), ApiError>;

    fn handle(&mut self, msg: DeleteCategory, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::categories::dsl::{categories, id, is_deleted};
        use crate::schema::products::dsl as product;

        let mut conn = self.connection()?;

        conn.build_transaction().run(|trx_conn| {
            find_category(trx_conn, msg.establishment_id, msg.category_id)?;

            let live_products = product::products
                .filter(product::category_id.eq(msg.category_id))
                .filter(product::is_deleted.eq(false))
                .count()
                .get_result::<i64>(trx_conn)?;
            if live_products > 0 {
                return Err(ApiError::conflict(format!(
                    "Category still holds {live_products} products"
                )));
            }

            diesel::update(categories.filter(id.eq(msg.category_id)))
                .set(is_deleted.eq(true))
                .execute(trx_conn)?;

            info!(category_id = msg.category_id, "category deleted");
            Ok(())
        })
    }
}

impl Handler<FetchProducts> for PgActor {
    type Result = Result<Vec<ProductAdminView>, ApiError>;

    fn handle(&mut self, msg: FetchProducts, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::products::dsl::{
            category_id, establishment_id, id, is_deleted, position, products,
        };

        let mut conn = self.connection()?;

        let mut query = products
            .filter(establishment_id.eq(msg.establishment_id))
            .filter(is_deleted.eq(false))
            .select(Product::as_select())
            .into_boxed();
        if let Some(category) = msg.category_id {
            query = query.filter(category_id.eq(category));
        }

        let rows = query.order((category_id, position, id)).load(&mut conn)?;

        Ok(product_views(&mut conn, rows)?)
    }
}

impl Handler<FetchProduct> for PgActor {
    type Result = Result<ProductAdminView, ApiError>;

    fn handle(&mut self, msg: FetchProduct, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = self.connection()?;

        let product = find_product(&mut conn, msg.establishment_id, msg.product_id)?;
        product_views(&mut conn, vec![product])?
            .pop()
            .ok_or_else(|| ApiError::not_found(format!("Product {} not found", msg.product_id)))
    }
}

impl Handler<CreateProduct> for PgActor {
    type Result = Result<ProductAdminView, ApiError>;

    fn handle(&mut self, msg: CreateProduct, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::products::dsl::products;

        let mut conn = self.connection()?;
        let body = msg.body;

        conn.build_transaction().run(|trx_conn| {
            find_category(trx_conn, msg.establishment_id, body.category_id)?;
            check_allergens(trx_conn, msg.establishment_id, &body.allergen_ids)?;

            let product = diesel::insert_into(products)
                .values(NewProduct {
                    establishment_id: msg.establishment_id,
                    category_id: body.category_id,
                    price: body.price,
                    image_url: body.image_url.clone(),
                    is_available: body.is_available,
                    position: body.position,
                })
                .returning(Product::as_returning())
                .get_result(trx_conn)?;

            replace_product_translations(trx_conn, product.id, &body.translations)?;
            replace_allergen_links(trx_conn, product.id, &body.allergen_ids)?;

            info!(product_id = product.id, "product created");
            product_views(trx_conn, vec![product])?
                .pop()
                .ok_or_else(|| ApiError::Internal("Created product vanished".into()))
        })
    }
}

impl Handler<UpdateProduct> for PgActor {
    type Result = Result<ProductAdminView, ApiError>;

    fn handle(&mut self, msg: UpdateProduct, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::products::dsl::{id, products};

        let mut conn = self.connection()?;
        let body = msg.body;

        conn.build_transaction().run(|trx_conn| {
            find_product(trx_conn, msg.establishment_id, msg.product_id)?;
            find_category(trx_conn, msg.establishment_id, body.category_id)?;
            check_allergens(trx_conn, msg.establishment_id, &body.allergen_ids)?;

            let product = diesel::update(products.filter(id.eq(msg.product_id)))
                .set(product_changes(&body))
                .returning(Product::as_returning())
                .get_result(trx_conn)?;

            replace_product_translations(trx_conn, product.id, &body.translations)?;
            replace_allergen_links(trx_conn, product.id, &body.allergen_ids)?;

            product_views(trx_conn, vec![product])?
                .pop()
                .ok_or_else(|| ApiError::Internal("Updated product vanished".into()))
        })
    }
}

impl Handler<DeleteProduct> for PgActor {
    type Result = Result<(), ApiError>;

    fn handle(&mut self, msg: DeleteProduct, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::products::dsl::{establishment_id, id, is_deleted, products};

        let mut conn = self.connection()?;

        let affected = diesel::update(
            products
                .filter(id.eq(msg.product_id))
                .filter(establishment_id.eq(msg.establishment_id))
                .filter(is_deleted.eq(false)),
        )
        .set(is_deleted.eq(true))
        .execute(&mut conn)?;

        if affected == 0 {
            return Err(ApiError::not_found(format!("Product {} not found", msg.product_id)));
        }

        info!(product_id = msg.product_id, "product deleted");
        Ok(())
    }
}

impl Handler<CreateVariant> for PgActor {
    type Result = Result<VariantAdminView, ApiError>;

    fn handle(&mut self, msg: CreateVariant, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::variants::dsl::variants;

        let mut conn = self.connection()?;

        conn.build_transaction().run(|trx_conn| {
            find_product(trx_conn, msg.establishment_id, msg.product_id)?;

            let variant = diesel::insert_into(variants)
                .values(NewVariant {
                    product_id: msg.product_id,
                    price: msg.body.price,
                    position: msg.body.position,
                })
                .returning(Variant::as_returning())
                .get_result(trx_conn)?;

            replace_variant_translations(trx_conn, variant.id, &msg.body.translations)?;

            Ok(VariantAdminView {
                id: variant.id,
                product_id: variant.product_id,
                price: variant.price,
                position: variant.position,
                translations: msg.body.translations.clone(),
            })
        })
    }
}

impl Handler<UpdateVariant> for PgActor {
    type Result = Result<VariantAdminView, ApiError>;

    fn handle(&mut self, msg: UpdateVariant, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::variants::dsl::{id, position, price, variants};

        let mut conn = self.connection()?;

        conn.build_transaction().run(|trx_conn| {
            find_variant(trx_conn, msg.establishment_id, msg.variant_id)?;

            let variant = diesel::update(variants.filter(id.eq(msg.variant_id)))
                .set((price.eq(msg.body.price), position.eq(msg.body.position)))
                .returning(Variant::as_returning())
                .get_result(trx_conn)?;

            replace_variant_translations(trx_conn, variant.id, &msg.body.translations)?;

            Ok(VariantAdminView {
                id: variant.id,
                product_id: variant.product_id,
                price: variant.price,
                position: variant.position,
                translations: msg.body.translations.clone(),
            })
        })
    }
}

impl Handler<DeleteVariant> for PgActor {
    type Result = Result<(), ApiError>;

    fn handle(&mut self, msg: DeleteVariant, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::variants::dsl::{id, is_deleted, variants};

        let mut conn = self.connection()?;

        conn.build_transaction().run(|trx_conn| {
            find_variant(trx_conn, msg.establishment_id, msg.variant_id)?;

            diesel::update(variants.filter(id.eq(msg.variant_id)))
                .set(is_deleted.eq(true))
                .execute(trx_conn)?;

            Ok(())
        })
    }
}
