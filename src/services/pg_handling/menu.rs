use actix::Handler;
use diesel::prelude::*;
use tracing::debug;

use super::{
    load_allergen_translations, load_category_translations, load_product_translations,
    load_variant_translations,
};
use crate::errors::ApiError;
use crate::menu::{assemble, MenuSource};
use crate::services::db_models::{Allergen, Category, Product, Variant};
use crate::services::db_utils::PgActor;
use crate::services::messages::FetchMenu;
use crate::services::views::MenuView;

impl Handler<FetchMenu> for PgActor {
    type Result = Result<MenuView, ApiError>;

    fn handle(&mut self, msg: FetchMenu, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::{allergens, categories, product_allergens, products, variants};

        let mut conn = self.connection()?;
        let est_id = msg.establishment.id;

        let category_rows = categories::table
            .filter(categories::establishment_id.eq(est_id))
            .filter(categories::is_deleted.eq(false))
            .select(Category::as_select())
            .load(&mut conn)?;

        let product_rows = products::table
            .filter(products::establishment_id.eq(est_id))
            .filter(products::is_deleted.eq(false))
            .filter(products::is_available.eq(true))
            .select(Product::as_select())
            .load(&mut conn)?;
        let product_ids: Vec<i64> = product_rows.iter().map(|p| p.id).collect();

        let variant_rows = variants::table
            .filter(variants::product_id.eq_any(&product_ids))
            .filter(variants::is_deleted.eq(false))
            .select(Variant::as_select())
            .load(&mut conn)?;

        let allergen_rows = allergens::table
            .filter(allergens::establishment_id.eq(est_id))
            .filter(allergens::is_deleted.eq(false))
            .select(Allergen::as_select())
            .load(&mut conn)?;

        let links = product_allergens::table
            .filter(product_allergens::product_id.eq_any(&product_ids))
            .select((product_allergens::product_id, product_allergens::allergen_id))
            .load::<(i64, i64)>(&mut conn)?;

        let category_ids: Vec<i64> = category_rows.iter().map(|c| c.id).collect();
        let variant_ids: Vec<i64> = variant_rows.iter().map(|v| v.id).collect();
        let allergen_ids: Vec<i64> = allergen_rows.iter().map(|a| a.id).collect();

        let source = MenuSource {
            category_translations: load_category_translations(&mut conn, &category_ids)?,
            product_translations: load_product_translations(&mut conn, &product_ids)?,
            variant_translations: load_variant_translations(&mut conn, &variant_ids)?,
            allergen_translations: load_allergen_translations(&mut conn, &allergen_ids)?,
            establishment: msg.establishment,
            categories: category_rows,
            products: product_rows,
            variants: variant_rows,
            allergens: allergen_rows,
            product_allergens: links,
        };

        debug!(establishment_id = est_id, language = %msg.language, "menu assembled from database");
        Ok(assemble(source, &msg.language))
    }
}
