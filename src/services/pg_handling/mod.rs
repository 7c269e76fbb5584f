//! `PgActor` message handlers, one file per resource.

use diesel::prelude::*;
use diesel::PgConnection;

use crate::errors::ApiError;
use crate::menu::TranslationMap;
use crate::services::db_models::{Allergen, Category, Product, Variant};
use crate::services::insertable::{
    NewAllergenTranslation, NewCategoryTranslation, NewProductTranslation, NewVariantTranslation,
};
use crate::services::views::Translation;

mod allergens;
mod catalog;
mod establishments;
mod menu;
mod orders;
mod users;

type TranslationRow = (i64, String, String, Option<String>);

fn group_translations(rows: Vec<TranslationRow>) -> TranslationMap {
    let mut map = TranslationMap::new();
    for (owner, language, name, description) in rows {
        map.entry(owner)
            .or_default()
            .push(Translation::from_row((language, name, description)));
    }
    map
}

/// Load/replace pair for one `*_translations` table.
macro_rules! translation_ops {
    ($load:ident, $replace:ident, $table:ident, $owner:ident, $new:ident) => {
        fn $load(conn: &mut PgConnection, ids: &[i64]) -> QueryResult<TranslationMap> {
            use crate::schema::$table::dsl::{
                $owner as owner, $table as translations, description, id, language, name,
            };

            let rows = translations
                .filter(owner.eq_any(ids))
                .order(id)
                .select((owner, language, name, description))
                .load::<TranslationRow>(conn)?;

            Ok(group_translations(rows))
        }

        fn $replace(conn: &mut PgConnection, owner_id: i64, values: &[Translation]) -> QueryResult<()> {
            use crate::schema::$table::dsl::{$owner as owner, $table as translations};

            diesel::delete(translations.filter(owner.eq(owner_id))).execute(conn)?;

            let rows: Vec<$new> = values
                .iter()
                .map(|t| $new {
                    $owner: owner_id,
                    language: &t.language,
                    name: &t.name,
                    description: t.description.as_deref(),
                })
                .collect();

            if !rows.is_empty() {
                diesel::insert_into(translations).values(&rows).execute(conn)?;
            }
            Ok(())
        }
    };
}

translation_ops!(
    load_category_translations,
    replace_category_translations,
    category_translations,
    category_id,
    NewCategoryTranslation
);
translation_ops!(
    load_product_translations,
    replace_product_translations,
    product_translations,
    product_id,
    NewProductTranslation
);
translation_ops!(
    load_variant_translations,
    replace_variant_translations,
    variant_translations,
    variant_id,
    NewVariantTranslation
);
translation_ops!(
    load_allergen_translations,
    replace_allergen_translations,
    allergen_translations,
    allergen_id,
    NewAllergenTranslation
);

fn find_category(
    conn: &mut PgConnection,
    establishment_id: i64,
    category_id: i64,
) -> Result<Category, ApiError> {
    use crate::schema::categories::dsl;

    dsl::categories
        .filter(dsl::id.eq(category_id))
        .filter(dsl::establishment_id.eq(establishment_id))
        .filter(dsl::is_deleted.eq(false))
        .select(Category::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found(format!("Category {category_id} not found")))
}

fn find_product(
    conn: &mut PgConnection,
    establishment_id: i64,
    product_id: i64,
) -> Result<Product, ApiError> {
    use crate::schema::products::dsl;

    dsl::products
        .filter(dsl::id.eq(product_id))
        .filter(dsl::establishment_id.eq(establishment_id))
        .filter(dsl::is_deleted.eq(false))
        .select(Product::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found(format!("Product {product_id} not found")))
}

fn find_variant(
    conn: &mut PgConnection,
    establishment_id: i64,
    variant_id: i64,
) -> Result<Variant, ApiError> {
    use crate::schema::{products, variants};

    variants::table
        .inner_join(products::table)
        .filter(variants::id.eq(variant_id))
        .filter(variants::is_deleted.eq(false))
        .filter(products::establishment_id.eq(establishment_id))
        .filter(products::is_deleted.eq(false))
        .select(Variant::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found(format!("Variant {variant_id} not found")))
}

fn find_allergen(
    conn: &mut PgConnection,
    establishment_id: i64,
    allergen_id: i64,
) -> Result<Allergen, ApiError> {
    use crate::schema::allergens::dsl;

    dsl::allergens
        .filter(dsl::id.eq(allergen_id))
        .filter(dsl::establishment_id.eq(establishment_id))
        .filter(dsl::is_deleted.eq(false))
        .select(Allergen::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found(format!("Allergen {allergen_id} not found")))
}

fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}
