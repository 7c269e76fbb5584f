use chrono::NaiveDateTime;
use diesel::{AsChangeset, Insertable};
use uuid::Uuid;

use crate::schema::{
    allergen_translations, allergens, categories, category_translations, establishments,
    order_items, orders, product_allergens, product_translations, products, users,
    variant_translations, variants,
};

#[derive(Insertable, Clone)]
#[diesel(table_name = establishments)]
pub struct NewEstablishment {
    pub slug: String,
    pub name: String,
    pub default_language: String,
    pub table_count: i32,
    pub currency: String,
}

#[derive(AsChangeset, Clone)]
#[diesel(table_name = establishments)]
pub struct EstablishmentChanges {
    pub name: String,
    pub default_language: String,
    pub table_count: i32,
    pub currency: String,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub establishment_id: Option<i64>,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = categories)]
pub struct NewCategory {
    pub establishment_id: i64,
    pub position: i32,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = category_translations)]
pub struct NewCategoryTranslation<'a> {
    pub category_id: i64,
    pub language: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = products)]
pub struct NewProduct {
    pub establishment_id: i64,
    pub category_id: i64,
    pub price: i32,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub position: i32,
}

#[derive(AsChangeset, Clone)]
#[diesel(table_name = products, treat_none_as_null = true)]
pub struct ProductChanges {
    pub category_id: i64,
    pub price: i32,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub position: i32,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = product_translations)]
pub struct NewProductTranslation<'a> {
    pub product_id: i64,
    pub language: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = product_allergens)]
pub struct ProductAllergenMapping {
    pub product_id: i64,
    pub allergen_id: i64,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = variants)]
pub struct NewVariant {
    pub product_id: i64,
    pub price: i32,
    pub position: i32,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = variant_translations)]
pub struct NewVariantTranslation<'a> {
    pub variant_id: i64,
    pub language: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = allergens)]
pub struct NewAllergen {
    pub establishment_id: i64,
    pub code: String,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = allergen_translations)]
pub struct NewAllergenTranslation<'a> {
    pub allergen_id: i64,
    pub language: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub establishment_id: i64,
    pub public_code: Uuid,
    pub table_number: i32,
    pub status: String,
    pub total: i32,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = order_items)]
pub struct NewOrderItem {
    pub order_id: i64,
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub name: String,
    pub quantity: i32,
    pub unit_price: i32,
}
