use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::db_models::{Establishment, User};
use crate::types::{OrderStatus, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub language: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Translation {
    pub fn from_row((language, name, description): (String, String, Option<String>)) -> Self {
        Self { language, name, description }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstablishmentView {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub default_language: String,
    pub table_count: i32,
    pub currency: String,
}

impl From<Establishment> for EstablishmentView {
    fn from(est: Establishment) -> Self {
        Self {
            id: est.id,
            slug: est.slug,
            name: est.name,
            default_language: est.default_language,
            table_count: est.table_count,
            currency: est.currency,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: i64,
    pub establishment_id: Option<i64>,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: NaiveDateTime,
}

impl TryFrom<User> for UserView {
    type Error = crate::errors::ApiError;

    fn try_from(user: User) -> Result<Self, Self::Error> {
        let role = user.role()?;
        Ok(Self {
            id: user.id,
            establishment_id: user.establishment_id,
            email: user.email,
            full_name: user.full_name,
            role,
            created_at: user.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryAdminView {
    pub id: i64,
    pub position: i32,
    pub translations: Vec<Translation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantAdminView {
    pub id: i64,
    pub product_id: i64,
    pub price: i32,
    pub position: i32,
    pub translations: Vec<Translation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductAdminView {
    pub id: i64,
    pub category_id: i64,
    pub price: i32,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub position: i32,
    pub translations: Vec<Translation>,
    pub allergen_ids: Vec<i64>,
    pub variants: Vec<VariantAdminView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllergenAdminView {
    pub id: i64,
    pub code: String,
    pub translations: Vec<Translation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuView {
    pub establishment: PublicEstablishment,
    pub language: String,
    /// Languages with at least one translation, default included.
    pub languages: Vec<String>,
    pub categories: Vec<MenuCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicEstablishment {
    pub slug: String,
    pub name: String,
    pub currency: String,
    pub table_count: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuCategory {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub products: Vec<MenuProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuProduct {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i32,
    pub image_url: Option<String>,
    pub variants: Vec<MenuVariant>,
    pub allergens: Vec<MenuAllergen>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuVariant {
    pub id: i64,
    pub name: String,
    pub price: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuAllergen {
    pub id: i64,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItemView {
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub name: String,
    pub quantity: i32,
    pub unit_price: i32,
    pub line_total: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: i64,
    pub public_code: Uuid,
    pub establishment_id: i64,
    pub table_number: i32,
    pub status: OrderStatus,
    pub total: i32,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub items: Vec<OrderItemView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QrTarget {
    pub table_number: i32,
    pub url: String,
}
