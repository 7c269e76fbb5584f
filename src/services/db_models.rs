use chrono::NaiveDateTime;
use diesel::{Queryable, Selectable};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::types::{OrderStatus, Role};

#[derive(Queryable, Selectable, Debug, Clone, Serialize)]
#[diesel(table_name = crate::schema::establishments)]
pub struct Establishment {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub default_language: String,
    pub table_count: i32,
    pub currency: String,
    pub is_deleted: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: i64,
    pub establishment_id: Option<i64>,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub is_deleted: bool,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn role(&self) -> Result<Role, ApiError> {
        self.role
            .parse()
            .map_err(|err| ApiError::Internal(format!("User {} has {err}", self.id)))
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::categories)]
pub struct Category {
    pub id: i64,
    pub establishment_id: i64,
    pub position: i32,
    pub is_deleted: bool,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::products)]
pub struct Product {
    pub id: i64,
    pub establishment_id: i64,
    pub category_id: i64,
    pub price: i32,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub position: i32,
    pub is_deleted: bool,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::variants)]
pub struct Variant {
    pub id: i64,
    pub product_id: i64,
    pub price: i32,
    pub position: i32,
    pub is_deleted: bool,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::allergens)]
pub struct Allergen {
    pub id: i64,
    pub establishment_id: i64,
    pub code: String,
    pub is_deleted: bool,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::orders)]
pub struct Order {
    pub id: i64,
    pub establishment_id: i64,
    pub public_code: Uuid,
    pub table_number: i32,
    pub status: String,
    pub total: i32,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Order {
    pub fn status(&self) -> Result<OrderStatus, ApiError> {
        self.status
            .parse()
            .map_err(|err| ApiError::Internal(format!("Order {} has {err}", self.id)))
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::order_items)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub name: String,
    pub quantity: i32,
    pub unit_price: i32,
}
