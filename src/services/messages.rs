use actix::Message;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::services::db_models::{Establishment, User};
use crate::services::payloads::{
    AllergenBody, CategoryBody, EstablishmentBody, EstablishmentUpdateBody, PlaceOrderBody,
    ProductBody, VariantBody,
};
use crate::services::views::{
    AllergenAdminView, CategoryAdminView, EstablishmentView, MenuView, OrderView,
    ProductAdminView, UserView, VariantAdminView,
};
use crate::types::{OrderStatus, Role};

// establishments

#[derive(Message)]
#[rtype(result = "Result<EstablishmentView, ApiError>")]
pub struct CreateEstablishment(pub EstablishmentBody);

#[derive(Message)]
#[rtype(result = "Result<Establishment, ApiError>")]
pub struct FetchEstablishment(pub i64);

#[derive(Message)]
#[rtype(result = "Result<Establishment, ApiError>")]
pub struct FetchEstablishmentBySlug(pub String);

#[derive(Message)]
#[rtype(result = "Result<EstablishmentView, ApiError>")]
pub struct UpdateEstablishment {
    pub establishment_id: i64,
    pub body: EstablishmentUpdateBody,
}

// users

#[derive(Message)]
#[rtype(result = "Result<UserView, ApiError>")]
pub struct AddUser {
    pub establishment_id: Option<i64>,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
}

#[derive(Message)]
#[rtype(result = "Result<User, ApiError>")]
pub struct FetchUserByEmail(pub String);

#[derive(Message)]
#[rtype(result = "Result<UserView, ApiError>")]
pub struct FetchUser(pub i64);

#[derive(Message)]
#[rtype(result = "Result<Vec<UserView>, ApiError>")]
pub struct FetchStaff(pub i64);

#[derive(Message)]
#[rtype(result = "Result<(), ApiError>")]
pub struct DeactivateUser {
    pub establishment_id: i64,
    pub user_id: i64,
}

/// Creates the platform super-admin unless an account with that email exists.
#[derive(Message)]
#[rtype(result = "Result<bool, ApiError>")]
pub struct EnsureSuperAdmin {
    pub email: String,
    pub password_hash: String,
}

// catalog

#[derive(Message)]
#[rtype(result = "Result<Vec<CategoryAdminView>, ApiError>")]
pub struct FetchCategories(pub i64);

#[derive(Message)]
#[rtype(result = "Result<CategoryAdminView, ApiError>")]
pub struct CreateCategory {
    pub establishment_id: i64,
    pub body: CategoryBody,
}

#[derive(Message)]
#[rtype(result = "Result<CategoryAdminView, ApiError>")]
pub struct UpdateCategory {
    pub establishment_id: i64,
    pub category_id: i64,
    pub body: CategoryBody,
}

#[derive(Message)]
#[rtype(result = "Result<(), ApiError>")]
pub struct DeleteCategory {
    pub establishment_id: i64,
    pub category_id: i64,
}

#[derive(Message)]
#[rtype(result = "Result<Vec<ProductAdminView>, ApiError>")]
pub struct FetchProducts {
    pub establishment_id: i64,
    pub category_id: Option<i64>,
}

#[derive(Message)]
#[rtype(result = "Result<ProductAdminView, ApiError>")]
pub struct FetchProduct {
    pub establishment_id: i64,
    pub product_id: i64,
}

#[derive(Message)]
#[rtype(result = "Result<ProductAdminView, ApiError>")]
pub struct CreateProduct {
    pub establishment_id: i64,
    pub body: ProductBody,
}

#[derive(Message)]
#[rtype(result = "Result<ProductAdminView, ApiError>")]
pub struct UpdateProduct {
    pub establishment_id: i64,
    pub product_id: i64,
    pub body: ProductBody,
}

#[derive(Message)]
#[rtype(result = "Result<(), ApiError>")]
pub struct DeleteProduct {
    pub establishment_id: i64,
    pub product_id: i64,
}

#[derive(Message)]
#[rtype(result = "Result<VariantAdminView, ApiError>")]
pub struct CreateVariant {
    pub establishment_id: i64,
    pub product_id: i64,
    pub body: VariantBody,
}

#[derive(Message)]
#[rtype(result = "Result<VariantAdminView, ApiError>")]
pub struct UpdateVariant {
    pub establishment_id: i64,
    pub variant_id: i64,
    pub body: VariantBody,
}

#[derive(Message)]
#[rtype(result = "Result<(), ApiError>")]
pub struct DeleteVariant {
    pub establishment_id: i64,
    pub variant_id: i64,
}

// allergens

#[derive(Message)]
#[rtype(result = "Result<Vec<AllergenAdminView>, ApiError>")]
pub struct FetchAllergens(pub i64);

#[derive(Message)]
#[rtype(result = "Result<AllergenAdminView, ApiError>")]
pub struct CreateAllergen {
    pub establishment_id: i64,
    pub body: AllergenBody,
}

#[derive(Message)]
#[rtype(result = "Result<AllergenAdminView, ApiError>")]
pub struct UpdateAllergen {
    pub establishment_id: i64,
    pub allergen_id: i64,
    pub body: AllergenBody,
}

#[derive(Message)]
#[rtype(result = "Result<(), ApiError>")]
pub struct DeleteAllergen {
    pub establishment_id: i64,
    pub allergen_id: i64,
}

// menu

#[derive(Message)]
#[rtype(result = "Result<MenuView, ApiError>")]
pub struct FetchMenu {
    pub establishment: Establishment,
    pub language: String,
}

// orders

#[derive(Message)]
#[rtype(result = "Result<OrderView, ApiError>")]
pub struct PlaceOrder(pub PlaceOrderBody);

#[derive(Message)]
#[rtype(result = "Result<OrderView, ApiError>")]
pub struct FetchOrderByCode(pub Uuid);

#[derive(Message)]
#[rtype(result = "Result<OrderView, ApiError>")]
pub struct FetchOrder {
    pub establishment_id: i64,
    pub order_id: i64,
}

#[derive(Message)]
#[rtype(result = "Result<Vec<OrderView>, ApiError>")]
pub struct FetchOrders {
    pub establishment_id: i64,
    pub status: Option<OrderStatus>,
    pub active_only: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum StatusChange {
    Advance,
    Cancel,
    Set(OrderStatus),
}

#[derive(Message)]
#[rtype(result = "Result<OrderView, ApiError>")]
pub struct ChangeOrderStatus {
    pub establishment_id: i64,
    pub order_id: i64,
    pub role: Role,
    pub change: StatusChange,
}
