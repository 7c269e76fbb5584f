use std::collections::BTreeSet;

use serde::Deserialize;

use crate::errors::ApiError;
use crate::order_flow::{check_line_count, MAX_QUANTITY};
use crate::services::views::Translation;
use crate::types::{OrderStatus, Role};
use crate::validation;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub establishment_id: Option<i64>,
}

impl RegisterBody {
    pub fn validated(self) -> Result<Self, ApiError> {
        validation::password(&self.password)?;
        Ok(Self {
            email: validation::email(&self.email)?,
            full_name: validation::name("Full name", &self.full_name)?,
            ..self
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct EstablishmentBody {
    pub slug: String,
    pub name: String,
    pub default_language: String,
    pub table_count: i32,
    pub currency: String,
}

impl EstablishmentBody {
    pub fn validated(self) -> Result<Self, ApiError> {
        Ok(Self {
            slug: validation::slug(&self.slug)?,
            name: validation::name("Name", &self.name)?,
            default_language: validation::language(&self.default_language)?,
            table_count: validation::table_count(self.table_count)?,
            currency: validation::currency(&self.currency)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct EstablishmentUpdateBody {
    pub name: String,
    pub default_language: String,
    pub table_count: i32,
    pub currency: String,
}

impl EstablishmentUpdateBody {
    pub fn validated(self) -> Result<Self, ApiError> {
        Ok(Self {
            name: validation::name("Name", &self.name)?,
            default_language: validation::language(&self.default_language)?,
            table_count: validation::table_count(self.table_count)?,
            currency: validation::currency(&self.currency)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    #[serde(default)]
    pub position: i32,
    pub translations: Vec<Translation>,
}

impl CategoryBody {
    pub fn validated(self) -> Result<Self, ApiError> {
        Ok(Self {
            translations: validation::translations(&self.translations)?,
            ..self
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductBody {
    pub category_id: i64,
    pub price: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub position: i32,
    pub translations: Vec<Translation>,
    #[serde(default)]
    pub allergen_ids: Vec<i64>,
}

impl ProductBody {
    pub fn validated(self) -> Result<Self, ApiError> {
        let allergen_ids: BTreeSet<i64> = self.allergen_ids.iter().copied().collect();
        Ok(Self {
            price: validation::price(self.price)?,
            image_url: validation::image_url(self.image_url.as_deref())?,
            translations: validation::translations(&self.translations)?,
            allergen_ids: allergen_ids.into_iter().collect(),
            ..self
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct VariantBody {
    pub price: i32,
    #[serde(default)]
    pub position: i32,
    pub translations: Vec<Translation>,
}

impl VariantBody {
    pub fn validated(self) -> Result<Self, ApiError> {
        Ok(Self {
            price: validation::price(self.price)?,
            translations: validation::translations(&self.translations)?,
            ..self
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AllergenBody {
    pub code: String,
    pub translations: Vec<Translation>,
}

impl AllergenBody {
    pub fn validated(self) -> Result<Self, ApiError> {
        Ok(Self {
            code: validation::allergen_code(&self.code)?,
            translations: validation::translations(&self.translations)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineBody {
    pub product_id: i64,
    #[serde(default)]
    pub variant_id: Option<i64>,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderBody {
    pub establishment: String,
    pub table_number: i32,
    #[serde(default)]
    pub note: Option<String>,
    pub items: Vec<OrderLineBody>,
}

impl PlaceOrderBody {
    pub fn validated(self) -> Result<Self, ApiError> {
        check_line_count(self.items.len())?;
        if self.table_number < 1 {
            return Err(ApiError::validation("Table number must be positive"));
        }
        if let Some(line) = self
            .items
            .iter()
            .find(|line| !(1..=MAX_QUANTITY).contains(&line.quantity))
        {
            return Err(ApiError::validation(format!(
                "Quantity of product {} must be between 1 and {MAX_QUANTITY}",
                line.product_id
            )));
        }

        Ok(Self {
            establishment: self.establishment.trim().to_lowercase(),
            note: validation::note(self.note.as_deref())?,
            ..self
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    #[serde(default)]
    pub category_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order(items: serde_json::Value) -> Result<PlaceOrderBody, ApiError> {
        serde_json::from_value::<PlaceOrderBody>(json!({
            "establishment": " Trattoria ",
            "table_number": 4,
            "note": "  ",
            "items": items,
        }))
        .unwrap()
        .validated()
    }

    #[test]
    fn order_body_is_normalised() {
        let body = order(json!([{"product_id": 1, "quantity": 2}])).unwrap();

        assert_eq!(body.establishment, "trattoria");
        assert_eq!(body.note, None);
        assert_eq!(body.items[0].variant_id, None);
    }

    #[test]
    fn order_body_rejects_bad_lines() {
        assert!(order(json!([])).is_err());
        assert!(order(json!([{"product_id": 1, "quantity": 0}])).is_err());
        assert!(order(json!([{"product_id": 1, "quantity": 100}])).is_err());
    }

    #[test]
    fn product_body_defaults_and_dedup() {
        let body: ProductBody = serde_json::from_value(json!({
            "category_id": 3,
            "price": 850,
            "translations": [{"language": "en", "name": "Fries"}],
            "allergen_ids": [4, 2, 4],
        }))
        .unwrap();
        let body = body.validated().unwrap();

        assert!(body.is_available);
        assert_eq!(body.position, 0);
        assert_eq!(body.allergen_ids, vec![2, 4]);
    }

    #[test]
    fn negative_prices_are_rejected() {
        let body: VariantBody = serde_json::from_value(json!({
            "price": -5,
            "translations": [{"language": "en", "name": "Large"}],
        }))
        .unwrap();
        assert!(matches!(body.validated(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn register_body_checks_credentials() {
        let body: RegisterBody = serde_json::from_value(json!({
            "email": "Cook@Example.com",
            "password": "12345678",
            "full_name": " Ana ",
            "role": "kitchen",
        }))
        .unwrap();
        let body = body.validated().unwrap();
        assert_eq!(body.email, "cook@example.com");
        assert_eq!(body.full_name, "Ana");
        assert_eq!(body.role, Role::Kitchen);

        let weak: RegisterBody = serde_json::from_value(json!({
            "email": "cook@example.com",
            "password": "123",
            "full_name": "Ana",
            "role": "kitchen",
        }))
        .unwrap();
        assert!(weak.validated().is_err());
    }

    #[test]
    fn establishment_language_is_two_letters() {
        let body = |language: &str| {
            serde_json::from_value::<EstablishmentBody>(json!({
                "slug": "trattoria",
                "name": "Trattoria",
                "default_language": language,
                "table_count": 12,
                "currency": "eur",
            }))
            .unwrap()
        };

        assert_eq!(body("IT").validated().unwrap().default_language, "it");
        assert!(matches!(body("english").validated(), Err(ApiError::Validation(_))));
        assert!(body("pt-br").validated().is_err());
    }

    #[test]
    fn unknown_status_fails_to_deserialize() {
        assert!(serde_json::from_value::<StatusBody>(json!({"status": "shipped"})).is_err());
    }
}
