//! Builds the public menu out of the rows loaded for one establishment.

use std::collections::{BTreeSet, HashMap};

use crate::services::db_models::{Allergen, Category, Establishment, Product, Variant};
use crate::services::views::{
    MenuAllergen, MenuCategory, MenuProduct, MenuVariant, MenuView, PublicEstablishment,
    Translation,
};

pub type TranslationMap = HashMap<i64, Vec<Translation>>;

pub struct MenuSource {
    pub establishment: Establishment,
    pub categories: Vec<Category>,
    pub category_translations: TranslationMap,
    pub products: Vec<Product>,
    pub product_translations: TranslationMap,
    pub variants: Vec<Variant>,
    pub variant_translations: TranslationMap,
    pub allergens: Vec<Allergen>,
    pub allergen_translations: TranslationMap,
    /// `(product_id, allergen_id)` links.
    pub product_allergens: Vec<(i64, i64)>,
}

/// Requested language first, then the establishment default, then whatever exists.
pub fn resolve_translation<'a>(
    translations: &'a [Translation],
    requested: &str,
    fallback: &str,
) -> Option<&'a Translation> {
    translations
        .iter()
        .find(|t| t.language == requested)
        .or_else(|| translations.iter().find(|t| t.language == fallback))
        .or_else(|| translations.first())
}

struct Resolver<'a> {
    requested: &'a str,
    fallback: &'a str,
}

impl Resolver<'_> {
    fn text(&self, map: &TranslationMap, id: i64) -> (String, Option<String>) {
        map.get(&id)
            .and_then(|translations| resolve_translation(translations, self.requested, self.fallback))
            .map(|t| (t.name.clone(), t.description.clone()))
            .unwrap_or_default()
    }
}

/// Every language the menu can be shown in, sorted.
fn offered_languages(source: &MenuSource) -> Vec<String> {
    let mut languages: BTreeSet<&str> = [
        &source.category_translations,
        &source.product_translations,
        &source.variant_translations,
        &source.allergen_translations,
    ]
    .into_iter()
    .flat_map(|map| map.values().flatten())
    .map(|t| t.language.as_str())
    .collect();
    languages.insert(source.establishment.default_language.as_str());

    languages.into_iter().map(str::to_owned).collect()
}

/// Builds the menu in `language`; languages the menu has no text for
/// collapse to the establishment default.
pub fn assemble(source: MenuSource, language: &str) -> MenuView {
    let languages = offered_languages(&source);
    let est = source.establishment;
    let language = if languages.iter().any(|l| l == language) {
        language
    } else {
        est.default_language.as_str()
    };
    let resolver = Resolver { requested: language, fallback: &est.default_language };

    let mut allergens_by_id: HashMap<i64, MenuAllergen> = HashMap::new();
    for allergen in source.allergens.iter().filter(|a| !a.is_deleted) {
        let (name, _) = resolver.text(&source.allergen_translations, allergen.id);
        allergens_by_id.insert(
            allergen.id,
            MenuAllergen { id: allergen.id, code: allergen.code.clone(), name },
        );
    }

    let mut allergens_of: HashMap<i64, Vec<MenuAllergen>> = HashMap::new();
    for (product_id, allergen_id) in &source.product_allergens {
        if let Some(allergen) = allergens_by_id.get(allergen_id) {
            allergens_of.entry(*product_id).or_default().push(allergen.clone());
        }
    }
    for list in allergens_of.values_mut() {
        list.sort_by(|a, b| a.code.cmp(&b.code));
    }

    let mut variants_of: HashMap<i64, Vec<&Variant>> = HashMap::new();
    for variant in source.variants.iter().filter(|v| !v.is_deleted) {
        variants_of.entry(variant.product_id).or_default().push(variant);
    }

    let mut products_of: HashMap<i64, Vec<MenuProduct>> = HashMap::new();
    let mut products: Vec<&Product> = source
        .products
        .iter()
        .filter(|p| !p.is_deleted && p.is_available)
        .collect();
    products.sort_by_key(|p| (p.position, p.id));

    for product in products {
        let (name, description) = resolver.text(&source.product_translations, product.id);

        let mut variants = variants_of.remove(&product.id).unwrap_or_default();
        variants.sort_by_key(|v| (v.position, v.id));
        let variants = variants
            .into_iter()
            .map(|v| MenuVariant {
                id: v.id,
                name: resolver.text(&source.variant_translations, v.id).0,
                price: v.price,
            })
            .collect();

        products_of.entry(product.category_id).or_default().push(MenuProduct {
            id: product.id,
            name,
            description,
            price: product.price,
            image_url: product.image_url.clone(),
            variants,
            allergens: allergens_of.remove(&product.id).unwrap_or_default(),
        });
    }

    let mut categories: Vec<&Category> = source.categories.iter().filter(|c| !c.is_deleted).collect();
    categories.sort_by_key(|c| (c.position, c.id));

    let categories = categories
        .into_iter()
        .filter_map(|category| {
            let products = products_of.remove(&category.id)?;
            let (name, description) = resolver.text(&source.category_translations, category.id);
            Some(MenuCategory { id: category.id, name, description, products })
        })
        .collect();

    MenuView {
        establishment: PublicEstablishment {
            slug: est.slug.clone(),
            name: est.name.clone(),
            currency: est.currency.clone(),
            table_count: est.table_count,
        },
        language: language.to_owned(),
        languages,
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn tr(language: &str, name: &str) -> Translation {
        Translation { language: language.into(), name: name.into(), description: None }
    }

    fn establishment() -> Establishment {
        Establishment {
            id: 1,
            slug: "trattoria".into(),
            name: "Trattoria".into(),
            default_language: "it".into(),
            table_count: 10,
            currency: "EUR".into(),
            is_deleted: false,
            created_at: NaiveDateTime::default(),
        }
    }

    fn product(id: i64, category_id: i64, position: i32) -> Product {
        Product {
            id,
            establishment_id: 1,
            category_id,
            price: 1000 + i32::try_from(id).unwrap(),
            image_url: None,
            is_available: true,
            position,
            is_deleted: false,
        }
    }

    fn source() -> MenuSource {
        let mut hidden = product(12, 1, 0);
        hidden.is_available = false;
        let mut removed = product(13, 1, 0);
        removed.is_deleted = true;

        MenuSource {
            establishment: establishment(),
            categories: vec![
                Category { id: 2, establishment_id: 1, position: 1, is_deleted: false },
                Category { id: 1, establishment_id: 1, position: 0, is_deleted: false },
                Category { id: 3, establishment_id: 1, position: 2, is_deleted: false },
            ],
            category_translations: HashMap::from([
                (1, vec![tr("it", "Primi"), tr("en", "First courses")]),
                (2, vec![tr("it", "Dolci")]),
            ]),
            products: vec![product(11, 1, 2), product(10, 1, 1), hidden, removed, product(20, 2, 0)],
            product_translations: HashMap::from([
                (10, vec![tr("it", "Lasagne"), tr("en", "Lasagna")]),
                (11, vec![tr("de", "Gnocchi")]),
                (20, vec![tr("it", "Tiramisù")]),
            ]),
            variants: vec![
                Variant { id: 101, product_id: 10, price: 1500, position: 1, is_deleted: false },
                Variant { id: 100, product_id: 10, price: 1100, position: 0, is_deleted: false },
                Variant { id: 102, product_id: 10, price: 1900, position: 2, is_deleted: true },
            ],
            variant_translations: HashMap::from([(100, vec![tr("en", "Small")])]),
            allergens: vec![
                Allergen { id: 5, establishment_id: 1, code: "GLUTEN".into(), is_deleted: false },
                Allergen { id: 6, establishment_id: 1, code: "EGG".into(), is_deleted: false },
                Allergen { id: 7, establishment_id: 1, code: "NUTS".into(), is_deleted: true },
            ],
            allergen_translations: HashMap::from([(5, vec![tr("en", "Gluten")])]),
            product_allergens: vec![(10, 5), (10, 6), (10, 7)],
        }
    }

    #[test]
    fn translation_fallback_order() {
        let translations = [tr("de", "Suppe"), tr("it", "Zuppa"), tr("en", "Soup")];

        assert_eq!(resolve_translation(&translations, "en", "it").unwrap().name, "Soup");
        assert_eq!(resolve_translation(&translations, "fr", "it").unwrap().name, "Zuppa");
        assert_eq!(
            resolve_translation(&translations[..1], "fr", "it").unwrap().name,
            "Suppe"
        );
        assert!(resolve_translation(&[], "en", "it").is_none());
    }

    #[test]
    fn categories_and_products_follow_position() {
        let menu = assemble(source(), "en");

        let names: Vec<_> = menu.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["First courses", "Dolci"]);

        let products: Vec<_> = menu.categories[0].products.iter().map(|p| p.id).collect();
        assert_eq!(products, [10, 11]);
    }

    #[test]
    fn hidden_deleted_and_empty_entries_are_skipped() {
        let menu = assemble(source(), "en");

        assert!(menu.categories.iter().all(|c| c.id != 3));
        let ids: Vec<_> = menu
            .categories
            .iter()
            .flat_map(|c| c.products.iter().map(|p| p.id))
            .collect();
        assert!(!ids.contains(&12));
        assert!(!ids.contains(&13));
    }

    #[test]
    fn product_details_are_resolved() {
        let menu = assemble(source(), "en");
        let lasagna = &menu.categories[0].products[0];

        assert_eq!(lasagna.name, "Lasagna");
        assert_eq!(
            lasagna.variants,
            vec![
                MenuVariant { id: 100, name: "Small".into(), price: 1100 },
                MenuVariant { id: 101, name: String::new(), price: 1500 },
            ]
        );
        let codes: Vec<_> = lasagna.allergens.iter().map(|a| a.code.as_str()).collect();
        assert_eq!(codes, ["EGG", "GLUTEN"]);
        assert_eq!(menu.categories[0].products[1].name, "Gnocchi");
        assert_eq!(menu.establishment.currency, "EUR");
    }

    #[test]
    fn unknown_language_collapses_to_default() {
        let menu = assemble(source(), "fr");

        assert_eq!(menu.language, "it");
        assert_eq!(menu.languages, ["de", "en", "it"]);
        assert_eq!(menu.categories[0].name, "Primi");
        assert_eq!(menu.categories[0].products[0].name, "Lasagne");
    }

    #[test]
    fn offered_language_is_kept() {
        let menu = assemble(source(), "de");

        assert_eq!(menu.language, "de");
        assert_eq!(menu.categories[0].products[1].name, "Gnocchi");
    }
}
