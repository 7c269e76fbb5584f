use std::collections::{HashMap, HashSet};

use actix::Handler;
use diesel::prelude::*;
use tracing::{info, warn};
use uuid::Uuid;

use super::{load_product_translations, load_variant_translations, now};
use crate::errors::ApiError;
use crate::menu::{resolve_translation, TranslationMap};
use crate::order_flow::{self, order_total};
use crate::services::db_models::{Establishment, Order, OrderItem, Product, Variant};
use crate::services::db_utils::PgActor;
use crate::services::insertable::{NewOrder, NewOrderItem};
use crate::services::messages::{
    ChangeOrderStatus, FetchOrder, FetchOrderByCode, FetchOrders, PlaceOrder, StatusChange,
};
use crate::services::payloads::OrderLineBody;
use crate::services::views::{OrderItemView, OrderView};
use crate::types::OrderStatus;

const ORDER_LIST_LIMIT: i64 = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
struct PricedLine {
    product_id: i64,
    variant_id: Option<i64>,
    name: String,
    quantity: i32,
    unit_price: i32,
}

/// Everything needed to price the lines of one order.
struct Catalog<'a> {
    products: &'a HashMap<i64, Product>,
    variants: &'a HashMap<i64, Variant>,
    with_variants: &'a HashSet<i64>,
    product_names: &'a TranslationMap,
    variant_names: &'a TranslationMap,
    language: &'a str,
}

impl Catalog<'_> {
    fn name_of(&self, map: &TranslationMap, id: i64) -> Option<String> {
        map.get(&id)
            .and_then(|list| resolve_translation(list, self.language, self.language))
            .map(|t| t.name.clone())
    }

    fn price(&self, lines: &[OrderLineBody]) -> Result<Vec<PricedLine>, ApiError> {
        lines.iter().map(|line| self.price_line(line)).collect()
    }

    fn price_line(&self, line: &OrderLineBody) -> Result<PricedLine, ApiError> {
        let product = self
            .products
            .get(&line.product_id)
            .filter(|p| !p.is_deleted)
            .ok_or_else(|| ApiError::not_found(format!("Product {} not found", line.product_id)))?;

        let product_name = self
            .name_of(self.product_names, product.id)
            .unwrap_or_else(|| format!("Product {}", product.id));

        if !product.is_available {
            return Err(ApiError::validation(format!("{product_name} is not available")));
        }

        match line.variant_id {
            Some(variant_id) => {
                let variant = self
                    .variants
                    .get(&variant_id)
                    .filter(|v| v.product_id == product.id && !v.is_deleted)
                    .ok_or_else(|| {
                        ApiError::validation(format!(
                            "Variant {variant_id} does not belong to {product_name}"
                        ))
                    })?;

                let name = match self.name_of(self.variant_names, variant.id) {
                    Some(variant_name) => format!("{product_name} ({variant_name})"),
                    None => product_name,
                };

                Ok(PricedLine {
                    product_id: product.id,
                    variant_id: Some(variant.id),
                    name,
                    quantity: line.quantity,
                    unit_price: variant.price,
                })
            }
            None if self.with_variants.contains(&product.id) => Err(ApiError::validation(
                format!("{product_name} requires a variant"),
            )),
            None => Ok(PricedLine {
                product_id: product.id,
                variant_id: None,
                name: product_name,
                quantity: line.quantity,
                unit_price: product.price,
            }),
        }
    }
}

fn order_views(conn: &mut PgConnection, rows: Vec<Order>) -> Result<Vec<OrderView>, ApiError> {
    use crate::schema::order_items::dsl::{id, order_id, order_items};

    let ids: Vec<i64> = rows.iter().map(|o| o.id).collect();
    let mut items: HashMap<i64, Vec<OrderItemView>> = HashMap::new();
    for item in order_items
        .filter(order_id.eq_any(&ids))
        .order(id)
        .select(OrderItem::as_select())
        .load(conn)?
    {
        items.entry(item.order_id).or_default().push(OrderItemView {
            product_id: item.product_id,
            variant_id: item.variant_id,
            name: item.name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.quantity.saturating_mul(item.unit_price),
        });
    }

    rows.into_iter()
        .map(|order| {
            Ok(OrderView {
                status: order.status()?,
                items: items.remove(&order.id).unwrap_or_default(),
                id: order.id,
                public_code: order.public_code,
                establishment_id: order.establishment_id,
                table_number: order.table_number,
                total: order.total,
                note: order.note,
                created_at: order.created_at,
                updated_at: order.updated_at,
            })
        })
        .collect()
}

fn single_view(conn: &mut PgConnection, order: Order) -> Result<OrderView, ApiError> {
    order_views(conn, vec![order])?
        .pop()
        .ok_or_else(|| ApiError::not_found("Order not found"))
}

fn find_order(conn: &mut PgConnection, est_id: i64, order_pk: i64) -> Result<Order, ApiError> {
    use crate::schema::orders::dsl::{establishment_id, id, orders};

    orders
        .filter(id.eq(order_pk))
        .filter(establishment_id.eq(est_id))
        .select(Order::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Order not found"))
}

/// Outcome of the conditional status update; no row means another writer got there first.
fn status_swapped(order_id: i64, updated: Option<Order>) -> Result<Order, ApiError> {
    updated.ok_or_else(|| {
        warn!(order_id, "order status changed concurrently");
        ApiError::conflict("Order was updated by someone else, reload it")
    })
}

impl Handler<PlaceOrder> for PgActor {
    type Result = Result<OrderView, ApiError>;

    fn handle(&mut self, msg: PlaceOrder, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::establishments::dsl as est;
        use crate::schema::order_items::dsl::order_items;
        use crate::schema::orders::dsl::orders;
        use crate::schema::{products, variants};

        let body = msg.0;
        let mut conn = self.connection()?;

        conn.build_transaction().run(|trx_conn| {
            let establishment = est::establishments
                .filter(est::slug.eq(&body.establishment))
                .filter(est::is_deleted.eq(false))
                .select(Establishment::as_select())
                .first(trx_conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("Establishment not found"))?;

            if body.table_number > establishment.table_count {
                return Err(ApiError::validation(format!(
                    "Table {} does not exist",
                    body.table_number
                )));
            }

            let product_ids: Vec<i64> = body.items.iter().map(|l| l.product_id).collect();
            let variant_ids: Vec<i64> = body.items.iter().filter_map(|l| l.variant_id).collect();

            let product_map: HashMap<i64, Product> = products::table
                .filter(products::id.eq_any(&product_ids))
                .filter(products::establishment_id.eq(establishment.id))
                .select(Product::as_select())
                .load(trx_conn)?
                .into_iter()
                .map(|p| (p.id, p))
                .collect();

            let variant_map: HashMap<i64, Variant> = variants::table
                .filter(variants::id.eq_any(&variant_ids))
                .select(Variant::as_select())
                .load(trx_conn)?
                .into_iter()
                .map(|v| (v.id, v))
                .collect();

            let with_variants: HashSet<i64> = variants::table
                .filter(variants::product_id.eq_any(&product_ids))
                .filter(variants::is_deleted.eq(false))
                .select(variants::product_id)
                .distinct()
                .load::<i64>(trx_conn)?
                .into_iter()
                .collect();

            let product_names = load_product_translations(trx_conn, &product_ids)?;
            let variant_names = load_variant_translations(trx_conn, &variant_ids)?;

            let catalog = Catalog {
                products: &product_map,
                variants: &variant_map,
                with_variants: &with_variants,
                product_names: &product_names,
                variant_names: &variant_names,
                language: &establishment.default_language,
            };
            let lines = catalog.price(&body.items)?;
            let total = order_total(lines.iter().map(|l| (l.quantity, l.unit_price)))?;

            let created_at = now();
            let order = diesel::insert_into(orders)
                .values(NewOrder {
                    establishment_id: establishment.id,
                    public_code: Uuid::new_v4(),
                    table_number: body.table_number,
                    status: OrderStatus::Pending.to_string(),
                    total,
                    note: body.note.clone(),
                    created_at,
                    updated_at: created_at,
                })
                .returning(Order::as_returning())
                .get_result(trx_conn)?;

            let new_items: Vec<NewOrderItem> = lines
                .into_iter()
                .map(|line| NewOrderItem {
                    order_id: order.id,
                    product_id: line.product_id,
                    variant_id: line.variant_id,
                    name: line.name,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                })
                .collect();
            diesel::insert_into(order_items)
                .values(&new_items)
                .execute(trx_conn)?;

            info!(
                order_id = order.id,
                establishment_id = establishment.id,
                table = order.table_number,
                total,
                "order placed"
            );
            single_view(trx_conn, order)
        })
    }
}

impl Handler<FetchOrderByCode> for PgActor {
    type Result = Result<OrderView, ApiError>;

    fn handle(&mut self, msg: FetchOrderByCode, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::orders::dsl::{orders, public_code};

        let mut conn = self.connection()?;

        let order = orders
            .filter(public_code.eq(msg.0))
            .select(Order::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| ApiError::not_found("Order not found"))?;

        single_view(&mut conn, order)
    }
}

impl Handler<FetchOrder> for PgActor {
    type Result = Result<OrderView, ApiError>;

    fn handle(&mut self, msg: FetchOrder, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = self.connection()?;

        let order = find_order(&mut conn, msg.establishment_id, msg.order_id)?;
        single_view(&mut conn, order)
    }
}

impl Handler<FetchOrders> for PgActor {
    type Result = Result<Vec<OrderView>, ApiError>;

    fn handle(&mut self, msg: FetchOrders, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::orders::dsl::{created_at, establishment_id, id, orders, status};

        let mut conn = self.connection()?;

        let mut query = orders
            .filter(establishment_id.eq(msg.establishment_id))
            .select(Order::as_select())
            .into_boxed();
        if let Some(wanted) = msg.status {
            query = query.filter(status.eq(wanted.as_str()));
        }
        if msg.active_only {
            let active: Vec<&str> = OrderStatus::ALL
                .iter()
                .filter(|s| s.is_active())
                .map(OrderStatus::as_str)
                .collect();
            query = query.filter(status.eq_any(active));
        }

        let rows = query
            .order((created_at.desc(), id.desc()))
            .limit(ORDER_LIST_LIMIT)
            .load(&mut conn)?;

        order_views(&mut conn, rows)
    }
}

impl Handler<ChangeOrderStatus> for PgActor {
    type Result = Result<OrderView, ApiError>;

    fn handle(&mut self, msg: ChangeOrderStatus, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::orders::dsl::{id, orders, status, updated_at};

        let mut conn = self.connection()?;

        conn.build_transaction().run(|trx_conn| {
            let order = find_order(trx_conn, msg.establishment_id, msg.order_id)?;
            let current = order.status()?;

            let target = match msg.change {
                StatusChange::Advance => order_flow::advance(msg.role, current)?,
                StatusChange::Cancel => order_flow::cancel(msg.role, current)?,
                StatusChange::Set(requested) => order_flow::set_status(msg.role, current, requested)?,
            };

            let updated = diesel::update(
                orders
                    .filter(id.eq(order.id))
                    .filter(status.eq(current.as_str())),
            )
            .set((status.eq(target.as_str()), updated_at.eq(now())))
            .returning(Order::as_returning())
            .get_result(trx_conn)
            .optional()?;

            let updated = status_swapped(order.id, updated)?;

            info!(order_id = updated.id, from = %current, to = %target, role = %msg.role, "order status changed");
            single_view(trx_conn, updated)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::views::Translation;

    fn product(id: i64, price: i32) -> Product {
        Product {
            id,
            establishment_id: 1,
            category_id: 1,
            price,
            image_url: None,
            is_available: true,
            position: 0,
            is_deleted: false,
        }
    }

    fn named(id: i64, name: &str) -> (i64, Vec<Translation>) {
        (id, vec![Translation { language: "en".into(), name: name.into(), description: None }])
    }

    struct Fixture {
        products: HashMap<i64, Product>,
        variants: HashMap<i64, Variant>,
        with_variants: HashSet<i64>,
        product_names: TranslationMap,
        variant_names: TranslationMap,
    }

    impl Fixture {
        fn new() -> Self {
            let mut sold_out = product(3, 500);
            sold_out.is_available = false;

            Self {
                products: HashMap::from([(1, product(1, 900)), (2, product(2, 300)), (3, sold_out)]),
                variants: HashMap::from([
                    (10, Variant { id: 10, product_id: 1, price: 1200, position: 0, is_deleted: false }),
                    (11, Variant { id: 11, product_id: 1, price: 1500, position: 1, is_deleted: true }),
                ]),
                with_variants: HashSet::from([1]),
                product_names: TranslationMap::from([named(1, "Pizza"), named(2, "Cola")]),
                variant_names: TranslationMap::from([named(10, "Large")]),
            }
        }

        fn catalog(&self) -> Catalog<'_> {
            Catalog {
                products: &self.products,
                variants: &self.variants,
                with_variants: &self.with_variants,
                product_names: &self.product_names,
                variant_names: &self.variant_names,
                language: "en",
            }
        }
    }

    fn line(product_id: i64, variant_id: Option<i64>, quantity: i32) -> OrderLineBody {
        OrderLineBody { product_id, variant_id, quantity }
    }

    #[test]
    fn lines_take_variant_or_product_price() {
        let fixture = Fixture::new();
        let lines = fixture
            .catalog()
            .price(&[line(1, Some(10), 2), line(2, None, 3)])
            .unwrap();

        assert_eq!(
            lines,
            vec![
                PricedLine {
                    product_id: 1,
                    variant_id: Some(10),
                    name: "Pizza (Large)".into(),
                    quantity: 2,
                    unit_price: 1200,
                },
                PricedLine {
                    product_id: 2,
                    variant_id: None,
                    name: "Cola".into(),
                    quantity: 3,
                    unit_price: 300,
                },
            ]
        );
        assert_eq!(
            order_total(lines.iter().map(|l| (l.quantity, l.unit_price))).unwrap(),
            3300
        );
    }

    fn order_row(status: OrderStatus) -> Order {
        Order {
            id: 8,
            establishment_id: 1,
            public_code: Uuid::nil(),
            table_number: 3,
            status: status.to_string(),
            total: 900,
            note: None,
            created_at: chrono::NaiveDateTime::default(),
            updated_at: chrono::NaiveDateTime::default(),
        }
    }

    #[test]
    fn lost_status_race_is_conflict() {
        let err = status_swapped(8, None).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let swapped = status_swapped(8, Some(order_row(OrderStatus::Preparing))).unwrap();
        assert_eq!(swapped.status().unwrap(), OrderStatus::Preparing);
    }

    #[test]
    fn product_with_variants_needs_one() {
        let fixture = Fixture::new();
        let err = fixture.catalog().price(&[line(1, None, 1)]).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn foreign_or_deleted_variants_are_rejected() {
        let fixture = Fixture::new();
        assert!(fixture.catalog().price(&[line(2, Some(10), 1)]).is_err());
        assert!(fixture.catalog().price(&[line(1, Some(11), 1)]).is_err());
    }

    #[test]
    fn unknown_and_unavailable_products_are_rejected() {
        let fixture = Fixture::new();
        assert!(matches!(
            fixture.catalog().price(&[line(99, None, 1)]),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            fixture.catalog().price(&[line(3, None, 1)]),
            Err(ApiError::Validation(_))
        ));
    }
}
