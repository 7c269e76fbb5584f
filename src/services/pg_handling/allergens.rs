use actix::Handler;
use diesel::prelude::*;
use tracing::info;

use super::{find_allergen, load_allergen_translations, replace_allergen_translations};
use crate::errors::ApiError;
use crate::services::db_models::Allergen;
use crate::services::db_utils::PgActor;
use crate::services::insertable::NewAllergen;
use crate::services::messages::{CreateAllergen, DeleteAllergen, FetchAllergens, UpdateAllergen};
use crate::services::views::AllergenAdminView;

fn code_in_use(
    conn: &mut PgConnection,
    est_id: i64,
    allergen_code: &str,
    except: Option<i64>,
) -> QueryResult<bool> {
    use crate::schema::allergens::dsl::{allergens, code, establishment_id, id, is_deleted};

    let mut query = allergens
        .filter(establishment_id.eq(est_id))
        .filter(code.eq(allergen_code))
        .filter(is_deleted.eq(false))
        .select(id)
        .into_boxed();
    if let Some(own_id) = except {
        query = query.filter(id.ne(own_id));
    }

    Ok(!query.load::<i64>(conn)?.is_empty())
}

impl Handler<FetchAllergens> for PgActor {
    type Result = Result<Vec<AllergenAdminView>, ApiError>;

    fn handle(&mut self, msg: FetchAllergens, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::allergens::dsl::{allergens, code, establishment_id, is_deleted};

        let mut conn = self.connection()?;

        let rows = allergens
            .filter(establishment_id.eq(msg.0))
            .filter(is_deleted.eq(false))
            .order(code)
            .select(Allergen::as_select())
            .load(&mut conn)?;

        let ids: Vec<i64> = rows.iter().map(|a| a.id).collect();
        let mut translations = load_allergen_translations(&mut conn, &ids)?;

        Ok(rows
            .into_iter()
            .map(|allergen| AllergenAdminView {
                id: allergen.id,
                code: allergen.code,
                translations: translations.remove(&allergen.id).unwrap_or_default(),
            })
            .collect())
    }
}

impl Handler<CreateAllergen> for PgActor {
    type Result = Result<AllergenAdminView, ApiError>;

    fn handle(&mut self, msg: CreateAllergen, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::allergens::dsl::allergens;

        let mut conn = self.connection()?;

        conn.build_transaction().run(|trx_conn| {
            if code_in_use(trx_conn, msg.establishment_id, &msg.body.code, None)? {
                return Err(ApiError::conflict(format!(
                    "Allergen code {} already exists",
                    msg.body.code
                )));
            }

            let allergen = diesel::insert_into(allergens)
                .values(NewAllergen {
                    establishment_id: msg.establishment_id,
                    code: msg.body.code.clone(),
                })
                .returning(Allergen::as_returning())
                .get_result(trx_conn)?;

            replace_allergen_translations(trx_conn, allergen.id, &msg.body.translations)?;

            info!(allergen_id = allergen.id, code = %allergen.code, "allergen created");
            Ok(AllergenAdminView {
                id: allergen.id,
                code: allergen.code,
                translations: msg.body.translations.clone(),
            })
        })
    }
}

impl Handler<UpdateAllergen> for PgActor {
    type Result = Result<AllergenAdminView, ApiError>;

    fn handle(&mut self, msg: UpdateAllergen, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::allergens::dsl::{allergens, code, id};

        let mut conn = self.connection()?;

        conn.build_transaction().run(|trx_conn| {
            find_allergen(trx_conn, msg.establishment_id, msg.allergen_id)?;

            if code_in_use(
                trx_conn,
                msg.establishment_id,
                &msg.body.code,
                Some(msg.allergen_id),
            )? {
                return Err(ApiError::conflict(format!(
                    "Allergen code {} already exists",
                    msg.body.code
                )));
            }

            diesel::update(allergens.filter(id.eq(msg.allergen_id)))
                .set(code.eq(&msg.body.code))
                .execute(trx_conn)?;

            replace_allergen_translations(trx_conn, msg.allergen_id, &msg.body.translations)?;

            Ok(AllergenAdminView {
                id: msg.allergen_id,
                code: msg.body.code.clone(),
                translations: msg.body.translations.clone(),
            })
        })
    }
}

impl Handler<DeleteAllergen> for PgActor {
    type Result = Result<(), ApiError>;

    fn handle(&mut self, msg: DeleteAllergen, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::allergens::dsl::{allergens, id, is_deleted};
        use crate::schema::product_allergens::dsl::{allergen_id, product_allergens};

        let mut conn = self.connection()?;

        conn.build_transaction().run(|trx_conn| {
            find_allergen(trx_conn, msg.establishment_id, msg.allergen_id)?;

            diesel::update(allergens.filter(id.eq(msg.allergen_id)))
                .set(is_deleted.eq(true))
                .execute(trx_conn)?;

            let unlinked = diesel::delete(product_allergens.filter(allergen_id.eq(msg.allergen_id)))
                .execute(trx_conn)?;

            info!(allergen_id = msg.allergen_id, unlinked, "allergen deleted");
            Ok(())
        })
    }
}
