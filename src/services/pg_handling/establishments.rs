use actix::Handler;
use diesel::prelude::*;
use tracing::info;

use crate::errors::ApiError;
use crate::services::db_models::Establishment;
use crate::services::db_utils::PgActor;
use crate::services::insertable::{EstablishmentChanges, NewEstablishment};
use crate::services::messages::{
    CreateEstablishment, FetchEstablishment, FetchEstablishmentBySlug, UpdateEstablishment,
};
use crate::services::views::EstablishmentView;

impl Handler<CreateEstablishment> for PgActor {
    type Result = Result<EstablishmentView, ApiError>;

    fn handle(&mut self, msg: CreateEstablishment, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::establishments::dsl::{establishments, slug};

        let mut conn = self.connection()?;
        let body = msg.0;

        let taken = establishments
            .filter(slug.eq(&body.slug))
            .count()
            .get_result::<i64>(&mut conn)?
            > 0;
        if taken {
            return Err(ApiError::conflict(format!("Slug '{}' is already taken", body.slug)));
        }

        let created = diesel::insert_into(establishments)
            .values(NewEstablishment {
                slug: body.slug,
                name: body.name,
                default_language: body.default_language,
                table_count: body.table_count,
                currency: body.currency,
            })
            .returning(Establishment::as_returning())
            .get_result(&mut conn)?;

        info!(establishment_id = created.id, slug = %created.slug, "establishment created");
        Ok(created.into())
    }
}

impl Handler<FetchEstablishment> for PgActor {
    type Result = Result<Establishment, ApiError>;

    fn handle(&mut self, msg: FetchEstablishment, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::establishments::dsl::{establishments, is_deleted};

        let mut conn = self.connection()?;

        establishments
            .find(msg.0)
            .filter(is_deleted.eq(false))
            .select(Establishment::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| ApiError::not_found("Establishment not found"))
    }
}

impl Handler<FetchEstablishmentBySlug> for PgActor {
    type Result = Result<Establishment, ApiError>;

    fn handle(&mut self, msg: FetchEstablishmentBySlug, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::establishments::dsl::{establishments, is_deleted, slug};

        let mut conn = self.connection()?;

        establishments
            .filter(slug.eq(msg.0.to_lowercase()))
            .filter(is_deleted.eq(false))
            .select(Establishment::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| ApiError::not_found("Establishment not found"))
    }
}

impl Handler<UpdateEstablishment> for PgActor {
    type Result = Result<EstablishmentView, ApiError>;

    fn handle(&mut self, msg: UpdateEstablishment, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::establishments::dsl::{establishments, id, is_deleted};

        let mut conn = self.connection()?;
        let body = msg.body;

        let updated = diesel::update(
            establishments
                .filter(id.eq(msg.establishment_id))
                .filter(is_deleted.eq(false)),
        )
        .set(EstablishmentChanges {
            name: body.name,
            default_language: body.default_language,
            table_count: body.table_count,
            currency: body.currency,
        })
        .returning(Establishment::as_returning())
        .get_result(&mut conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Establishment not found"))?;

        info!(establishment_id = updated.id, "establishment updated");
        Ok(updated.into())
    }
}
