use actix::Handler;
use diesel::prelude::*;
use tracing::info;

use crate::errors::ApiError;
use crate::services::db_models::User;
use crate::services::db_utils::PgActor;
use crate::services::insertable::NewUser;
use crate::services::messages::{
    AddUser, DeactivateUser, EnsureSuperAdmin, FetchStaff, FetchUser, FetchUserByEmail,
};
use crate::services::views::UserView;
use crate::types::Role;

fn email_taken(conn: &mut PgConnection, address: &str) -> QueryResult<bool> {
    use crate::schema::users::dsl::{email, users};

    let count = users
        .filter(email.eq(address))
        .count()
        .get_result::<i64>(conn)?;
    Ok(count > 0)
}

impl Handler<AddUser> for PgActor {
    type Result = Result<UserView, ApiError>;

    fn handle(&mut self, msg: AddUser, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::establishments::dsl::{establishments, is_deleted as est_deleted};
        use crate::schema::users::dsl::users;

        let mut conn = self.connection()?;

        conn.build_transaction().run(|trx_conn| {
            if let Some(est_id) = msg.establishment_id {
                let exists = establishments
                    .find(est_id)
                    .filter(est_deleted.eq(false))
                    .count()
                    .get_result::<i64>(trx_conn)?
                    > 0;
                if !exists {
                    return Err(ApiError::not_found("Establishment not found"));
                }
            }

            if email_taken(trx_conn, &msg.email)? {
                return Err(ApiError::conflict("Email is already registered"));
            }

            let user = diesel::insert_into(users)
                .values(NewUser {
                    establishment_id: msg.establishment_id,
                    email: msg.email.clone(),
                    password_hash: msg.password_hash.clone(),
                    full_name: msg.full_name.clone(),
                    role: msg.role.to_string(),
                })
                .returning(User::as_returning())
                .get_result(trx_conn)?;

            info!(user_id = user.id, role = %msg.role, "user registered");
            UserView::try_from(user)
        })
    }
}

impl Handler<FetchUserByEmail> for PgActor {
    type Result = Result<User, ApiError>;

    fn handle(&mut self, msg: FetchUserByEmail, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::users::dsl::{email, is_deleted, users};

        let mut conn = self.connection()?;

        users
            .filter(email.eq(msg.0))
            .filter(is_deleted.eq(false))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }
}

impl Handler<FetchUser> for PgActor {
    type Result = Result<UserView, ApiError>;

    fn handle(&mut self, msg: FetchUser, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::users::dsl::{is_deleted, users};

        let mut conn = self.connection()?;

        let user = users
            .find(msg.0)
            .filter(is_deleted.eq(false))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        UserView::try_from(user)
    }
}

impl Handler<FetchStaff> for PgActor {
    type Result = Result<Vec<UserView>, ApiError>;

    fn handle(&mut self, msg: FetchStaff, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::users::dsl::{establishment_id, id, is_deleted, users};

        let mut conn = self.connection()?;

        users
            .filter(establishment_id.eq(msg.0))
            .filter(is_deleted.eq(false))
            .order(id)
            .select(User::as_select())
            .load(&mut conn)?
            .into_iter()
            .map(UserView::try_from)
            .collect()
    }
}

impl Handler<DeactivateUser> for PgActor {
    type Result = Result<(), ApiError>;

    fn handle(&mut self, msg: DeactivateUser, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::users::dsl::{establishment_id, id, is_deleted, users};

        let mut conn = self.connection()?;

        let affected = diesel::update(
            users
                .filter(id.eq(msg.user_id))
                .filter(establishment_id.eq(msg.establishment_id))
                .filter(is_deleted.eq(false)),
        )
        .set(is_deleted.eq(true))
        .execute(&mut conn)?;

        if affected == 0 {
            return Err(ApiError::not_found("User not found"));
        }

        info!(user_id = msg.user_id, "user deactivated");
        Ok(())
    }
}

impl Handler<EnsureSuperAdmin> for PgActor {
    type Result = Result<bool, ApiError>;

    fn handle(&mut self, msg: EnsureSuperAdmin, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::users::dsl::users;

        let mut conn = self.connection()?;

        if email_taken(&mut conn, &msg.email)? {
            return Ok(false);
        }

        diesel::insert_into(users)
            .values(NewUser {
                establishment_id: None,
                email: msg.email,
                password_hash: msg.password_hash,
                full_name: "Platform administrator".to_owned(),
                role: Role::SuperAdmin.to_string(),
            })
            .execute(&mut conn)?;

        Ok(true)
    }
}
