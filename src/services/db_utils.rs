use actix::dev::ToEnvelope;
use actix::{Actor, Addr, Handler, Message, SyncContext};
use diesel::r2d2::{ConnectionManager, Pool, PoolError, PooledConnection};
use diesel::PgConnection;

use crate::errors::ApiError;
use crate::settings::Settings;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;
pub type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

pub struct PgActor(pub PgPool);

impl Actor for PgActor {
    type Context = SyncContext<Self>;
}

impl PgActor {
    pub fn connection(&self) -> Result<PgPooledConnection, ApiError> {
        Ok(self.0.get()?)
    }
}

pub struct AppState {
    pub pg_db: Addr<PgActor>,
    pub redis_db: redis::Client,
    pub settings: Settings,
}

impl AppState {
    /// Sends a message to the database actors and flattens the mailbox error.
    pub async fn query<M, T>(&self, msg: M) -> Result<T, ApiError>
    where
        M: Message<Result = Result<T, ApiError>> + Send + 'static,
        T: Send + 'static,
        PgActor: Handler<M>,
        <PgActor as Actor>::Context: ToEnvelope<PgActor, M>,
    {
        self.pg_db.send(msg).await?
    }
}

pub fn get_db_pool(db_url: &str) -> Result<PgPool, PoolError> {
    let manager: ConnectionManager<PgConnection> = ConnectionManager::<PgConnection>::new(db_url);
    Pool::builder().build(manager)
}
