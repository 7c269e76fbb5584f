use actix_web::web;
use redis::{Commands, RedisError};
use thiserror::Error;
use tracing::{debug, warn};

use crate::services::db_utils::AppState;
use crate::services::views::MenuView;
use crate::types::{menu_cache_key, menu_cache_pattern};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis: {0}")]
    Redis(#[from] RedisError),

    #[error("menu JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn get_menu(
    db: &redis::Client,
    establishment_id: i64,
    language: &str,
) -> Result<Option<MenuView>, CacheError> {
    let mut conn = db.get_connection()?;

    let menu_json = redis::cmd("GET")
        .arg(menu_cache_key(establishment_id, language))
        .query::<Option<String>>(&mut conn)?;

    match menu_json {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

pub fn put_menu(
    db: &redis::Client,
    establishment_id: i64,
    menu: &MenuView,
    ttl_secs: u64,
) -> Result<(), CacheError> {
    let menu_json = serde_json::to_string(menu)?;
    let mut conn = db.get_connection()?;

    redis::cmd("SET")
        .arg(menu_cache_key(establishment_id, &menu.language))
        .arg(menu_json)
        .arg("EX")
        .arg(ttl_secs.max(1))
        .query::<()>(&mut conn)?;

    Ok(())
}

/// Drops every cached language of an establishment's menu.
pub fn invalidate_menus(db: &redis::Client, establishment_id: i64) -> Result<usize, CacheError> {
    let mut conn = db.get_connection()?;

    let keys: Vec<String> = conn
        .scan_match::<_, String>(menu_cache_pattern(establishment_id))?
        .collect();

    if keys.is_empty() {
        return Ok(0);
    }

    Ok(redis::cmd("DEL").arg(&keys).query::<usize>(&mut conn)?)
}

// The redis client is synchronous; these run it on the blocking pool and
// degrade to a cache miss when redis is unavailable.

pub async fn cached_menu(
    state: &AppState,
    establishment_id: i64,
    language: String,
) -> Option<MenuView> {
    let client = state.redis_db.clone();

    match web::block(move || get_menu(&client, establishment_id, &language)).await {
        Ok(Ok(menu)) => menu,
        Ok(Err(err)) => {
            warn!(establishment_id, %err, "menu cache read failed");
            None
        }
        Err(err) => {
            warn!(establishment_id, %err, "menu cache read was not executed");
            None
        }
    }
}

pub async fn cache_menu(state: &AppState, establishment_id: i64, menu: MenuView) {
    let client = state.redis_db.clone();
    let ttl_secs = state.settings.menu_cache_ttl_secs;

    match web::block(move || put_menu(&client, establishment_id, &menu, ttl_secs)).await {
        Ok(Ok(())) => debug!(establishment_id, "menu cached"),
        Ok(Err(err)) => warn!(establishment_id, %err, "menu cache write failed"),
        Err(err) => warn!(establishment_id, %err, "menu cache write was not executed"),
    }
}

pub async fn drop_cached_menus(state: &AppState, establishment_id: i64) {
    let client = state.redis_db.clone();

    match web::block(move || invalidate_menus(&client, establishment_id)).await {
        Ok(Ok(dropped)) => debug!(establishment_id, dropped, "menu cache invalidated"),
        Ok(Err(err)) => warn!(establishment_id, %err, "menu cache invalidation failed"),
        Err(err) => warn!(establishment_id, %err, "menu cache invalidation was not executed"),
    }
}
