use anyhow::{Context, Result};
use diesel::{
    Connection, PgConnection,
    connection::CacheSize,
    r2d2::{ConnectionManager, CustomizeConnection, Error as R2d2Error, Pool},
};
use std::time::Duration;
use tracing::debug;

const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection poolers in transaction mode cannot share prepared statements across sessions.
#[derive(Debug, Default)]
struct NoStatementCache;

impl CustomizeConnection<PgConnection, R2d2Error> for NoStatementCache {
    fn on_acquire(&self, conn: &mut PgConnection) -> std::result::Result<(), R2d2Error> {
        conn.set_prepared_statement_cache_size(CacheSize::Disabled);
        Ok(())
    }
}

pub type PgPoolSquad = Pool<ConnectionManager<PgConnection>>;

pub fn establish_connection(database_url: &str, pool_size: u32) -> Result<PgPoolSquad> {
    let pool_size = pool_size.max(1);
    let manager = ConnectionManager::<PgConnection>::new(database_url);

    let pool = Pool::builder()
        .max_size(pool_size)
        .connection_timeout(CHECKOUT_TIMEOUT)
        .connection_customizer(Box::new(NoStatementCache))
        .build(manager)
        .context("postgres: failed to build connection pool")?;

    debug!(pool_size, "postgres: pool ready");
    Ok(pool)
}
