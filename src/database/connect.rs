//! Connection pool and schema migrations.

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::{
    constants::DATABASE_MAX_CONNECTIONS,
    error::{Error, HtmlError, QueryError},
};

pub async fn connect(database_url: &str) -> Result<Pool<Postgres>, Error> {
    let pool = PgPoolOptions::new()
        .max_connections(DATABASE_MAX_CONNECTIONS)
        .connect(database_url)
        .await
        .map_err(|e| {
            log::error!("Failed to connect to the database: {e}");
            Error::from(QueryError::from(e))
        })?;

    log::info!("Connected to the database");

    Ok(pool)
}

/// Pool that opens connections on first use only.
pub fn connect_lazy(database_url: &str) -> Result<Pool<Postgres>, Error> {
    PgPoolOptions::new()
        .max_connections(DATABASE_MAX_CONNECTIONS)
        .connect_lazy(database_url)
        .map_err(|e| Error::from(QueryError::from(e)))
}

pub async fn migrate(pool: &Pool<Postgres>) -> Result<(), Error> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        log::error!("Database connection succeeded, but migrating the database failed: {e}");
        HtmlError::InternalServerError.new("Migration failed")
    })?;

    log::info!("Database migrations applied");

    Ok(())
}
