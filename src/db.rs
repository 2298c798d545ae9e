use crate::app_env::DbSettings;
use secrecy::ExposeSecret;
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection};
use std::str::FromStr;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("the database URL could not be understood: {0}")]
    InvalidUrl(#[source] sqlx::Error),
    #[error("failed to access the database: {0}")]
    Unreachable(#[source] sqlx::Error),
}

/// Builds connection options from the configured URL, overriding any user or password it contains
/// with the separately configured ones
pub fn connect_options(settings: &DbSettings) -> Result<PgConnectOptions, ConnectionError> {
    let options = PgConnectOptions::from_str(&settings.url)
        .map_err(ConnectionError::InvalidUrl)?
        .username(&settings.user)
        .password(settings.password.expose_secret());

    Ok(options)
}

/// Opens the single connection the session runs on. Doesn't retry.
pub async fn connect(settings: &DbSettings) -> Result<PgConnection, ConnectionError> {
    let options = connect_options(settings)?;

    match PgConnection::connect_with(&options).await {
        Ok(connection) => {
            info!("Connection established successfully");
            Ok(connection)
        }
        Err(cxn_err) => {
            error!(error = %cxn_err, "Failed to access the database");
            Err(ConnectionError::Unreachable(cxn_err))
        }
    }
}

/// Closes the connection if there is one. Failing to close is logged, never raised.
pub async fn close(connection: Option<PgConnection>) {
    let Some(connection) = connection else {
        return;
    };

    match connection.close().await {
        Ok(()) => info!("Connection closed successfully"),
        Err(close_err) => error!(error = %close_err, "Error closing connection"),
    }
}
