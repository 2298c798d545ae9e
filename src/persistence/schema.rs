use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::Context;
use sqlx::query;
use tracing::info;

const CREATE_USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
    id SERIAL PRIMARY KEY,
    username VARCHAR(255) NOT NULL UNIQUE,
    password VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

const CREATE_TASKS_TABLE: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id SERIAL PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id),
    name VARCHAR(255) NOT NULL,
    description VARCHAR(255),
    end_date DATE NOT NULL,
    status BOOLEAN NOT NULL DEFAULT FALSE
)";

/// Creates the `users` table if it isn't there yet
pub async fn ensure_users_table(ext_cxn: &mut impl ExternalConnectivity) -> Result<(), anyhow::Error> {
    let mut cxn = ext_cxn.database_cxn().await?;

    query(CREATE_USERS_TABLE)
        .execute(cxn.borrow_connection())
        .await
        .context("Creating the users table")?;
    info!("Table 'users' checked and created if necessary");

    Ok(())
}

/// Creates the `tasks` table if it isn't there yet. `users` has to exist first.
pub async fn ensure_tasks_table(ext_cxn: &mut impl ExternalConnectivity) -> Result<(), anyhow::Error> {
    let mut cxn = ext_cxn.database_cxn().await?;

    query(CREATE_TASKS_TABLE)
        .execute(cxn.borrow_connection())
        .await
        .context("Creating the tasks table")?;
    info!("Table 'tasks' checked and created if necessary");

    Ok(())
}

/// Makes sure every table the application needs exists. Safe to run any number of times.
pub async fn bootstrap(ext_cxn: &mut impl ExternalConnectivity) -> Result<(), anyhow::Error> {
    ensure_users_table(&mut *ext_cxn).await?;
    ensure_tasks_table(&mut *ext_cxn).await?;

    Ok(())
}
