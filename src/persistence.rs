pub mod db_task_driven_ports;
pub mod db_user_driven_ports;
pub mod schema;

use crate::external_connections;
use crate::external_connections::ConnectionHandle;
use anyhow::Context;
use sqlx::{Connection, FromRow, PgConnection, Postgres, Transaction};

/// Data structure which owns the session's database connection.
/// Allows business logic to be agnostic of the external systems it communicates with
/// so driven adapters can easily be swapped out for other implementations
pub struct SessionConnectivity {
    db: PgConnection,
}

impl SessionConnectivity {
    /// Takes ownership of an open connection for the rest of the session
    pub fn new(db: PgConnection) -> Self {
        SessionConnectivity { db }
    }

    /// Gives the connection back so it can be closed
    pub fn into_connection(self) -> PgConnection {
        self.db
    }
}

/// A handle from SessionConnectivity which lends out the session's connection
pub struct ConnectionRef<'cxn> {
    active_connection: &'cxn mut PgConnection,
}

impl ConnectionHandle for ConnectionRef<'_> {
    fn borrow_connection(&mut self) -> &mut PgConnection {
        &mut *self.active_connection
    }
}

impl external_connections::ExternalConnectivity for SessionConnectivity {
    type DbHandle<'cxn_borrow>
        = ConnectionRef<'cxn_borrow>
    where
        Self: 'cxn_borrow;

    async fn database_cxn(&mut self) -> Result<ConnectionRef<'_>, anyhow::Error> {
        Ok(ConnectionRef {
            active_connection: &mut self.db,
        })
    }
}

impl external_connections::Transactable for SessionConnectivity {
    type Handle<'txn>
        = SessionInTransaction<'txn>
    where
        Self: 'txn;

    async fn start_transaction(&mut self) -> Result<SessionInTransaction<'_>, anyhow::Error> {
        let transaction = self
            .db
            .begin()
            .await
            .context("Starting transaction on the session connection")?;

        Ok(SessionInTransaction { txn: transaction })
    }
}

/// A variant of SessionConnectivity where the connection has an active database transaction
/// which can later be committed. Dropping it without committing rolls the transaction back.
pub struct SessionInTransaction<'txn> {
    txn: Transaction<'txn, Postgres>,
}

impl external_connections::ExternalConnectivity for SessionInTransaction<'_> {
    type DbHandle<'cxn_borrow>
        = ConnectionRef<'cxn_borrow>
    where
        Self: 'cxn_borrow;

    async fn database_cxn(&mut self) -> Result<ConnectionRef<'_>, anyhow::Error> {
        Ok(ConnectionRef {
            active_connection: &mut *self.txn,
        })
    }
}

impl external_connections::TransactionHandle for SessionInTransaction<'_> {
    async fn commit(self) -> Result<(), anyhow::Error> {
        self.txn
            .commit()
            .await
            .context("Committing database transaction")?;

        Ok(())
    }
}

/// Utility DTO for consuming the output of the PostgreSQL `count()` function
#[derive(FromRow)]
struct Count {
    count: Option<i64>,
}

impl Count {
    /// Retrieve the count value, as it's typechecked to be optional but should always be present
    fn count(&self) -> i64 {
        self.count.unwrap_or_default()
    }
}

/// Utility DTO for retrieving the ID of a newly inserted record to PostgreSQL
#[derive(FromRow)]
struct NewId {
    id: i32,
}
