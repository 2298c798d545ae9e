use sqlx::PgConnection;

/// Something that lends out the live database connection for the duration of a query
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Access to the systems outside the process. Driven ports receive one of these and ask it for a
/// database connection, so business logic never needs to know whether it's talking to the
/// session's connection, a transaction on that connection, or a test fake.
pub trait ExternalConnectivity {
    type DbHandle<'cxn_borrow>: ConnectionHandle
    where
        Self: 'cxn_borrow;

    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error>;
}

/// External connectivity which can open a transaction. Work done through the returned handle is
/// discarded unless [TransactionHandle::commit] is called.
pub trait Transactable {
    type Handle<'txn>: ExternalConnectivity + TransactionHandle
    where
        Self: 'txn;

    async fn start_transaction(&mut self) -> Result<Self::Handle<'_>, anyhow::Error>;
}

pub trait TransactionHandle {
    async fn commit(self) -> Result<(), anyhow::Error>;
}

/// Shorthand for connectivity that can both run queries directly and open transactions
pub trait TransactableExternalConnectivity: ExternalConnectivity + Transactable {}

impl<T> TransactableExternalConnectivity for T where T: ExternalConnectivity + Transactable {}
