use crate::app_env::test::TEST_DB_URL;
use crate::persistence::{SessionConnectivity, schema};
use dotenv::dotenv;
use lazy_static::lazy_static;
use rand::{Rng, thread_rng};
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection, query};
use std::env;
use std::future::Future;
use std::str::FromStr;
use tokio::runtime::Runtime;

lazy_static! {
    static ref TOKIO_RT: Runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Tokio runtime failed to initialize");
}

struct TestDatabase {
    db_name: String,
}

impl TestDatabase {
    async fn create(conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        let db_id: u32 = thread_rng().gen_range(10_000..99_999);
        let db_name = format!("test_db_{db_id}");

        query(format!("CREATE DATABASE {db_name}").as_str())
            .execute(&mut *conn)
            .await?;

        Ok(TestDatabase { db_name })
    }

    async fn drop(self, conn: &mut PgConnection) {
        let result = query(format!("DROP DATABASE IF EXISTS {} WITH (FORCE)", self.db_name).as_str())
            .execute(&mut *conn)
            .await;
        if let Err(drop_err) = result {
            println!(
                "Warning: failed to drop test database {}, you may need to do it manually. Error: {drop_err}",
                self.db_name
            );
        }
    }
}

/// Creates an empty database for a single test, sets up the application's tables in it, and hands
/// the test a session connection to it. The database is dropped afterward.
///
/// Expects that the TEST_DB_URL environment variable is populated
pub fn prepare_db_and_test<F, R>(test_fn: F)
where
    R: Future<Output = ()>,
    F: FnOnce(SessionConnectivity) -> R,
{
    if dotenv().is_err() {
        println!("Test is running without .env file.");
    }

    TOKIO_RT.block_on(async move {
        let base_url = env::var(TEST_DB_URL).expect(
            "You must provide the TEST_DB_URL environment variable as the base postgres connection string",
        );
        let base_options =
            PgConnectOptions::from_str(&base_url).expect("TEST_DB_URL should be a valid postgres URL");

        let mut admin_conn = PgConnection::connect_with(&base_options)
            .await
            .expect("Test failure - could not create initial connection to provision database.");
        let test_db = TestDatabase::create(&mut admin_conn)
            .await
            .expect("Failed to create test database");

        let test_conn = PgConnection::connect_with(&base_options.clone().database(&test_db.db_name))
            .await
            .expect("Could not connect to the test database");
        let mut ext_cxn = SessionConnectivity::new(test_conn);
        schema::bootstrap(&mut ext_cxn)
            .await
            .expect("Could not set up tables in the test database");

        test_fn(ext_cxn).await;

        test_db.drop(&mut admin_conn).await;
        let _ = admin_conn.close().await;
    });
}
