use crate::console::{Console, Controller};
use crate::db::ConnectionError;
use crate::domain::task::TaskService;
use crate::domain::user::UserService;
use crate::persistence::SessionConnectivity;
use crate::persistence::db_task_driven_ports::DbTaskStore;
use crate::persistence::db_user_driven_ports::{DbDetectUser, DbReadUsers, DbWriteUsers};
use dotenv::dotenv;
use std::process::ExitCode;
use tokio::io::BufReader;
use tracing::{error, info};

mod app_env;
mod console;
mod db;
mod domain;
mod dto;
mod external_connections;
mod logging;
mod persistence;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    logging::setup_logging(logging::init_env_filter());

    let settings = match app_env::DbSettings::from_env() {
        Ok(settings) => settings,
        Err(config_err) => {
            error!(error = %config_err, "Database settings are incomplete");
            return ExitCode::FAILURE;
        }
    };

    let connection = match db::connect(&settings).await {
        Ok(connection) => connection,
        Err(ConnectionError::InvalidUrl(url_err)) => {
            error!(error = %url_err, "The database URL could not be understood");
            return ExitCode::FAILURE;
        }
        // Already logged while connecting
        Err(ConnectionError::Unreachable(_)) => return ExitCode::FAILURE,
    };
    let mut ext_cxn = SessionConnectivity::new(connection);

    let session_result = match persistence::schema::bootstrap(&mut ext_cxn).await {
        Ok(()) => {
            let mut console = Console::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
            let controller = Controller {
                user_service: &UserService::default(),
                task_service: &TaskService {},
                u_reader: &DbReadUsers,
                u_writer: &DbWriteUsers,
                u_detect: &DbDetectUser,
                task_store: &DbTaskStore,
            };
            controller.run(&mut ext_cxn, &mut console).await
        }
        Err(bootstrap_err) => Err(bootstrap_err),
    };

    db::close(Some(ext_cxn.into_connection())).await;

    match session_result {
        Ok(()) => {
            info!("Goodbye");
            ExitCode::SUCCESS
        }
        Err(fatal_err) => {
            error!(error = ?fatal_err, "Exiting after an unrecoverable error");
            ExitCode::FAILURE
        }
    }
}
