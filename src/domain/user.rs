use crate::domain::user::driving_ports::RegisterError;
use crate::external_connections::{
    ExternalConnectivity, TransactableExternalConnectivity, TransactionHandle,
};
use anyhow::Context;
use derive_more::Display;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{info, warn};

/// bcrypt work factor applied to every stored password
pub const PASSWORD_HASH_COST: u32 = 12;

/// An authenticated user. Never carries the password or its hash.
#[derive(PartialEq, Eq, Debug, Clone, Display)]
#[display("{username} <{email}>")]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
}

pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password: SecretString,
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    /// A user row as stored, including the bcrypt hash needed to check a login
    pub struct StoredCredentials {
        pub user: User,
        pub password_hash: String,
    }

    /// Everything needed to insert a user once the password has been hashed
    pub struct HashedUser<'data> {
        pub username: &'data str,
        pub email: &'data str,
        pub password_hash: &'data str,
    }

    pub trait UserReader {
        async fn credentials_by_username(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<StoredCredentials>, anyhow::Error>;
    }

    pub trait UserWriter {
        async fn create_user(
            &self,
            user: &HashedUser<'_>,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, anyhow::Error>;
    }

    pub trait DetectUser {
        async fn user_with_name_exists(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;

        async fn id_for_username(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<i32>, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::external_connections::{ExternalConnectivity, TransactableExternalConnectivity};

    #[derive(Debug, Error)]
    pub enum RegisterError {
        #[error("The provided username is already taken.")]
        UserAlreadyExists,
        #[error("Could not hash the password: {0}")]
        HashFailure(#[from] bcrypt::BcryptError),
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    pub trait UserPort {
        async fn register(
            &self,
            new_user: &CreateUser,
            ext_cxn: &mut impl TransactableExternalConnectivity,
            u_writer: &impl driven_ports::UserWriter,
            u_detect: &impl driven_ports::DetectUser,
        ) -> Result<i32, RegisterError>;
        async fn login(
            &self,
            username: &str,
            password: &SecretString,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
        ) -> Result<Option<User>, anyhow::Error>;
    }
}

/// Why a login was turned down. Only ever written to the logs; callers just see "no user".
#[derive(Debug, Display)]
enum LoginRejection {
    #[display("unknown username")]
    UnknownUser,
    #[display("wrong password")]
    WrongPassword,
}

pub struct UserService {
    hash_cost: u32,
}

impl Default for UserService {
    fn default() -> Self {
        UserService {
            hash_cost: PASSWORD_HASH_COST,
        }
    }
}

impl driving_ports::UserPort for UserService {
    async fn register(
        &self,
        new_user: &CreateUser,
        ext_cxn: &mut impl TransactableExternalConnectivity,
        u_writer: &impl driven_ports::UserWriter,
        u_detect: &impl driven_ports::DetectUser,
    ) -> Result<i32, RegisterError> {
        // bcrypt stays outside the transaction
        let password_hash = hash_password(&new_user.password, self.hash_cost).await?;

        let mut txn = ext_cxn
            .start_transaction()
            .await
            .context("Starting user registration")?;

        let user_exists = u_detect
            .user_with_name_exists(&new_user.username, &mut txn)
            .await
            .context("Looking up user during registration")?;
        if user_exists {
            warn!(username = %new_user.username, "Registration refused, username taken");
            return Err(RegisterError::UserAlreadyExists);
        }

        let hashed_user = driven_ports::HashedUser {
            username: &new_user.username,
            email: &new_user.email,
            password_hash: &password_hash,
        };
        let new_id = u_writer
            .create_user(&hashed_user, &mut txn)
            .await
            .context("Trying to create user at service level")?;

        txn.commit().await.context("Finishing user registration")?;
        info!(user_id = new_id, "Registered new user");

        Ok(new_id)
    }

    async fn login(
        &self,
        username: &str,
        password: &SecretString,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl driven_ports::UserReader,
    ) -> Result<Option<User>, anyhow::Error> {
        let stored = u_reader
            .credentials_by_username(username, &mut *ext_cxn)
            .await
            .context("Looking up credentials during login")?;

        let rejection = match stored {
            None => LoginRejection::UnknownUser,
            Some(credentials) => {
                let password_matches =
                    verify_password(password, credentials.password_hash).await?;
                if password_matches {
                    info!(user_id = credentials.user.id, "User logged in");
                    return Ok(Some(credentials.user));
                }

                LoginRejection::WrongPassword
            }
        };

        warn!(%username, reason = %rejection, "Login rejected");
        Ok(None)
    }
}

/// Runs bcrypt off the async workers
async fn hash_password(password: &SecretString, cost: u32) -> Result<String, RegisterError> {
    let password = SecretString::from(password.expose_secret().to_owned());
    let password_hash =
        tokio::task::spawn_blocking(move || bcrypt::hash(password.expose_secret(), cost))
            .await
            .context("Waiting for password hashing")??;

    Ok(password_hash)
}

async fn verify_password(
    password: &SecretString,
    stored_hash: String,
) -> Result<bool, anyhow::Error> {
    let password = SecretString::from(password.expose_secret().to_owned());
    let password_matches =
        tokio::task::spawn_blocking(move || bcrypt::verify(password.expose_secret(), &stored_hash))
            .await
            .context("Waiting for password verification")?
            .context("Checking password against stored hash")?;

    Ok(password_matches)
}
