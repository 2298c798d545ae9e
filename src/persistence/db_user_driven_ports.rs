use super::{Count, NewId};
use crate::domain;
use crate::domain::user::User;
use crate::domain::user::driven_ports::{HashedUser, StoredCredentials};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use sqlx::{FromRow, query_as};

pub struct DbDetectUser;

#[derive(FromRow)]
struct UserIdRow {
    id: i32,
}

impl domain::user::driven_ports::DetectUser for DbDetectUser {
    async fn user_with_name_exists(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let user_with_name_count =
            query_as::<_, Count>("SELECT count(*) AS count FROM users u WHERE u.username = $1")
                .bind(username)
                .fetch_one(cxn.borrow_connection())
                .await
                .context("Detecting user via username")?;

        Ok(user_with_name_count.count() > 0)
    }

    async fn id_for_username(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<i32>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let user_id = query_as::<_, UserIdRow>("SELECT u.id FROM users u WHERE u.username = $1")
            .bind(username)
            .fetch_optional(cxn.borrow_connection())
            .await
            .context("Resolving a user's ID from their username")?;

        Ok(user_id.map(|row| row.id))
    }
}

pub struct DbReadUsers;

#[derive(FromRow)]
struct UserCredentialsRow {
    id: i32,
    username: String,
    email: String,
    password: String,
}

impl From<UserCredentialsRow> for StoredCredentials {
    fn from(value: UserCredentialsRow) -> Self {
        StoredCredentials {
            user: User {
                id: value.id,
                username: value.username,
                email: value.email,
            },
            password_hash: value.password,
        }
    }
}

impl domain::user::driven_ports::UserReader for DbReadUsers {
    async fn credentials_by_username(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<StoredCredentials>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let credentials = query_as::<_, UserCredentialsRow>(
            "SELECT u.id, u.username, u.email, u.password FROM users u WHERE u.username = $1",
        )
        .bind(username)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("Fetching a user's credentials by username")?;

        Ok(credentials.map(StoredCredentials::from))
    }
}

pub struct DbWriteUsers;

impl domain::user::driven_ports::UserWriter for DbWriteUsers {
    async fn create_user(
        &self,
        user: &HashedUser<'_>,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let new_user = query_as::<_, NewId>(
            "INSERT INTO users(username, password, email) VALUES ($1, $2, $3) RETURNING users.id",
        )
        .bind(user.username)
        .bind(user.password_hash)
        .bind(user.email)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("Inserting new user")?;

        Ok(new_user.id)
    }
}
