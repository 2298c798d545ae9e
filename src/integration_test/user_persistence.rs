use super::test_util;
use crate::domain::user::driving_ports::{RegisterError, UserPort};
use crate::domain::user::{CreateUser, UserService};
use crate::persistence::db_user_driven_ports::{DbDetectUser, DbReadUsers, DbWriteUsers};
use secrecy::SecretString;
use speculoos::prelude::*;

fn jane() -> CreateUser {
    CreateUser {
        username: "jane".to_owned(),
        email: "jane@example.com".to_owned(),
        password: SecretString::from("correct horse".to_owned()),
    }
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn registered_user_can_log_in() {
    test_util::prepare_db_and_test(|mut ext_cxn| async move {
        let user_service = UserService::default();

        let new_id = user_service
            .register(&jane(), &mut ext_cxn, &DbWriteUsers, &DbDetectUser)
            .await
            .expect("registration should succeed");
        let logged_in = user_service
            .login(
                "jane",
                &SecretString::from("correct horse".to_owned()),
                &mut ext_cxn,
                &DbReadUsers,
            )
            .await;

        assert_that!(logged_in).is_ok().is_some().matches(|user| {
            user.id == new_id && user.username == "jane" && user.email == "jane@example.com"
        });
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn wrong_password_is_turned_down() {
    test_util::prepare_db_and_test(|mut ext_cxn| async move {
        let user_service = UserService::default();

        user_service
            .register(&jane(), &mut ext_cxn, &DbWriteUsers, &DbDetectUser)
            .await
            .expect("registration should succeed");
        let logged_in = user_service
            .login(
                "jane",
                &SecretString::from("battery staple".to_owned()),
                &mut ext_cxn,
                &DbReadUsers,
            )
            .await;

        assert_that!(logged_in).is_ok().is_none();
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn duplicate_username_is_rejected() {
    test_util::prepare_db_and_test(|mut ext_cxn| async move {
        let user_service = UserService::default();

        user_service
            .register(&jane(), &mut ext_cxn, &DbWriteUsers, &DbDetectUser)
            .await
            .expect("first registration should succeed");
        let second_attempt = user_service
            .register(&jane(), &mut ext_cxn, &DbWriteUsers, &DbDetectUser)
            .await;

        assert_that!(second_attempt)
            .is_err()
            .matches(|err| matches!(err, RegisterError::UserAlreadyExists));
    });
}
