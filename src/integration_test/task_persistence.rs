use super::test_util;
use crate::domain::session::Session;
use crate::domain::task::TaskService;
use crate::domain::task::driving_ports::{RemovalOutcome, TaskPort};
use crate::domain::user::driving_ports::UserPort;
use crate::domain::user::{CreateUser, User, UserService};
use crate::persistence::SessionConnectivity;
use crate::persistence::db_task_driven_ports::DbTaskStore;
use crate::persistence::db_user_driven_ports::{DbDetectUser, DbWriteUsers};
use secrecy::SecretString;
use speculoos::prelude::*;

async fn registered_user(username: &str, ext_cxn: &mut SessionConnectivity) -> User {
    let new_user = CreateUser {
        username: username.to_owned(),
        email: format!("{username}@example.com"),
        password: SecretString::from("correct horse".to_owned()),
    };
    let id = UserService::default()
        .register(&new_user, ext_cxn, &DbWriteUsers, &DbDetectUser)
        .await
        .expect("registration should succeed");

    User {
        id,
        username: new_user.username,
        email: new_user.email,
    }
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn session_tasks_survive_a_reload() {
    test_util::prepare_db_and_test(|mut ext_cxn| async move {
        let user = registered_user("jane", &mut ext_cxn).await;
        let mut session = Session::begin(user.clone());

        session
            .create_task("Groceries", "milk, eggs", "2030/01/15", &mut ext_cxn, &TaskService {}, &DbTaskStore)
            .await
            .expect("first task should be stored");
        session
            .create_task("Taxes", "", "2030/04/15", &mut ext_cxn, &TaskService {}, &DbTaskStore)
            .await
            .expect("second task should be stored");

        let mut reloaded = Session::begin(user);
        reloaded
            .load_from_storage(&mut ext_cxn, &TaskService {}, &DbDetectUser, &DbTaskStore)
            .await
            .expect("tasks should load");

        let listed: Vec<String> = reloaded.list().map(|numbered| numbered.to_string()).collect();
        assert_eq!(
            vec![
                "ID: 1 - Name: Groceries - Description: milk, eggs - Completed: false - Date: 15/01/2030".to_owned(),
                "ID: 2 - Name: Taxes - Description:  - Completed: false - Date: 15/04/2030".to_owned(),
            ],
            listed
        );
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn removing_a_task_deletes_it_from_storage() {
    test_util::prepare_db_and_test(|mut ext_cxn| async move {
        let user = registered_user("jane", &mut ext_cxn).await;
        let mut session = Session::begin(user.clone());
        for name in ["A", "B", "C"] {
            session
                .create_task(name, "", "2030/01/01", &mut ext_cxn, &TaskService {}, &DbTaskStore)
                .await
                .expect("task should be stored");
        }

        let removed = session
            .remove_task(2, &mut ext_cxn, &TaskService {}, &DbTaskStore)
            .await;
        assert_that!(removed)
            .is_ok()
            .is_some()
            .matches(|task| task.name == "B");

        let mut reloaded = Session::begin(user);
        reloaded
            .load_from_storage(&mut ext_cxn, &TaskService {}, &DbDetectUser, &DbTaskStore)
            .await
            .expect("tasks should load");
        let names: Vec<&str> = reloaded.list().map(|numbered| numbered.task.name.as_str()).collect();
        assert_eq!(vec!["A", "C"], names);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn users_cannot_remove_each_others_tasks() {
    test_util::prepare_db_and_test(|mut ext_cxn| async move {
        let owner = registered_user("jane", &mut ext_cxn).await;
        let intruder = registered_user("mallory", &mut ext_cxn).await;
        let mut owner_session = Session::begin(owner.clone());
        owner_session
            .create_task("Private", "", "2030/01/01", &mut ext_cxn, &TaskService {}, &DbTaskStore)
            .await
            .expect("task should be stored");
        let task_id = owner_session
            .list()
            .next()
            .map(|numbered| numbered.task.id)
            .expect("the owner should have one task");

        let outcome = TaskService {}
            .remove_user_task(&intruder, task_id, &mut ext_cxn, &DbTaskStore, &DbTaskStore, &DbTaskStore)
            .await;
        assert_that!(outcome).is_ok().is_equal_to(RemovalOutcome::NotFound);

        let mut reloaded = Session::begin(owner);
        reloaded
            .load_from_storage(&mut ext_cxn, &TaskService {}, &DbDetectUser, &DbTaskStore)
            .await
            .expect("tasks should load");
        assert_eq!(1, reloaded.task_count());
    });
}
