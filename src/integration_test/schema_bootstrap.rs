use super::test_util;
use crate::domain::task::driven_ports::DetectTaskStorage;
use crate::persistence::db_task_driven_ports::DbTaskStore;
use crate::persistence::schema;
use speculoos::prelude::*;

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn bootstrap_can_run_repeatedly() {
    test_util::prepare_db_and_test(|mut ext_cxn| async move {
        let first_rerun = schema::bootstrap(&mut ext_cxn).await;
        let second_rerun = schema::bootstrap(&mut ext_cxn).await;

        assert_that!(first_rerun).is_ok();
        assert_that!(second_rerun).is_ok();
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn task_storage_is_detected_after_bootstrap() {
    test_util::prepare_db_and_test(|mut ext_cxn| async move {
        let exists = DbTaskStore.task_storage_exists(&mut ext_cxn).await;

        assert_that!(exists).is_ok().is_true();
    });
}
