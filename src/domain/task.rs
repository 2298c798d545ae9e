use crate::domain;
use crate::domain::task::driven_ports::{DetectTaskStorage, TaskReader, TaskWriter};
use crate::domain::task::driving_ports::{RemovalOutcome, TaskError};
use crate::domain::user::User;
use crate::external_connections::{
    ExternalConnectivity, TransactableExternalConnectivity, TransactionHandle,
};
use anyhow::Context;
use chrono::NaiveDate;
use tracing::{info, warn};

/// Format due dates are typed in with, e.g. 2025/01/15
pub const DUE_DATE_INPUT_FORMAT: &str = "%Y/%m/%d";
/// Format due dates are shown in, e.g. 15/01/2025
pub const DUE_DATE_DISPLAY_FORMAT: &str = "%d/%m/%Y";

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Task {
    pub id: i32,
    pub owner_user_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub completed: bool,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
}

impl NewTask {
    /// Builds a new task from console input. The name can't be blank, the due date must be written
    /// as yyyy/MM/dd and an empty description means the task has none.
    pub fn parse(name: &str, description: &str, due_date: &str) -> Result<NewTask, TaskError> {
        let parsed_date = NaiveDate::parse_from_str(due_date.trim(), DUE_DATE_INPUT_FORMAT)
            .map_err(|source| TaskError::InvalidDate {
                input: due_date.to_owned(),
                source,
            })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(TaskError::BlankName);
        }
        let description = Some(description.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_owned);

        Ok(NewTask {
            name: name.to_owned(),
            description,
            due_date: parsed_date,
        })
    }
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    pub trait TaskReader {
        /// Every task owned by the user, in the order they were stored
        async fn tasks_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Task>, anyhow::Error>;
        async fn user_task_by_id(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error>;
    }

    pub trait TaskWriter {
        /// Stores a task and returns the ID storage assigned to it
        async fn create_task_for_user(
            &self,
            user_id: i32,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, anyhow::Error>;

        /// Deletes a task only if the user owns it, returning how many rows went away
        async fn delete_user_task(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<u64, anyhow::Error>;
    }

    pub trait DetectTaskStorage {
        async fn task_storage_exists(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::external_connections::{ExternalConnectivity, TransactableExternalConnectivity};
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum TaskError {
        #[error("\"{input}\" is not a date in the yyyy/MM/dd format")]
        InvalidDate {
            input: String,
            #[source]
            source: chrono::ParseError,
        },
        #[error("A task needs a name")]
        BlankName,
        #[error("The tasks table does not exist.")]
        StorageMissing,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    /// What happened to storage when a task removal was requested
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum RemovalOutcome {
        Removed,
        /// The task doesn't exist or belongs to someone else. Nothing was changed.
        NotFound,
        /// The task was found but the delete touched no rows
        Vanished,
    }

    pub trait TaskPort {
        async fn tasks_for_user(
            &self,
            user: &User,
            ext_cxn: &mut impl ExternalConnectivity,
            u_detect: &impl domain::user::driven_ports::DetectUser,
            storage_detect: &impl driven_ports::DetectTaskStorage,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<Task>, TaskError>;
        async fn create_task_for_user(
            &self,
            user: &User,
            task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            storage_detect: &impl driven_ports::DetectTaskStorage,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, TaskError>;
        async fn remove_user_task(
            &self,
            user: &User,
            task_id: i32,
            ext_cxn: &mut impl TransactableExternalConnectivity,
            storage_detect: &impl driven_ports::DetectTaskStorage,
            task_read: &impl driven_ports::TaskReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<RemovalOutcome, TaskError>;
    }
}

pub struct TaskService {}

impl driving_ports::TaskPort for TaskService {
    async fn tasks_for_user(
        &self,
        user: &User,
        ext_cxn: &mut impl ExternalConnectivity,
        u_detect: &impl domain::user::driven_ports::DetectUser,
        storage_detect: &impl DetectTaskStorage,
        task_read: &impl TaskReader,
    ) -> Result<Vec<Task>, TaskError> {
        let user_id = u_detect
            .id_for_username(&user.username, &mut *ext_cxn)
            .await
            .context("Resolving user before loading tasks")?;
        let Some(user_id) = user_id else {
            warn!(username = %user.username, "User not found, no tasks to load");
            return Ok(Vec::new());
        };

        if !storage_detect.task_storage_exists(&mut *ext_cxn).await? {
            warn!("Table 'tasks' does not exist, no tasks to load");
            return Ok(Vec::new());
        }

        let tasks = task_read
            .tasks_for_user(user_id, &mut *ext_cxn)
            .await
            .context("Loading tasks for user")?;
        if tasks.is_empty() {
            warn!(user_id, "User has no tasks");
        }

        Ok(tasks)
    }

    async fn create_task_for_user(
        &self,
        user: &User,
        task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        storage_detect: &impl DetectTaskStorage,
        task_write: &impl TaskWriter,
    ) -> Result<Task, TaskError> {
        if !storage_detect.task_storage_exists(&mut *ext_cxn).await? {
            warn!("Table 'tasks' does not exist, task not inserted");
            return Err(TaskError::StorageMissing);
        }

        let task_id = task_write
            .create_task_for_user(user.id, task, &mut *ext_cxn)
            .await
            .context("Inserting a new task")?;
        info!(task_id, user_id = user.id, "Task inserted");

        Ok(Task {
            id: task_id,
            owner_user_id: user.id,
            name: task.name.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            completed: false,
        })
    }

    async fn remove_user_task(
        &self,
        user: &User,
        task_id: i32,
        ext_cxn: &mut impl TransactableExternalConnectivity,
        storage_detect: &impl DetectTaskStorage,
        task_read: &impl TaskReader,
        task_write: &impl TaskWriter,
    ) -> Result<RemovalOutcome, TaskError> {
        let mut txn = ext_cxn
            .start_transaction()
            .await
            .context("Starting task removal")?;

        if !storage_detect.task_storage_exists(&mut txn).await? {
            warn!("Table 'tasks' does not exist, nothing to remove");
            return Ok(RemovalOutcome::NotFound);
        }

        let owned_task = task_read
            .user_task_by_id(user.id, task_id, &mut txn)
            .await
            .context("Checking task ownership before removal")?;
        if owned_task.is_none() {
            warn!(
                task_id,
                user_id = user.id,
                "Task not found or does not belong to the user, no action taken"
            );
            return Ok(RemovalOutcome::NotFound);
        }

        let rows_affected = task_write
            .delete_user_task(user.id, task_id, &mut txn)
            .await
            .context("Removing a task")?;
        txn.commit().await.context("Finishing task removal")?;

        info!(task_id, rows_affected, "Rows affected by removal");
        if rows_affected == 0 {
            warn!(task_id, "Task was not removed, it may no longer belong to the user");
            return Ok(RemovalOutcome::Vanished);
        }

        Ok(RemovalOutcome::Removed)
    }
}
