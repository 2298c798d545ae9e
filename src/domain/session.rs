use crate::domain::task::driven_ports::{DetectTaskStorage, TaskReader, TaskWriter};
use crate::domain::task::driving_ports::{RemovalOutcome, TaskError, TaskPort};
use crate::domain::task::{DUE_DATE_DISPLAY_FORMAT, NewTask, Task};
use crate::domain::user::User;
use crate::domain::user::driven_ports::DetectUser;
use crate::external_connections::{ExternalConnectivity, TransactableExternalConnectivity};
use std::fmt;
use tracing::debug;

/// One authenticated user's interactive session, holding an ordered copy of their tasks.
///
/// Tasks are identified by their storage ID. The numbers shown to the user ("local IDs") are just
/// positions in the list counted from 1, so they're always contiguous and are never persisted.
/// Every mutation goes to storage first and only touches the local copy once storage succeeded.
pub struct Session {
    user: User,
    tasks: Vec<Task>,
}

/// A task paired with the number it's displayed under
#[derive(Debug, PartialEq, Eq)]
pub struct NumberedTask<'session> {
    pub local_id: usize,
    pub task: &'session Task,
}

impl fmt::Display for NumberedTask<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {} - Name: {} - Description: {} - Completed: {} - Date: {}",
            self.local_id,
            self.task.name,
            self.task.description.as_deref().unwrap_or(""),
            self.task.completed,
            self.task.due_date.format(DUE_DATE_DISPLAY_FORMAT),
        )
    }
}

impl Session {
    /// Starts a session for a freshly logged in user with no tasks loaded yet
    pub fn begin(user: User) -> Session {
        Session {
            user,
            tasks: Vec::new(),
        }
    }

    /// Ends the session, handing back the user it belonged to
    pub fn end(self) -> User {
        self.user
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The session's tasks in storage order, numbered from 1
    pub fn list(&self) -> impl Iterator<Item = NumberedTask<'_>> {
        self.tasks
            .iter()
            .enumerate()
            .map(|(index, task)| NumberedTask {
                local_id: index + 1,
                task,
            })
    }

    /// Replaces the local copy with whatever storage currently holds for the user
    pub async fn load_from_storage(
        &mut self,
        ext_cxn: &mut impl ExternalConnectivity,
        task_service: &impl TaskPort,
        u_detect: &impl DetectUser,
        task_store: &(impl DetectTaskStorage + TaskReader),
    ) -> Result<(), TaskError> {
        let tasks = task_service
            .tasks_for_user(&self.user, ext_cxn, u_detect, task_store, task_store)
            .await?;
        debug!(task_count = tasks.len(), "Loaded tasks into session");
        self.tasks = tasks;

        Ok(())
    }

    /// Stores a new task and appends it to the session. Returns the local ID it's listed under.
    pub async fn create_task(
        &mut self,
        name: &str,
        description: &str,
        due_date: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        task_service: &impl TaskPort,
        task_store: &(impl DetectTaskStorage + TaskWriter),
    ) -> Result<usize, TaskError> {
        let new_task = NewTask::parse(name, description, due_date)?;
        let stored_task = task_service
            .create_task_for_user(&self.user, &new_task, ext_cxn, task_store, task_store)
            .await?;
        self.tasks.push(stored_task);

        Ok(self.tasks.len())
    }

    /// Removes the task listed under [local_id] from storage and then from the session.
    /// Returns [None] without touching anything if no task has that local ID.
    pub async fn remove_task(
        &mut self,
        local_id: usize,
        ext_cxn: &mut impl TransactableExternalConnectivity,
        task_service: &impl TaskPort,
        task_store: &(impl DetectTaskStorage + TaskReader + TaskWriter),
    ) -> Result<Option<Task>, TaskError> {
        let Some(index) = local_id.checked_sub(1).filter(|index| *index < self.tasks.len()) else {
            return Ok(None);
        };

        let storage_id = self.tasks[index].id;
        let outcome = task_service
            .remove_user_task(&self.user, storage_id, ext_cxn, task_store, task_store, task_store)
            .await?;
        if outcome != RemovalOutcome::Removed {
            debug!(storage_id, ?outcome, "Task was already gone from storage");
        }

        Ok(Some(self.tasks.remove(index)))
    }
}
