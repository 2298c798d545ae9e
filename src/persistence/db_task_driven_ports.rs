use super::NewId;
use crate::domain;
use crate::domain::task::{NewTask, Task};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::NaiveDate;
use sqlx::{FromRow, query, query_as};

/// Reads, writes and checks for the `tasks` table
pub struct DbTaskStore;

#[derive(FromRow)]
struct TaskRow {
    id: i32,
    user_id: i32,
    name: String,
    description: Option<String>,
    end_date: NaiveDate,
    status: bool,
}

impl From<TaskRow> for domain::task::Task {
    fn from(value: TaskRow) -> Self {
        Task {
            id: value.id,
            owner_user_id: value.user_id,
            name: value.name,
            description: value.description,
            due_date: value.end_date,
            completed: value.status,
        }
    }
}

#[derive(FromRow)]
struct TableExists {
    present: bool,
}

impl domain::task::driven_ports::TaskReader for DbTaskStore {
    async fn tasks_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let tasks: Vec<Task> = query_as::<_, TaskRow>(
            "SELECT t.id, t.user_id, t.name, t.description, t.end_date, t.status \
             FROM tasks t WHERE t.user_id = $1 ORDER BY t.id",
        )
        .bind(user_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("trying to fetch tasks for a user")?
        .into_iter()
        .map(domain::task::Task::from)
        .collect();

        Ok(tasks)
    }

    async fn user_task_by_id(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let task: Option<Task> = query_as::<_, TaskRow>(
            "SELECT t.id, t.user_id, t.name, t.description, t.end_date, t.status \
             FROM tasks t WHERE t.user_id = $1 AND t.id = $2",
        )
        .bind(user_id)
        .bind(task_id)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("trying to fetch a task by ID")?
        .map(domain::task::Task::from);

        Ok(task)
    }
}

impl domain::task::driven_ports::TaskWriter for DbTaskStore {
    async fn create_task_for_user(
        &self,
        user_id: i32,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let new_id = query_as::<_, NewId>(
            "INSERT INTO tasks(user_id, name, description, end_date, status) \
             VALUES ($1, $2, $3, $4, FALSE) RETURNING tasks.id",
        )
        .bind(user_id)
        .bind(new_task.name.as_str())
        .bind(new_task.description.as_deref())
        .bind(new_task.due_date)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to insert a new task into the database")?;

        Ok(new_id.id)
    }

    async fn delete_user_task(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<u64, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let result = query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a task from the database")?;

        Ok(result.rows_affected())
    }
}

impl domain::task::driven_ports::DetectTaskStorage for DbTaskStore {
    async fn task_storage_exists(
        &self,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let table = query_as::<_, TableExists>(
            "SELECT to_regclass('tasks') IS NOT NULL AS present",
        )
        .fetch_one(cxn.borrow_connection())
        .await
        .context("checking whether the tasks table exists")?;

        Ok(table.present)
    }
}
