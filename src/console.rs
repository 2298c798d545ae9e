use crate::domain::session::Session;
use crate::domain::task::driven_ports::{DetectTaskStorage, TaskReader, TaskWriter};
use crate::domain::task::driving_ports::{TaskError, TaskPort};
use crate::domain::user::User;
use crate::domain::user::driven_ports::{DetectUser, UserReader, UserWriter};
use crate::domain::user::driving_ports::{RegisterError, UserPort};
use crate::external_connections::TransactableExternalConnectivity;
use crate::{domain, dto};
use anyhow::Context;
use secrecy::SecretString;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info, warn};
use validator::{Validate, ValidationErrors};

/// Line based terminal I/O. Every read returns [None] once input runs out.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W) -> Self {
        Console { input, output }
    }

    /// Prints a line of text
    pub async fn say(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }

    /// Prints [label] without a line break and reads the reply without its line ending. Bytes
    /// that aren't UTF-8 come back as replacement characters.
    pub async fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        self.output.write_all(label.as_bytes()).await?;
        self.output.flush().await?;

        let mut raw_line = Vec::new();
        if self.input.read_until(b'\n', &mut raw_line).await? == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&raw_line);

        Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
    }

    /// Prompts until the reply is a whole number
    pub async fn read_number(&mut self, label: &str) -> io::Result<Option<i64>> {
        loop {
            let Some(reply) = self.prompt(label).await? else {
                return Ok(None);
            };
            match reply.trim().parse() {
                Ok(number) => return Ok(Some(number)),
                Err(_) => self.say("Invalid input. Please enter a valid number.").await?,
            }
        }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

/// Lists the fields that failed validation, e.g. "email, username"
fn invalid_fields(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_keys().collect();
    fields.sort();
    fields.join(", ")
}

/// The menus a person moves through, and the services and driven adapters they work through
pub struct Controller<'p, US, TS, UR, UW, UD, TStore> {
    pub user_service: &'p US,
    pub task_service: &'p TS,
    pub u_reader: &'p UR,
    pub u_writer: &'p UW,
    pub u_detect: &'p UD,
    pub task_store: &'p TStore,
}

impl<US, TS, UR, UW, UD, TStore> Controller<'_, US, TS, UR, UW, UD, TStore>
where
    US: UserPort,
    TS: TaskPort,
    UR: UserReader,
    UW: UserWriter,
    UD: DetectUser,
    TStore: DetectTaskStorage + TaskReader + TaskWriter,
{
    /// Runs the whole interactive program: log in or register, then manage tasks until the user
    /// exits or input ends. Errors returned from here are fatal.
    pub async fn run<R, W>(
        &self,
        ext_cxn: &mut impl TransactableExternalConnectivity,
        console: &mut Console<R, W>,
    ) -> Result<(), anyhow::Error>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let Some(user) = self.authenticate(&mut *ext_cxn, &mut *console).await? else {
            info!("Exiting without logging in");
            return Ok(());
        };

        self.manage_tasks(Session::begin(user), ext_cxn, console)
            .await
    }

    async fn authenticate<R, W>(
        &self,
        ext_cxn: &mut impl TransactableExternalConnectivity,
        console: &mut Console<R, W>,
    ) -> Result<Option<User>, anyhow::Error>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            console.say("Log-in (1)\nRegister (2)\nEXIT (0)").await?;
            let Some(option) = console.read_number("> ").await? else {
                return Ok(None);
            };

            match option {
                0 => return Ok(None),
                1 => {
                    let Some(username) = console.prompt("USERNAME: ").await? else {
                        return Ok(None);
                    };
                    let Some(password) = console.prompt("PASSWORD: ").await? else {
                        return Ok(None);
                    };

                    let login_result = self
                        .user_service
                        .login(
                            &username,
                            &SecretString::from(password),
                            &mut *ext_cxn,
                            self.u_reader,
                        )
                        .await;
                    match login_result {
                        Ok(Some(user)) => return Ok(Some(user)),
                        Ok(None) => console.say("Login failed. Please try again.").await?,
                        Err(login_err) => {
                            error!(error = ?login_err, "Login could not be completed");
                            console.say("Login failed. Please try again.").await?;
                        }
                    }
                }
                2 => {
                    let Some(email) = console.prompt("EMAIL: ").await? else {
                        return Ok(None);
                    };
                    let Some(username) = console.prompt("USERNAME: ").await? else {
                        return Ok(None);
                    };
                    let Some(password) = console.prompt("PASSWORD: ").await? else {
                        return Ok(None);
                    };

                    let form = dto::user::NewUser {
                        username,
                        email,
                        password,
                    };
                    if let Err(validation_errs) = form.validate() {
                        let fields = invalid_fields(&validation_errs);
                        console
                            .say(&format!("Registration failed. Please check: {fields}"))
                            .await?;
                        continue;
                    }

                    let new_user = domain::user::CreateUser::from(form);
                    let register_result = self
                        .user_service
                        .register(&new_user, &mut *ext_cxn, self.u_writer, self.u_detect)
                        .await;
                    match register_result {
                        Ok(_) => {
                            console
                                .say("Registration successful. Please log in.")
                                .await?
                        }
                        Err(RegisterError::UserAlreadyExists) => {
                            console
                                .say("That username is already taken. Please try another.")
                                .await?
                        }
                        Err(register_err) => {
                            error!(error = ?register_err, "Registration could not be completed");
                            console
                                .say("Registration failed. Please try again.")
                                .await?;
                        }
                    }
                }
                _ => console.say("Invalid option. Please try again.").await?,
            }
        }
    }

    async fn manage_tasks<R, W>(
        &self,
        mut session: Session,
        ext_cxn: &mut impl TransactableExternalConnectivity,
        console: &mut Console<R, W>,
    ) -> Result<(), anyhow::Error>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        session
            .load_from_storage(&mut *ext_cxn, self.task_service, self.u_detect, self.task_store)
            .await
            .context("Loading tasks at the start of the session")?;

        loop {
            console
                .say("Choose an option:\n1 - Insert Task\n2 - Remove Task\n3 - Show Tasks\n4 - User info\n0 - EXIT")
                .await?;
            let Some(option) = console.read_number("> ").await? else {
                break;
            };

            match option {
                0 => break,
                1 => {
                    let Some(name) = console.prompt("Enter the task name/title: ").await? else {
                        break;
                    };
                    let Some(description) =
                        console.prompt("Enter the task description: ").await?
                    else {
                        break;
                    };
                    let Some(due_date) = console
                        .prompt("Enter the task deadline (YYYY/MM/DD): ")
                        .await?
                    else {
                        break;
                    };

                    let form = dto::task::NewTask {
                        name,
                        description,
                        due_date,
                    };
                    if let Err(validation_errs) = form.validate() {
                        let fields = invalid_fields(&validation_errs);
                        console
                            .say(&format!("Task not added. Please check: {fields}"))
                            .await?;
                        continue;
                    }

                    let create_result = session
                        .create_task(
                            &form.name,
                            &form.description,
                            &form.due_date,
                            &mut *ext_cxn,
                            self.task_service,
                            self.task_store,
                        )
                        .await;
                    match create_result {
                        Ok(local_id) => console.say(&format!("Task {local_id} added.")).await?,
                        Err(input_err @ (TaskError::InvalidDate { .. } | TaskError::BlankName)) => {
                            console.say(&input_err.to_string()).await?
                        }
                        Err(task_err) => {
                            return Err(anyhow::Error::from(task_err))
                                .context("Trying to insert a new task");
                        }
                    }
                }
                2 => {
                    if session.is_empty() {
                        console.say("No tasks exist.").await?;
                        continue;
                    }
                    print_tasks(&session, console).await?;

                    let Some(local_id) = console.read_number("Enter the task ID: ").await? else {
                        break;
                    };
                    let Ok(local_id) = usize::try_from(local_id) else {
                        console.say("ID not found.").await?;
                        continue;
                    };

                    let removed = session
                        .remove_task(local_id, &mut *ext_cxn, self.task_service, self.task_store)
                        .await
                        .context("Trying to remove a task")?;
                    match removed {
                        Some(task) => {
                            console
                                .say(&format!("Task \"{}\" removed.", task.name))
                                .await?
                        }
                        None => console.say("ID not found.").await?,
                    }
                }
                3 => {
                    session
                        .load_from_storage(
                            &mut *ext_cxn,
                            self.task_service,
                            self.u_detect,
                            self.task_store,
                        )
                        .await
                        .context("Refreshing tasks from storage")?;
                    if session.is_empty() {
                        warn!("No tasks exist");
                        console.say("No tasks exist.").await?;
                        continue;
                    }
                    print_tasks(&session, console).await?;
                }
                4 => {
                    let user = session.user();
                    console
                        .say(&format!(
                            "ID: {} - Name: {} - Email: {}",
                            user.id, user.username, user.email
                        ))
                        .await?;
                }
                _ => console.say("Invalid option, please try again.").await?,
            }
        }

        let user = session.end();
        info!(user_id = user.id, "Session ended");

        Ok(())
    }
}

async fn print_tasks<R, W>(session: &Session, console: &mut Console<R, W>) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    for numbered in session.list() {
        console.say(&numbered.to_string()).await?;
    }

    Ok(())
}
