use super::not_blank;
use validator::Validate;

/// A new task as typed into the console. The due date stays text until the session parses it.
#[derive(Validate)]
pub struct NewTask {
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub name: String,
    #[validate(length(max = 255))]
    pub description: String,
    pub due_date: String,
}
