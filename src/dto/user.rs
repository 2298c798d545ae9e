use super::not_blank;
use crate::domain;
use secrecy::SecretString;
use validator::Validate;

/// Registration details as typed into the console
#[derive(Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub username: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

impl From<NewUser> for domain::user::CreateUser {
    fn from(value: NewUser) -> Self {
        domain::user::CreateUser {
            username: value.username,
            email: value.email,
            password: SecretString::from(value.password),
        }
    }
}
