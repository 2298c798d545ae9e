use validator::ValidationError;

pub mod task;
pub mod user;

/// Rejects text made only of whitespace. Pair with a length check to also reject empty text.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }

    Ok(())
}
