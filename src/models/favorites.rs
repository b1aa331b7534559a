use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// The persisted favorites record: who to email, and which fruits to watch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct FavoriteList {
    #[validate(email(message = "email address is not valid"))]
    pub email: String,
    #[validate(
        length(min = 1, message = "at least one fruit is required"),
        custom(function = "no_blank_names")
    )]
    pub fruits: Vec<String>,
}

impl FavoriteList {
    /// Builds a list from form input: comma separated `name-variety` entries.
    pub fn from_input(fruits: &str, email: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            fruits: split_fruits(fruits),
        }
    }
}

pub fn split_fruits(input: &str) -> Vec<String> {
    input
        .split([',', '，'])
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn no_blank_names(fruits: &[String]) -> Result<(), ValidationError> {
    if fruits.iter().any(|name| name.trim().is_empty()) {
        return Err(ValidationError::new("blank_fruit_name"));
    }
    Ok(())
}
