//! Request payloads and the checks applied to them before anything touches
//! the database.

use std::collections::HashSet;

use serde::Deserialize;

use crate::{
    config::Limits,
    constants::{EMAIL_MAX_LENGTH, USERNAME_EXTRA_CHARS, USER_FIELD_MAX_LENGTH},
    error::{Error, HtmlError},
    schema::Id,
};

const BLANK: &str = "This field may not be blank.";

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: Id,
    pub amount: i32,
}

/// Body of `POST /recipes/` and `PATCH /recipes/{id}/`.
#[derive(Deserialize, Debug, Clone)]
pub struct RecipeForm {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub ingredients: Vec<IngredientAmount>,
    #[serde(default)]
    pub tags: Vec<Id>,
}

impl RecipeForm {
    pub fn validate(&self, limits: &Limits) -> Result<(), Error> {
        validate_text("name", &self.name, limits.max_field_length)?;
        validate_present("text", &self.text)?;
        validate_present("image", &self.image)?;

        if !(limits.min_cooking_time..=limits.max_cooking_time).contains(&self.cooking_time) {
            return Err(HtmlError::InvalidRequest.field(
                "cooking_time",
                &format!(
                    "Cooking time must be between {} and {} minutes.",
                    limits.min_cooking_time, limits.max_cooking_time
                ),
            ));
        }

        if self.ingredients.is_empty() {
            return Err(HtmlError::InvalidRequest.field("ingredients", "Add at least one ingredient."));
        }

        let mut seen = HashSet::new();
        for item in &self.ingredients {
            if !(limits.min_amount..=limits.max_amount).contains(&item.amount) {
                return Err(HtmlError::InvalidRequest.field(
                    "ingredients",
                    &format!(
                        "Amount of ingredient {} must be between {} and {}.",
                        item.id, limits.min_amount, limits.max_amount
                    ),
                ));
            }

            if !seen.insert(item.id) {
                return Err(HtmlError::InvalidRequest.field(
                    "ingredients",
                    &format!("Ingredient {} is listed more than once.", item.id),
                ));
            }
        }

        Ok(())
    }

    /// Submitted tag ids without repeats, in submission order.
    pub fn tag_ids(&self) -> Vec<Id> {
        let mut seen = HashSet::new();
        self.tags
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }

    pub fn ingredient_ids(&self) -> Vec<Id> {
        self.ingredients.iter().map(|item| item.id).collect()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct UserForm {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl UserForm {
    pub fn validate(&self, limits: &Limits) -> Result<(), Error> {
        // User columns are narrower than the general field limit.
        let email_length = limits.max_field_length.min(EMAIL_MAX_LENGTH);
        let name_length = limits.max_field_length.min(USER_FIELD_MAX_LENGTH);

        validate_text("email", &self.email, email_length)?;
        validate_email(&self.email)?;
        validate_text("username", &self.username, name_length)?;
        validate_username(&self.username)?;
        validate_text("first_name", &self.first_name, name_length)?;
        validate_text("last_name", &self.last_name, name_length)?;
        validate_present("password", &self.password)?;

        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TagForm {
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl TagForm {
    pub fn validate(&self, limits: &Limits) -> Result<(), Error> {
        validate_text("name", &self.name, limits.max_field_length)?;
        validate_text("slug", &self.slug, limits.max_field_length)?;

        if !is_slug(&self.slug) {
            return Err(HtmlError::InvalidRequest.field(
                "slug",
                "Use only letters, numbers, underscores or hyphens.",
            ));
        }

        if !is_hex_color(&self.color) {
            return Err(HtmlError::InvalidRequest.field(
                "color",
                "Use a HEX color code such as #FFF or #D7ABC9.",
            ));
        }

        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct IngredientForm {
    pub name: String,
    pub measurement_unit: String,
}

impl IngredientForm {
    pub fn validate(&self, limits: &Limits) -> Result<(), Error> {
        validate_text("name", &self.name, limits.max_field_length)?;
        validate_text("measurement_unit", &self.measurement_unit, limits.max_field_length)
    }
}

fn validate_present(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(HtmlError::InvalidRequest.field(field, BLANK));
    }
    Ok(())
}

fn validate_text(field: &str, value: &str, max_length: usize) -> Result<(), Error> {
    validate_present(field, value)?;

    if value.chars().count() > max_length {
        return Err(HtmlError::InvalidRequest.field(
            field,
            &format!("Ensure this field has no more than {max_length} characters."),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), Error> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(HtmlError::InvalidRequest.field("email", "Enter a valid email address."));
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), Error> {
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || USERNAME_EXTRA_CHARS.contains(&c));

    if !valid {
        return Err(HtmlError::InvalidRequest.field(
            "username",
            "Enter a valid username. It may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

/// `#RGB` or `#RRGGBB`.
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(digits) => {
            (digits.len() == 3 || digits.len() == 6)
                && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

fn is_slug(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
