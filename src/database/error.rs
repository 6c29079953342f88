use std::fmt::{self, Display};

use serde_json::{Map, Value};
use warp::{
    http::StatusCode,
    reject::Reject,
};

/// Unique constraints that map onto a single request field.
const CONSTRAINT_FIELDS: &[(&str, &str, &str)] = &[
    ("users_email_key", "email", "A user with that email already exists."),
    ("users_email_lower_key", "email", "A user with that email already exists."),
    ("users_username_key", "username", "A user with that username already exists."),
    ("recipes_name_key", "name", "A recipe with this name already exists."),
    ("tags_name_key", "name", "A tag with this name already exists."),
    ("tags_color_key", "color", "A tag with this color already exists."),
    ("tags_slug_key", "slug", "A tag with this slug already exists."),
    (
        "ingredients_name_unit_key",
        "name",
        "An ingredient with this name and measurement unit already exists.",
    ),
    (
        "recipe_ingredients_recipe_ingredient_key",
        "ingredients",
        "Each ingredient may appear in a recipe only once.",
    ),
];

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";
const STRING_DATA_RIGHT_TRUNCATION: &str = "22001";

/// Error returned by every action and rendered by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub code: u16,
    pub info: Option<String>,
    pub field: Option<String>,
}

impl Error {
    pub fn with_code(code: u16, info: &str) -> Self {
        Self {
            code,
            info: Some(info.to_string()),
            field: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// `{"<field>": ["<message>"]}` for field errors, `{"detail": "<message>"}` otherwise.
    pub fn body(&self) -> Value {
        let info = self.info.clone().unwrap_or_else(|| {
            self.status()
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

        let mut body = Map::new();
        match &self.field {
            Some(field) => body.insert(field.to_owned(), Value::Array(vec![Value::String(info)])),
            None => body.insert(String::from("detail"), Value::String(info)),
        };

        Value::Object(body)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.field, &self.info) {
            (Some(field), Some(info)) => write!(f, "{} ({field}: {info})", self.code),
            (None, Some(info)) => write!(f, "{} ({info})", self.code),
            _ => write!(f, "{}", self.code),
        }
    }
}

impl std::error::Error for Error {}
impl Reject for Error {}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlError {
    InvalidRequest,
    Unauthorized,
    InvalidSession,
    Forbidden,
    NotFound,
    InternalServerError,
}

impl HtmlError {
    pub fn code(&self) -> u16 {
        match self {
            HtmlError::InvalidRequest => 400,
            HtmlError::Unauthorized => 401,
            HtmlError::InvalidSession => 401,
            HtmlError::Forbidden => 403,
            HtmlError::NotFound => 404,
            HtmlError::InternalServerError => 500,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            HtmlError::InvalidRequest => "Invalid request",
            HtmlError::Unauthorized => "Authentication credentials were not provided.",
            HtmlError::InvalidSession => "Invalid token.",
            HtmlError::Forbidden => "You do not have permission to perform this action.",
            HtmlError::NotFound => "Not found.",
            HtmlError::InternalServerError => "Internal server error",
        }
    }

    pub fn new(self, info: &str) -> Error {
        Error::with_code(self.code(), info)
    }

    pub fn default(self) -> Error {
        self.new(self.message())
    }

    /// Validation error scoped to a single request field.
    pub fn field(self, field: &str, info: &str) -> Error {
        Error {
            code: self.code(),
            info: Some(info.to_string()),
            field: Some(field.to_string()),
        }
    }
}

#[derive(Debug)]
pub struct QueryError {
    info: String,
    sql_state: Option<String>,
    constraint: Option<String>,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self {
            info,
            sql_state: None,
            constraint: None,
        }
    }

    pub fn constraint(&self) -> Option<&str> {
        self.constraint.as_deref()
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(e) => Self {
                info: format!("{e}"),
                sql_state: e.code().map(|code| code.into_owned()),
                constraint: e.constraint().map(String::from),
            },
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(e),
            sqlx::Error::RowNotFound => Self::new(String::from("RowNotFound")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(e),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(String::from("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(String::from("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            e => Self::new(format!("{e}")),
        }
    }
}

impl From<QueryError> for Error {
    fn from(value: QueryError) -> Self {
        match value.sql_state.as_deref() {
            Some(UNIQUE_VIOLATION) => {
                let known = value.constraint().and_then(|constraint| {
                    CONSTRAINT_FIELDS
                        .iter()
                        .find(|(name, _, _)| *name == constraint)
                });

                match known {
                    Some((_, field, info)) => HtmlError::InvalidRequest.field(field, info),
                    None => HtmlError::InvalidRequest.new("Object already exists"),
                }
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                HtmlError::NotFound.new("Referenced object does not exist")
            }
            Some(CHECK_VIOLATION) => HtmlError::InvalidRequest.new(&value.info),
            Some(STRING_DATA_RIGHT_TRUNCATION) => {
                log::warn!("Rejected oversized value: {}", value.info);
                HtmlError::InvalidRequest.new("A value exceeds the maximum length.")
            }
            _ => {
                log::error!("Query failed: {}", value.info);
                HtmlError::InternalServerError.default()
            }
        }
    }
}

#[derive(Debug)]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl From<TypeError> for Error {
    fn from(value: TypeError) -> Self {
        HtmlError::InvalidRequest.new(&value.info)
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.info)
    }
}

impl std::error::Error for TypeError {}
