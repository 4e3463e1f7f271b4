use std::fmt::{self, Display};

use potion::{Error, HtmlError};
use thiserror::Error as ThisError;
use warp::reject::Rejection;

use super::schema::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { info }
    }

    pub fn info(&self) -> &str {
        &self.info
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Database(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(e),
            sqlx::Error::RowNotFound => Self::new("RowNotFound".to_owned()),
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
            sqlx::Error::PoolTimedOut => Self::new("Pool timed out".to_owned()),
            sqlx::Error::PoolClosed => Self::new("Pool closed".to_owned()),
            sqlx::Error::WorkerCrashed => Self::new("Worker crashed".to_owned()),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            _ => Self::new("Unknown error".to_owned()),
        }
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "query failed: {}", self.info)
    }
}

impl std::error::Error for QueryError {}

impl Into<Error> for QueryError {
    fn into(self) -> Error {
        log::error!("{self}");
        Error {
            code: 500,
            info: Some(self.info),
            redirect: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
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

impl Into<potion::Error> for TypeError {
    fn into(self) -> potion::Error {
        HtmlError::InvalidRequest.new(&self.info)
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.info)
    }
}

impl std::error::Error for TypeError {}

impl Into<Rejection> for TypeError {
    fn into(self) -> Rejection {
        HtmlError::InvalidRequest.new(&self.info).into()
    }
}

/// Reasons a recipe payload is rejected before anything is written.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Amount of ingredient {ingredient_id} must be at least 1, got {amount}")]
    InvalidAmount { ingredient_id: Uuid, amount: i32 },

    #[error("Ingredient {0} doesn't exist")]
    UnknownIngredient(Uuid),

    #[error("Ingredient {0} is repeated in the recipe")]
    DuplicateIngredient(Uuid),

    #[error("Tag {0} doesn't exist")]
    UnknownTag(Uuid),

    #[error("Cooking time must be at least 1 minute, got {0}")]
    InvalidCookingTime(i32),

    #[error("Invalid recipe name: {0}")]
    InvalidName(String),
}

#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum RecipeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No recipe exists with id {0}")]
    RecipeNotFound(Uuid),

    #[error("Recipe {0} is already in the shopping cart")]
    AlreadyInCart(Uuid),

    #[error("Recipe {0} is not in the shopping cart")]
    NotInCart(Uuid),

    #[error("Recipe {0} is already in favorites")]
    AlreadyFavorited(Uuid),

    #[error("Recipe {0} is not in favorites")]
    NotFavorited(Uuid),

    #[error("Invalid input {0}")]
    InvalidInput(#[from] TypeError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl RecipeError {
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            RecipeError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl Into<potion::Error> for RecipeError {
    fn into(self) -> potion::Error {
        match self {
            RecipeError::Query(e) => e.into(),
            other => HtmlError::InvalidRequest.new(&other.to_string()),
        }
    }
}

impl Into<Rejection> for RecipeError {
    fn into(self) -> Rejection {
        let error: potion::Error = self.into();
        error.into()
    }
}
