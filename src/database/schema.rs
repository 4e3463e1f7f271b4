use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::TypeError;

pub type Uuid = i32;

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

/// Catalog row as it appears in the ingredient fixture, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub color: String,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub created_at: DateTime<Utc>,
}

/// The author-editable columns of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeFields {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

impl From<&Recipe> for RecipeFields {
    fn from(recipe: &Recipe) -> Self {
        Self {
            name: recipe.name.to_owned(),
            image: recipe.image.to_owned(),
            text: recipe.text.to_owned(),
            cooking_time: recipe.cooking_time,
        }
    }
}

/// One `{id, amount}` entry of an incoming ingredient list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

impl IngredientAmount {
    pub fn new(id: Uuid, amount: i32) -> Self {
        Self { id, amount }
    }
}

/// Write schema of a recipe: authored fields plus the full tag and ingredient sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipePayload {
    #[serde(flatten)]
    pub fields: RecipeFields,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientAmount>,
}

/// An ingredient association joined with its catalog entry.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeIngredient {
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// A recipe together with its tag and ingredient sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<RecipeIngredient>,
}

impl RecipeDetail {
    pub fn tag_ids(&self) -> Vec<Uuid> {
        self.tags.iter().map(|tag| tag.id).collect()
    }

    pub fn ingredient_amounts(&self) -> Vec<IngredientAmount> {
        self.ingredients
            .iter()
            .map(|part| IngredientAmount::new(part.ingredient_id, part.amount))
            .collect()
    }
}

/// Read schema of a recipe for a given viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeView {
    #[serde(flatten)]
    pub detail: RecipeDetail,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// Minified recipe used in cart and favorite listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<&Recipe> for RecipeSummary {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.to_owned(),
            image: recipe.image.to_owned(),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Query filters of the recipe listing. `is_favorited` and `is_in_shopping_cart` only
/// apply when there is a viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeFilter {
    pub author: Option<Uuid>,
    /// Tag slugs; a recipe matches when it carries any of them.
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    List,
    Retrieve,
    Create,
    Replace,
    Delete,
}

/// Shape of the data exchanged for an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeSchema {
    /// `RecipePayload` in, `RecipeView` out
    Write,
    /// nothing in, `RecipeView` out
    Read,
    /// nothing in, nothing out
    Empty,
}

impl OperationKind {
    pub fn schema(&self) -> RecipeSchema {
        match self {
            OperationKind::List | OperationKind::Retrieve => RecipeSchema::Read,
            OperationKind::Create | OperationKind::Replace => RecipeSchema::Write,
            OperationKind::Delete => RecipeSchema::Empty,
        }
    }
}

impl TryFrom<Value> for OperationKind {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value {
                "list" => Ok(Self::List),
                "retrieve" => Ok(Self::Retrieve),
                "create" => Ok(Self::Create),
                "replace" => Ok(Self::Replace),
                "delete" => Ok(Self::Delete),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => Err(TypeError::new("Failed to parse value as string")),
        }
    }
}
