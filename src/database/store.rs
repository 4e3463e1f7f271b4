//! Storage seams used by the recipe actions.
//!
//! Every backend (`PgStore`, `MemoryStore`) implements all of these. Mutations of a
//! recipe graph only happen through a [`RecipeUnitOfWork`], which is committed or
//! rolled back as a whole. Dropping an uncommitted unit of work rolls it back.
#![allow(async_fn_in_trait)]

use super::{
    error::QueryError,
    pagination::PageRequest,
    schema::{
        Ingredient, NewIngredient, Recipe, RecipeFields, RecipeFilter, RecipeIngredient, Tag, Uuid,
    },
};

/// Read-only registry of ingredients and tags.
pub trait Catalog {
    async fn ingredient_exists(&self, id: Uuid) -> Result<bool, QueryError>;
    async fn tag_exists(&self, id: Uuid) -> Result<bool, QueryError>;
    async fn get_ingredient(&self, id: Uuid) -> Result<Option<Ingredient>, QueryError>;
    async fn get_tag(&self, id: Uuid) -> Result<Option<Tag>, QueryError>;
    async fn list_tags(&self) -> Result<Vec<Tag>, QueryError>;
    /// Case-insensitive name prefix search, ordered by name.
    async fn search_ingredients(&self, prefix: &str) -> Result<Vec<Ingredient>, QueryError>;
    /// Bulk insert used by fixture loading. Returns the number of rows inserted.
    async fn insert_ingredients(&self, rows: &[NewIngredient]) -> Result<u64, QueryError>;
}

pub trait RecipeStore {
    type UnitOfWork: RecipeUnitOfWork;

    async fn begin(&self) -> Result<Self::UnitOfWork, QueryError>;

    async fn get_recipe(&self, id: Uuid) -> Result<Option<Recipe>, QueryError>;

    /// Ingredient rows of one recipe joined with the catalog, ordered by ingredient name.
    async fn ingredient_associations_for_recipe(
        &self,
        recipe_id: Uuid,
    ) -> Result<Vec<RecipeIngredient>, QueryError>;

    /// Tags of one recipe, ordered by id.
    async fn tags_for_recipe(&self, recipe_id: Uuid) -> Result<Vec<Tag>, QueryError>;

    async fn count_recipes_by_author(&self, author_id: Uuid) -> Result<i64, QueryError>;

    /// One page of recipes, newest first, plus the total number of matches.
    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<Uuid>,
        request: PageRequest,
    ) -> Result<(Vec<Recipe>, i64), QueryError>;
}

/// One atomic write scope over the recipe tables.
pub trait RecipeUnitOfWork {
    async fn insert_recipe(
        &mut self,
        author_id: Uuid,
        fields: &RecipeFields,
    ) -> Result<Recipe, QueryError>;

    async fn update_recipe(
        &mut self,
        recipe_id: Uuid,
        fields: &RecipeFields,
    ) -> Result<Option<Recipe>, QueryError>;

    async fn get_recipe(&mut self, recipe_id: Uuid) -> Result<Option<Recipe>, QueryError>;

    /// Returns `false` when no row was deleted.
    async fn delete_recipe(&mut self, recipe_id: Uuid) -> Result<bool, QueryError>;

    /// Returns `false` when the `(recipe_id, ingredient_id)` pair is already present.
    async fn insert_ingredient_association(
        &mut self,
        recipe_id: Uuid,
        ingredient_id: Uuid,
        amount: i32,
    ) -> Result<bool, QueryError>;

    async fn delete_ingredient_associations_for_recipe(
        &mut self,
        recipe_id: Uuid,
    ) -> Result<u64, QueryError>;

    /// Returns `false` when the tag was already on the recipe.
    async fn insert_tag_association(
        &mut self,
        recipe_id: Uuid,
        tag_id: Uuid,
    ) -> Result<bool, QueryError>;

    async fn delete_tag_associations_for_recipe(
        &mut self,
        recipe_id: Uuid,
    ) -> Result<u64, QueryError>;

    async fn ingredient_associations_for_recipe(
        &mut self,
        recipe_id: Uuid,
    ) -> Result<Vec<RecipeIngredient>, QueryError>;

    async fn tags_for_recipe(&mut self, recipe_id: Uuid) -> Result<Vec<Tag>, QueryError>;

    async fn commit(self) -> Result<(), QueryError>;

    async fn rollback(self) -> Result<(), QueryError>;
}

/// Per-user shopping cart membership.
pub trait CartIndex {
    async fn recipe_ids_in_cart(&self, user_id: Uuid) -> Result<Vec<Uuid>, QueryError>;
    async fn is_in_cart(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError>;
    /// Returns `false` when the recipe was already in the cart.
    async fn add_to_cart(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError>;
    /// Returns `false` when the recipe was not in the cart.
    async fn remove_from_cart(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError>;
}

pub trait FavoriteIndex {
    async fn is_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError>;
    async fn add_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError>;
    async fn remove_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError>;
}
