//! In-process backend.
//!
//! A unit of work holds the state lock for its whole lifetime and keeps a snapshot
//! taken at `begin`; rollback (explicit or on drop) restores the snapshot. Units of
//! work are therefore serialized, which is stricter than what Postgres gives but
//! observably the same for last-writer-wins replaces.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    error::QueryError,
    pagination::PageRequest,
    schema::{
        Ingredient, NewIngredient, Recipe, RecipeFields, RecipeFilter, RecipeIngredient, Tag, Uuid,
    },
    store::{CartIndex, Catalog, FavoriteIndex, RecipeStore, RecipeUnitOfWork},
};

#[derive(Clone, Debug, Default)]
struct MemoryState {
    last_id: Uuid,
    ingredients: BTreeMap<Uuid, Ingredient>,
    tags: BTreeMap<Uuid, Tag>,
    recipes: BTreeMap<Uuid, Recipe>,
    // (recipe_id, ingredient_id) -> amount
    recipe_ingredients: BTreeMap<(Uuid, Uuid), i32>,
    // (recipe_id, tag_id)
    recipe_tags: BTreeSet<(Uuid, Uuid)>,
    // (user_id, recipe_id)
    cart: BTreeSet<(Uuid, Uuid)>,
    favorites: BTreeSet<(Uuid, Uuid)>,
}

impl MemoryState {
    fn next_id(&mut self) -> Uuid {
        self.last_id += 1;
        self.last_id
    }

    fn ingredient_rows(&self, recipe_id: Uuid) -> Vec<RecipeIngredient> {
        let mut rows: Vec<RecipeIngredient> = self
            .recipe_ingredients
            .range((recipe_id, Uuid::MIN)..=(recipe_id, Uuid::MAX))
            .filter_map(|(&(recipe_id, ingredient_id), &amount)| {
                self.ingredients
                    .get(&ingredient_id)
                    .map(|ingredient| RecipeIngredient {
                        recipe_id,
                        ingredient_id,
                        name: ingredient.name.to_owned(),
                        measurement_unit: ingredient.measurement_unit.to_owned(),
                        amount,
                    })
            })
            .collect();

        rows.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then(a.ingredient_id.cmp(&b.ingredient_id))
        });
        rows
    }

    fn tag_rows(&self, recipe_id: Uuid) -> Vec<Tag> {
        self.recipe_tags
            .range((recipe_id, Uuid::MIN)..=(recipe_id, Uuid::MAX))
            .filter_map(|(_, tag_id)| self.tags.get(tag_id).cloned())
            .collect()
    }

    fn delete_recipe(&mut self, recipe_id: Uuid) -> bool {
        if self.recipes.remove(&recipe_id).is_none() {
            return false;
        }

        self.recipe_ingredients.retain(|(r, _), _| *r != recipe_id);
        self.recipe_tags.retain(|(r, _)| *r != recipe_id);
        self.cart.retain(|(_, r)| *r != recipe_id);
        self.favorites.retain(|(_, r)| *r != recipe_id);
        true
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_ingredient(&self, name: &str, measurement_unit: &str) -> Ingredient {
        let mut state = self.state.lock().await;
        let ingredient = Ingredient {
            id: state.next_id(),
            name: name.to_owned(),
            measurement_unit: measurement_unit.to_owned(),
        };
        state.ingredients.insert(ingredient.id, ingredient.clone());
        ingredient
    }

    pub async fn add_tag(&self, name: &str, slug: &str, color: &str) -> Tag {
        let mut state = self.state.lock().await;
        let tag = Tag {
            id: state.next_id(),
            name: name.to_owned(),
            slug: slug.to_owned(),
            color: color.to_owned(),
        };
        state.tags.insert(tag.id, tag.clone());
        tag
    }

    pub async fn recipe_count(&self) -> usize {
        self.state.lock().await.recipes.len()
    }

    /// Ingredient association rows for a recipe, including ones whose ingredient
    /// has since disappeared from the catalog.
    pub async fn ingredient_association_count(&self, recipe_id: Uuid) -> usize {
        self.state
            .lock()
            .await
            .recipe_ingredients
            .range((recipe_id, Uuid::MIN)..=(recipe_id, Uuid::MAX))
            .count()
    }
}

impl Catalog for MemoryStore {
    async fn ingredient_exists(&self, id: Uuid) -> Result<bool, QueryError> {
        Ok(self.state.lock().await.ingredients.contains_key(&id))
    }

    async fn tag_exists(&self, id: Uuid) -> Result<bool, QueryError> {
        Ok(self.state.lock().await.tags.contains_key(&id))
    }

    async fn get_ingredient(&self, id: Uuid) -> Result<Option<Ingredient>, QueryError> {
        Ok(self.state.lock().await.ingredients.get(&id).cloned())
    }

    async fn get_tag(&self, id: Uuid) -> Result<Option<Tag>, QueryError> {
        Ok(self.state.lock().await.tags.get(&id).cloned())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, QueryError> {
        Ok(self.state.lock().await.tags.values().cloned().collect())
    }

    async fn search_ingredients(&self, prefix: &str) -> Result<Vec<Ingredient>, QueryError> {
        let prefix = prefix.to_lowercase();
        let mut rows: Vec<Ingredient> = self
            .state
            .lock()
            .await
            .ingredients
            .values()
            .filter(|ingredient| ingredient.name.to_lowercase().starts_with(&prefix))
            .cloned()
            .collect();

        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn insert_ingredients(&self, rows: &[NewIngredient]) -> Result<u64, QueryError> {
        let mut state = self.state.lock().await;
        for row in rows {
            let id = state.next_id();
            state.ingredients.insert(
                id,
                Ingredient {
                    id,
                    name: row.name.to_owned(),
                    measurement_unit: row.measurement_unit.to_owned(),
                },
            );
        }

        Ok(rows.len() as u64)
    }
}

impl RecipeStore for MemoryStore {
    type UnitOfWork = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork, QueryError> {
        let state = self.state.clone().lock_owned().await;
        let snapshot = state.clone();

        Ok(MemoryUnitOfWork {
            state,
            snapshot: Some(snapshot),
        })
    }

    async fn get_recipe(&self, id: Uuid) -> Result<Option<Recipe>, QueryError> {
        Ok(self.state.lock().await.recipes.get(&id).cloned())
    }

    async fn ingredient_associations_for_recipe(
        &self,
        recipe_id: Uuid,
    ) -> Result<Vec<RecipeIngredient>, QueryError> {
        Ok(self.state.lock().await.ingredient_rows(recipe_id))
    }

    async fn tags_for_recipe(&self, recipe_id: Uuid) -> Result<Vec<Tag>, QueryError> {
        Ok(self.state.lock().await.tag_rows(recipe_id))
    }

    async fn count_recipes_by_author(&self, author_id: Uuid) -> Result<i64, QueryError> {
        let count = self
            .state
            .lock()
            .await
            .recipes
            .values()
            .filter(|recipe| recipe.author_id == author_id)
            .count();

        Ok(count as i64)
    }

    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<Uuid>,
        request: PageRequest,
    ) -> Result<(Vec<Recipe>, i64), QueryError> {
        let state = self.state.lock().await;

        let mut matches: Vec<&Recipe> = state
            .recipes
            .values()
            .filter(|recipe| filter.author.map_or(true, |author| recipe.author_id == author))
            .filter(|recipe| {
                filter.tags.is_empty()
                    || state
                        .tag_rows(recipe.id)
                        .iter()
                        .any(|tag| filter.tags.contains(&tag.slug))
            })
            .filter(|recipe| match viewer {
                Some(user_id) => {
                    let key = (user_id, recipe.id);
                    (!filter.is_favorited || state.favorites.contains(&key))
                        && (!filter.is_in_shopping_cart || state.cart.contains(&key))
                }
                None => true,
            })
            .collect();

        matches.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let total_count = matches.len() as i64;
        let page = matches
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit as usize)
            .cloned()
            .collect();

        Ok((page, total_count))
    }
}

pub struct MemoryUnitOfWork {
    state: OwnedMutexGuard<MemoryState>,
    snapshot: Option<MemoryState>,
}

impl Drop for MemoryUnitOfWork {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.state = snapshot;
        }
    }
}

impl RecipeUnitOfWork for MemoryUnitOfWork {
    async fn insert_recipe(
        &mut self,
        author_id: Uuid,
        fields: &RecipeFields,
    ) -> Result<Recipe, QueryError> {
        if fields.cooking_time < 1 {
            return Err(QueryError::new(
                "recipes_cooking_time_check violated".to_owned(),
            ));
        }

        let recipe = Recipe {
            id: self.state.next_id(),
            author_id,
            name: fields.name.to_owned(),
            image: fields.image.to_owned(),
            text: fields.text.to_owned(),
            cooking_time: fields.cooking_time,
            created_at: Utc::now(),
        };
        self.state.recipes.insert(recipe.id, recipe.clone());

        Ok(recipe)
    }

    async fn update_recipe(
        &mut self,
        recipe_id: Uuid,
        fields: &RecipeFields,
    ) -> Result<Option<Recipe>, QueryError> {
        if fields.cooking_time < 1 {
            return Err(QueryError::new(
                "recipes_cooking_time_check violated".to_owned(),
            ));
        }

        Ok(self.state.recipes.get_mut(&recipe_id).map(|recipe| {
            recipe.name = fields.name.to_owned();
            recipe.image = fields.image.to_owned();
            recipe.text = fields.text.to_owned();
            recipe.cooking_time = fields.cooking_time;
            recipe.clone()
        }))
    }

    async fn get_recipe(&mut self, recipe_id: Uuid) -> Result<Option<Recipe>, QueryError> {
        Ok(self.state.recipes.get(&recipe_id).cloned())
    }

    async fn delete_recipe(&mut self, recipe_id: Uuid) -> Result<bool, QueryError> {
        Ok(self.state.delete_recipe(recipe_id))
    }

    async fn insert_ingredient_association(
        &mut self,
        recipe_id: Uuid,
        ingredient_id: Uuid,
        amount: i32,
    ) -> Result<bool, QueryError> {
        if !self.state.recipes.contains_key(&recipe_id)
            || !self.state.ingredients.contains_key(&ingredient_id)
        {
            return Err(QueryError::new(
                "recipe_ingredients foreign key violated".to_owned(),
            ));
        }
        if amount < 1 {
            return Err(QueryError::new(
                "recipe_ingredients_amount_check violated".to_owned(),
            ));
        }

        let key = (recipe_id, ingredient_id);
        if self.state.recipe_ingredients.contains_key(&key) {
            return Ok(false);
        }
        self.state.recipe_ingredients.insert(key, amount);

        Ok(true)
    }

    async fn delete_ingredient_associations_for_recipe(
        &mut self,
        recipe_id: Uuid,
    ) -> Result<u64, QueryError> {
        let before = self.state.recipe_ingredients.len();
        self.state
            .recipe_ingredients
            .retain(|(r, _), _| *r != recipe_id);

        Ok((before - self.state.recipe_ingredients.len()) as u64)
    }

    async fn insert_tag_association(
        &mut self,
        recipe_id: Uuid,
        tag_id: Uuid,
    ) -> Result<bool, QueryError> {
        if !self.state.recipes.contains_key(&recipe_id) || !self.state.tags.contains_key(&tag_id)
        {
            return Err(QueryError::new(
                "recipe_tags foreign key violated".to_owned(),
            ));
        }

        Ok(self.state.recipe_tags.insert((recipe_id, tag_id)))
    }

    async fn delete_tag_associations_for_recipe(
        &mut self,
        recipe_id: Uuid,
    ) -> Result<u64, QueryError> {
        let before = self.state.recipe_tags.len();
        self.state.recipe_tags.retain(|(r, _)| *r != recipe_id);

        Ok((before - self.state.recipe_tags.len()) as u64)
    }

    async fn ingredient_associations_for_recipe(
        &mut self,
        recipe_id: Uuid,
    ) -> Result<Vec<RecipeIngredient>, QueryError> {
        Ok(self.state.ingredient_rows(recipe_id))
    }

    async fn tags_for_recipe(&mut self, recipe_id: Uuid) -> Result<Vec<Tag>, QueryError> {
        Ok(self.state.tag_rows(recipe_id))
    }

    async fn commit(mut self) -> Result<(), QueryError> {
        self.snapshot = None;
        Ok(())
    }

    async fn rollback(self) -> Result<(), QueryError> {
        // restored by Drop
        Ok(())
    }
}

impl CartIndex for MemoryStore {
    async fn recipe_ids_in_cart(&self, user_id: Uuid) -> Result<Vec<Uuid>, QueryError> {
        Ok(self
            .state
            .lock()
            .await
            .cart
            .iter()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, recipe)| *recipe)
            .collect())
    }

    async fn is_in_cart(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError> {
        Ok(self.state.lock().await.cart.contains(&(user_id, recipe_id)))
    }

    async fn add_to_cart(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError> {
        let mut state = self.state.lock().await;
        if !state.recipes.contains_key(&recipe_id) {
            return Err(QueryError::new(
                "shopping_cart foreign key violated".to_owned(),
            ));
        }

        Ok(state.cart.insert((user_id, recipe_id)))
    }

    async fn remove_from_cart(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError> {
        Ok(self.state.lock().await.cart.remove(&(user_id, recipe_id)))
    }
}

impl FavoriteIndex for MemoryStore {
    async fn is_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError> {
        Ok(self
            .state
            .lock()
            .await
            .favorites
            .contains(&(user_id, recipe_id)))
    }

    async fn add_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError> {
        let mut state = self.state.lock().await;
        if !state.recipes.contains_key(&recipe_id) {
            return Err(QueryError::new("favorites foreign key violated".to_owned()));
        }

        Ok(state.favorites.insert((user_id, recipe_id)))
    }

    async fn remove_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError> {
        Ok(self
            .state
            .lock()
            .await
            .favorites
            .remove(&(user_id, recipe_id)))
    }
}
