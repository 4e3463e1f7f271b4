use crate::{
    error::{RecipeError, ValidationError},
    schema::{IngredientAmount, Recipe, RecipeDetail, RecipePayload, Uuid},
    store::{Catalog, RecipeStore, RecipeUnitOfWork},
};

use super::validate_payload;

/// Creates a recipe together with its tags and ingredients.
///
/// Nothing is persisted unless the payload validates and every association is written.
pub async fn create_recipe<S>(
    store: &S,
    author_id: Uuid,
    payload: &RecipePayload,
) -> Result<RecipeDetail, RecipeError>
where
    S: Catalog + RecipeStore,
{
    log::debug!(
        "Creating recipe {:?} for author {author_id}",
        payload.fields.name
    );

    validate_payload(store, payload).await?;
    persist_new_recipe(store, author_id, payload).await
}

/// Replaces a recipe's fields and its whole tag and ingredient sets.
///
/// Tags or ingredients left out of `payload` are removed from the recipe.
pub async fn replace_recipe<S>(
    store: &S,
    recipe_id: Uuid,
    payload: &RecipePayload,
) -> Result<RecipeDetail, RecipeError>
where
    S: Catalog + RecipeStore,
{
    log::debug!("Replacing recipe {recipe_id}");

    if store.get_recipe(recipe_id).await?.is_none() {
        return Err(RecipeError::RecipeNotFound(recipe_id));
    }

    validate_payload(store, payload).await?;
    persist_replacement(store, recipe_id, payload).await
}

pub async fn delete_recipe<S: RecipeStore>(store: &S, recipe_id: Uuid) -> Result<(), RecipeError> {
    log::debug!("Deleting recipe {recipe_id}");

    let mut uow = store.begin().await?;
    if !uow.delete_recipe(recipe_id).await? {
        uow.rollback().await?;
        return Err(RecipeError::RecipeNotFound(recipe_id));
    }
    uow.commit().await?;

    Ok(())
}

pub async fn get_recipe_detail<S: RecipeStore>(
    store: &S,
    recipe_id: Uuid,
) -> Result<RecipeDetail, RecipeError> {
    let recipe = store
        .get_recipe(recipe_id)
        .await?
        .ok_or(RecipeError::RecipeNotFound(recipe_id))?;

    let tags = store.tags_for_recipe(recipe_id).await?;
    let ingredients = store.ingredient_associations_for_recipe(recipe_id).await?;

    Ok(RecipeDetail {
        recipe,
        tags,
        ingredients,
    })
}

/// Writes an already validated recipe.
///
/// A `(recipe, ingredient)` collision at this point discards the whole recipe and
/// reports `DuplicateIngredient`; a recipe never exists with part of its ingredients.
pub(crate) async fn persist_new_recipe<S: RecipeStore>(
    store: &S,
    author_id: Uuid,
    payload: &RecipePayload,
) -> Result<RecipeDetail, RecipeError> {
    let mut uow = store.begin().await?;

    let recipe = uow.insert_recipe(author_id, &payload.fields).await?;
    insert_tags(&mut uow, recipe.id, &payload.tags).await?;

    let collision = insert_ingredients(&mut uow, recipe.id, &payload.ingredients).await?;
    if let Some(ingredient_id) = collision {
        log::warn!(
            "Ingredient {ingredient_id} collided while creating recipe {}, discarding it",
            recipe.id
        );

        uow.delete_ingredient_associations_for_recipe(recipe.id).await?;
        uow.delete_tag_associations_for_recipe(recipe.id).await?;
        uow.delete_recipe(recipe.id).await?;
        uow.rollback().await?;

        return Err(ValidationError::DuplicateIngredient(ingredient_id).into());
    }

    let detail = read_detail(&mut uow, recipe).await?;
    uow.commit().await?;

    log::debug!("Created recipe {}", detail.recipe.id);
    Ok(detail)
}

/// Writes an already validated replacement. Any failure rolls back to the previous state.
pub(crate) async fn persist_replacement<S: RecipeStore>(
    store: &S,
    recipe_id: Uuid,
    payload: &RecipePayload,
) -> Result<RecipeDetail, RecipeError> {
    let mut uow = store.begin().await?;

    if uow.get_recipe(recipe_id).await?.is_none() {
        uow.rollback().await?;
        return Err(RecipeError::RecipeNotFound(recipe_id));
    }

    uow.delete_tag_associations_for_recipe(recipe_id).await?;
    uow.delete_ingredient_associations_for_recipe(recipe_id).await?;

    insert_tags(&mut uow, recipe_id, &payload.tags).await?;

    let collision = insert_ingredients(&mut uow, recipe_id, &payload.ingredients).await?;
    if let Some(ingredient_id) = collision {
        log::warn!(
            "Ingredient {ingredient_id} collided while replacing recipe {recipe_id}, \
            keeping the previous version"
        );
        uow.rollback().await?;

        return Err(ValidationError::DuplicateIngredient(ingredient_id).into());
    }

    let recipe = match uow.update_recipe(recipe_id, &payload.fields).await? {
        Some(recipe) => recipe,
        None => {
            uow.rollback().await?;
            return Err(RecipeError::RecipeNotFound(recipe_id));
        }
    };

    let detail = read_detail(&mut uow, recipe).await?;
    uow.commit().await?;

    Ok(detail)
}

async fn insert_tags<U: RecipeUnitOfWork>(
    uow: &mut U,
    recipe_id: Uuid,
    tags: &[Uuid],
) -> Result<(), RecipeError> {
    for &tag_id in tags {
        // already present is a no-op
        uow.insert_tag_association(recipe_id, tag_id).await?;
    }

    Ok(())
}

/// Returns the first ingredient whose row already existed for the recipe.
async fn insert_ingredients<U: RecipeUnitOfWork>(
    uow: &mut U,
    recipe_id: Uuid,
    ingredients: &[IngredientAmount],
) -> Result<Option<Uuid>, RecipeError> {
    for entry in ingredients {
        let inserted = uow
            .insert_ingredient_association(recipe_id, entry.id, entry.amount)
            .await?;

        if !inserted {
            return Ok(Some(entry.id));
        }
    }

    Ok(None)
}

async fn read_detail<U: RecipeUnitOfWork>(
    uow: &mut U,
    recipe: Recipe,
) -> Result<RecipeDetail, RecipeError> {
    let tags = uow.tags_for_recipe(recipe.id).await?;
    let ingredients = uow.ingredient_associations_for_recipe(recipe.id).await?;

    Ok(RecipeDetail {
        recipe,
        tags,
        ingredients,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{memory::MemoryStore, schema::RecipeFields};

    fn payload(tags: Vec<Uuid>, ingredients: Vec<IngredientAmount>) -> RecipePayload {
        RecipePayload {
            fields: RecipeFields {
                name: "Omelette".to_owned(),
                image: "recipes/image/omelette.png".to_owned(),
                text: "Whisk and cook.".to_owned(),
                cooking_time: 10,
            },
            tags,
            ingredients,
        }
    }

    #[tokio::test]
    async fn write_time_collision_discards_new_recipe() {
        let store = MemoryStore::new();
        let egg = store.add_ingredient("Egg", "pcs").await;
        let milk = store.add_ingredient("Milk", "ml").await;
        let tag = store.add_tag("Breakfast", "breakfast", "#E26C2D").await;

        // bypasses validation the way a racing writer would
        let e = persist_new_recipe(
            &store,
            1,
            &payload(
                vec![tag.id],
                vec![
                    IngredientAmount::new(egg.id, 2),
                    IngredientAmount::new(milk.id, 50),
                    IngredientAmount::new(egg.id, 3),
                ],
            ),
        )
        .await
        .unwrap_err();

        assert_eq!(
            e.validation(),
            Some(&ValidationError::DuplicateIngredient(egg.id))
        );
        assert_eq!(store.recipe_count().await, 0);
    }

    #[tokio::test]
    async fn write_time_collision_keeps_previous_version() {
        let store = MemoryStore::new();
        let egg = store.add_ingredient("Egg", "pcs").await;
        let milk = store.add_ingredient("Milk", "ml").await;
        let breakfast = store.add_tag("Breakfast", "breakfast", "#E26C2D").await;
        let dinner = store.add_tag("Dinner", "dinner", "#8775D2").await;

        let original = create_recipe(
            &store,
            1,
            &payload(vec![breakfast.id], vec![IngredientAmount::new(egg.id, 2)]),
        )
        .await
        .unwrap();

        let mut broken = payload(
            vec![dinner.id],
            vec![
                IngredientAmount::new(milk.id, 100),
                IngredientAmount::new(milk.id, 200),
            ],
        );
        broken.fields.name = "Latte".to_owned();

        let e = persist_replacement(&store, original.recipe.id, &broken)
            .await
            .unwrap_err();
        assert_eq!(
            e.validation(),
            Some(&ValidationError::DuplicateIngredient(milk.id))
        );

        let current = get_recipe_detail(&store, original.recipe.id).await.unwrap();
        assert_eq!(current, original);
    }

    #[tokio::test]
    async fn replace_missing_recipe() {
        let store = MemoryStore::new();

        let e = replace_recipe(&store, 404, &payload(vec![], vec![]))
            .await
            .unwrap_err();

        assert_eq!(e, RecipeError::RecipeNotFound(404));
    }

    #[tokio::test]
    async fn delete_missing_recipe() {
        let store = MemoryStore::new();

        assert_eq!(
            delete_recipe(&store, 5).await.unwrap_err(),
            RecipeError::RecipeNotFound(5)
        );
    }
}
