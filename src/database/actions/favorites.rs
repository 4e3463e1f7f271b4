use crate::{
    error::RecipeError,
    schema::{RecipeSummary, Uuid},
    store::{FavoriteIndex, RecipeStore},
};

pub async fn add_to_favorites<S>(
    store: &S,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Result<RecipeSummary, RecipeError>
where
    S: FavoriteIndex + RecipeStore,
{
    let recipe = store
        .get_recipe(recipe_id)
        .await?
        .ok_or(RecipeError::RecipeNotFound(recipe_id))?;

    if !store.add_favorite(user_id, recipe_id).await? {
        return Err(RecipeError::AlreadyFavorited(recipe_id));
    }

    Ok(RecipeSummary::from(&recipe))
}

pub async fn remove_from_favorites<F: FavoriteIndex>(
    store: &F,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Result<(), RecipeError> {
    if !store.remove_favorite(user_id, recipe_id).await? {
        return Err(RecipeError::NotFavorited(recipe_id));
    }

    Ok(())
}
