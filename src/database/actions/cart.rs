use crate::{
    error::RecipeError,
    schema::{RecipeSummary, Uuid},
    store::{CartIndex, RecipeStore},
};

pub async fn add_to_shopping_cart<S>(
    store: &S,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Result<RecipeSummary, RecipeError>
where
    S: CartIndex + RecipeStore,
{
    let recipe = store
        .get_recipe(recipe_id)
        .await?
        .ok_or(RecipeError::RecipeNotFound(recipe_id))?;

    if !store.add_to_cart(user_id, recipe_id).await? {
        return Err(RecipeError::AlreadyInCart(recipe_id));
    }

    Ok(RecipeSummary::from(&recipe))
}

pub async fn remove_from_shopping_cart<C: CartIndex>(
    store: &C,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Result<(), RecipeError> {
    if !store.remove_from_cart(user_id, recipe_id).await? {
        return Err(RecipeError::NotInCart(recipe_id));
    }

    Ok(())
}

pub async fn list_shopping_cart<S>(
    store: &S,
    user_id: Uuid,
) -> Result<Vec<RecipeSummary>, RecipeError>
where
    S: CartIndex + RecipeStore,
{
    let mut list = vec![];
    for recipe_id in store.recipe_ids_in_cart(user_id).await? {
        // deleted since it was listed
        if let Some(recipe) = store.get_recipe(recipe_id).await? {
            list.push(RecipeSummary::from(&recipe));
        }
    }

    Ok(list)
}
