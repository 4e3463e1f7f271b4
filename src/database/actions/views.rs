//! Derived read-only fields of a recipe, each computed from explicit inputs.
//!
//! `viewer` is `None` for anonymous requests; anonymous viewers never have
//! favorites or a cart.

use crate::{
    error::{QueryError, RecipeError},
    schema::{RecipeView, Uuid},
    store::{CartIndex, FavoriteIndex, RecipeStore},
};

use super::get_recipe_detail;

pub async fn is_favorited<F: FavoriteIndex>(
    store: &F,
    viewer: Option<Uuid>,
    recipe_id: Uuid,
) -> Result<bool, QueryError> {
    match viewer {
        Some(user_id) => store.is_favorite(user_id, recipe_id).await,
        None => Ok(false),
    }
}

pub async fn is_in_shopping_cart<C: CartIndex>(
    store: &C,
    viewer: Option<Uuid>,
    recipe_id: Uuid,
) -> Result<bool, QueryError> {
    match viewer {
        Some(user_id) => store.is_in_cart(user_id, recipe_id).await,
        None => Ok(false),
    }
}

pub async fn recipes_count<S: RecipeStore>(store: &S, author_id: Uuid) -> Result<i64, QueryError> {
    store.count_recipes_by_author(author_id).await
}

pub async fn recipe_view<S>(
    store: &S,
    viewer: Option<Uuid>,
    recipe_id: Uuid,
) -> Result<RecipeView, RecipeError>
where
    S: RecipeStore + CartIndex + FavoriteIndex,
{
    let detail = get_recipe_detail(store, recipe_id).await?;

    Ok(RecipeView {
        is_favorited: is_favorited(store, viewer, recipe_id).await?,
        is_in_shopping_cart: is_in_shopping_cart(store, viewer, recipe_id).await?,
        detail,
    })
}
