use std::collections::BTreeMap;

use crate::{
    error::RecipeError,
    export::ShoppingList,
    schema::{ShoppingListItem, Uuid},
    store::{CartIndex, RecipeStore},
};

/// Sums ingredient amounts over every recipe in the user's cart.
///
/// Lines are keyed by `(name, measurement_unit)`, so distinct catalog entries sharing
/// both collapse into one line. Each recipe is read on its own; a recipe replaced
/// while this runs may contribute either its old or its new ingredients.
pub async fn aggregate_shopping_list<S>(
    store: &S,
    user_id: Uuid,
) -> Result<ShoppingList, RecipeError>
where
    S: CartIndex + RecipeStore,
{
    let recipe_ids = store.recipe_ids_in_cart(user_id).await?;
    log::trace!("> Aggregating {} cart recipes for user {user_id}", recipe_ids.len());

    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for recipe_id in recipe_ids {
        let parts = store.ingredient_associations_for_recipe(recipe_id).await?;
        for part in parts {
            *totals
                .entry((part.name, part.measurement_unit))
                .or_insert(0) += i64::from(part.amount);
        }
    }

    let items = totals
        .into_iter()
        .map(|((name, measurement_unit), total_amount)| ShoppingListItem {
            name,
            measurement_unit,
            total_amount,
        })
        .collect();

    Ok(ShoppingList::new(items))
}
