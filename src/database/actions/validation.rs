use std::collections::HashSet;

use crate::{
    constants::RECIPE_NAME_MAX_LENGTH,
    error::{RecipeError, ValidationError},
    schema::{IngredientAmount, RecipeFields, RecipePayload, Uuid},
    store::Catalog,
};

/// Checks an ingredient list before anything is written.
///
/// Rules run as separate passes over the whole list and the first failing pass wins:
/// amounts, then catalog membership, then duplicates.
pub async fn validate_ingredients<C: Catalog>(
    catalog: &C,
    ingredients: &[IngredientAmount],
) -> Result<(), RecipeError> {
    if let Some(entry) = ingredients.iter().find(|entry| entry.amount < 1) {
        return Err(ValidationError::InvalidAmount {
            ingredient_id: entry.id,
            amount: entry.amount,
        }
        .into());
    }

    let mut known: HashSet<Uuid> = HashSet::new();
    for entry in ingredients {
        if known.contains(&entry.id) {
            continue;
        }
        if !catalog.ingredient_exists(entry.id).await? {
            return Err(ValidationError::UnknownIngredient(entry.id).into());
        }
        known.insert(entry.id);
    }

    let mut seen: HashSet<Uuid> = HashSet::with_capacity(ingredients.len());
    for entry in ingredients {
        if !seen.insert(entry.id) {
            return Err(ValidationError::DuplicateIngredient(entry.id).into());
        }
    }

    Ok(())
}

/// Every tag must be in the catalog. Repeats are allowed and collapse on insert.
pub async fn validate_tags<C: Catalog>(catalog: &C, tags: &[Uuid]) -> Result<(), RecipeError> {
    let mut checked: HashSet<Uuid> = HashSet::new();
    for &tag_id in tags {
        if !checked.insert(tag_id) {
            continue;
        }
        if !catalog.tag_exists(tag_id).await? {
            return Err(ValidationError::UnknownTag(tag_id).into());
        }
    }

    Ok(())
}

pub fn validate_fields(fields: &RecipeFields) -> Result<(), ValidationError> {
    let name = fields.name.trim();
    if name.is_empty() {
        return Err(ValidationError::InvalidName("name is blank".to_owned()));
    }
    if name.chars().count() > RECIPE_NAME_MAX_LENGTH {
        return Err(ValidationError::InvalidName(format!(
            "name is longer than {RECIPE_NAME_MAX_LENGTH} characters"
        )));
    }
    if fields.cooking_time < 1 {
        return Err(ValidationError::InvalidCookingTime(fields.cooking_time));
    }

    Ok(())
}

/// Fields, then ingredients, then tags.
pub async fn validate_payload<C: Catalog>(
    catalog: &C,
    payload: &RecipePayload,
) -> Result<(), RecipeError> {
    validate_fields(&payload.fields)?;
    validate_ingredients(catalog, &payload.ingredients).await?;
    validate_tags(catalog, &payload.tags).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn fields(name: &str, cooking_time: i32) -> RecipeFields {
        RecipeFields {
            name: name.to_owned(),
            image: String::new(),
            text: String::new(),
            cooking_time,
        }
    }

    #[tokio::test]
    async fn accepts_distinct_known_ingredients() {
        let store = MemoryStore::new();
        let salt = store.add_ingredient("Salt", "g").await;
        let water = store.add_ingredient("Water", "ml").await;

        let result = validate_ingredients(
            &store,
            &[
                IngredientAmount::new(salt.id, 5),
                IngredientAmount::new(water.id, 1),
            ],
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn empty_list_is_valid() {
        let store = MemoryStore::new();
        assert!(validate_ingredients(&store, &[]).await.is_ok());
    }

    #[tokio::test]
    async fn zero_amount_is_rejected() {
        let store = MemoryStore::new();
        let salt = store.add_ingredient("Salt", "g").await;

        let e = validate_ingredients(&store, &[IngredientAmount::new(salt.id, 0)])
            .await
            .unwrap_err();

        assert_eq!(
            e.validation(),
            Some(&ValidationError::InvalidAmount {
                ingredient_id: salt.id,
                amount: 0
            })
        );
    }

    #[tokio::test]
    async fn amount_rule_runs_before_catalog_rule() {
        let store = MemoryStore::new();
        let salt = store.add_ingredient("Salt", "g").await;

        let e = validate_ingredients(
            &store,
            &[
                IngredientAmount::new(9999, 1),
                IngredientAmount::new(salt.id, -2),
            ],
        )
        .await
        .unwrap_err();

        assert!(matches!(
            e.validation(),
            Some(ValidationError::InvalidAmount { amount: -2, .. })
        ));
    }

    #[tokio::test]
    async fn unknown_ingredient_is_rejected() {
        let store = MemoryStore::new();

        let e = validate_ingredients(&store, &[IngredientAmount::new(42, 1)])
            .await
            .unwrap_err();

        assert_eq!(e.validation(), Some(&ValidationError::UnknownIngredient(42)));
    }

    #[tokio::test]
    async fn catalog_rule_runs_before_duplicate_rule() {
        let store = MemoryStore::new();
        let salt = store.add_ingredient("Salt", "g").await;

        let e = validate_ingredients(
            &store,
            &[
                IngredientAmount::new(salt.id, 2),
                IngredientAmount::new(salt.id, 3),
                IngredientAmount::new(77, 1),
            ],
        )
        .await
        .unwrap_err();

        assert_eq!(e.validation(), Some(&ValidationError::UnknownIngredient(77)));
    }

    #[tokio::test]
    async fn repeated_ingredient_is_rejected() {
        let store = MemoryStore::new();
        let salt = store.add_ingredient("Salt", "g").await;

        let e = validate_ingredients(
            &store,
            &[
                IngredientAmount::new(salt.id, 2),
                IngredientAmount::new(salt.id, 3),
            ],
        )
        .await
        .unwrap_err();

        assert_eq!(
            e.validation(),
            Some(&ValidationError::DuplicateIngredient(salt.id))
        );
    }

    #[tokio::test]
    async fn repeated_tags_are_fine_unknown_are_not() {
        let store = MemoryStore::new();
        let tag = store.add_tag("Lunch", "lunch", "#49B64E").await;

        assert!(validate_tags(&store, &[tag.id, tag.id]).await.is_ok());

        let e = validate_tags(&store, &[tag.id, 500]).await.unwrap_err();
        assert_eq!(e.validation(), Some(&ValidationError::UnknownTag(500)));
    }

    #[test]
    fn field_rules() {
        assert!(validate_fields(&fields("Soup", 1)).is_ok());
        assert_eq!(
            validate_fields(&fields("Soup", 0)),
            Err(ValidationError::InvalidCookingTime(0))
        );
        assert!(matches!(
            validate_fields(&fields("   ", 10)),
            Err(ValidationError::InvalidName(_))
        ));
        assert!(matches!(
            validate_fields(&fields(&"x".repeat(201), 10)),
            Err(ValidationError::InvalidName(_))
        ));
    }
}
