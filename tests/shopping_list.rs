use foodgram_sdk::{
    add_to_shopping_cart, aggregate_shopping_list, create_recipe,
    error::RecipeError,
    get_recipe_detail, list_shopping_cart,
    memory::MemoryStore,
    remove_from_shopping_cart,
    schema::{IngredientAmount, RecipeFields, RecipePayload, ShoppingListItem, Uuid},
};

async fn recipe(store: &MemoryStore, name: &str, ingredients: Vec<IngredientAmount>) -> Uuid {
    let payload = RecipePayload {
        fields: RecipeFields {
            name: name.to_owned(),
            image: String::new(),
            text: String::new(),
            cooking_time: 30,
        },
        tags: vec![],
        ingredients,
    };

    create_recipe(store, 1, &payload).await.unwrap().recipe.id
}

fn item(name: &str, unit: &str, total_amount: i64) -> ShoppingListItem {
    ShoppingListItem {
        name: name.to_owned(),
        measurement_unit: unit.to_owned(),
        total_amount,
    }
}

#[tokio::test]
async fn amounts_of_the_same_ingredient_are_summed() {
    let store = MemoryStore::new();
    let salt = store.add_ingredient("Salt", "g").await.id;

    let a = recipe(&store, "A", vec![IngredientAmount::new(salt, 5)]).await;
    let b = recipe(&store, "B", vec![IngredientAmount::new(salt, 3)]).await;
    add_to_shopping_cart(&store, 9, a).await.unwrap();
    add_to_shopping_cart(&store, 9, b).await.unwrap();

    let cart_before = list_shopping_cart(&store, 9).await.unwrap();
    let a_before = get_recipe_detail(&store, a).await.unwrap();
    let b_before = get_recipe_detail(&store, b).await.unwrap();

    let list = aggregate_shopping_list(&store, 9).await.unwrap();

    assert_eq!(list.items, vec![item("Salt", "g", 8)]);
    assert_eq!(list.to_string(), "Salt (g) — 8");

    // aggregation only reads
    assert_eq!(list_shopping_cart(&store, 9).await.unwrap(), cart_before);
    assert_eq!(get_recipe_detail(&store, a).await.unwrap(), a_before);
    assert_eq!(get_recipe_detail(&store, b).await.unwrap(), b_before);
    assert_eq!(aggregate_shopping_list(&store, 9).await.unwrap(), list);
}

#[tokio::test]
async fn empty_cart_gives_empty_list() {
    let store = MemoryStore::new();

    let list = aggregate_shopping_list(&store, 9).await.unwrap();

    assert!(list.is_empty());
    assert!(list.lines().is_empty());
}

#[tokio::test]
async fn lines_are_keyed_by_name_and_unit() {
    let store = MemoryStore::new();
    let sugar_g = store.add_ingredient("Sugar", "g").await.id;
    let sugar_g_again = store.add_ingredient("Sugar", "g").await.id;
    let sugar_spoon = store.add_ingredient("Sugar", "tbsp").await.id;
    let apple = store.add_ingredient("Apple", "pcs").await.id;

    let pie = recipe(
        &store,
        "Pie",
        vec![
            IngredientAmount::new(sugar_g, 100),
            IngredientAmount::new(apple, 4),
            IngredientAmount::new(sugar_spoon, 1),
        ],
    )
    .await;
    let tea = recipe(&store, "Tea", vec![IngredientAmount::new(sugar_g_again, 10)]).await;

    add_to_shopping_cart(&store, 9, pie).await.unwrap();
    add_to_shopping_cart(&store, 9, tea).await.unwrap();

    let list = aggregate_shopping_list(&store, 9).await.unwrap();

    assert_eq!(
        list.items,
        vec![
            item("Apple", "pcs", 4),
            item("Sugar", "g", 110),
            item("Sugar", "tbsp", 1),
        ]
    );
    assert_eq!(
        list.lines(),
        vec!["Apple (pcs) — 4", "Sugar (g) — 110", "Sugar (tbsp) — 1"]
    );
}

#[tokio::test]
async fn other_carts_are_not_included() {
    let store = MemoryStore::new();
    let salt = store.add_ingredient("Salt", "g").await.id;
    let a = recipe(&store, "A", vec![IngredientAmount::new(salt, 5)]).await;

    add_to_shopping_cart(&store, 1, a).await.unwrap();

    assert!(aggregate_shopping_list(&store, 2).await.unwrap().is_empty());
}

#[tokio::test]
async fn cart_membership_rules() {
    let store = MemoryStore::new();
    let a = recipe(&store, "A", vec![]).await;

    let summary = add_to_shopping_cart(&store, 9, a).await.unwrap();
    assert_eq!(summary.id, a);
    assert_eq!(
        add_to_shopping_cart(&store, 9, a).await.unwrap_err(),
        RecipeError::AlreadyInCart(a)
    );
    assert_eq!(
        add_to_shopping_cart(&store, 9, 404).await.unwrap_err(),
        RecipeError::RecipeNotFound(404)
    );
    assert_eq!(list_shopping_cart(&store, 9).await.unwrap().len(), 1);

    remove_from_shopping_cart(&store, 9, a).await.unwrap();
    assert_eq!(
        remove_from_shopping_cart(&store, 9, a).await.unwrap_err(),
        RecipeError::NotInCart(a)
    );
    assert!(list_shopping_cart(&store, 9).await.unwrap().is_empty());
}
