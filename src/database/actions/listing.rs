use crate::{
    error::RecipeError,
    pagination::{Page, PageRequest},
    schema::{RecipeFilter, RecipeSummary, Uuid},
    store::RecipeStore,
};

pub async fn fetch_recipes<S: RecipeStore>(
    store: &S,
    filter: &RecipeFilter,
    viewer: Option<Uuid>,
    request: PageRequest,
) -> Result<Page<RecipeSummary>, RecipeError> {
    let (rows, total_count) = store.list_recipes(filter, viewer, request).await?;

    let page = Page::from_rows(rows, total_count, request);
    Ok(page.map(|recipe| RecipeSummary::from(&recipe)))
}
