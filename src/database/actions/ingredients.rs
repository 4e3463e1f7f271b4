use crate::{
    error::{RecipeError, TypeError},
    schema::NewIngredient,
    store::Catalog,
};

/// Parses the ingredient fixture: a JSON array of `{"name", "measurement_unit"}` objects.
pub fn parse_ingredient_fixture(data: &str) -> Result<Vec<NewIngredient>, TypeError> {
    let rows: Vec<NewIngredient> = serde_json::from_str(data)
        .map_err(|e| TypeError::new(&format!("Invalid ingredient fixture; {e}")))?;

    if let Some(row) = rows
        .iter()
        .find(|row| row.name.trim().is_empty() || row.measurement_unit.trim().is_empty())
    {
        return Err(TypeError::new(&format!(
            "Invalid ingredient fixture; blank field in {row:?}"
        )));
    }

    Ok(rows)
}

/// Loads the fixture into the catalog and returns how many ingredients were inserted.
pub async fn load_ingredients<C: Catalog>(catalog: &C, data: &str) -> Result<u64, RecipeError> {
    let rows = parse_ingredient_fixture(data)?;
    let inserted = catalog.insert_ingredients(&rows).await?;

    log::info!("Loaded {inserted} ingredients");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    const FIXTURE: &str = r#"[
        {"name": "абрикосовое варенье", "measurement_unit": "г"},
        {"name": "Salt", "measurement_unit": "g"}
    ]"#;

    #[test]
    fn parses_fixture() {
        let rows = parse_ingredient_fixture(FIXTURE).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].measurement_unit, "g");
    }

    #[test]
    fn rejects_malformed_fixture() {
        assert!(parse_ingredient_fixture("{}").is_err());
        assert!(parse_ingredient_fixture(r#"[{"name": "Salt"}]"#).is_err());
        assert!(parse_ingredient_fixture(r#"[{"name": " ", "measurement_unit": "g"}]"#).is_err());
    }

    #[tokio::test]
    async fn loads_into_catalog() {
        let store = MemoryStore::new();

        assert_eq!(load_ingredients(&store, FIXTURE).await.unwrap(), 2);

        let found = store.search_ingredients("sa").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Salt");
    }
}
