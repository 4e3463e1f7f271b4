use sqlx::{postgres::PgPoolOptions, FromRow, Pool, Postgres, QueryBuilder, Transaction};

use crate::{
    config::DatabaseConfig,
    constants::INGREDIENT_INSERT_CHUNK,
    error::QueryError,
    pagination::PageRequest,
    schema::{
        Ingredient, NewIngredient, Recipe, RecipeFields, RecipeFilter, RecipeIngredient, Tag, Uuid,
    },
    store::{CartIndex, Catalog, FavoriteIndex, RecipeStore, RecipeUnitOfWork},
};

const SELECT_RECIPE_INGREDIENTS: &str = "
    SELECT ri.recipe_id AS recipe_id, i.id AS ingredient_id, i.name AS name,
        i.measurement_unit AS measurement_unit, ri.amount AS amount
    FROM recipe_ingredients ri
    INNER JOIN ingredients i ON i.id = ri.ingredient_id
    WHERE ri.recipe_id = $1
    ORDER BY i.name, i.id
";

const SELECT_RECIPE_TAGS: &str = "
    SELECT t.*
    FROM recipe_tags rt
    INNER JOIN tags t ON t.id = rt.tag_id
    WHERE rt.recipe_id = $1
    ORDER BY t.id
";

const FILTER_TAG_SLUGS: &str = "
    AND EXISTS (
        SELECT 1 FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = r.id AND t.slug = ANY(";

const FILTER_FAVORITED: &str = "
    AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ";

const FILTER_IN_CART: &str = "
    AND EXISTS (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ";

#[derive(FromRow)]
struct RecipeListRow {
    #[sqlx(flatten)]
    recipe: Recipe,
    count: i64,
}

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, QueryError> {
        log::info!(
            "Connecting to database with at most {} connections",
            config.max_connections
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(QueryError::from)?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), QueryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| QueryError::from(sqlx::Error::from(e)))?;

        Ok(())
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

/// Escapes `LIKE` wildcards so user input only matches literally.
fn like_prefix(prefix: &str) -> String {
    let escaped = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("{escaped}%")
}

impl Catalog for PgStore {
    async fn ingredient_exists(&self, id: Uuid) -> Result<bool, QueryError> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(QueryError::from)?;

        Ok(row.is_some())
    }

    async fn tag_exists(&self, id: Uuid) -> Result<bool, QueryError> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(QueryError::from)?;

        Ok(row.is_some())
    }

    async fn get_ingredient(&self, id: Uuid) -> Result<Option<Ingredient>, QueryError> {
        let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(QueryError::from)?;

        Ok(row)
    }

    async fn get_tag(&self, id: Uuid) -> Result<Option<Tag>, QueryError> {
        let row: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(QueryError::from)?;

        Ok(row)
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, QueryError> {
        let rows: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(QueryError::from)?;

        Ok(rows)
    }

    async fn search_ingredients(&self, prefix: &str) -> Result<Vec<Ingredient>, QueryError> {
        let rows: Vec<Ingredient> =
            sqlx::query_as("SELECT * FROM ingredients WHERE name ILIKE $1 ORDER BY name, id")
                .bind(like_prefix(prefix))
                .fetch_all(&self.pool)
                .await
                .map_err(QueryError::from)?;

        Ok(rows)
    }

    async fn insert_ingredients(&self, rows: &[NewIngredient]) -> Result<u64, QueryError> {
        let mut tr = self
            .pool
            .begin()
            .await
            .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

        let mut inserted = 0;
        for chunk in rows.chunks(INGREDIENT_INSERT_CHUNK) {
            let mut query: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO ingredients (name, measurement_unit) ");
            query.push_values(chunk, |mut b, row| {
                b.push_bind(&row.name).push_bind(&row.measurement_unit);
            });

            inserted += query
                .build()
                .execute(&mut *tr)
                .await
                .map_err(QueryError::from)?
                .rows_affected();
        }

        tr.commit()
            .await
            .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))?;

        Ok(inserted)
    }
}

impl RecipeStore for PgStore {
    type UnitOfWork = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork, QueryError> {
        let tr = self
            .pool
            .begin()
            .await
            .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

        Ok(PgUnitOfWork { tr })
    }

    async fn get_recipe(&self, id: Uuid) -> Result<Option<Recipe>, QueryError> {
        let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(QueryError::from)?;

        Ok(row)
    }

    async fn ingredient_associations_for_recipe(
        &self,
        recipe_id: Uuid,
    ) -> Result<Vec<RecipeIngredient>, QueryError> {
        let rows: Vec<RecipeIngredient> = sqlx::query_as(SELECT_RECIPE_INGREDIENTS)
            .bind(recipe_id)
            .fetch_all(&self.pool)
            .await
            .map_err(QueryError::from)?;

        Ok(rows)
    }

    async fn tags_for_recipe(&self, recipe_id: Uuid) -> Result<Vec<Tag>, QueryError> {
        let rows: Vec<Tag> = sqlx::query_as(SELECT_RECIPE_TAGS)
            .bind(recipe_id)
            .fetch_all(&self.pool)
            .await
            .map_err(QueryError::from)?;

        Ok(rows)
    }

    async fn count_recipes_by_author(&self, author_id: Uuid) -> Result<i64, QueryError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(QueryError::from)?;

        Ok(count.0)
    }

    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<Uuid>,
        request: PageRequest,
    ) -> Result<(Vec<Recipe>, i64), QueryError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");

        if let Some(author) = filter.author {
            query.push(" AND r.author_id = ").push_bind(author);
        }

        if !filter.tags.is_empty() {
            query
                .push(FILTER_TAG_SLUGS)
                .push_bind(filter.tags.clone())
                .push("))");
        }

        if let Some(viewer) = viewer {
            if filter.is_favorited {
                query.push(FILTER_FAVORITED).push_bind(viewer).push(")");
            }
            if filter.is_in_shopping_cart {
                query.push(FILTER_IN_CART).push_bind(viewer).push(")");
            }
        }

        query
            .push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ")
            .push_bind(request.limit)
            .push(" OFFSET ")
            .push_bind(request.offset());

        let rows: Vec<RecipeListRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(QueryError::from)?;

        let total_count = rows.first().map(|row| row.count).unwrap_or(0);
        Ok((rows.into_iter().map(|row| row.recipe).collect(), total_count))
    }
}

pub struct PgUnitOfWork {
    tr: Transaction<'static, Postgres>,
}

impl RecipeUnitOfWork for PgUnitOfWork {
    async fn insert_recipe(
        &mut self,
        author_id: Uuid,
        fields: &RecipeFields,
    ) -> Result<Recipe, QueryError> {
        let recipe: Recipe = sqlx::query_as(
            "
            INSERT INTO recipes (author_id, name, image, text, cooking_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
        ",
        )
        .bind(author_id)
        .bind(&fields.name)
        .bind(&fields.image)
        .bind(&fields.text)
        .bind(fields.cooking_time)
        .fetch_one(&mut *self.tr)
        .await
        .map_err(QueryError::from)?;

        Ok(recipe)
    }

    async fn update_recipe(
        &mut self,
        recipe_id: Uuid,
        fields: &RecipeFields,
    ) -> Result<Option<Recipe>, QueryError> {
        let recipe: Option<Recipe> = sqlx::query_as(
            "
            UPDATE recipes SET name = $1, image = $2, text = $3, cooking_time = $4
            WHERE id = $5
            RETURNING *
        ",
        )
        .bind(&fields.name)
        .bind(&fields.image)
        .bind(&fields.text)
        .bind(fields.cooking_time)
        .bind(recipe_id)
        .fetch_optional(&mut *self.tr)
        .await
        .map_err(QueryError::from)?;

        Ok(recipe)
    }

    async fn get_recipe(&mut self, recipe_id: Uuid) -> Result<Option<Recipe>, QueryError> {
        // Row lock so concurrent replaces of one recipe apply one after another.
        let recipe: Option<Recipe> =
            sqlx::query_as("SELECT * FROM recipes WHERE id = $1 FOR UPDATE")
                .bind(recipe_id)
                .fetch_optional(&mut *self.tr)
                .await
                .map_err(QueryError::from)?;

        Ok(recipe)
    }

    async fn delete_recipe(&mut self, recipe_id: Uuid) -> Result<bool, QueryError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .execute(&mut *self.tr)
            .await
            .map_err(QueryError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_ingredient_association(
        &mut self,
        recipe_id: Uuid,
        ingredient_id: Uuid,
        amount: i32,
    ) -> Result<bool, QueryError> {
        let result = sqlx::query(
            "
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
        ",
        )
        .bind(recipe_id)
        .bind(ingredient_id)
        .bind(amount)
        .execute(&mut *self.tr)
        .await
        .map_err(QueryError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_ingredient_associations_for_recipe(
        &mut self,
        recipe_id: Uuid,
    ) -> Result<u64, QueryError> {
        let result = sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *self.tr)
            .await
            .map_err(QueryError::from)?;

        Ok(result.rows_affected())
    }

    async fn insert_tag_association(
        &mut self,
        recipe_id: Uuid,
        tag_id: Uuid,
    ) -> Result<bool, QueryError> {
        let result = sqlx::query(
            "INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(recipe_id)
        .bind(tag_id)
        .execute(&mut *self.tr)
        .await
        .map_err(QueryError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_tag_associations_for_recipe(
        &mut self,
        recipe_id: Uuid,
    ) -> Result<u64, QueryError> {
        let result = sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *self.tr)
            .await
            .map_err(QueryError::from)?;

        Ok(result.rows_affected())
    }

    async fn ingredient_associations_for_recipe(
        &mut self,
        recipe_id: Uuid,
    ) -> Result<Vec<RecipeIngredient>, QueryError> {
        let rows: Vec<RecipeIngredient> = sqlx::query_as(SELECT_RECIPE_INGREDIENTS)
            .bind(recipe_id)
            .fetch_all(&mut *self.tr)
            .await
            .map_err(QueryError::from)?;

        Ok(rows)
    }

    async fn tags_for_recipe(&mut self, recipe_id: Uuid) -> Result<Vec<Tag>, QueryError> {
        let rows: Vec<Tag> = sqlx::query_as(SELECT_RECIPE_TAGS)
            .bind(recipe_id)
            .fetch_all(&mut *self.tr)
            .await
            .map_err(QueryError::from)?;

        Ok(rows)
    }

    async fn commit(self) -> Result<(), QueryError> {
        self.tr
            .commit()
            .await
            .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))
    }

    async fn rollback(self) -> Result<(), QueryError> {
        self.tr
            .rollback()
            .await
            .map_err(|_| QueryError::new("Could not roll back transaction".to_owned()))
    }
}

impl CartIndex for PgStore {
    async fn recipe_ids_in_cart(&self, user_id: Uuid) -> Result<Vec<Uuid>, QueryError> {
        let rows: Vec<(i32,)> = sqlx::query_as(
            "SELECT recipe_id FROM shopping_cart WHERE user_id = $1 ORDER BY recipe_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(QueryError::from)?;

        Ok(rows.into_iter().map(|row| row.0).collect())
    }

    async fn is_in_cart(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT recipe_id FROM shopping_cart WHERE user_id = $1 AND recipe_id = $2",
        )
        .bind(user_id)
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(QueryError::from)?;

        Ok(row.is_some())
    }

    async fn add_to_cart(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError> {
        let result = sqlx::query(
            "INSERT INTO shopping_cart (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await
        .map_err(QueryError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_from_cart(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError> {
        let result = sqlx::query("DELETE FROM shopping_cart WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .execute(&self.pool)
            .await
            .map_err(QueryError::from)?;

        Ok(result.rows_affected() > 0)
    }
}

impl FavoriteIndex for PgStore {
    async fn is_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT recipe_id FROM favorites WHERE user_id = $1 AND recipe_id = $2",
        )
        .bind(user_id)
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(QueryError::from)?;

        Ok(row.is_some())
    }

    async fn add_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError> {
        let result = sqlx::query(
            "INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await
        .map_err(QueryError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, QueryError> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .execute(&self.pool)
            .await
            .map_err(QueryError::from)?;

        Ok(result.rows_affected() > 0)
    }
}
