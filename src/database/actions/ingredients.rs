use std::collections::HashMap;

use crate::{
    config::Limits,
    error::{Error, QueryError},
    schema::{Id, Ingredient, RecipeIngredient},
    validation::IngredientForm,
};

use sqlx::{Pool, Postgres};

pub async fn create_ingredient(
    form: &IngredientForm,
    limits: &Limits,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, Error> {
    form.validate(limits)?;

    let ingredient: Ingredient = sqlx::query_as(
        "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING *",
    )
    .bind(form.name.trim())
    .bind(form.measurement_unit.trim())
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    log::info!(
        "Created ingredient {} ({}) as {}",
        ingredient.name,
        ingredient.measurement_unit,
        ingredient.id
    );

    Ok(ingredient)
}

pub async fn get_ingredient(id: Id, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, Error> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

/// Ingredients whose name starts with `name` (case-insensitive), or all of them.
pub async fn list_ingredients(
    name: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, Error> {
    let rows: Vec<Ingredient> = match name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => {
            let pattern = format!("{}%", escape_like(name));
            sqlx::query_as(
                "SELECT * FROM ingredients WHERE name ILIKE $1 ESCAPE '\\' ORDER BY name, measurement_unit",
            )
            .bind(pattern)
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?
        }
        None => sqlx::query_as("SELECT * FROM ingredients ORDER BY name, measurement_unit")
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?,
    };

    Ok(rows)
}

/// Ingredient rows of every recipe in `recipe_ids`, keyed by recipe.
pub async fn list_recipe_ingredients(
    recipe_ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<HashMap<Id, Vec<RecipeIngredient>>, Error> {
    let rows: Vec<RecipeIngredient> = sqlx::query_as(
        "
        SELECT ri.recipe_id AS recipe_id, i.id AS id, i.name AS name,
            i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ANY($1)
        ORDER BY ri.id
    ",
    )
    .bind(recipe_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let mut map: HashMap<Id, Vec<RecipeIngredient>> = HashMap::new();
    rows.into_iter()
        .for_each(|row| map.entry(row.recipe_id).or_default().push(row));

    Ok(map)
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_patterns_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("flour"), "flour");
    }
}
