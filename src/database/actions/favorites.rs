use crate::{
    error::{Error, HtmlError, QueryError},
    schema::{Id, RecipeMinified},
};

use super::recipes::get_recipe_minified;

use sqlx::{Pool, Postgres};

/// Per-user recipe collections that share the same `(user_id, recipe_id)` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl RecipeList {
    fn table(&self) -> &'static str {
        match self {
            RecipeList::Favorites => "favorites",
            RecipeList::ShoppingCart => "shopping_cart",
        }
    }

    fn duplicate_message(&self) -> &'static str {
        match self {
            RecipeList::Favorites => "Recipe is already in favorites",
            RecipeList::ShoppingCart => "Recipe is already in the shopping cart",
        }
    }

    fn missing_message(&self) -> &'static str {
        match self {
            RecipeList::Favorites => "Recipe is not in favorites",
            RecipeList::ShoppingCart => "Recipe is not in the shopping cart",
        }
    }
}

pub async fn add_to_list(
    list: RecipeList,
    recipe_id: Id,
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<RecipeMinified, Error> {
    let recipe = get_recipe_minified(recipe_id, pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.new("No recipe exists with specified id"))?;

    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        list.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HtmlError::InvalidRequest.new(list.duplicate_message()));
    }

    log::trace!("> {:?}: user {user_id} added recipe {recipe_id}", list);

    Ok(recipe)
}

pub async fn remove_from_list(
    list: RecipeList,
    recipe_id: Id,
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        list.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HtmlError::NotFound.new(list.missing_message()));
    }

    log::trace!("> {:?}: user {user_id} removed recipe {recipe_id}", list);

    Ok(())
}
