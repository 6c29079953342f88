//! Recipe reads and the recipe writer.
//!
//! A recipe and its ingredient/tag associations are only ever written
//! together, inside one transaction: validate, check references, write the
//! recipe row, replace the associations, commit. Any error drops the
//! transaction before commit, so readers never observe a half-written recipe.

use std::collections::{HashMap, HashSet};

use crate::{
    config::Limits,
    error::{Error, HtmlError, QueryError, TypeError},
    form::Form,
    jwt::SessionData,
    pagination::{PageContext, Paging},
    permissions::ActionType,
    schema::{Id, Recipe, RecipeDetail, RecipeMinified, RecipeRow, UserProfile},
    validation::RecipeForm,
};

use super::{ingredients::list_recipe_ingredients, tags::list_recipe_tags, users::get_profile};

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

/// Query-string filters of the recipe list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<Id>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeFilter {
    /// `?author=<id>&tags=<slug>&tags=<slug>&is_favorited=1&is_in_shopping_cart=1`
    pub fn from_form(form: &Form) -> Result<Self, TypeError> {
        Ok(Self {
            author: form.get_number("author")?,
            tags: form.get_all("tags").into_iter().map(String::from).collect(),
            is_favorited: form.get_flag("is_favorited")?,
            is_in_shopping_cart: form.get_flag("is_in_shopping_cart")?,
        })
    }
}

pub async fn get_recipe_row(id: Id, pool: &Pool<Postgres>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_recipe_minified(
    id: Id,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipeMinified>, Error> {
    let row: Option<RecipeMinified> =
        sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(row)
}

/// Full representation of a recipe as seen by `viewer`.
pub async fn get_recipe(
    id: Id,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipeDetail>, Error> {
    let recipe = match get_recipe_row(id, pool).await? {
        Some(recipe) => recipe,
        None => return Ok(None),
    };

    let mut details = materialize(vec![recipe], viewer, pool).await?;
    Ok(details.pop())
}

/// Loads a recipe the session is allowed to modify.
pub async fn get_recipe_mut(
    id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match get_recipe_row(id, pool).await? {
        Some(recipe) if recipe.author_id == session.user_id => Ok(recipe),
        Some(_) => Err(HtmlError::Forbidden.default()),
        None => Err(HtmlError::NotFound.new("No recipe exists with specified id")),
    }
}

pub async fn fetch_recipes(
    filter: &RecipeFilter,
    paging: Paging,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeDetail>, Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");

    if let Some(author) = filter.author {
        builder.push(" AND r.author_id = ").push_bind(author);
    }

    if !filter.tags.is_empty() {
        builder
            .push(" AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug = ANY(")
            .push_bind(filter.tags.clone())
            .push("))");
    }

    // Membership filters only mean something for a known viewer.
    match viewer {
        Some(viewer) => {
            if filter.is_favorited {
                builder
                    .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
                    .push_bind(viewer)
                    .push(")");
            }
            if filter.is_in_shopping_cart {
                builder
                    .push(" AND EXISTS (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ")
                    .push_bind(viewer)
                    .push(")");
            }
        }
        None => {
            if filter.is_favorited || filter.is_in_shopping_cart {
                return Ok(PageContext::no_rows());
            }
        }
    }

    builder
        .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
        .push_bind(paging.limit)
        .push(" OFFSET ")
        .push_bind(paging.offset());

    log::trace!("> Recipe list query: {}", builder.sql());

    let rows: Vec<RecipeRow> = builder
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    if rows.is_empty() && paging.page > 1 {
        return Err(HtmlError::NotFound.new("Invalid page."));
    }

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let recipes = rows.into_iter().map(|row| row.recipe).collect();
    let details = materialize(recipes, viewer, pool).await?;

    Ok(PageContext::from_rows(details, total_count, paging))
}

/// Creates a recipe with its ingredients and tags as one atomic unit.
pub async fn create_recipe(
    form: &RecipeForm,
    session: &SessionData,
    limits: &Limits,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetail, Error> {
    session.authenticate(ActionType::CreateRecipes)?;
    form.validate(limits)?;

    let mut tx = pool.begin().await.map_err(QueryError::from)?;

    check_references(form, &mut tx).await?;

    let (recipe_id,): (Id,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, text, image, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(session.user_id)
    .bind(form.name.trim())
    .bind(&form.text)
    .bind(&form.image)
    .bind(form.cooking_time)
    .fetch_one(&mut *tx)
    .await
    .map_err(QueryError::from)?;

    write_associations(recipe_id, form, &mut tx).await?;

    tx.commit().await.map_err(QueryError::from)?;

    log::info!("User {} created recipe {recipe_id}", session.user_id);

    get_recipe(recipe_id, Some(session.user_id), pool)
        .await?
        .ok_or_else(|| HtmlError::InternalServerError.new("Created recipe disappeared"))
}

/// Replaces a recipe's fields, ingredients and tags. Nothing is merged: the
/// associations afterwards are exactly the submitted ones.
pub async fn update_recipe(
    id: Id,
    form: &RecipeForm,
    session: &SessionData,
    limits: &Limits,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetail, Error> {
    session.authenticate(ActionType::ManageOwnRecipes)?;

    let mut tx = pool.begin().await.map_err(QueryError::from)?;

    let author: Option<(Id,)> = sqlx::query_as("SELECT author_id FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(QueryError::from)?;

    match author {
        Some((author_id,)) if author_id == session.user_id => {}
        Some(_) => return Err(HtmlError::Forbidden.default()),
        None => return Err(HtmlError::NotFound.new("No recipe exists with specified id")),
    }

    // Everything below mutates; nothing may run before the payload is known good.
    form.validate(limits)?;
    check_references(form, &mut tx).await?;

    sqlx::query(
        "
        UPDATE recipes
        SET author_id = $1, name = $2, text = $3, image = $4, cooking_time = $5
        WHERE id = $6
    ",
    )
    .bind(session.user_id)
    .bind(form.name.trim())
    .bind(&form.text)
    .bind(&form.image)
    .bind(form.cooking_time)
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(QueryError::from)?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(QueryError::from)?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(QueryError::from)?;

    write_associations(id, form, &mut tx).await?;

    tx.commit().await.map_err(QueryError::from)?;

    log::info!("User {} updated recipe {id}", session.user_id);

    get_recipe(id, Some(session.user_id), pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.new("No recipe exists with specified id"))
}

/// Deletes a recipe; ingredient rows, favorites and cart entries cascade.
pub async fn delete_recipe(
    id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let recipe = get_recipe_mut(id, session, pool).await?;

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe.id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    log::info!("User {} deleted recipe {id}", session.user_id);

    Ok(())
}

/// Every submitted ingredient and tag id must exist.
async fn check_references(form: &RecipeForm, conn: &mut PgConnection) -> Result<(), Error> {
    let ingredient_ids = form.ingredient_ids();
    let known: Vec<(Id,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(&ingredient_ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(QueryError::from)?;

    if let Some(missing) = first_missing(&ingredient_ids, &known) {
        log::warn!("Rejected recipe write: unknown ingredient {missing}");
        return Err(HtmlError::InvalidRequest.field(
            "ingredients",
            &format!("Invalid pk \"{missing}\" - object does not exist."),
        ));
    }

    let tag_ids = form.tag_ids();
    if tag_ids.is_empty() {
        return Ok(());
    }

    let known: Vec<(Id,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
        .bind(&tag_ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(QueryError::from)?;

    if let Some(missing) = first_missing(&tag_ids, &known) {
        log::warn!("Rejected recipe write: unknown tag {missing}");
        return Err(HtmlError::InvalidRequest.field(
            "tags",
            &format!("Invalid pk \"{missing}\" - object does not exist."),
        ));
    }

    Ok(())
}

fn first_missing(submitted: &[Id], known: &[(Id,)]) -> Option<Id> {
    let known: HashSet<Id> = known.iter().map(|(id,)| *id).collect();
    submitted.iter().copied().find(|id| !known.contains(id))
}

async fn write_associations(
    recipe_id: Id,
    form: &RecipeForm,
    conn: &mut PgConnection,
) -> Result<(), Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    builder.push_values(&form.ingredients, |mut row, item| {
        row.push_bind(recipe_id)
            .push_bind(item.id)
            .push_bind(item.amount);
    });
    builder
        .build()
        .execute(&mut *conn)
        .await
        .map_err(QueryError::from)?;

    let tag_ids = form.tag_ids();
    if tag_ids.is_empty() {
        return Ok(());
    }

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
    builder.push_values(tag_ids, |mut row, tag_id| {
        row.push_bind(recipe_id).push_bind(tag_id);
    });
    builder
        .build()
        .execute(&mut *conn)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

/// Resolves authors, tags, ingredients and viewer flags for a page of recipes.
async fn materialize(
    recipes: Vec<Recipe>,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeDetail>, Error> {
    if recipes.is_empty() {
        return Ok(vec![]);
    }

    let ids: Vec<Id> = recipes.iter().map(|recipe| recipe.id).collect();

    let mut tags = list_recipe_tags(&ids, pool).await?;
    let mut ingredients = list_recipe_ingredients(&ids, pool).await?;
    let favorited = viewer_recipes("favorites", &ids, viewer, pool).await?;
    let in_cart = viewer_recipes("shopping_cart", &ids, viewer, pool).await?;

    let mut authors: HashMap<Id, UserProfile> = HashMap::new();
    for recipe in &recipes {
        if authors.contains_key(&recipe.author_id) {
            continue;
        }
        let author = get_profile(recipe.author_id, viewer, pool)
            .await?
            .ok_or_else(|| HtmlError::InternalServerError.new("Recipe author is missing"))?;
        authors.insert(recipe.author_id, author);
    }

    let details = recipes
        .into_iter()
        .filter_map(|recipe| {
            let author = authors.get(&recipe.author_id)?.clone();
            Some(RecipeDetail {
                id: recipe.id,
                author,
                tags: tags.remove(&recipe.id).unwrap_or_default(),
                ingredients: ingredients.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                name: recipe.name,
                image: recipe.image,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            })
        })
        .collect();

    Ok(details)
}

/// Which of `ids` the viewer has in `table` (`favorites` or `shopping_cart`).
async fn viewer_recipes(
    table: &str,
    ids: &[Id],
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<HashSet<Id>, Error> {
    let viewer = match viewer {
        Some(viewer) => viewer,
        None => return Ok(HashSet::new()),
    };

    let rows: Vec<(Id,)> = sqlx::query_as(&format!(
        "SELECT recipe_id FROM {table} WHERE user_id = $1 AND recipe_id = ANY($2)"
    ))
    .bind(viewer)
    .bind(ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}
