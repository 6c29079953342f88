use std::collections::HashMap;

use crate::{
    config::Limits,
    error::{Error, QueryError},
    schema::{Id, LinkedRecipeTag, Tag},
    validation::TagForm,
};

use sqlx::{Pool, Postgres};

pub async fn create_tag(form: &TagForm, limits: &Limits, pool: &Pool<Postgres>) -> Result<Tag, Error> {
    form.validate(limits)?;

    let tag: Tag = sqlx::query_as(
        "INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(form.name.trim())
    .bind(form.color.to_uppercase())
    .bind(form.slug.trim())
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    log::info!("Created tag {} ({})", tag.slug, tag.id);

    Ok(tag)
}

pub async fn get_tag(id: Id, pool: &Pool<Postgres>) -> Result<Option<Tag>, Error> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(tag)
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(list)
}

/// Tags of every recipe in `recipe_ids`, keyed by recipe.
pub async fn list_recipe_tags(
    recipe_ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<HashMap<Id, Vec<Tag>>, Error> {
    let rows: Vec<LinkedRecipeTag> = sqlx::query_as(
        "
        SELECT rt.recipe_id AS recipe_id, t.id AS id, t.name AS name, t.color AS color, t.slug AS slug
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = ANY($1)
        ORDER BY t.name
    ",
    )
    .bind(recipe_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let mut map: HashMap<Id, Vec<Tag>> = HashMap::new();
    rows.into_iter()
        .for_each(|row| map.entry(row.recipe_id).or_default().push(row.tag));

    Ok(map)
}
