use std::collections::HashMap;

use crate::{
    error::{Error, HtmlError, QueryError},
    pagination::{PageContext, Paging},
    schema::{AuthorRecipe, Id, RecipeMinified, Subscription, UserProfile, UserProfileRow},
};

use super::users::get_profile;

use sqlx::{Pool, Postgres};

/// `user_id` starts following `author_id`. Following yourself is always refused.
pub async fn subscribe(
    user_id: Id,
    author_id: Id,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Subscription, Error> {
    if user_id == author_id {
        return Err(HtmlError::InvalidRequest.new("You cannot subscribe to yourself"));
    }

    let author = get_profile(author_id, Some(user_id), pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.new("User doesn't exist"))?;

    let result = sqlx::query(
        "INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HtmlError::InvalidRequest.new("You are already subscribed to this author"));
    }

    log::info!("User {user_id} subscribed to {author_id}");

    let author = UserProfile {
        is_subscribed: true,
        ..author
    };

    let mut subscriptions = attach_recipes(vec![author], recipes_limit, pool).await?;
    subscriptions
        .pop()
        .ok_or_else(|| HtmlError::InternalServerError.default())
}

pub async fn unsubscribe(user_id: Id, author_id: Id, pool: &Pool<Postgres>) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HtmlError::NotFound.new("You are not subscribed to this author"));
    }

    log::info!("User {user_id} unsubscribed from {author_id}");

    Ok(())
}

/// Authors followed by `user_id`, each with a preview of their recipes.
pub async fn fetch_subscriptions(
    user_id: Id,
    paging: Paging,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<Subscription>, Error> {
    let rows: Vec<UserProfileRow> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name,
            TRUE AS is_subscribed, COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY u.username
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(paging.limit)
    .bind(paging.offset())
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    if rows.is_empty() && paging.page > 1 {
        return Err(HtmlError::NotFound.new("Invalid page."));
    }

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let authors = rows.into_iter().map(|row| row.profile).collect();
    let subscriptions = attach_recipes(authors, recipes_limit, pool).await?;

    Ok(PageContext::from_rows(subscriptions, total_count, paging))
}

async fn attach_recipes(
    authors: Vec<UserProfile>,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Subscription>, Error> {
    let ids: Vec<Id> = authors.iter().map(|author| author.id).collect();

    let rows: Vec<AuthorRecipe> = sqlx::query_as(
        "
        SELECT author_id, id, name, image, cooking_time
        FROM recipes
        WHERE author_id = ANY($1)
        ORDER BY pub_date DESC, id DESC
    ",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let mut recipes: HashMap<Id, Vec<RecipeMinified>> = HashMap::new();
    rows.into_iter()
        .for_each(|row| recipes.entry(row.author_id).or_default().push(row.recipe));

    Ok(authors
        .into_iter()
        .map(|author| {
            let all = recipes.remove(&author.id).unwrap_or_default();
            Subscription {
                recipes_count: all.len() as i64,
                recipes: limit_recipes(all, recipes_limit),
                author,
            }
        })
        .collect())
}

fn limit_recipes(mut recipes: Vec<RecipeMinified>, limit: Option<i64>) -> Vec<RecipeMinified> {
    if let Some(limit) = limit {
        recipes.truncate(limit.max(0) as usize);
    }
    recipes
}
