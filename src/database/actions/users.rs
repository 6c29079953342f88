use crate::{
    authentication::cryptography::{hash_password, verify_password},
    config::Limits,
    error::{Error, HtmlError, QueryError},
    jwt::SessionSigner,
    pagination::{PageContext, Paging},
    schema::{Id, User, UserProfile, UserProfileRow},
    validation::{LoginForm, PasswordForm, UserForm},
};

use sqlx::{Pool, Postgres};

const PROFILE_COLUMNS: &str = "
    u.id, u.email, u.username, u.first_name, u.last_name,
    EXISTS(SELECT 1 FROM subscriptions s WHERE s.user_id = $1 AND s.author_id = u.id) AS is_subscribed
";

pub async fn get_user_by_email(email: &str, pool: &Pool<Postgres>) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_user_by_id(user_id: Id, pool: &Pool<Postgres>) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

/// Profile of `user_id` with `is_subscribed` relative to `viewer`.
pub async fn get_profile(
    user_id: Id,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<Option<UserProfile>, Error> {
    let row: Option<UserProfile> =
        sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM users u WHERE u.id = $2"))
            .bind(viewer)
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn fetch_users(
    paging: Paging,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserProfile>, Error> {
    let rows: Vec<UserProfileRow> = sqlx::query_as(&format!(
        "SELECT {PROFILE_COLUMNS}, COUNT(*) OVER() AS count FROM users u ORDER BY u.username LIMIT $2 OFFSET $3"
    ))
    .bind(viewer)
    .bind(paging.limit)
    .bind(paging.offset())
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    if rows.is_empty() && paging.page > 1 {
        return Err(HtmlError::NotFound.new("Invalid page."));
    }

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let rows = rows.into_iter().map(|row| row.profile).collect();

    Ok(PageContext::from_rows(rows, total_count, paging))
}

/// Creates a user; the password is stored as an argon2 hash.
pub async fn register_user(
    form: &UserForm,
    limits: &Limits,
    pool: &Pool<Postgres>,
) -> Result<UserProfile, Error> {
    form.validate(limits)?;
    let password = hash_password(&form.password)?;

    let (id,): (Id,) = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(form.email.trim())
    .bind(form.username.trim())
    .bind(form.first_name.trim())
    .bind(form.last_name.trim())
    .bind(password)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    log::info!("Registered user {} ({id})", form.username);

    Ok(UserProfile {
        id,
        email: form.email.trim().to_string(),
        username: form.username.trim().to_string(),
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        is_subscribed: false,
    })
}

/// Returns a signed session token for valid credentials.
pub async fn login_user(
    form: &LoginForm,
    signer: &SessionSigner,
    pool: &Pool<Postgres>,
) -> Result<String, Error> {
    let user = get_user_by_email(&form.email, pool)
        .await?
        .ok_or_else(|| HtmlError::InvalidRequest.new("Invalid credentials"))?;

    if !verify_password(&form.password, &user.password)? {
        log::warn!("Failed login for {}", user.username);
        return Err(HtmlError::InvalidRequest.new("Invalid credentials"));
    }

    signer.sign(&user)
}

pub async fn set_password(
    user_id: Id,
    form: &PasswordForm,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    if form.new_password.trim().is_empty() {
        return Err(HtmlError::InvalidRequest.field("new_password", "This field may not be blank."));
    }

    let user = get_user_by_id(user_id, pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.default())?;

    if !verify_password(&form.current_password, &user.password)? {
        return Err(HtmlError::InvalidRequest.field("current_password", "Invalid password."));
    }

    let password = hash_password(&form.new_password)?;
    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(password)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}
