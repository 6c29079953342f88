#![allow(dead_code)]

use foodgram::{
    actions,
    config::Limits,
    connect::{connect, migrate},
    jwt::SessionData,
    schema::{Id, Ingredient, Tag, UserRole},
    validation::{IngredientAmount, IngredientForm, RecipeForm, TagForm, UserForm},
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// Connects to `DATABASE_URL` and applies migrations, or `None` when the
/// variable is unset.
pub async fn setup() -> Option<Pool<Postgres>> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL is not set, skipping database test");
            return None;
        }
    };

    let pool = connect(&url).await.expect("connect to test database");
    migrate(&pool).await.expect("migrate test database");

    Some(pool)
}

pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

pub async fn create_user(pool: &Pool<Postgres>, role: UserRole) -> SessionData {
    let username = unique("cook");
    let form = UserForm {
        email: format!("{username}@example.com"),
        username: username.clone(),
        first_name: String::from("Test"),
        last_name: String::from("Cook"),
        password: String::from("secret-password"),
    };

    let profile = actions::register_user(&form, &Limits::default(), pool)
        .await
        .expect("register user");

    if role == UserRole::Admin {
        sqlx::query("UPDATE users SET role = 'admin' WHERE id = $1")
            .bind(profile.id)
            .execute(pool)
            .await
            .expect("promote user");
    }

    SessionData {
        user_id: profile.id,
        username,
        role,
    }
}

pub async fn create_ingredient(pool: &Pool<Postgres>, name: &str, unit: &str) -> Ingredient {
    let form = IngredientForm {
        name: name.to_string(),
        measurement_unit: unit.to_string(),
    };

    actions::create_ingredient(&form, &Limits::default(), pool)
        .await
        .expect("create ingredient")
}

pub async fn create_tag(pool: &Pool<Postgres>) -> Tag {
    let slug = unique("tag");
    let color = format!("#{}", &Uuid::new_v4().simple().to_string()[..6]);
    let form = TagForm {
        name: slug.clone(),
        color,
        slug,
    };

    actions::create_tag(&form, &Limits::default(), pool)
        .await
        .expect("create tag")
}

pub fn recipe_form(ingredients: &[(Id, i32)], tags: &[Id]) -> RecipeForm {
    RecipeForm {
        name: unique("recipe"),
        text: String::from("Mix everything and bake."),
        image: String::from("data:image/png;base64,iVBORw0KGgo="),
        cooking_time: 30,
        ingredients: ingredients
            .iter()
            .map(|&(id, amount)| IngredientAmount { id, amount })
            .collect(),
        tags: tags.to_vec(),
    }
}
