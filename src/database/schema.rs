use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Id = i32;

#[derive(
    Clone, Copy, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Deserialize, Eq, Ord, Hash,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: UserRole,
}

/// A user as seen by the viewer of a request.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct UserProfileRow {
    #[sqlx(flatten)]
    pub profile: UserProfile,
    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: Id,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ingredient {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeRow {
    #[sqlx(flatten)]
    pub recipe: Recipe,
    pub count: i64,
}

/// One ingredient of a recipe with its resolved name and unit.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipeIngredient {
    #[serde(skip)]
    pub recipe_id: Id,
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct LinkedRecipeTag {
    pub recipe_id: Id,
    #[sqlx(flatten)]
    pub tag: Tag,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeDetail {
    pub id: Id,
    pub author: UserProfile,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<RecipeIngredient>,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipeMinified {
    pub id: Id,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct AuthorRecipe {
    pub author_id: Id,
    #[sqlx(flatten)]
    pub recipe: RecipeMinified,
}

/// An author the viewer follows, with a preview of their recipes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    #[serde(flatten)]
    pub author: UserProfile,
    pub recipes: Vec<RecipeMinified>,
    pub recipes_count: i64,
}
