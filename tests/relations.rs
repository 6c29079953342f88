//! Favorites, subscriptions and cascading deletes.

mod common;

use common::{create_ingredient, create_user, recipe_form, setup, unique};
use foodgram::{
    actions::{self, RecipeFilter, RecipeList},
    config::Limits,
    pagination::Paging,
    schema::UserRole,
    validation::UserForm,
};

#[tokio::test]
async fn favorites_are_unique_per_user() {
    let Some(pool) = setup().await else { return };

    let author = create_user(&pool, UserRole::User).await;
    let fan = create_user(&pool, UserRole::User).await;
    let x = create_ingredient(&pool, &unique("x"), "g").await;
    let recipe = actions::create_recipe(
        &recipe_form(&[(x.id, 1)], &[]),
        &author,
        &Limits::default(),
        &pool,
    )
    .await
    .unwrap();

    let minified = actions::add_to_list(RecipeList::Favorites, recipe.id, fan.user_id, &pool)
        .await
        .unwrap();
    assert_eq!(minified.id, recipe.id);
    assert_eq!(minified.name, recipe.name);

    let error = actions::add_to_list(RecipeList::Favorites, recipe.id, fan.user_id, &pool)
        .await
        .unwrap_err();
    assert_eq!(error.code, 400);

    let detail = actions::get_recipe(recipe.id, Some(fan.user_id), &pool)
        .await
        .unwrap()
        .unwrap();
    assert!(detail.is_favorited);
    assert!(!detail.is_in_shopping_cart);

    let filter = RecipeFilter {
        is_favorited: true,
        ..RecipeFilter::default()
    };
    let page = actions::fetch_recipes(&filter, Paging::new(None, None, 6), Some(fan.user_id), &pool)
        .await
        .unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].id, recipe.id);

    actions::remove_from_list(RecipeList::Favorites, recipe.id, fan.user_id, &pool)
        .await
        .unwrap();
    let error = actions::remove_from_list(RecipeList::Favorites, recipe.id, fan.user_id, &pool)
        .await
        .unwrap_err();
    assert_eq!(error.code, 404);
}

#[tokio::test]
async fn unknown_recipe_cannot_be_favorited() {
    let Some(pool) = setup().await else { return };

    let fan = create_user(&pool, UserRole::User).await;
    let error = actions::add_to_list(RecipeList::Favorites, i32::MAX, fan.user_id, &pool)
        .await
        .unwrap_err();

    assert_eq!(error.code, 404);
}

#[tokio::test]
async fn self_subscription_is_rejected() {
    let Some(pool) = setup().await else { return };

    let user = create_user(&pool, UserRole::User).await;
    let error = actions::subscribe(user.user_id, user.user_id, None, &pool)
        .await
        .unwrap_err();
    assert_eq!(error.code, 400);

    // Even for an id that does not exist.
    let error = actions::subscribe(i32::MAX, i32::MAX, Some(3), &pool)
        .await
        .unwrap_err();
    assert_eq!(error.code, 400);

    let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);
}

#[tokio::test]
async fn subscription_lifecycle() {
    let Some(pool) = setup().await else { return };

    let author = create_user(&pool, UserRole::User).await;
    let follower = create_user(&pool, UserRole::User).await;
    let x = create_ingredient(&pool, &unique("x"), "g").await;

    for _ in 0..3 {
        actions::create_recipe(
            &recipe_form(&[(x.id, 1)], &[]),
            &author,
            &Limits::default(),
            &pool,
        )
        .await
        .unwrap();
    }

    let subscription = actions::subscribe(follower.user_id, author.user_id, Some(2), &pool)
        .await
        .unwrap();
    assert!(subscription.author.is_subscribed);
    assert_eq!(subscription.recipes.len(), 2);
    assert_eq!(subscription.recipes_count, 3);

    let error = actions::subscribe(follower.user_id, author.user_id, None, &pool)
        .await
        .unwrap_err();
    assert_eq!(error.code, 400);

    let page = actions::fetch_subscriptions(follower.user_id, Paging::new(None, None, 6), None, &pool)
        .await
        .unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].author.id, author.user_id);
    assert_eq!(page.results[0].recipes.len(), 3);

    let profile = actions::get_profile(author.user_id, Some(follower.user_id), &pool)
        .await
        .unwrap()
        .unwrap();
    assert!(profile.is_subscribed);

    actions::unsubscribe(follower.user_id, author.user_id, &pool)
        .await
        .unwrap();
    let error = actions::unsubscribe(follower.user_id, author.user_id, &pool)
        .await
        .unwrap_err();
    assert_eq!(error.code, 404);
}

#[tokio::test]
async fn unknown_author_cannot_be_followed() {
    let Some(pool) = setup().await else { return };

    let follower = create_user(&pool, UserRole::User).await;
    let error = actions::subscribe(follower.user_id, i32::MAX, None, &pool)
        .await
        .unwrap_err();

    assert_eq!(error.code, 404);
}

#[tokio::test]
async fn deleting_a_recipe_cascades() {
    let Some(pool) = setup().await else { return };

    let author = create_user(&pool, UserRole::User).await;
    let fan = create_user(&pool, UserRole::User).await;
    let x = create_ingredient(&pool, &unique("x"), "g").await;
    let recipe = actions::create_recipe(
        &recipe_form(&[(x.id, 1)], &[]),
        &author,
        &Limits::default(),
        &pool,
    )
    .await
    .unwrap();

    actions::add_to_list(RecipeList::Favorites, recipe.id, fan.user_id, &pool)
        .await
        .unwrap();
    actions::add_to_list(RecipeList::ShoppingCart, recipe.id, fan.user_id, &pool)
        .await
        .unwrap();

    actions::delete_recipe(recipe.id, &author, &pool).await.unwrap();

    assert!(actions::get_recipe(recipe.id, None, &pool)
        .await
        .unwrap()
        .is_none());

    for table in ["recipe_ingredients", "favorites", "shopping_cart"] {
        let (rows,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM {table} WHERE recipe_id = $1"))
                .bind(recipe.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(rows, 0, "{table}");
    }

    // The ingredient itself survives.
    assert!(actions::get_ingredient(x.id, &pool).await.unwrap().is_some());
}

#[tokio::test]
async fn deleting_a_user_cascades() {
    let Some(pool) = setup().await else { return };

    let cook = create_user(&pool, UserRole::User).await;
    let other = create_user(&pool, UserRole::User).await;
    let fan = create_user(&pool, UserRole::User).await;
    let x = create_ingredient(&pool, &unique("x"), "g").await;

    let own = actions::create_recipe(
        &recipe_form(&[(x.id, 1)], &[]),
        &cook,
        &Limits::default(),
        &pool,
    )
    .await
    .unwrap();
    let foreign = actions::create_recipe(
        &recipe_form(&[(x.id, 2)], &[]),
        &other,
        &Limits::default(),
        &pool,
    )
    .await
    .unwrap();

    for list in [RecipeList::Favorites, RecipeList::ShoppingCart] {
        actions::add_to_list(list, own.id, fan.user_id, &pool)
            .await
            .unwrap();
        actions::add_to_list(list, foreign.id, cook.user_id, &pool)
            .await
            .unwrap();
    }
    actions::subscribe(fan.user_id, cook.user_id, None, &pool)
        .await
        .unwrap();
    actions::subscribe(cook.user_id, other.user_id, None, &pool)
        .await
        .unwrap();

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(cook.user_id)
        .execute(&pool)
        .await
        .unwrap();

    let (recipes,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(cook.user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(recipes, 0);

    for table in ["favorites", "shopping_cart"] {
        let (rows,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM {table} WHERE user_id = $1 OR recipe_id = $2"
        ))
        .bind(cook.user_id)
        .bind(own.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(rows, 0, "{table}");
    }

    let (subscriptions,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1 OR author_id = $1")
            .bind(cook.user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(subscriptions, 0);

    // Other users and their content are untouched.
    assert!(actions::get_recipe(foreign.id, None, &pool)
        .await
        .unwrap()
        .is_some());
    assert!(actions::get_user_by_id(fan.user_id, &pool)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn emails_are_unique_regardless_of_case() {
    let Some(pool) = setup().await else { return };

    let username = unique("case");
    let form = UserForm {
        email: format!("Mixed-{username}@Example.com"),
        username: username.clone(),
        first_name: String::from("Case"),
        last_name: String::from("Test"),
        password: String::from("secret-password"),
    };
    actions::register_user(&form, &Limits::default(), &pool)
        .await
        .unwrap();

    let duplicate = UserForm {
        email: form.email.to_lowercase(),
        username: unique("case"),
        ..form.clone()
    };
    let error = actions::register_user(&duplicate, &Limits::default(), &pool)
        .await
        .unwrap_err();
    assert_eq!(error.code, 400);
    assert_eq!(error.field.as_deref(), Some("email"));

    let signer = foodgram::jwt::SessionSigner::new("test-secret", 1).unwrap();
    let login = foodgram::validation::LoginForm {
        email: form.email.to_lowercase(),
        password: form.password.clone(),
    };
    assert!(actions::login_user(&login, &signer, &pool).await.is_ok());
}

#[tokio::test]
async fn login_issues_a_verifiable_token() {
    let Some(pool) = setup().await else { return };

    let user = create_user(&pool, UserRole::User).await;
    let signer = foodgram::jwt::SessionSigner::new("test-secret", 1).unwrap();

    let form = foodgram::validation::LoginForm {
        email: format!("{}@example.com", user.username),
        password: String::from("secret-password"),
    };
    let token = actions::login_user(&form, &signer, &pool).await.unwrap();
    assert_eq!(signer.verify(&token).unwrap().user_id, user.user_id);

    let form = foodgram::validation::LoginForm {
        password: String::from("wrong"),
        ..form
    };
    assert_eq!(
        actions::login_user(&form, &signer, &pool).await.unwrap_err().code,
        400
    );
}
