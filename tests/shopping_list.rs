mod common;

use common::{create_ingredient, create_user, recipe_form, setup, unique};
use foodgram::{
    actions::{self, RecipeList},
    config::Limits,
    jwt::SessionSigner,
    routes::routes,
    schema::UserRole,
    state::AppState,
};
use warp::http::{header, StatusCode};

#[tokio::test]
async fn shared_ingredient_is_summed_across_recipes() {
    let Some(pool) = setup().await else { return };

    let author = create_user(&pool, UserRole::User).await;
    let shopper = create_user(&pool, UserRole::User).await;
    let flour = unique("flour");
    let grams = create_ingredient(&pool, &flour, "grams").await;
    let cups = create_ingredient(&pool, &flour, "cups").await;

    let a = actions::create_recipe(
        &recipe_form(&[(grams.id, 200), (cups.id, 1)], &[]),
        &author,
        &Limits::default(),
        &pool,
    )
    .await
    .unwrap();
    let b = actions::create_recipe(
        &recipe_form(&[(grams.id, 150)], &[]),
        &author,
        &Limits::default(),
        &pool,
    )
    .await
    .unwrap();

    for id in [a.id, b.id] {
        actions::add_to_list(RecipeList::ShoppingCart, id, shopper.user_id, &pool)
            .await
            .unwrap();
    }

    let list = actions::build_shopping_list(shopper.user_id, &pool).await.unwrap();
    assert_eq!(
        list.to_string(),
        format!("{flour} cups - 1\n{flour} grams - 350\n")
    );

    let again = actions::build_shopping_list(shopper.user_id, &pool).await.unwrap();
    assert_eq!(list.to_string(), again.to_string());
}

#[tokio::test]
async fn empty_cart_is_an_empty_file() {
    let Some(pool) = setup().await else { return };

    let shopper = create_user(&pool, UserRole::User).await;
    let list = actions::build_shopping_list(shopper.user_id, &pool).await.unwrap();

    assert!(list.is_empty());
    assert_eq!(list.to_string(), "");
}

#[tokio::test]
async fn removed_recipe_leaves_the_list() {
    let Some(pool) = setup().await else { return };

    let author = create_user(&pool, UserRole::User).await;
    let salt = create_ingredient(&pool, &unique("salt"), "g").await;
    let recipe = actions::create_recipe(
        &recipe_form(&[(salt.id, 5)], &[]),
        &author,
        &Limits::default(),
        &pool,
    )
    .await
    .unwrap();

    actions::add_to_list(RecipeList::ShoppingCart, recipe.id, author.user_id, &pool)
        .await
        .unwrap();
    actions::remove_from_list(RecipeList::ShoppingCart, recipe.id, author.user_id, &pool)
        .await
        .unwrap();

    let list = actions::build_shopping_list(author.user_id, &pool).await.unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn download_serves_the_list_as_an_attachment() {
    let Some(pool) = setup().await else { return };

    let author = create_user(&pool, UserRole::User).await;
    let shopper = create_user(&pool, UserRole::User).await;
    let flour = unique("flour");
    let grams = create_ingredient(&pool, &flour, "grams").await;

    for amount in [200, 150] {
        let recipe = actions::create_recipe(
            &recipe_form(&[(grams.id, amount)], &[]),
            &author,
            &Limits::default(),
            &pool,
        )
        .await
        .unwrap();
        actions::add_to_list(RecipeList::ShoppingCart, recipe.id, shopper.user_id, &pool)
            .await
            .unwrap();
    }

    let signer = SessionSigner::new("download-secret", 1).unwrap();
    let user = actions::get_user_by_id(shopper.user_id, &pool)
        .await
        .unwrap()
        .unwrap();
    let token = signer.sign(&user).unwrap();
    let app = routes(AppState::new(pool.clone(), signer, Limits::default()));

    let response = warp::test::request()
        .path("/api/recipes/download_shopping_cart/")
        .header("authorization", format!("Token {token}"))
        .reply(&app)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=shop_list.txt"
    );
    assert_eq!(response.body().as_ref(), format!("{flour} grams - 350\n").as_bytes());
}

#[tokio::test]
async fn download_requires_a_session() {
    let Some(pool) = setup().await else { return };

    let signer = SessionSigner::new("download-secret", 1).unwrap();
    let app = routes(AppState::new(pool, signer, Limits::default()));

    let response = warp::test::request()
        .path("/api/recipes/download_shopping_cart/")
        .reply(&app)
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
