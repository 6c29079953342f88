use serde::Serialize;
use serde_json::json;
use warp::{
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    reject::Rejection,
    reply::{self, Reply, Response},
};

use crate::{
    actions::{self, RecipeFilter, RecipeList},
    constants::SHOPPING_LIST_FILENAME,
    error::{Error, HtmlError},
    form::{Form, FormData},
    jwt::SessionData,
    pagination::Paging,
    permissions::ActionType,
    schema::Id,
    validation::{IngredientForm, LoginForm, PasswordForm, RecipeForm, TagForm, UserForm},
};

use super::state::SharedState;

type HandlerResult = Result<Response, Rejection>;

fn json<T: Serialize>(value: &T, status: StatusCode) -> Response {
    reply::with_status(reply::json(value), status).into_response()
}

fn ok<T: Serialize>(value: &T) -> HandlerResult {
    Ok(json(value, StatusCode::OK))
}

fn created<T: Serialize>(value: &T) -> HandlerResult {
    Ok(json(value, StatusCode::CREATED))
}

fn no_content() -> HandlerResult {
    Ok(StatusCode::NO_CONTENT.into_response())
}

fn paging(form: &Form, state: &SharedState) -> Result<Paging, Error> {
    Ok(Paging::from_form(form, state.limits.page_size)?)
}

fn viewer(session: &Option<SessionData>) -> Option<Id> {
    session.as_ref().map(|session| session.user_id)
}

// Users

pub async fn register_user(state: SharedState, form: UserForm) -> HandlerResult {
    let profile = actions::register_user(&form, &state.limits, &state.pool).await?;
    created(&profile)
}

pub async fn list_users(
    state: SharedState,
    session: Option<SessionData>,
    query: FormData,
) -> HandlerResult {
    let form = Form::from_data(query);
    let page = actions::fetch_users(paging(&form, &state)?, viewer(&session), &state.pool).await?;
    ok(&page)
}

pub async fn me(state: SharedState, session: SessionData) -> HandlerResult {
    let profile = actions::get_profile(session.user_id, Some(session.user_id), &state.pool)
        .await?
        .ok_or_else(|| HtmlError::InvalidSession.default())?;
    ok(&profile)
}

pub async fn get_user(
    id: Id,
    state: SharedState,
    session: Option<SessionData>,
) -> HandlerResult {
    let profile = actions::get_profile(id, viewer(&session), &state.pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.default())?;
    ok(&profile)
}

pub async fn set_password(
    state: SharedState,
    session: SessionData,
    form: PasswordForm,
) -> HandlerResult {
    actions::set_password(session.user_id, &form, &state.pool).await?;
    no_content()
}

pub async fn login(state: SharedState, form: LoginForm) -> HandlerResult {
    let token = actions::login_user(&form, &state.signer, &state.pool).await?;
    ok(&json!({ "auth_token": token }))
}

// Subscriptions

pub async fn list_subscriptions(
    state: SharedState,
    session: SessionData,
    query: FormData,
) -> HandlerResult {
    session.authenticate(ActionType::ManageSubscriptions)?;

    let form = Form::from_data(query);
    let recipes_limit = form.get_number("recipes_limit").map_err(Error::from)?;
    let page = actions::fetch_subscriptions(
        session.user_id,
        paging(&form, &state)?,
        recipes_limit,
        &state.pool,
    )
    .await?;
    ok(&page)
}

pub async fn subscribe(
    id: Id,
    state: SharedState,
    session: SessionData,
    query: FormData,
) -> HandlerResult {
    session.authenticate(ActionType::ManageSubscriptions)?;

    let form = Form::from_data(query);
    let recipes_limit = form.get_number("recipes_limit").map_err(Error::from)?;
    let subscription =
        actions::subscribe(session.user_id, id, recipes_limit, &state.pool).await?;
    created(&subscription)
}

pub async fn unsubscribe(id: Id, state: SharedState, session: SessionData) -> HandlerResult {
    session.authenticate(ActionType::ManageSubscriptions)?;

    actions::unsubscribe(session.user_id, id, &state.pool).await?;
    no_content()
}

// Tags

pub async fn list_tags(state: SharedState) -> HandlerResult {
    ok(&actions::list_tags(&state.pool).await?)
}

pub async fn get_tag(id: Id, state: SharedState) -> HandlerResult {
    let tag = actions::get_tag(id, &state.pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.default())?;
    ok(&tag)
}

pub async fn create_tag(state: SharedState, session: SessionData, form: TagForm) -> HandlerResult {
    session.authenticate(ActionType::ManageTags)?;

    let tag = actions::create_tag(&form, &state.limits, &state.pool).await?;
    created(&tag)
}

// Ingredients

pub async fn list_ingredients(state: SharedState, query: FormData) -> HandlerResult {
    let form = Form::from_data(query);
    ok(&actions::list_ingredients(form.get_str("name"), &state.pool).await?)
}

pub async fn get_ingredient(id: Id, state: SharedState) -> HandlerResult {
    let ingredient = actions::get_ingredient(id, &state.pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.default())?;
    ok(&ingredient)
}

pub async fn create_ingredient(
    state: SharedState,
    session: SessionData,
    form: IngredientForm,
) -> HandlerResult {
    session.authenticate(ActionType::ManageIngredients)?;

    let ingredient = actions::create_ingredient(&form, &state.limits, &state.pool).await?;
    created(&ingredient)
}

// Recipes

pub async fn list_recipes(
    state: SharedState,
    session: Option<SessionData>,
    query: FormData,
) -> HandlerResult {
    let form = Form::from_data(query);
    let filter = RecipeFilter::from_form(&form).map_err(Error::from)?;
    let page = actions::fetch_recipes(
        &filter,
        paging(&form, &state)?,
        viewer(&session),
        &state.pool,
    )
    .await?;
    ok(&page)
}

pub async fn get_recipe(
    id: Id,
    state: SharedState,
    session: Option<SessionData>,
) -> HandlerResult {
    let recipe = actions::get_recipe(id, viewer(&session), &state.pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.default())?;
    ok(&recipe)
}

pub async fn create_recipe(
    state: SharedState,
    session: SessionData,
    form: RecipeForm,
) -> HandlerResult {
    let recipe = actions::create_recipe(&form, &session, &state.limits, &state.pool).await?;
    created(&recipe)
}

pub async fn update_recipe(
    id: Id,
    state: SharedState,
    session: SessionData,
    form: RecipeForm,
) -> HandlerResult {
    let recipe = actions::update_recipe(id, &form, &session, &state.limits, &state.pool).await?;
    ok(&recipe)
}

pub async fn delete_recipe(id: Id, state: SharedState, session: SessionData) -> HandlerResult {
    actions::delete_recipe(id, &session, &state.pool).await?;
    no_content()
}

// Favorites and shopping cart

async fn add_to_list(
    list: RecipeList,
    id: Id,
    state: SharedState,
    session: SessionData,
) -> HandlerResult {
    session.authenticate(ActionType::ManageOwnLists)?;

    let recipe = actions::add_to_list(list, id, session.user_id, &state.pool).await?;
    created(&recipe)
}

async fn remove_from_list(
    list: RecipeList,
    id: Id,
    state: SharedState,
    session: SessionData,
) -> HandlerResult {
    session.authenticate(ActionType::ManageOwnLists)?;

    actions::remove_from_list(list, id, session.user_id, &state.pool).await?;
    no_content()
}

pub async fn add_favorite(id: Id, state: SharedState, session: SessionData) -> HandlerResult {
    add_to_list(RecipeList::Favorites, id, state, session).await
}

pub async fn remove_favorite(id: Id, state: SharedState, session: SessionData) -> HandlerResult {
    remove_from_list(RecipeList::Favorites, id, state, session).await
}

pub async fn add_to_cart(id: Id, state: SharedState, session: SessionData) -> HandlerResult {
    add_to_list(RecipeList::ShoppingCart, id, state, session).await
}

pub async fn remove_from_cart(id: Id, state: SharedState, session: SessionData) -> HandlerResult {
    remove_from_list(RecipeList::ShoppingCart, id, state, session).await
}

pub async fn download_shopping_cart(state: SharedState, session: SessionData) -> HandlerResult {
    session.authenticate(ActionType::ManageOwnLists)?;

    let list = actions::build_shopping_list(session.user_id, &state.pool).await?;
    log::info!(
        "User {} downloaded a shopping list with {} lines",
        session.user_id,
        list.items().len()
    );

    let body = reply::with_header(list.to_string(), CONTENT_TYPE, "text/plain; charset=utf-8");
    let body = reply::with_header(
        body,
        CONTENT_DISPOSITION,
        format!("attachment; filename={SHOPPING_LIST_FILENAME}"),
    );

    Ok(body.into_response())
}
