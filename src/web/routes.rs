use std::convert::Infallible;

use serde::de::DeserializeOwned;
use warp::{
    filters::BoxedFilter,
    reject::Rejection,
    reply::Response,
    Filter,
};

use crate::{
    constants::BODY_SIZE_LIMIT,
    form::FormData,
    middleware::{with_possible_session, with_session},
    schema::Id,
};

use super::{
    handlers,
    recover::handle_rejection,
    state::{with_state, SharedState},
};

fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: DeserializeOwned + Send,
{
    warp::body::content_length_limit(BODY_SIZE_LIMIT).and(warp::body::json())
}

fn query() -> impl Filter<Extract = (FormData,), Error = Rejection> + Clone {
    warp::query::<FormData>()
}

/// Every endpoint under `/api`, with rejections rendered as JSON.
pub fn routes(state: SharedState) -> impl Filter<Extract = (Response,), Error = Infallible> + Clone {
    let api = users(&state)
        .or(tags(&state))
        .unify()
        .or(ingredients(&state))
        .unify()
        .or(recipes(&state))
        .unify();

    warp::path("api")
        .and(api)
        .recover(handle_rejection)
        .unify()
}

fn users(state: &SharedState) -> BoxedFilter<(Response,)> {
    let register = warp::path!("users")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body())
        .and_then(handlers::register_user);

    let list = warp::path!("users")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(with_possible_session(state.signer.clone()))
        .and(query())
        .and_then(handlers::list_users);

    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(with_session(state.signer.clone()))
        .and_then(handlers::me);

    let set_password = warp::path!("users" / "set_password")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(with_session(state.signer.clone()))
        .and(json_body())
        .and_then(handlers::set_password);

    let subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(with_session(state.signer.clone()))
        .and(query())
        .and_then(handlers::list_subscriptions);

    let subscribe = warp::path!("users" / Id / "subscribe")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(with_session(state.signer.clone()))
        .and(query())
        .and_then(handlers::subscribe);

    let unsubscribe = warp::path!("users" / Id / "subscribe")
        .and(warp::delete())
        .and(with_state(state.clone()))
        .and(with_session(state.signer.clone()))
        .and_then(handlers::unsubscribe);

    let profile = warp::path!("users" / Id)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(with_possible_session(state.signer.clone()))
        .and_then(handlers::get_user);

    let login = warp::path!("auth" / "token" / "login")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body())
        .and_then(handlers::login);

    register
        .or(list)
        .unify()
        .or(me)
        .unify()
        .or(set_password)
        .unify()
        .or(subscriptions)
        .unify()
        .or(subscribe)
        .unify()
        .or(unsubscribe)
        .unify()
        .or(profile)
        .unify()
        .or(login)
        .unify()
        .boxed()
}

fn tags(state: &SharedState) -> BoxedFilter<(Response,)> {
    let list = warp::path!("tags")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::list_tags);

    let create = warp::path!("tags")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(with_session(state.signer.clone()))
        .and(json_body())
        .and_then(handlers::create_tag);

    let get = warp::path!("tags" / Id)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_tag);

    list.or(create).unify().or(get).unify().boxed()
}

fn ingredients(state: &SharedState) -> BoxedFilter<(Response,)> {
    let list = warp::path!("ingredients")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(query())
        .and_then(handlers::list_ingredients);

    let create = warp::path!("ingredients")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(with_session(state.signer.clone()))
        .and(json_body())
        .and_then(handlers::create_ingredient);

    let get = warp::path!("ingredients" / Id)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_ingredient);

    list.or(create).unify().or(get).unify().boxed()
}

fn recipes(state: &SharedState) -> BoxedFilter<(Response,)> {
    let list = warp::path!("recipes")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(with_possible_session(state.signer.clone()))
        .and(query())
        .and_then(handlers::list_recipes);

    let create = warp::path!("recipes")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(with_session(state.signer.clone()))
        .and(json_body())
        .and_then(handlers::create_recipe);

    let download = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(with_session(state.signer.clone()))
        .and_then(handlers::download_shopping_cart);

    let get = warp::path!("recipes" / Id)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(with_possible_session(state.signer.clone()))
        .and_then(handlers::get_recipe);

    let update = warp::path!("recipes" / Id)
        .and(warp::patch())
        .and(with_state(state.clone()))
        .and(with_session(state.signer.clone()))
        .and(json_body())
        .and_then(handlers::update_recipe);

    let delete = warp::path!("recipes" / Id)
        .and(warp::delete())
        .and(with_state(state.clone()))
        .and(with_session(state.signer.clone()))
        .and_then(handlers::delete_recipe);

    let favorite = warp::path!("recipes" / Id / "favorite");
    let add_favorite = favorite
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(with_session(state.signer.clone()))
        .and_then(handlers::add_favorite);
    let remove_favorite = favorite
        .and(warp::delete())
        .and(with_state(state.clone()))
        .and(with_session(state.signer.clone()))
        .and_then(handlers::remove_favorite);

    let cart = warp::path!("recipes" / Id / "shopping_cart");
    let add_to_cart = cart
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(with_session(state.signer.clone()))
        .and_then(handlers::add_to_cart);
    let remove_from_cart = cart
        .and(warp::delete())
        .and(with_state(state.clone()))
        .and(with_session(state.signer.clone()))
        .and_then(handlers::remove_from_cart);

    list.or(create)
        .unify()
        .or(download)
        .unify()
        .or(get)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .or(add_favorite)
        .unify()
        .or(remove_favorite)
        .unify()
        .or(add_to_cart)
        .unify()
        .or(remove_from_cart)
        .unify()
        .boxed()
}
