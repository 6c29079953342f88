use std::{convert::Infallible, sync::Arc};

use sqlx::{Pool, Postgres};
use warp::Filter;

use crate::{config::Limits, jwt::SessionSigner};

pub struct AppState {
    pub pool: Pool<Postgres>,
    pub signer: SessionSigner,
    pub limits: Limits,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(pool: Pool<Postgres>, signer: SessionSigner, limits: Limits) -> SharedState {
        Arc::new(Self {
            pool,
            signer,
            limits,
        })
    }
}

pub fn with_state(
    state: SharedState,
) -> impl Filter<Extract = (SharedState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}
