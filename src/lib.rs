mod database {
    pub mod actions;
    pub mod connect;
    pub mod error;
    pub mod form;
    pub mod pagination;
    pub mod schema;
    pub mod validation;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod web {
    pub mod handlers;
    pub mod recover;
    pub mod routes;
    pub mod server;
    pub mod state;
}
pub mod config;
mod constants;

pub use authentication::*;
pub use constants::*;
pub use database::*;
pub use web::*;
