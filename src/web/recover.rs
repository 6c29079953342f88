use std::convert::Infallible;

use warp::{
    filters::body::BodyDeserializeError,
    reject::{
        InvalidQuery, LengthRequired, MethodNotAllowed, PayloadTooLarge, Rejection,
        UnsupportedMediaType,
    },
    reply::{self, Reply, Response},
};

use crate::error::{Error, HtmlError};

/// Renders every rejection as a JSON error body.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let error = rejection_error(&err);

    if error.code >= 500 {
        log::error!("Request failed: {error}");
    } else {
        log::trace!("> Request rejected: {error}");
    }

    Ok(reply::with_status(reply::json(&error.body()), error.status()).into_response())
}

fn rejection_error(err: &Rejection) -> Error {
    if let Some(error) = err.find::<Error>() {
        return error.clone();
    }

    if err.is_not_found() {
        return HtmlError::NotFound.default();
    }

    if let Some(e) = err.find::<BodyDeserializeError>() {
        return HtmlError::InvalidRequest.new(&e.to_string());
    }

    if err.find::<InvalidQuery>().is_some() {
        return HtmlError::InvalidRequest.new("Invalid query string");
    }

    if err.find::<UnsupportedMediaType>().is_some() {
        return Error::with_code(415, "Unsupported media type");
    }

    if err.find::<LengthRequired>().is_some() {
        return Error::with_code(411, "Content-Length header is required");
    }

    if err.find::<PayloadTooLarge>().is_some() {
        return Error::with_code(413, "Payload too large");
    }

    if err.find::<MethodNotAllowed>().is_some() {
        return Error::with_code(405, "Method not allowed");
    }

    log::error!("Unhandled rejection: {err:?}");
    HtmlError::InternalServerError.default()
}
