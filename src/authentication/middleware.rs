use warp::{reject::Rejection, Filter};

use super::jwt::{SessionData, SessionSigner};
use crate::error::HtmlError;

/// Accepts `Token <jwt>` as well as `Bearer <jwt>`.
fn token_from_header(value: &str) -> Option<&str> {
    value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn read_session(
    signer: &SessionSigner,
    header: Option<String>,
) -> Result<Option<SessionData>, Rejection> {
    match header {
        None => Ok(None),
        Some(header) => match token_from_header(&header) {
            Some(token) => signer.verify(token).map(Some).map_err(Rejection::from),
            None => Err(HtmlError::InvalidSession.default().into()),
        },
    }
}

pub fn with_session(
    signer: SessionSigner,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let signer = signer.clone();
        async move {
            match read_session(&signer, header)? {
                Some(session) => Ok(session),
                None => Err(Rejection::from(HtmlError::Unauthorized.default())),
            }
        }
    })
}

/// Anonymous requests pass through as `None`; a malformed or expired token is still rejected.
pub fn with_possible_session(
    signer: SessionSigner,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let signer = signer.clone();
        async move { read_session(&signer, header) }
    })
}
