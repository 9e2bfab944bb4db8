//! Request handlers.
//!
//! Store and filesystem work is blocking, so every handler that touches them
//! hands the work to [`tokio::task::spawn_blocking`].

use axum::extract::{Form, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::debug;

use super::error::AppResult;
use super::views;
use super::AppState;
use crate::error::Result;
use crate::person::{first_form_value, PersonFields};
use crate::profile::ProfileView;
use crate::registration;

/// Characters escaped when a token is placed in a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const PROFILE_NOT_FOUND: &str = "Profile not found.";

/// Decoded `application/x-www-form-urlencoded` body, repeated keys included.
type FormPairs = Vec<(String, String)>;

async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

/// `/register/<token>` with the token percent-encoded as one segment.
#[must_use]
pub fn register_path(token: &str) -> String {
    format!("/register/{}", utf8_percent_encode(token, PATH_SEGMENT))
}

/// Parse a profile id. Only plain decimal digits can have been assigned, so
/// signs, whitespace and out-of-range values yield `None`.
fn parse_profile_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

pub(super) async fn home() -> Redirect {
    Redirect::to("/start")
}

pub(super) async fn start_form() -> Html<String> {
    Html(views::start_page(None).into_string())
}

pub(super) async fn start_submit(Form(pairs): Form<FormPairs>) -> Response {
    let raw = first_form_value(&pairs, "gatepass_number").unwrap_or_default();
    match registration::start(raw) {
        Ok(token) => Redirect::to(&register_path(&token)).into_response(),
        Err(err) => {
            debug!("Rejected gatepass number: {}", err);
            Html(views::start_page(Some(&err.message())).into_string()).into_response()
        }
    }
}

pub(super) async fn register_form(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Html<String>> {
    let registrar = state.registrar.clone();
    let form = blocking(move || registrar.lookup(&token)).await?;
    Ok(Html(views::register_page(&form).into_string()))
}

pub(super) async fn register_submit(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
    Form(pairs): Form<FormPairs>,
) -> AppResult<Html<String>> {
    let fields = PersonFields::from_form_pairs(&pairs);
    let origin = state.origin(&headers);
    let registrar = state.registrar.clone();
    let registration = blocking(move || registrar.register(&token, &fields, &origin)).await?;
    Ok(Html(views::confirmation_page(&registration).into_string()))
}

pub(super) async fn profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let Some(id) = parse_profile_id(&id) else {
        return Ok((StatusCode::NOT_FOUND, PROFILE_NOT_FOUND).into_response());
    };

    let viewer = state.viewer.clone();
    match blocking(move || viewer.view(id)).await? {
        ProfileView::Found(person) => Ok(Html(views::profile_page(&person).into_string()).into_response()),
        ProfileView::NotFound => Ok((StatusCode::NOT_FOUND, PROFILE_NOT_FOUND).into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile_id() {
        assert_eq!(parse_profile_id("1"), Some(1));
        assert_eq!(parse_profile_id("0042"), Some(42));
        for raw in ["+1", "-1", " 1", "1e3", "", "abc", "99999999999999999999"] {
            assert_eq!(parse_profile_id(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn test_register_path_plain() {
        assert_eq!(register_path("A_123"), "/register/A_123");
    }

    #[test]
    fn test_register_path_escapes_reserved() {
        assert_eq!(register_path("A B?#%"), "/register/A%20B%3F%23%25");
        assert_eq!(register_path("ü~u"), "/register/%C3%BC~u");
    }
}
