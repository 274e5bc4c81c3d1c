//! Authentication route handlers.
//!
//! Password login against the users table. The session ID is cycled on
//! login and the whole session is flushed on logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

use super::MessageQuery;

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
    pub username: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout).post(logout))
}

/// Send visitors to the dashboard or the login page.
async fn index(OptionalAuth(user): OptionalAuth) -> Redirect {
    if user.is_some() {
        Redirect::to("/dashboard")
    } else {
        Redirect::to("/login")
    }
}

/// Map a login error code from the query string to display text.
fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Invalid username or password.",
        "session" => "Could not start a session. Please try again.",
        _ => "Something went wrong. Please try again.",
    }
}

/// Display the login page.
async fn login_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    LoginTemplate {
        error: query.error.as_deref().map(error_message),
        success: query
            .success
            .as_deref()
            .filter(|code| *code == "logged_out")
            .map(|_| "You have been signed out."),
        username: String::new(),
    }
    .into_response()
}

/// Handle login form submission.
///
/// Unknown usernames and wrong passwords get the same response.
#[instrument(skip(state, session, form), fields(username = %form.username))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let password = SecretString::from(form.password);

    let user = match AuthService::new(state.pool())
        .authenticate(&form.username, password)
        .await
    {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Login failed");
            return Ok(Redirect::to("/login?error=credentials").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let current = CurrentUser::from(&user);
    if let Err(e) = set_current_user(&session, &current).await {
        tracing::error!(error = %e, "Failed to set session");
        return Ok(Redirect::to("/login?error=session").into_response());
    }

    set_sentry_user(&current.id, current.username.as_str());
    tracing::info!(user_id = %current.id, "User logged in");

    Ok(Redirect::to("/dashboard").into_response())
}

/// Logout and clear session.
async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_current_user(&session).await {
        tracing::warn!(error = %e, "Failed to clear session on logout");
    }
    clear_sentry_user();

    Redirect::to("/login?success=logged_out")
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::routes::test_support::{body_string, location, login_cookie, test_app};

    fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        builder.body(Body::empty()).expect("request")
    }

    #[test]
    fn test_error_codes_share_one_credentials_message() {
        assert_eq!(error_message("credentials"), "Invalid username or password.");
        assert_eq!(
            error_message("<script>"),
            "Something went wrong. Please try again."
        );
    }

    #[test]
    fn test_login_form_debug_redacts_password() {
        let form = LoginForm {
            username: "admin".to_string(),
            password: "hunter2hunter2".to_string(),
        };
        let debug_output = format!("{form:?}");
        assert!(debug_output.contains("admin"));
        assert!(!debug_output.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_index_redirects_guest_to_login() {
        let response = test_app(MemoryStore::default())
            .oneshot(get_request("/", None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/login"));
    }

    #[tokio::test]
    async fn test_index_redirects_user_to_dashboard() {
        let store = MemoryStore::default();
        let cookie = login_cookie(&store).await;

        let response = test_app(store)
            .oneshot(get_request("/", Some(&cookie)))
            .await
            .expect("response");
        assert_eq!(location(&response), Some("/dashboard"));
    }

    #[tokio::test]
    async fn test_login_page_shows_credentials_error() {
        let response = test_app(MemoryStore::default())
            .oneshot(get_request("/login?error=credentials", None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("Invalid username or password."));
        assert!(body.contains(r#"action="/login""#));
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let store = MemoryStore::default();
        let cookie = login_cookie(&store).await;

        let response = test_app(store.clone())
            .oneshot(get_request("/logout", Some(&cookie)))
            .await
            .expect("response");
        assert_eq!(location(&response), Some("/login?success=logged_out"));

        let response = test_app(store)
            .oneshot(get_request("/dashboard", Some(&cookie)))
            .await
            .expect("response");
        assert_eq!(location(&response), Some("/login"));
    }
}
