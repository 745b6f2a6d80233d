//! The registration page and the endpoint that creates a new account.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{PasswordHash, ValidatedPassword, create_user, normalize_email, set_auth_cookie},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, email_input, link,
        loading_spinner, log_in_register, password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    timezone::get_local_offset,
};

/// Client-side minimum password length. The server checks strength on top of this.
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

pub const DUPLICATE_EMAIL_ERROR_MSG: &str = "An account with this email already exists";

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()];

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

/// Inline error messages for each field of the registration form.
#[derive(Debug, Default)]
struct RegistrationErrors<'a> {
    email: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn registration_form(email: &str, errors: RegistrationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #confirm-password, #submit-button"
            hx-target-error="#alert-container"
            class="space-y-4 md:space-y-6"
        {
            (email_input(email, errors.email))
            (password_input("", PASSWORD_INPUT_MIN_LENGTH, errors.password))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                (link(endpoints::LOG_IN_VIEW, "Log in here"))
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", RegistrationErrors::default());
    let content = log_in_register("Create Account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Create an account, sign the new user in and send them to the dashboard.
///
/// Invalid input is returned as the form with inline error messages.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let email = match normalize_email(&user_data.email) {
        Ok(email) => email,
        Err(_) => {
            return registration_form(
                &user_data.email,
                RegistrationErrors {
                    email: Some("Please enter a valid email address"),
                    ..Default::default()
                },
            )
            .into_response();
        }
    };

    let validated_password = match ValidatedPassword::new(&user_data.password, &[email.as_str()]) {
        Ok(password) => password,
        Err(error) => {
            let message = error.to_string();
            return registration_form(
                &email,
                RegistrationErrors {
                    password: Some(&message),
                    ..Default::default()
                },
            )
            .into_response();
        }
    };

    if user_data.password != user_data.confirm_password {
        return registration_form(
            &email,
            RegistrationErrors {
                confirm_password: Some("Passwords do not match"),
                ..Default::default()
            },
        )
        .into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let user = match state.db_connection.lock() {
        Ok(connection) => create_user(&email, password_hash, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let user = match user {
        Ok(user) => user,
        Err(Error::DuplicateEmail) => {
            return registration_form(
                &email,
                RegistrationErrors {
                    email: Some(DUPLICATE_EMAIL_ERROR_MSG),
                    ..Default::default()
                },
            )
            .into_response();
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");
            return get_internal_server_error_redirect();
        }
    };

    tracing::info!("registered user {}", user.id);

    match set_auth_cookie(jar, user.id, state.cookie_duration, local_offset) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");
            get_internal_server_error_redirect()
        }
    }
}


#[cfg(test)]
mod register_user_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        body::Body,
        extract::State,
        http::{Response, StatusCode},
    };
    use axum_extra::extract::PrivateCookieJar;
    use rusqlite::Connection;

    use crate::{
        app_state::create_cookie_key,
        auth::{DEFAULT_COOKIE_DURATION, PasswordHash, count_users, create_user},
        db::initialize,
        endpoints,
        test_utils::{assert_hx_redirect, parse_html_fragment},
    };

    use super::{DUPLICATE_EMAIL_ERROR_MSG, RegisterForm, RegistrationState, register_user};

    const STRONG_PASSWORD: &str = "iamtestingwhethericancreateanewuser";

    fn get_state() -> RegistrationState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        RegistrationState {
            cookie_key: create_cookie_key("42"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn form(email: &str, password: &str, confirm_password: &str) -> RegisterForm {
        RegisterForm {
            email: email.to_owned(),
            password: password.to_owned(),
            confirm_password: confirm_password.to_owned(),
        }
    }

    async fn post(state: RegistrationState, form: RegisterForm) -> Response<Body> {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        register_user(State(state), jar, Form(form)).await
    }

    async fn get_error_messages(response: Response<Body>) -> Vec<String> {
        let fragment = parse_html_fragment(response).await;

        fragment
            .select(&scraper::Selector::parse("p.text-red-500").unwrap())
            .map(|p| p.text().collect::<String>().trim().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn create_user_succeeds() {
        let state = get_state();

        let response = post(
            state.clone(),
            form("new@user.com", STRONG_PASSWORD, STRONG_PASSWORD),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::DASHBOARD_VIEW);
        assert!(response.headers().get("set-cookie").is_some());
        assert_eq!(count_users(&state.db_connection.lock().unwrap()), Ok(1));
    }

    #[tokio::test]
    async fn create_user_fails_with_duplicate_email() {
        let state = get_state();
        create_user(
            "taken@user.com",
            PasswordHash::new_unchecked("hash"),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = post(
            state,
            form("Taken@User.com", STRONG_PASSWORD, STRONG_PASSWORD),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            get_error_messages(response).await,
            [DUPLICATE_EMAIL_ERROR_MSG]
        );
    }

    #[tokio::test]
    async fn create_user_fails_with_invalid_email() {
        let response = post(get_state(), form("not-an-email", STRONG_PASSWORD, STRONG_PASSWORD)).await;

        assert_eq!(
            get_error_messages(response).await,
            ["Please enter a valid email address"]
        );
    }

    #[tokio::test]
    async fn create_user_fails_when_password_is_weak() {
        let response = post(get_state(), form("new@user.com", "foo", "foo")).await;

        let messages = get_error_messages(response).await;
        assert_eq!(messages.len(), 1);
        assert!(
            messages[0].to_lowercase().contains("password is too weak"),
            "'{}' does not contain the text 'password is too weak'",
            messages[0]
        );
    }

    #[tokio::test]
    async fn create_user_fails_when_passwords_do_not_match() {
        let response = post(
            get_state(),
            form("new@user.com", STRONG_PASSWORD, "thisisadifferentpassword"),
        )
        .await;

        assert_eq!(
            get_error_messages(response).await,
            ["Passwords do not match"]
        );
    }
}
