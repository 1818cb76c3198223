//! Authentication stage
//!
//! Signs the session in through the site's one-time login URL:
//!
//! 1. Fetch the sign-in landing page
//! 2. Pull the dynamic login URL out of its markup (HTML-unescaped)
//! 3. Fetch that URL to get the credential form
//! 4. Submit username and password through the form
//! 5. Judge the response
//!
//! Any failure is fatal for the run. Nothing is retried: a soft retry against a
//! credential form risks locking the account.

use crate::config::{Config, LoginConfig};
use crate::crawler::fetcher::{Page, PageRequest};
use crate::crawler::form::FormSubmission;
use crate::extract::{first_match, unescape_html, ExtractionError};
use crate::session::{Credentials, SessionContext};
use crate::state::AuthState;
use crate::GiveawayError;

/// Embedded JSON flag the site uses to report a signed-out session
const SIGNED_OUT_PATTERN: &str = r#""(?:isSignedIn|signedIn)"\s*:\s*false"#;

/// Signs `session` in with `credentials`
///
/// # Returns
///
/// * `Ok(AuthState::LoggedIn)` - The session's cookie jar now carries the login
/// * `Err(GiveawayError::LoginFailed)` - The site rejected the login or the sign-in
///   pages could not be navigated
pub async fn authenticate(
    session: &SessionContext,
    config: &Config,
    credentials: &Credentials,
) -> Result<AuthState, GiveawayError> {
    let mut state = AuthState::AwaitingSignInPage;

    match sign_in(session, config, credentials, &mut state).await {
        Ok(()) => {
            state = state.advance(AuthState::LoggedIn)?;
            tracing::info!(
                "-------- Logged in successfully: {} --------",
                credentials.username()
            );
            Ok(state)
        }
        Err(e) => {
            let failed = state.advance(AuthState::LoginFailed)?;
            tracing::error!("-------- Login failed ({}): {} --------", failed, e);
            Err(match e {
                GiveawayError::LoginFailed { .. } => e,
                other => GiveawayError::LoginFailed {
                    reason: other.to_string(),
                },
            })
        }
    }
}

/// Walks the sign-in pages, leaving `state` at the last state reached
async fn sign_in(
    session: &SessionContext,
    config: &Config,
    credentials: &Credentials,
    state: &mut AuthState,
) -> Result<(), GiveawayError> {
    let sign_in_url = config.sign_in_url()?;
    tracing::info!("Fetching sign-in page: {}", sign_in_url);
    let landing = session.fetch(PageRequest::get(sign_in_url)).await?;
    *state = state.advance(AuthState::AwaitingDynamicLoginUrl)?;

    let credential_page = match resolve_login_url(&landing, &config.login)? {
        Some(login_url) => {
            tracing::debug!("Following dynamic login URL: {}", login_url);
            session.fetch(PageRequest::get(login_url)).await?
        }
        None => {
            tracing::debug!("No dynamic login URL; using the landing page's own form");
            landing
        }
    };

    let form = FormSubmission::from_page(
        &credential_page,
        &config.login.form_name,
        &[
            (config.login.username_field.as_str(), credentials.username()),
            (config.login.password_field.as_str(), credentials.password()),
        ],
    )
    .map_err(|e| GiveawayError::LoginFailed {
        reason: format!("credential form unavailable: {}", e),
    })?;
    let form_action_path = form.action.path().to_string();

    let response = session.fetch(form.into_request()).await?;
    *state = state.advance(AuthState::AwaitingCredentialChallenge)?;

    let sign_in_paths = [
        config.site.sign_in_path.as_str(),
        credential_page.url.path(),
        form_action_path.as_str(),
    ];
    match login_rejection(&response, &config.login, &sign_in_paths)? {
        Some(reason) => Err(GiveawayError::LoginFailed { reason }),
        None => Ok(()),
    }
}

/// Extracts and resolves the one-time login URL from the landing page
fn resolve_login_url(
    landing: &Page,
    login: &LoginConfig,
) -> Result<Option<url::Url>, ExtractionError> {
    let Some(raw) = first_match(&login.login_url_pattern, &landing.body)? else {
        return Ok(None);
    };
    let unescaped = unescape_html(&raw);
    landing
        .url
        .join(&unescaped)
        .map(Some)
        .map_err(|e| ExtractionError::InvalidUrl {
            url: unescaped,
            message: e.to_string(),
        })
}

/// Returns why the post-login response signals failure, if it does
///
/// The login is rejected when the response:
/// - is still on a sign-in path (the configured one or the credential form's own)
/// - contains a known failure phrase
/// - carries a signed-out JSON flag
pub fn login_rejection(
    response: &Page,
    login: &LoginConfig,
    sign_in_paths: &[&str],
) -> Result<Option<String>, ExtractionError> {
    let path = response.url.path();
    if sign_in_paths
        .iter()
        .filter(|p| !p.is_empty() && **p != "/")
        .any(|p| path.contains(p))
    {
        return Ok(Some(format!("still on sign-in page {}", response.url)));
    }

    let body = response.body.to_lowercase();
    if let Some(phrase) = login
        .failure_phrases
        .iter()
        .find(|phrase| body.contains(&phrase.to_lowercase()))
    {
        return Ok(Some(format!("page says '{}'", phrase)));
    }

    if first_match(SIGNED_OUT_PATTERN, &response.body)?.is_some() {
        return Ok(Some("site reports a signed-out session".to_string()));
    }

    Ok(None)
}
