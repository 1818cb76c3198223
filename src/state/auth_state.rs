//! Sign-in state definitions

use crate::GiveawayError;
use std::fmt;

/// Represents the progress of the sign-in sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthState {
    /// The sign-in landing page has been requested
    AwaitingSignInPage,

    /// The landing page arrived; the one-time login URL is being resolved
    AwaitingDynamicLoginUrl,

    /// Credentials have been submitted and the verdict is pending
    AwaitingCredentialChallenge,

    /// The session is authenticated
    LoggedIn,

    /// The site rejected the session; the run must stop
    LoginFailed,
}

impl AuthState {
    /// Returns true once sign-in has reached a verdict
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::LoggedIn | Self::LoginFailed)
    }

    /// Returns true if `next` is a legal successor of this state
    ///
    /// Any non-terminal state may fail; otherwise states advance strictly in order.
    pub fn can_transition_to(&self, next: AuthState) -> bool {
        match (self, next) {
            (s, Self::LoginFailed) => !s.is_terminal(),
            (Self::AwaitingSignInPage, Self::AwaitingDynamicLoginUrl) => true,
            (Self::AwaitingDynamicLoginUrl, Self::AwaitingCredentialChallenge) => true,
            (Self::AwaitingCredentialChallenge, Self::LoggedIn) => true,
            _ => false,
        }
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn advance(self, next: AuthState) -> Result<AuthState, GiveawayError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(GiveawayError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    /// Stable lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingSignInPage => "awaiting_sign_in_page",
            Self::AwaitingDynamicLoginUrl => "awaiting_dynamic_login_url",
            Self::AwaitingCredentialChallenge => "awaiting_credential_challenge",
            Self::LoggedIn => "logged_in",
            Self::LoginFailed => "login_failed",
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
