//! Checks that run before a prompt is sent.
//!
//! Account state lives outside this crate; hosts plug it in through
//! [`Preflight`]. A rejection stops the submission before any turn exists.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PreflightRejection {
    #[error("Sign in to start a conversation.")]
    NotAuthenticated,

    #[error("You have run out of credits. Top up your balance to continue.")]
    InsufficientBalance,
}

pub trait Preflight {
    fn check(&self, user: Option<&str>, agent: &str) -> Result<(), PreflightRejection>;
}

impl<F> Preflight for F
where
    F: Fn(Option<&str>, &str) -> Result<(), PreflightRejection>,
{
    fn check(&self, user: Option<&str>, agent: &str) -> Result<(), PreflightRejection> {
        self(user, agent)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Preflight for AllowAll {
    fn check(&self, _user: Option<&str>, _agent: &str) -> Result<(), PreflightRejection> {
        Ok(())
    }
}

/// Rejects submissions without a signed-in user.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequireUser;

impl Preflight for RequireUser {
    fn check(&self, user: Option<&str>, _agent: &str) -> Result<(), PreflightRejection> {
        match user {
            Some(user) if !user.trim().is_empty() => Ok(()),
            _ => Err(PreflightRejection::NotAuthenticated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_user_rejects_missing_and_blank_users() {
        assert_eq!(
            RequireUser.check(None, "general"),
            Err(PreflightRejection::NotAuthenticated)
        );
        assert_eq!(
            RequireUser.check(Some("  "), "general"),
            Err(PreflightRejection::NotAuthenticated)
        );
        assert_eq!(RequireUser.check(Some("ada"), "general"), Ok(()));
    }

    #[test]
    fn closures_act_as_preflight_checks() {
        let no_credit = |_: Option<&str>, _: &str| -> Result<(), PreflightRejection> {
            Err(PreflightRejection::InsufficientBalance)
        };
        assert_eq!(
            no_credit.check(Some("ada"), "research"),
            Err(PreflightRejection::InsufficientBalance)
        );
    }
}
