//! Write actions against monitored repositories
//!
//! The only mutation the engine performs is closing a stale issue or PR:
//! post the configured explanation comment, then patch the item closed.
//! The two calls are not atomic; when the comment lands but the close
//! fails, the error says so, because retrying blindly would post the
//! comment twice.

use std::fmt;

use crate::fleet::config::RepositoryRef;
use crate::fleet::github::GithubClient;

/// Error from a stale-close attempt
#[derive(Debug, Clone)]
pub struct CloseStaleError {
    /// Whether the explanation comment was already posted when the
    /// operation failed
    pub comment_posted: bool,
    pub message: String,
}

impl fmt::Display for CloseStaleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.comment_posted {
            write!(
                f,
                "{} (the stale comment was posted; re-running will duplicate it)",
                self.message
            )
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for CloseStaleError {}

/// Posts the stale comment on an item, then closes it
///
/// # Errors
///
/// Returns an error when either call fails; [`CloseStaleError::comment_posted`]
/// tells the caller whether the comment made it before the failure.
pub async fn close_stale_item(
    client: &GithubClient,
    repo: &RepositoryRef,
    number: u64,
    message: &str,
) -> Result<(), CloseStaleError> {
    client
        .post_issue_comment(repo, number, message)
        .await
        .map_err(|message| CloseStaleError {
            comment_posted: false,
            message,
        })?;

    client
        .close_issue(repo, number)
        .await
        .map_err(|message| CloseStaleError {
            comment_posted: true,
            message,
        })?;

    tracing::info!("Closed stale item {}#{}", repo.full_name(), number);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_flags_posted_comment() {
        let before = CloseStaleError {
            comment_posted: false,
            message: "Failed to post comment on #12: 403 Forbidden".to_string(),
        };
        assert!(!before.to_string().contains("duplicate"));

        let after = CloseStaleError {
            comment_posted: true,
            message: "Failed to close #12: 403 Forbidden".to_string(),
        };
        assert!(after.to_string().contains("re-running will duplicate"));
    }
}
