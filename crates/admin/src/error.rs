//! Unified error handling for the admin workspace.

use std::fmt;

use thiserror::Error;

use emporium_core::{AdminId, ProductId};

use crate::catalog::CatalogError;
use crate::workspace::form::ValidationError;
use crate::workspace::image::ImageError;

/// Workspace operation that talked to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CheckSession,
    Login,
    Logout,
    LoadProducts,
    SaveProduct,
    DeleteProduct,
}

impl Action {
    /// Message for a failed store request.
    ///
    /// Shown to the admin for actions that surface errors. Session checks and
    /// logouts fail quietly, so their messages only reach the log written by
    /// [`WorkspaceError::report`].
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::CheckSession => "Unable to check the current session.",
            Self::Login => "Login failed. Please ensure the catalog backend is running.",
            Self::Logout => "Unable to end the session.",
            Self::LoadProducts => {
                "Unable to load products. Make sure the catalog backend is running."
            }
            Self::SaveProduct => "Unable to save product. Please try again.",
            Self::DeleteProduct => "Unable to delete product. Please try again.",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CheckSession => "Session check",
            Self::Login => "Login",
            Self::Logout => "Logout",
            Self::LoadProducts => "Product load",
            Self::SaveProduct => "Product save",
            Self::DeleteProduct => "Product delete",
        })
    }
}

/// Error type for admin workspace operations.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Form input rejected before any request.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Image rejected before it was read.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// No admin account matched the email and password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Product operations need an authenticated admin.
    #[error("Not signed in")]
    NotAuthenticated,

    /// The product is not in the loaded list.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// The store request failed.
    #[error("{action} failed: {source}")]
    Catalog {
        action: Action,
        #[source]
        source: CatalogError,
    },
}

impl WorkspaceError {
    /// Wrap a store failure with the action it interrupted.
    #[must_use]
    pub const fn catalog(action: Action, source: CatalogError) -> Self {
        Self::Catalog { action, source }
    }

    /// Text to show the admin.
    ///
    /// Store failures collapse to a fixed message per action; the underlying
    /// error is logged by [`WorkspaceError::report`].
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid credentials. Please try again.".to_string(),
            Self::NotAuthenticated => "Please sign in to manage products.".to_string(),
            Self::Catalog {
                action,
                source: CatalogError::Parse(_),
            } => format!("{action} failed: the catalog store sent data that could not be read."),
            Self::Catalog { action, .. } => action.failure_message().to_string(),
            _ => self.to_string(),
        }
    }

    /// Log the error; store failures are also sent to Sentry.
    pub fn report(&self) {
        if let Self::Catalog { action, .. } = self {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                user_message = action.failure_message(),
                sentry_event_id = %event_id,
                "Catalog request error"
            );
        } else {
            tracing::debug!(error = %self, "Workspace request rejected");
        }
    }
}

/// Set the Sentry user context from a signed-in admin.
pub fn set_sentry_user(admin_id: Option<&AdminId>, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: admin_id.map(ToString::to_string),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
