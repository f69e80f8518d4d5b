//! Admin workspace.
//!
//! Holds the signed-in admin, the loaded product list with its category
//! hierarchy, and the product form, and drives every store call an admin
//! makes: session check, login, logout, product create/replace/delete.
//!
//! # Concurrency
//!
//! [`AdminWorkspace`] is a cheap handle over shared state. The state lock is
//! never held across a store request, so a snapshot taken mid-request shows
//! the in-flight flags (`is_saving`, `deleting_id`, ...).

pub mod form;
pub mod image;
pub mod notice;

pub use form::{AttachedImage, ProductForm, SpecificationRow, ValidationError};
pub use image::{ImageError, ImageUpload, MAX_IMAGE_BYTES};
pub use notice::{NOTICE_TTL, Notice};

use std::sync::Arc;

use chrono::Utc;
use secrecy::SecretString;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use emporium_core::{
    AdminAccount, AdminSession, CategoryHierarchy, NewSession, Product, ProductId, SessionId,
};

use crate::catalog::CatalogClient;
use crate::error::{Action, WorkspaceError, clear_sentry_user, set_sentry_user};

/// Prompt passed to [`Confirm`] before a delete.
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this product?";

/// Header name used when the session has no display name.
pub const FALLBACK_ADMIN_NAME: &str = "Administrator";

/// Asks the operator to approve a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Where the workspace is in the sign-in flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// Looking for an active session in the store.
    CheckingSession,
    Unauthenticated,
    Authenticated,
}

/// Result of a successful submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

impl SaveOutcome {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Created => "Product created successfully.",
            Self::Updated => "Product updated successfully.",
        }
    }
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The operator declined; nothing was sent.
    Cancelled,
}

/// Message shown after a delete.
pub const DELETED_MESSAGE: &str = "Product deleted successfully.";

/// Snapshot of everything the admin sees.
#[derive(Debug, Clone)]
pub struct WorkspaceState {
    pub auth: AuthState,
    pub session_id: Option<SessionId>,
    /// Empty when the session carries neither a name nor an email.
    pub admin_name: String,
    pub is_authenticating: bool,
    pub auth_error: Option<String>,

    /// Sorted by id ascending.
    pub products: Vec<Product>,
    pub hierarchy: CategoryHierarchy,
    pub is_fetching_products: bool,
    pub product_error: Option<String>,

    pub form: ProductForm,
    pub preview_image: Option<String>,
    pub form_error: Option<String>,
    pub notice: Option<Notice>,
    pub is_saving: bool,
    pub deleting_id: Option<ProductId>,
}

impl Default for WorkspaceState {
    fn default() -> Self {
        Self {
            auth: AuthState::CheckingSession,
            session_id: None,
            admin_name: String::new(),
            is_authenticating: false,
            auth_error: None,
            products: Vec::new(),
            hierarchy: CategoryHierarchy::default(),
            is_fetching_products: false,
            product_error: None,
            form: ProductForm::default(),
            preview_image: None,
            form_error: None,
            notice: None,
            is_saving: false,
            deleting_id: None,
        }
    }
}

impl WorkspaceState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.auth == AuthState::Authenticated
    }

    /// Header name for the signed-in admin.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.admin_name.is_empty() {
            FALLBACK_ADMIN_NAME
        } else {
            &self.admin_name
        }
    }

    /// The success notice, while it is still visible.
    #[must_use]
    pub fn success_message(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| n.is_visible())
            .map(Notice::message)
    }

    /// Whether the submit control is enabled.
    #[must_use]
    pub const fn can_submit(&self) -> bool {
        !self.is_saving
    }

    /// Whether a delete of `id` is in flight.
    #[must_use]
    pub fn is_deleting(&self, id: &ProductId) -> bool {
        self.deleting_id.as_ref() == Some(id)
    }

    /// Category choices for the form.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        self.hierarchy.categories().collect()
    }

    /// Subcategory choices for the form's category.
    #[must_use]
    pub fn available_subcategories(&self) -> Vec<&str> {
        if self.form.category.is_empty() {
            return Vec::new();
        }
        self.hierarchy.subcategories(&self.form.category)
    }

    /// Sub-subcategory choices for the form's category and subcategory.
    #[must_use]
    pub fn available_sub_subcategories(&self) -> &[String] {
        if self.form.category.is_empty() || self.form.subcategory.is_empty() {
            return &[];
        }
        self.hierarchy
            .sub_subcategories(&self.form.category, &self.form.subcategory)
    }

    fn set_products(&mut self, mut products: Vec<Product>) {
        products.sort_by(|a, b| a.id.numeric_cmp(&b.id));
        self.hierarchy = CategoryHierarchy::from_products(&products);
        self.products = products;
    }

    fn clear_products(&mut self) {
        self.products.clear();
        self.hierarchy = CategoryHierarchy::default();
        self.product_error = None;
    }

    fn clear_form(&mut self) {
        self.form = ProductForm::default();
        self.preview_image = None;
        self.form_error = None;
    }
}

/// Admin workspace handle.
///
/// Clones share state.
#[derive(Debug, Clone)]
pub struct AdminWorkspace {
    client: CatalogClient,
    state: Arc<RwLock<WorkspaceState>>,
}

impl AdminWorkspace {
    /// Workspace in the `CheckingSession` state. No request is sent.
    #[must_use]
    pub fn new(client: CatalogClient) -> Self {
        Self {
            client,
            state: Arc::new(RwLock::new(WorkspaceState::default())),
        }
    }

    /// Create a workspace and run the session check.
    pub async fn mount(client: CatalogClient) -> Self {
        let workspace = Self::new(client);
        workspace.check_session().await;
        workspace
    }

    #[must_use]
    pub const fn client(&self) -> &CatalogClient {
        &self.client
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> WorkspaceState {
        self.state.read().await.clone()
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Adopt the newest active session in the store, if any.
    ///
    /// A store failure leaves the workspace signed out; it is logged, not
    /// shown. Products are loaded once a session is adopted.
    #[instrument(skip(self))]
    pub async fn check_session(&self) -> AuthState {
        self.state.write().await.auth = AuthState::CheckingSession;

        let adopted = match self.client.list_sessions().await {
            Ok(sessions) => AdminSession::latest_active(&sessions).cloned(),
            Err(e) => {
                WorkspaceError::catalog(Action::CheckSession, e).report();
                None
            }
        };

        let auth = {
            let mut state = self.state.write().await;
            if let Some(session) = &adopted {
                state.session_id = Some(session.id.clone());
                state.admin_name = session.display_name().unwrap_or_default().to_owned();
                state.auth = AuthState::Authenticated;
            } else {
                state.session_id = None;
                state.admin_name.clear();
                state.auth = AuthState::Unauthenticated;
                state.clear_products();
            }
            state.auth
        };

        if let Some(session) = adopted {
            set_sentry_user(session.admin_id.as_ref(), session.email.as_deref());
            info!(session_id = %session.id, "Adopted existing admin session");
            self.reload_products().await;
        }

        auth
    }

    /// Sign in with email and password.
    ///
    /// On success a session record is created and products are loaded.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::InvalidCredentials` if no account matches and
    /// `WorkspaceError::Catalog` if the store fails. Either way the message is
    /// also kept in `auth_error`.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<(), WorkspaceError> {
        {
            let mut state = self.state.write().await;
            state.auth_error = None;
            state.is_authenticating = true;
        }

        let result = self.authenticate(email, password).await;

        {
            let mut state = self.state.write().await;
            state.is_authenticating = false;
            match &result {
                Ok((account, session)) => {
                    state.session_id = Some(session.id.clone());
                    state.admin_name = account.display_name().to_owned();
                    state.auth = AuthState::Authenticated;
                }
                Err(e) => state.auth_error = Some(e.user_message()),
            }
        }

        match result {
            Ok((account, session)) => {
                set_sentry_user(Some(&account.id), Some(&account.email));
                info!(session_id = %session.id, "Admin signed in");
                self.reload_products().await;
                Ok(())
            }
            Err(e) => {
                e.report();
                Err(e)
            }
        }
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<(AdminAccount, AdminSession), WorkspaceError> {
        let account = self
            .client
            .find_admins(email, password)
            .await
            .map_err(|e| WorkspaceError::catalog(Action::Login, e))?
            .into_iter()
            .next()
            .ok_or(WorkspaceError::InvalidCredentials)?;

        let session = self
            .client
            .create_session(&NewSession::for_account(&account, Utc::now()))
            .await
            .map_err(|e| WorkspaceError::catalog(Action::Login, e))?;

        Ok((account, session))
    }

    /// Sign out.
    ///
    /// The session record is deleted best-effort; local state is cleared
    /// whether or not that succeeds.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let session_id = self.state.read().await.session_id.clone();

        if let Some(id) = &session_id {
            if let Err(e) = self.client.delete_session(id).await {
                WorkspaceError::catalog(Action::Logout, e).report();
            }
        }

        {
            let mut state = self.state.write().await;
            state.auth = AuthState::Unauthenticated;
            state.session_id = None;
            state.admin_name.clear();
            state.auth_error = None;
            state.clear_products();
            state.clear_form();
            state.notice = None;
        }

        clear_sentry_user();
        info!("Admin signed out");
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Reload the product list and rebuild the hierarchy.
    ///
    /// On failure the previous list is kept and `product_error` is set.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::Catalog` if the store fails.
    #[instrument(skip(self))]
    pub async fn fetch_products(&self) -> Result<(), WorkspaceError> {
        {
            let mut state = self.state.write().await;
            state.is_fetching_products = true;
            state.product_error = None;
        }

        let result = self.client.list_products().await;

        let mut state = self.state.write().await;
        state.is_fetching_products = false;
        match result {
            Ok(products) => {
                state.set_products(products);
                Ok(())
            }
            Err(e) => {
                let err = WorkspaceError::catalog(Action::LoadProducts, e);
                err.report();
                state.product_error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Reload after a sign-in or a write.
    ///
    /// A failure is kept in `product_error` and reported by
    /// [`Self::fetch_products`]; the operation that triggered the reload
    /// still succeeds.
    async fn reload_products(&self) {
        if let Err(e) = self.fetch_products().await {
            warn!(error = %e, "Product list not refreshed");
        }
    }

    /// Apply `edit` to the form.
    pub async fn edit_form(&self, edit: impl FnOnce(&mut ProductForm)) {
        edit(&mut self.state.write().await.form);
    }

    /// Load `product` into the form for editing.
    pub async fn begin_edit(&self, product: &Product) {
        let mut state = self.state.write().await;
        state.form = ProductForm::from_product(product);
        state.preview_image = product.image.clone().filter(|i| !i.is_empty());
        state.form_error = None;
        state.notice = None;
    }

    /// Load the product with `id` from the current list into the form.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::ProductNotFound` if it is not in the list.
    pub async fn begin_edit_by_id(&self, id: &ProductId) -> Result<(), WorkspaceError> {
        let product = self
            .state
            .read()
            .await
            .products
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| WorkspaceError::ProductNotFound(id.clone()))?;
        self.begin_edit(&product).await;
        Ok(())
    }

    /// Clear the form, its preview, and any notice.
    pub async fn reset_form(&self) {
        let mut state = self.state.write().await;
        state.clear_form();
        state.notice = None;
    }

    /// Attach a local image to the form as a data URL.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::Image` if the file is too large or not an
    /// image; the form keeps its previous image.
    #[instrument(skip(self, upload), fields(file_name = %upload.file_name))]
    pub async fn attach_image(&self, upload: ImageUpload) -> Result<(), WorkspaceError> {
        let mut state = self.state.write().await;
        match upload.into_data_url() {
            Ok((attached, data_url)) => {
                state.form.image.clone_from(&data_url);
                state.form.image_file = Some(attached);
                state.preview_image = Some(data_url);
                state.form_error = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Image rejected");
                state.form_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Drop the form's image.
    pub async fn remove_image(&self) {
        let mut state = self.state.write().await;
        state.form.image.clear();
        state.form.image_file = None;
        state.preview_image = None;
    }

    /// Create or replace the product in the form.
    ///
    /// On success the list is reloaded, the form is cleared and a success
    /// notice is shown for [`NOTICE_TTL`].
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::Validation` without sending anything if name
    /// or category is blank, and `WorkspaceError::Catalog` if the store
    /// fails. The form is kept on error.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<SaveOutcome, WorkspaceError> {
        let form = {
            let mut state = self.state.write().await;
            if !state.is_authenticated() {
                return Err(WorkspaceError::NotAuthenticated);
            }
            state.form_error = None;
            state.notice = None;
            if let Err(e) = state.form.validate() {
                state.form_error = Some(e.to_string());
                return Err(e.into());
            }
            state.is_saving = true;
            state.form.clone()
        };

        let payload = form.to_payload();
        let result = match &form.id {
            Some(id) => self
                .client
                .replace_product(id, &payload)
                .await
                .map(|_| SaveOutcome::Updated),
            None => self
                .client
                .create_product(&payload)
                .await
                .map(|_| SaveOutcome::Created),
        };

        match result {
            Ok(outcome) => {
                self.reload_products().await;
                let mut state = self.state.write().await;
                state.clear_form();
                state.notice = Some(Notice::new(outcome.message()));
                state.is_saving = false;
                info!(?outcome, name = %payload.name, "Product saved");
                Ok(outcome)
            }
            Err(e) => {
                let err = WorkspaceError::catalog(Action::SaveProduct, e);
                err.report();
                let mut state = self.state.write().await;
                state.form_error = Some(err.user_message());
                state.is_saving = false;
                Err(err)
            }
        }
    }

    /// Delete a product after asking `confirm`.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::Catalog` if the store fails; the message is
    /// also kept in `form_error`.
    #[instrument(skip(self, confirm), fields(product_id = %id))]
    pub async fn delete_product(
        &self,
        id: &ProductId,
        confirm: &impl Confirm,
    ) -> Result<DeleteOutcome, WorkspaceError> {
        if !self.state.read().await.is_authenticated() {
            return Err(WorkspaceError::NotAuthenticated);
        }
        if !confirm.confirm(DELETE_PROMPT) {
            return Ok(DeleteOutcome::Cancelled);
        }

        self.state.write().await.deleting_id = Some(id.clone());

        match self.client.delete_product(id).await {
            Ok(()) => {
                self.reload_products().await;
                let mut state = self.state.write().await;
                state.notice = Some(Notice::new(DELETED_MESSAGE));
                state.deleting_id = None;
                info!("Product deleted");
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                let err = WorkspaceError::catalog(Action::DeleteProduct, e);
                err.report();
                let mut state = self.state.write().await;
                state.form_error = Some(err.user_message());
                state.deleting_id = None;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use url::Url;

    fn product(id: i64, name: &str, category: &str, sub: Option<&str>) -> Product {
        let mut product = Product::new(ProductId::new(id), name);
        product.category = Some(category.to_string());
        product.subcategory = sub.map(str::to_string);
        product
    }

    fn unreachable_workspace() -> AdminWorkspace {
        // Port 9 (discard) is never served in the test environment.
        let client = CatalogClient::new(&Url::parse("http://127.0.0.1:9").unwrap()).unwrap();
        AdminWorkspace::new(client)
    }

    #[test]
    fn test_initial_state() {
        let state = WorkspaceState::default();
        assert_eq!(state.auth, AuthState::CheckingSession);
        assert!(state.can_submit());
        assert_eq!(state.display_name(), "Administrator");
        assert_eq!(state.success_message(), None);
    }

    #[test]
    fn test_products_sorted_by_numeric_id() {
        let mut state = WorkspaceState::default();
        state.set_products(vec![
            product(10, "Ten", "A", None),
            product(2, "Two", "B", None),
            product(1, "One", "A", None),
        ]);
        let ids: Vec<String> = state.products.iter().map(|p| p.id.to_string()).collect();
        assert_eq!(ids, vec!["1", "2", "10"]);
        assert_eq!(state.categories(), vec!["A", "B"]);
    }

    #[test]
    fn test_form_choices_follow_selection() {
        let mut state = WorkspaceState::default();
        let mut espresso = product(1, "Espresso", "Coffee", Some("Hot"));
        espresso.sub_subcategory = Some("Short".to_string());
        state.set_products(vec![espresso, product(2, "Cold brew", "Coffee", Some("Cold"))]);

        assert!(state.available_subcategories().is_empty());

        state.form.set_category("Coffee");
        assert_eq!(state.available_subcategories(), vec!["Hot", "Cold"]);
        assert!(state.available_sub_subcategories().is_empty());

        state.form.set_subcategory("Hot");
        assert_eq!(state.available_sub_subcategories(), ["Short".to_string()]);
    }

    #[test]
    fn test_can_submit_while_saving() {
        let state = WorkspaceState {
            is_saving: true,
            ..WorkspaceState::default()
        };
        assert!(!state.can_submit());
    }

    #[test]
    fn test_confirm_closure() {
        let yes = |_: &str| true;
        assert!(yes.confirm(DELETE_PROMPT));
    }

    #[tokio::test]
    async fn test_submit_requires_sign_in() {
        let workspace = unreachable_workspace();
        let err = workspace.submit().await.unwrap_err();
        assert!(matches!(err, WorkspaceError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_attach_and_remove_image() {
        let workspace = unreachable_workspace();
        workspace
            .attach_image(ImageUpload::new("a.png", "image/png", vec![0]))
            .await
            .unwrap();
        let state = workspace.snapshot().await;
        assert_eq!(state.form.image, "data:image/png;base64,AA==");
        assert_eq!(state.preview_image.as_deref(), Some("data:image/png;base64,AA=="));

        workspace.remove_image().await;
        let state = workspace.snapshot().await;
        assert!(state.form.image.is_empty());
        assert!(state.preview_image.is_none());
    }

    #[tokio::test]
    async fn test_rejected_image_keeps_previous() {
        let workspace = unreachable_workspace();
        workspace
            .edit_form(|form| form.image = "https://cdn.example.com/a.jpg".to_string())
            .await;

        let err = workspace
            .attach_image(ImageUpload::new("a.txt", "text/plain", vec![0]))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Please upload a valid image file");

        let state = workspace.snapshot().await;
        assert_eq!(state.form.image, "https://cdn.example.com/a.jpg");
        assert_eq!(
            state.form_error.as_deref(),
            Some("Please upload a valid image file")
        );
    }

    #[tokio::test]
    async fn test_begin_edit_and_reset() {
        let workspace = unreachable_workspace();
        let mut lamp = product(3, "Lamp", "Home", None);
        lamp.image = Some("https://cdn.example.com/lamp.jpg".to_string());

        workspace.begin_edit(&lamp).await;
        let state = workspace.snapshot().await;
        assert!(state.form.is_editing());
        assert_eq!(state.form.name, "Lamp");
        assert!(state.preview_image.is_some());

        workspace.reset_form().await;
        let state = workspace.snapshot().await;
        assert!(!state.form.is_editing());
        assert_eq!(state.form.rating, "4.8");
        assert!(state.preview_image.is_none());
    }

    #[tokio::test]
    async fn test_begin_edit_by_unknown_id() {
        let workspace = unreachable_workspace();
        let err = workspace
            .begin_edit_by_id(&ProductId::new(77))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_unreachable_store_leaves_signed_out() {
        let workspace = unreachable_workspace();
        assert_eq!(workspace.check_session().await, AuthState::Unauthenticated);
        assert!(!workspace.snapshot().await.is_authenticated());
    }

    #[tokio::test]
    async fn test_failed_session_check_drops_loaded_products() {
        let workspace = unreachable_workspace();
        {
            let mut state = workspace.state.write().await;
            state.auth = AuthState::Authenticated;
            state.session_id = Some(SessionId::new(1));
            state.set_products(vec![product(1, "Espresso", "Coffee", Some("Hot"))]);
            state.product_error = Some("stale".to_string());
        }

        assert_eq!(workspace.check_session().await, AuthState::Unauthenticated);
        let state = workspace.snapshot().await;
        assert!(state.products.is_empty());
        assert!(state.hierarchy.is_empty());
        assert_eq!(state.product_error, None);
        assert_eq!(state.session_id, None);
    }
}
