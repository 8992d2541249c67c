//! Visitor extractor.
//!
//! Every browser gets a random visitor id on its first request, stored in the
//! session. The id selects the visitor's [`Shopper`] (cart and checkout page)
//! from the registry in [`AppState`].

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use uuid::Uuid;

use crate::cart::CartStore;
use crate::error::{AppError, set_sentry_visitor};
use crate::models::session_keys;
use crate::shopper::Shopper;
use crate::state::AppState;
use crate::storage::SessionStorage;

/// The visitor making the request.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(visitor: Visitor) -> impl IntoResponse {
///     format!("{} items in cart", visitor.cart().total_quantity())
/// }
/// ```
pub struct Visitor {
    pub id: Uuid,
    pub shopper: Arc<Shopper>,
    session: Session,
}

impl Visitor {
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        self.shopper.cart()
    }

    /// The visitor's durable storage.
    #[must_use]
    pub fn storage(&self) -> SessionStorage {
        SessionStorage::new(self.session.clone())
    }
}

impl FromRequestParts<AppState> for Visitor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer is not installed".to_string()))?;

        let id = match session.get::<Uuid>(session_keys::VISITOR_ID).await? {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                session.insert(session_keys::VISITOR_ID, id).await?;
                tracing::debug!(visitor = %id, "New visitor");
                id
            }
        };

        set_sentry_visitor(id);
        let shopper = state.shoppers().get(id).await;

        Ok(Self {
            id,
            shopper,
            session,
        })
    }
}
