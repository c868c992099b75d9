use std::sync::Arc;

use async_trait::async_trait;
use event_bus::{Delivery, Route, UserRegistered};
use store::UserViewRepository;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};

/// Keeps the local set of registered users.
///
/// Each `user.registered` event inserts the user id if it is not already
/// known. The view lags the user service: a user who just registered may not
/// be visible yet.
#[derive(Clone)]
pub struct UserViewProjector {
    view: Arc<dyn UserViewRepository>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl UserViewProjector {
    /// Creates a projector writing into the given view.
    pub fn new(view: Arc<dyn UserViewRepository>) -> Self {
        Self {
            view,
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }
}

#[async_trait]
impl Projection for UserViewProjector {
    fn name(&self) -> &'static str {
        "UserViewProjector"
    }

    fn route(&self) -> Route {
        Route::UserRegistered
    }

    async fn handle(&self, delivery: &Delivery) -> Result<()> {
        let event: UserRegistered = delivery.decode()?;

        if self.view.insert(event.user_id).await? {
            tracing::info!(user_id = %event.user_id, "User added to view");
        } else {
            tracing::debug!(user_id = %event.user_id, "User already in view");
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProjectionError;
    use common::UserId;
    use store::InMemoryUserView;

    fn registration(user_id: i64) -> Delivery {
        let payload = serde_json::to_vec(&UserRegistered {
            user_id: UserId::new(user_id),
        })
        .unwrap();
        Delivery::new("user.registered", payload)
    }

    #[tokio::test]
    async fn test_registration_inserts_user() {
        let view = InMemoryUserView::new();
        let projector = UserViewProjector::new(Arc::new(view.clone()));

        projector.handle(&registration(42)).await.unwrap();

        assert!(view.exists(UserId::new(42)).await.unwrap());
        assert_eq!(projector.position().await.events_processed, 1);
    }

    #[tokio::test]
    async fn test_duplicate_registration_keeps_one_row() {
        let view = InMemoryUserView::new();
        let projector = UserViewProjector::new(Arc::new(view.clone()));

        projector.handle(&registration(42)).await.unwrap();
        projector.handle(&registration(42)).await.unwrap();

        assert_eq!(view.count().await.unwrap(), 1);
        assert_eq!(projector.position().await.events_processed, 2);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_rejected() {
        let view = InMemoryUserView::new();
        let projector = UserViewProjector::new(Arc::new(view.clone()));

        let result = projector
            .handle(&Delivery::new("user.registered", b"{\"user\":1}".to_vec()))
            .await;

        assert!(matches!(result, Err(ProjectionError::Deserialization(_))));
        assert_eq!(view.count().await.unwrap(), 0);
        assert_eq!(projector.position().await.events_processed, 0);
    }
}
