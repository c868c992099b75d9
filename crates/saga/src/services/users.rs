use std::sync::Arc;

use common::UserId;
use event_bus::{EventBus, EventBusExt, UserRegistered};

use crate::{Result, SagaError};

/// Announces registered users to the orders service.
///
/// The user directory itself lives outside this system; all the saga needs
/// is the `user.registered` event that feeds the orders-side user view.
#[derive(Clone)]
pub struct UserRegistrar {
    bus: Arc<dyn EventBus>,
}

impl UserRegistrar {
    /// Creates a registrar publishing on `bus`.
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self { bus }
    }

    /// Publishes `user.registered` for `user_id`.
    ///
    /// The user becomes visible to order creation once the projection has
    /// consumed the event. Registering the same user twice is harmless.
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn register(&self, user_id: UserId) -> Result<()> {
        if !user_id.is_valid() {
            return Err(SagaError::InvalidUserId(user_id));
        }

        self.bus.publish(&UserRegistered { user_id }).await?;
        tracing::info!("user registered");
        Ok(())
    }
}
