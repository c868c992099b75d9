//! Broker topology: exchange, routing keys and queues.

/// Name of the single durable topic exchange every service publishes to.
pub const EXCHANGE: &str = "events";

/// A routing key together with the durable queue bound to it.
///
/// Each consumer owns exactly one queue, and each queue is bound to exactly
/// one routing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Published by the user service, consumed by the orders service.
    UserRegistered,
    /// Published by the orders service, consumed by the inventory service.
    OrderCreated,
    /// Published by the inventory service, consumed by the orders service.
    InventoryReserved,
    /// Published by the inventory service, consumed by the orders service.
    InventoryFailed,
}

impl Route {
    /// Every route in the topology.
    pub const ALL: [Route; 4] = [
        Route::UserRegistered,
        Route::OrderCreated,
        Route::InventoryReserved,
        Route::InventoryFailed,
    ];

    /// Returns the routing key messages are published with.
    pub fn routing_key(&self) -> &'static str {
        match self {
            Route::UserRegistered => "user.registered",
            Route::OrderCreated => "order.created",
            Route::InventoryReserved => "inventory.reserved",
            Route::InventoryFailed => "inventory.failed",
        }
    }

    /// Returns the durable queue bound to this routing key.
    pub fn queue(&self) -> &'static str {
        match self {
            Route::UserRegistered => "user_registered_queue",
            Route::OrderCreated => "order_created_queue",
            Route::InventoryReserved => "inventory_reserved_queue",
            Route::InventoryFailed => "inventory_failed_queue",
        }
    }

    /// Looks a route up by routing key.
    pub fn from_routing_key(key: &str) -> Option<Route> {
        Route::ALL.into_iter().find(|r| r.routing_key() == key)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.routing_key())
    }
}

/// Checks a routing key against a topic binding pattern.
///
/// Words are separated by `.`; `*` matches exactly one word and `#` matches
/// zero or more words.
pub fn topic_matches(pattern: &str, routing_key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = routing_key.split('.').collect();
    matches_words(&pattern, &key)
}

fn matches_words(pattern: &[&str], key: &[&str]) -> bool {
    match pattern.split_first() {
        None => key.is_empty(),
        Some((&"#", rest)) => (0..=key.len()).any(|skip| matches_words(rest, &key[skip..])),
        Some((&word, rest)) => match key.split_first() {
            Some((&first, key_rest)) => (word == "*" || word == first) && matches_words(rest, key_rest),
            None => false,
        },
    }
}
