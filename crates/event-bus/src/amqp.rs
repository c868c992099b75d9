//! AMQP (RabbitMQ) event bus implementation.
//!
//! All services share one durable topic exchange. Every consumer declares its
//! own durable queue and binds it to a single routing key.

use async_trait::async_trait;
use futures_util::StreamExt;
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
    options::{
        BasicConsumeOptions, BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions,
        QueueBindOptions, QueueDeclareOptions,
    },
    publisher_confirm::Confirmation,
    types::FieldTable,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bus::{Delivery, EventBus};
use crate::topology::EXCHANGE;
use crate::{BusError, Result};

/// Checks that a broker URL uses an AMQP scheme.
pub fn validate_url(url: &str) -> Result<()> {
    if url.starts_with("amqp://") || url.starts_with("amqps://") {
        Ok(())
    } else {
        Err(BusError::Connection(format!(
            "broker URL must start with amqp:// or amqps://, got {}",
            url
        )))
    }
}

/// Turns a publisher confirmation into a result.
///
/// The publishing channel runs in confirm mode, so anything but an ack means
/// the broker did not take the message.
fn check_confirmation(routing_key: &str, confirmation: Confirmation) -> Result<()> {
    if confirmation.is_ack() {
        Ok(())
    } else if confirmation.is_nack() {
        Err(BusError::Publish(format!(
            "broker rejected message for {}",
            routing_key
        )))
    } else {
        Err(BusError::Publish(format!(
            "no confirmation requested for {}",
            routing_key
        )))
    }
}

/// AMQP event bus backed by a single broker connection.
pub struct AmqpEventBus {
    connection: Connection,
    publisher: Channel,
    exchange: String,
}

impl AmqpEventBus {
    /// Connects to the broker and declares the events exchange.
    pub async fn connect(url: &str) -> Result<Self> {
        validate_url(url)?;

        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| BusError::Connection(format!("Failed to connect: {}", e)))?;

        let publisher = connection
            .create_channel()
            .await
            .map_err(|e| BusError::Connection(format!("Failed to create channel: {}", e)))?;

        publisher
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| BusError::Connection(format!("Failed to enable confirms: {}", e)))?;

        publisher
            .exchange_declare(
                EXCHANGE,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BusError::Connection(format!("Failed to declare exchange: {}", e)))?;

        info!(exchange = EXCHANGE, "Connected to AMQP");

        Ok(Self {
            connection,
            publisher,
            exchange: EXCHANGE.to_string(),
        })
    }
}

#[async_trait]
impl EventBus for AmqpEventBus {
    async fn publish_raw(&self, routing_key: &str, payload: Vec<u8>) -> Result<()> {
        let properties = BasicProperties::default()
            .with_content_type("application/json".into())
            .with_delivery_mode(2);

        let confirm = self
            .publisher
            .basic_publish(
                &self.exchange,
                routing_key,
                BasicPublishOptions::default(),
                &payload,
                properties,
            )
            .await
            .map_err(|e| BusError::Publish(e.to_string()))?;

        let confirmation = confirm
            .await
            .map_err(|e| BusError::Publish(format!("Publish confirmation failed: {}", e)))?;
        check_confirmation(routing_key, confirmation)?;

        debug!(exchange = %self.exchange, routing_key, "Published event");
        Ok(())
    }

    async fn subscribe(
        &self,
        queue: &str,
        routing_key: &str,
        capacity: usize,
    ) -> Result<mpsc::Receiver<Delivery>> {
        if capacity == 0 {
            return Err(BusError::Subscribe(format!(
                "queue {} needs a capacity of at least one",
                queue
            )));
        }

        let channel = self
            .connection
            .create_channel()
            .await
            .map_err(|e| BusError::Connection(format!("Failed to create channel: {}", e)))?;

        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BusError::Subscribe(format!("Failed to declare queue: {}", e)))?;

        channel
            .queue_bind(
                queue,
                &self.exchange,
                routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| BusError::Subscribe(format!("Failed to bind queue: {}", e)))?;

        info!(queue, routing_key, "Bound queue to exchange");

        // The broker considers a message acknowledged as soon as it is sent.
        let consumer_tag = format!("{}-{}", queue, uuid::Uuid::new_v4());
        let mut consumer = channel
            .basic_consume(
                queue,
                &consumer_tag,
                BasicConsumeOptions {
                    no_ack: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BusError::Subscribe(format!("Failed to start consumer: {}", e)))?;

        let (sender, receiver) = mpsc::channel(capacity);
        let queue = queue.to_string();

        tokio::spawn(async move {
            while let Some(delivery) = consumer.next().await {
                match delivery {
                    Ok(delivery) => {
                        let delivery =
                            Delivery::new(delivery.routing_key.as_str(), delivery.data);
                        if sender.send(delivery).await.is_err() {
                            debug!(queue = %queue, "Worker gone, stopping consumer");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(queue = %queue, error = %e, "Consumer stream failed");
                        break;
                    }
                }
            }
            // Keep the channel open for as long as the consumer runs.
            drop(channel);
        });

        Ok(receiver)
    }

    async fn close(&self) -> Result<()> {
        self.connection.close(200, "shutdown").await?;
        info!("Closed AMQP connection");
        Ok(())
    }
}
