//! AMQP broker (RabbitMQ) over lapin
//!
//! Publishes through the default exchange with the queue name as routing
//! key. No publisher confirms are enabled, so publish is fire-and-forget.

use std::collections::HashSet;

use bytes::Bytes;
use contracts::{BrokerConfig, BrokerConnector, ContractError, MessageBroker, QueueSpec};
use lapin::options::{BasicPublishOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::uri::{AMQPAuthority, AMQPUri, AMQPUserInfo};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tracing::{debug, instrument, warn};

/// Reply code for a normal channel/connection close
const REPLY_SUCCESS: u16 = 200;

/// AMQP delivery mode for messages that survive a broker restart
const DELIVERY_MODE_PERSISTENT: u8 = 2;

/// Opens AMQP connections
#[derive(Debug, Clone)]
pub struct AmqpConnector {
    uri: AMQPUri,
    endpoint: String,
}

impl AmqpConnector {
    /// Create from broker configuration
    pub fn new(config: &BrokerConfig) -> Self {
        Self {
            uri: amqp_uri(config),
            endpoint: config.endpoint(),
        }
    }
}

/// Unset credentials fall back to lapin's defaults (guest/guest)
fn amqp_uri(config: &BrokerConfig) -> AMQPUri {
    let defaults = AMQPUri::default();
    let userinfo = match &config.username {
        Some(username) => AMQPUserInfo {
            username: username.clone(),
            password: config.password.clone().unwrap_or_default(),
        },
        None => defaults.authority.userinfo.clone(),
    };

    AMQPUri {
        authority: AMQPAuthority {
            userinfo,
            host: config.host.clone(),
            port: config.port,
        },
        vhost: config.vhost.clone(),
        ..defaults
    }
}

/// Errors meaning the connection or channel is gone, not just one message
fn connection_lost(error: &lapin::Error) -> bool {
    matches!(
        error,
        lapin::Error::InvalidChannelState(_)
            | lapin::Error::InvalidConnectionState(_)
            | lapin::Error::IOError(_)
    )
}

impl BrokerConnector for AmqpConnector {
    type Broker = AmqpBroker;

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    #[instrument(name = "amqp_connect", skip(self), fields(endpoint = %self.endpoint))]
    async fn connect(&self) -> Result<AmqpBroker, ContractError> {
        let connection = Connection::connect_uri(self.uri.clone(), ConnectionProperties::default())
            .await
            .map_err(|e| ContractError::broker_connection(e.to_string()))?;

        let channel = match connection.create_channel().await {
            Ok(channel) => channel,
            Err(e) => {
                if let Err(close_err) = connection.close(REPLY_SUCCESS, "OK").await {
                    warn!(error = %close_err, "AMQP connection close failed");
                }
                return Err(ContractError::broker_connection(format!(
                    "channel open failed: {e}"
                )));
            }
        };

        debug!(channel_id = channel.id(), "AMQP channel opened");

        Ok(AmqpBroker {
            name: format!("amqp://{}", self.endpoint),
            connection,
            channel,
            durable_queues: HashSet::new(),
            closed: false,
        })
    }
}

/// One AMQP connection with a single channel
pub struct AmqpBroker {
    name: String,
    connection: Connection,
    channel: Channel,
    durable_queues: HashSet<String>,
    closed: bool,
}

impl AmqpBroker {
    fn properties_for(&self, queue: &str) -> BasicProperties {
        if self.durable_queues.contains(queue) {
            BasicProperties::default().with_delivery_mode(DELIVERY_MODE_PERSISTENT)
        } else {
            BasicProperties::default()
        }
    }
}

impl MessageBroker for AmqpBroker {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "amqp_declare_queue",
        skip(self, queue),
        fields(queue = %queue.name, durable = queue.durable)
    )]
    async fn declare_queue(&mut self, queue: &QueueSpec) -> Result<(), ContractError> {
        let options = QueueDeclareOptions {
            durable: queue.durable,
            ..Default::default()
        };

        self.channel
            .queue_declare(&queue.name, options, FieldTable::default())
            .await
            .map_err(|e| ContractError::broker_connection(e.to_string()))?;

        if queue.durable {
            self.durable_queues.insert(queue.name.clone());
        }
        Ok(())
    }

    #[instrument(
        name = "amqp_publish",
        skip(self, payload),
        fields(queue = %queue, bytes = payload.len())
    )]
    async fn publish(&mut self, queue: &str, payload: Bytes) -> Result<(), ContractError> {
        let properties = self.properties_for(queue);

        // The returned confirm is not awaited: confirms are not enabled
        self.channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                &payload,
                properties,
            )
            .await
            .map_err(|e| {
                if connection_lost(&e) {
                    ContractError::broker_connection(e.to_string())
                } else {
                    ContractError::publish(queue, e.to_string())
                }
            })?;

        Ok(())
    }

    #[instrument(name = "amqp_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Err(e) = self.channel.close(REPLY_SUCCESS, "OK").await {
            warn!(error = %e, "AMQP channel close failed");
        }
        self.connection
            .close(REPLY_SUCCESS, "OK")
            .await
            .map_err(|e| ContractError::broker_connection(format!("connection close failed: {e}")))?;

        debug!(broker = %self.name, "AMQP connection closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_hides_credentials_in_endpoint() {
        let config = BrokerConfig {
            username: Some("dispatch".into()),
            password: Some("secret".into()),
            ..Default::default()
        };
        let connector = AmqpConnector::new(&config);
        assert_eq!(connector.endpoint(), "localhost:5672");
        assert!(!connector.endpoint().contains("secret"));
    }

    #[test]
    fn test_uri_carries_broker_settings() {
        let config = BrokerConfig {
            host: "mq.internal".into(),
            port: 5673,
            vhost: "dispatch/prod".into(),
            username: Some("dispatch".into()),
            password: Some("p@ss/word".into()),
        };
        let uri = amqp_uri(&config);
        assert_eq!(uri.authority.host, "mq.internal");
        assert_eq!(uri.authority.port, 5673);
        assert_eq!(uri.vhost, "dispatch/prod");
        assert_eq!(uri.authority.userinfo.username, "dispatch");
        assert_eq!(uri.authority.userinfo.password, "p@ss/word");
    }

    #[test]
    fn test_uri_defaults_without_credentials() {
        let uri = amqp_uri(&BrokerConfig::default());
        let defaults = AMQPUri::default();
        assert_eq!(uri.vhost, "/");
        assert_eq!(uri.authority.host, "localhost");
        assert_eq!(uri.authority.port, 5672);
        assert_eq!(uri.authority.userinfo, defaults.authority.userinfo);
    }

    #[test]
    fn test_io_error_counts_as_connection_loss() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(connection_lost(&lapin::Error::IOError(std::sync::Arc::new(io))));
        assert!(!connection_lost(&lapin::Error::ChannelsLimitReached));
    }

    #[tokio::test]
    async fn test_unreachable_broker_is_connection_error() {
        // Port 1 on loopback is never an AMQP broker
        let config = BrokerConfig {
            host: "127.0.0.1".into(),
            port: 1,
            ..Default::default()
        };
        let connector = AmqpConnector::new(&config);
        let result = connector.connect().await;
        assert!(matches!(
            result,
            Err(ContractError::BrokerConnection { .. })
        ));
    }
}
