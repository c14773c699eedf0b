//! Chat gateway: polls for messages, filters senders, hands messages to a
//! handler one at a time and relays the outcome to the chat.
//!
//! The poller and the worker are separate tasks joined by a bounded queue.
//! A full queue blocks the poller, so a slow backend throttles polling.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use notebridge_core::defaults::{EVENT_BUS_CAPACITY, POLL_ERROR_BACKOFF_MS};
use notebridge_core::{Error, Result};

use crate::config::AppConfig;
use crate::message::Message;
use crate::orchestrator::MessageOrchestrator;
use crate::telegram::TelegramClient;

/// Produces the reply text for a message.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &Message) -> Result<String>;
}

#[async_trait]
impl MessageHandler for MessageOrchestrator {
    async fn handle(&self, message: &Message) -> Result<String> {
        self.handle_message(message).await
    }
}

/// Event emitted by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// Polling started.
    Started,
    /// A message from a sender outside the owner list was dropped.
    Ignored {
        chat_id: i64,
        sender_id: Option<i64>,
    },
    /// A message was handled and the confirmation relayed.
    Handled { chat_id: i64, message_id: i64 },
    /// Handling failed; the error text was relayed.
    Failed {
        chat_id: i64,
        message_id: i64,
        error: String,
    },
    /// Neither the reply nor its plain-text fallback could be sent.
    ReplyFailed { chat_id: i64, error: String },
    /// The queue drained and the worker exited.
    Stopped,
}

/// Handle for controlling a running gateway.
pub struct GatewayHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<GatewayEvent>,
    tasks: Vec<JoinHandle<()>>,
}

impl GatewayHandle {
    /// Stop polling. Queued messages are still handled.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for gateway events.
    pub fn events(&self) -> broadcast::Receiver<GatewayEvent> {
        self.event_rx.resubscribe()
    }

    /// Wait for the poller and the worker to finish.
    pub async fn join(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                error!(error = ?e, "Gateway task panicked");
            }
        }
    }
}

pub struct ChatGateway {
    telegram: TelegramClient,
    handler: Arc<dyn MessageHandler>,
    config: Arc<AppConfig>,
    event_tx: broadcast::Sender<GatewayEvent>,
}

impl ChatGateway {
    pub fn new(
        telegram: TelegramClient,
        handler: Arc<dyn MessageHandler>,
        config: Arc<AppConfig>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self {
            telegram,
            handler,
            config,
            event_tx,
        }
    }

    /// Spawn the poller and the worker and return a handle for control.
    pub fn start(self) -> GatewayHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (queue_tx, queue_rx) = mpsc::channel(self.config.queue_capacity);
        let event_rx = self.event_tx.subscribe();

        let gateway = Arc::new(self);
        let poller = {
            let gateway = gateway.clone();
            tokio::spawn(async move { gateway.poll(queue_tx, shutdown_rx).await })
        };
        let worker = tokio::spawn(async move { gateway.work(queue_rx).await });

        GatewayHandle {
            shutdown_tx,
            event_rx,
            tasks: vec![poller, worker],
        }
    }

    #[instrument(skip_all, fields(subsystem = "bot", component = "gateway", op = "poll"))]
    async fn poll(&self, queue: mpsc::Sender<Message>, mut shutdown_rx: mpsc::Receiver<()>) {
        info!(
            poll_timeout_secs = self.config.poll_timeout.as_secs(),
            owner_count = self.config.owner_ids.len(),
            queue_capacity = self.config.queue_capacity,
            "Chat gateway started"
        );
        let _ = self.event_tx.send(GatewayEvent::Started);

        let backoff = Duration::from_millis(POLL_ERROR_BACKOFF_MS);
        let mut offset = 0i64;

        'poll: loop {
            let polled = tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Chat gateway received shutdown signal");
                    break;
                }
                polled = self.telegram.get_updates(offset) => polled,
            };

            let updates = match polled {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "Update poll failed");
                    tokio::select! {
                        _ = shutdown_rx.recv() => {
                            info!("Chat gateway received shutdown signal");
                            break;
                        }
                        _ = sleep(backoff) => {}
                    }
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(message) = update.message else {
                    continue;
                };

                let chat_id = message.chat.id;
                let sender_id = message.sender_id();
                if !self.config.is_authorized(sender_id) {
                    warn!(chat_id, sender_id, "Message from unauthorized sender ignored");
                    let _ = self
                        .event_tx
                        .send(GatewayEvent::Ignored { chat_id, sender_id });
                    continue;
                }

                debug!(chat_id, message_id = message.message_id, "Message queued");
                if queue.send(message).await.is_err() {
                    warn!("Message worker is gone, poller exiting");
                    break 'poll;
                }
            }
        }
    }

    async fn work(&self, mut queue: mpsc::Receiver<Message>) {
        while let Some(message) = queue.recv().await {
            self.process(message).await;
        }
        info!("Chat gateway stopped");
        let _ = self.event_tx.send(GatewayEvent::Stopped);
    }

    #[instrument(
        skip(self, message),
        fields(
            subsystem = "bot",
            component = "gateway",
            op = "process",
            chat_id = message.chat.id,
            message_id = message.message_id
        )
    )]
    async fn process(&self, message: Message) {
        let chat_id = message.chat.id;
        let message_id = message.message_id;

        let event = match self.handler.handle(&message).await {
            Ok(reply) => {
                let parse_mode = self.config.reply_format.parse_mode();
                self.reply(chat_id, &reply, Some(parse_mode)).await;
                GatewayEvent::Handled {
                    chat_id,
                    message_id,
                }
            }
            Err(e) => {
                error!(error = %e, "Message handling failed");
                let error = e.to_string();
                self.reply(chat_id, &error, None).await;
                GatewayEvent::Failed {
                    chat_id,
                    message_id,
                    error,
                }
            }
        };
        let _ = self.event_tx.send(event);
    }

    /// Send `text`; if that fails, send the failure as plain text instead.
    async fn reply(&self, chat_id: i64, text: &str, parse_mode: Option<&str>) {
        let Err(e) = self.telegram.send_message(chat_id, text, parse_mode).await else {
            return;
        };
        warn!(chat_id, error = %e, "Reply failed, sending the error instead");

        let fallback = e.to_string();
        if let Err(e) = self.telegram.send_message(chat_id, &fallback, None).await {
            error!(chat_id, error = %e, "Failed to send reply");
            let _ = self.event_tx.send(GatewayEvent::ReplyFailed {
                chat_id,
                error: e.to_string(),
            });
        }
    }
}
