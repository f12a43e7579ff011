use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

use crate::common::{ChatCommand, ChatEvent};

use super::client::ApiClient;

/// Background side of the widget: turns UI commands into backend calls and
/// reports the results as events.
pub struct ChatWorker {
    client: ApiClient,
    event_sender: mpsc::Sender<ChatEvent>,
    command_receiver: mpsc::Receiver<ChatCommand>,
    poll_interval: Option<Duration>,
}

impl ChatWorker {
    pub fn new(
        client: ApiClient,
        event_sender: mpsc::Sender<ChatEvent>,
        command_receiver: mpsc::Receiver<ChatCommand>,
        poll_interval: Option<Duration>,
    ) -> Self {
        Self {
            client,
            event_sender,
            command_receiver,
            poll_interval,
        }
    }

    pub async fn run(mut self) {
        let mut poll = self.poll_interval.map(|period| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        log::info!("Chat worker started");

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(command) => self.dispatch(command),
                        None => break,
                    }
                }
                _ = next_tick(&mut poll) => self.spawn_poll(),
            }
        }

        log::info!("Chat worker stopped");
    }

    // Each command runs on its own task: overlapping sends are not sequenced
    // and replies reach the UI in arrival order.
    fn dispatch(&self, command: ChatCommand) {
        let client = self.client.clone();
        let event_sender = self.event_sender.clone();
        tokio::spawn(async move {
            if let Some(event) = execute(&client, command).await {
                if let Err(err) = event_sender.send(event).await {
                    log::warn!("Failed to notify UI: {err}");
                }
            }
        });
    }

    fn spawn_poll(&self) {
        let client = self.client.clone();
        let event_sender = self.event_sender.clone();
        tokio::spawn(async move {
            let messages = client.poll_messages().await;
            if messages.is_empty() {
                return;
            }
            if let Err(err) = event_sender.send(ChatEvent::Polled(messages)).await {
                log::warn!("Failed to deliver polled messages: {err}");
            }
        });
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Performs one command against the backend. Returns the event the UI must
/// see, if any; failures are logged here.
pub async fn execute(client: &ApiClient, command: ChatCommand) -> Option<ChatEvent> {
    match command {
        ChatCommand::Initialize {
            index,
            sop_namespace,
            kb_namespace,
        } => match client
            .initialize(&index, &sop_namespace, &kb_namespace)
            .await
        {
            Ok(ack) => {
                log::info!("Backend initialized: {ack}");
                Some(ChatEvent::Initialized)
            }
            Err(err) => {
                log::error!("Error initializing API: {err}");
                None
            }
        },
        ChatCommand::SendMessage { text, channel } => {
            match client.send_message(&text, true, None, channel).await {
                Ok(reply) => Some(ChatEvent::ReplyReceived(reply)),
                Err(err) => {
                    log::error!("Error sending message: {err}");
                    Some(ChatEvent::SendFailed(err.to_string()))
                }
            }
        }
        ChatCommand::UploadImage {
            message_id,
            path,
            channel,
        } => match client.send_message("", true, Some(&path), channel).await {
            Ok(reply) => Some(ChatEvent::ImageUploaded { message_id, reply }),
            Err(err) => {
                log::error!("Error uploading image {}: {err}", path.display());
                Some(ChatEvent::ImageFailed {
                    message_id,
                    error: err.to_string(),
                })
            }
        },
        ChatCommand::SendFeedback {
            content,
            positive,
            channel,
        } => {
            if let Err(err) = client.send_feedback(&content, positive, channel).await {
                log::error!("Error sending feedback: {err}");
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Channel, ChatReply};
    use crate::config::AppConfig;
    use crate::network::stub;

    fn client_for(base_url: &str) -> ApiClient {
        ApiClient::new(&AppConfig {
            base_url: base_url.to_string(),
            ..AppConfig::default()
        })
    }

    #[tokio::test]
    async fn failed_initialization_is_swallowed() {
        let client = client_for(&stub::unreachable_url().await);
        let command = ChatCommand::Initialize {
            index: "i".into(),
            sop_namespace: "s".into(),
            kb_namespace: "k".into(),
        };
        assert_eq!(execute(&client, command).await, None);
    }

    #[tokio::test]
    async fn send_failure_becomes_event() {
        let (base_url, server) = stub::serve(1, 500, "{}").await;
        let client = client_for(&base_url);
        let event = execute(
            &client,
            ChatCommand::SendMessage {
                text: "hello".into(),
                channel: Channel::Chat,
            },
        )
        .await;
        assert_eq!(event, Some(ChatEvent::SendFailed("server error: 500".into())));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn negative_feedback_posts_flag_false() {
        let (base_url, server) = stub::serve(1, 200, r#"{"reply":"noted"}"#).await;
        let client = client_for(&base_url);
        let event = execute(
            &client,
            ChatCommand::SendFeedback {
                content: String::new(),
                positive: false,
                channel: Channel::Freshdesk,
            },
        )
        .await;
        assert_eq!(event, None);

        let body = server.await.unwrap()[0].json();
        assert_eq!(body["feedback"], false);
        assert_eq!(body["channel"], "freshdesk");
        assert_eq!(body["messages"][0]["content"], "");
    }

    #[tokio::test]
    async fn worker_forwards_replies_until_commands_close() {
        let (base_url, server) = stub::serve(1, 200, r#"{"reply":"hi"}"#).await;
        let (command_tx, command_rx) = mpsc::channel(4);
        let (event_tx, mut event_rx) = mpsc::channel(4);
        let worker = ChatWorker::new(client_for(&base_url), event_tx, command_rx, None);
        let running = tokio::spawn(worker.run());

        command_tx
            .send(ChatCommand::SendMessage {
                text: "hello".into(),
                channel: Channel::Chat,
            })
            .await
            .unwrap();

        let event = event_rx.recv().await.unwrap();
        assert_eq!(
            event,
            ChatEvent::ReplyReceived(ChatReply {
                reply: Some("hi".into()),
                image_url: None,
            })
        );

        drop(command_tx);
        running.await.unwrap();
        server.await.unwrap();
    }
}
