use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::application::errors::{BotError, ErrorKind};
use crate::application::messaging::{replies, CommandDispatcher, Reply};
use crate::domain::entities::Message;
use crate::domain::traits::Bot;

/// Service for processing inbound events: dispatch, log, reply
pub struct BotService<B: Bot> {
    bot: Arc<B>,
    dispatcher: Arc<CommandDispatcher>,
}

impl<B: Bot + 'static> BotService<B> {
    pub fn new(bot: Arc<B>, dispatcher: Arc<CommandDispatcher>) -> Self {
        Self { bot, dispatcher }
    }

    /// Reply text for one inbound message
    pub async fn respond(&self, message: &Message) -> String {
        let Some(text) = message.content.text().map(str::to_string) else {
            tracing::info!(event_id = %message.id, workspace = %message.workspace_id, "Home tab opened");
            return replies::greeting(self.dispatcher.bot_name());
        };

        // Run the dispatch on its own task so a panicking store cannot take
        // the event loop down with it
        let dispatcher = self.dispatcher.clone();
        let workspace_id = message.workspace_id.clone();
        let reply = match tokio::spawn(async move { dispatcher.dispatch(&workspace_id, &text).await }).await {
            Ok(reply) => reply,
            Err(e) => Reply::unavailable(format!("dispatch task failed: {}", e)),
        };

        log_reply(message, &reply);
        reply.text
    }

    /// Process a message and send the reply back to its channel
    pub async fn handle(&self, message: Message) -> Result<(), BotError> {
        let text = self.respond(&message).await;
        self.bot.send_message(&message.channel_id, &text).await?;
        Ok(())
    }

    /// Handle events until the source closes or `shutdown` resolves, then
    /// wait for in-flight events. Returns how many events were handled.
    pub async fn run<F>(self: Arc<Self>, mut events: mpsc::Receiver<Message>, shutdown: F) -> usize
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);
        let mut in_flight = JoinSet::new();
        let mut handled = 0;

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, no longer accepting events");
                    break;
                }
                event = events.recv() => match event {
                    Some(message) => {
                        let service = self.clone();
                        in_flight.spawn(async move { service.handle(message).await });
                    }
                    None => {
                        tracing::info!("Event source closed");
                        break;
                    }
                },
                Some(done) = in_flight.join_next(), if !in_flight.is_empty() => {
                    handled += 1;
                    log_finished(done);
                }
            }
        }

        events.close();
        if !in_flight.is_empty() {
            tracing::info!("Waiting for {} in-flight events", in_flight.len());
        }
        while let Some(done) = in_flight.join_next().await {
            handled += 1;
            log_finished(done);
        }
        handled
    }
}

fn log_reply(message: &Message, reply: &Reply) {
    let outcome = reply.outcome.name();
    let elapsed_ms = (Utc::now() - message.timestamp).num_milliseconds();
    match reply.error_kind() {
        None => tracing::info!(
            event_id = %message.id,
            workspace = %message.workspace_id,
            platform = %message.platform,
            sender = message.sender_id.as_deref().unwrap_or("-"),
            outcome,
            elapsed_ms,
            "Command handled"
        ),
        Some(ErrorKind::StoreUnavailable) => tracing::error!(
            event_id = %message.id,
            workspace = %message.workspace_id,
            outcome,
            cause = reply.cause.as_deref().unwrap_or("unknown"),
            "Command failed"
        ),
        Some(kind) => tracing::info!(
            event_id = %message.id,
            workspace = %message.workspace_id,
            outcome,
            error = %kind,
            "Command rejected"
        ),
    }
}

fn log_finished(done: Result<Result<(), BotError>, JoinError>) {
    match done {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Failed to send reply: {}", e),
        Err(e) => tracing::error!("Event task failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::{oneshot, Notify};

    use crate::application::errors::StorageError;
    use crate::domain::entities::{Content, Task, TaskId};
    use crate::domain::traits::{BotInfo, TaskStore};
    use crate::infrastructure::storage::MemoryStore;

    /// Records every reply instead of sending it
    #[derive(Default)]
    struct RecordingBot {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingBot {
        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Bot for RecordingBot {
        async fn start(&self, _events: mpsc::Sender<Message>) -> Result<(), BotError> {
            Ok(())
        }

        async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError> {
            self.sent.lock().unwrap().push((channel_id.to_string(), text.to_string()));
            Ok("ts".to_string())
        }

        fn bot_info(&self) -> BotInfo {
            BotInfo {
                id: "UBOT".to_string(),
                name: "todobot".to_string(),
                platform: "test".to_string(),
            }
        }
    }

    struct PanickingStore;

    #[async_trait]
    impl TaskStore for PanickingStore {
        async fn add(&self, _: &str, _: &str) -> Result<Task, StorageError> {
            panic!("store exploded")
        }

        async fn list(&self, _: &str) -> Result<Vec<Task>, StorageError> {
            panic!("store exploded")
        }

        async fn complete(&self, _: &str, _: TaskId) -> Result<Task, StorageError> {
            panic!("store exploded")
        }

        async fn delete(&self, _: &str, _: TaskId) -> Result<(), StorageError> {
            panic!("store exploded")
        }
    }

    /// Holds every add until released
    struct GatedStore {
        inner: MemoryStore,
        entered: mpsc::UnboundedSender<()>,
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl TaskStore for GatedStore {
        async fn add(&self, workspace_id: &str, content: &str) -> Result<Task, StorageError> {
            let _ = self.entered.send(());
            self.gate.notified().await;
            self.inner.add(workspace_id, content).await
        }

        async fn list(&self, workspace_id: &str) -> Result<Vec<Task>, StorageError> {
            self.inner.list(workspace_id).await
        }

        async fn complete(&self, workspace_id: &str, id: TaskId) -> Result<Task, StorageError> {
            self.inner.complete(workspace_id, id).await
        }

        async fn delete(&self, workspace_id: &str, id: TaskId) -> Result<(), StorageError> {
            self.inner.delete(workspace_id, id).await
        }
    }

    fn service(store: Arc<dyn TaskStore>) -> (Arc<BotService<RecordingBot>>, Arc<RecordingBot>) {
        let bot = Arc::new(RecordingBot::default());
        let dispatcher = Arc::new(CommandDispatcher::new(store, "todobot"));
        (Arc::new(BotService::new(bot.clone(), dispatcher)), bot)
    }

    #[tokio::test]
    async fn test_handle_replies_to_channel() {
        let (service, bot) = service(Arc::new(MemoryStore::new()));

        service.handle(Message::from_text("T1", "C9", "add Buy milk")).await.unwrap();

        let sent = bot.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "C9");
        assert!(sent[0].1.contains("Buy milk"));
    }

    #[tokio::test]
    async fn test_home_opened_gets_greeting() {
        let (service, bot) = service(Arc::new(MemoryStore::new()));

        service.handle(Message::new("T1", "D1", Content::HomeOpened)).await.unwrap();

        assert_eq!(bot.sent(), vec![("D1".to_string(), replies::greeting("todobot"))]);
    }

    #[tokio::test]
    async fn test_panicking_store_gets_generic_reply() {
        let (service, bot) = service(Arc::new(PanickingStore));

        service.handle(Message::from_text("T1", "C1", "list")).await.unwrap();
        service.handle(Message::from_text("T1", "C1", "help")).await.unwrap();

        let sent = bot.sent();
        assert_eq!(sent[0].1, replies::unavailable());
        assert_eq!(sent[1].1, replies::help("todobot"));
    }

    #[tokio::test]
    async fn test_run_until_source_closes() {
        let (service, bot) = service(Arc::new(MemoryStore::new()));
        let (tx, rx) = mpsc::channel(8);
        for text in ["add one", "add two", "list"] {
            tx.send(Message::from_text("T1", "C1", text)).await.unwrap();
        }
        drop(tx);

        let handled = service.run(rx, std::future::pending()).await;

        assert_eq!(handled, 3);
        assert_eq!(bot.sent().len(), 3);
    }

    #[tokio::test]
    async fn test_shutdown_drains_in_flight() {
        let (entered_tx, mut entered_rx) = mpsc::unbounded_channel();
        let gate = Arc::new(Notify::new());
        let store = GatedStore {
            inner: MemoryStore::new(),
            entered: entered_tx,
            gate: gate.clone(),
        };
        let (service, bot) = service(Arc::new(store));

        let (tx, rx) = mpsc::channel(8);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let runner = tokio::spawn(service.run(rx, async move {
            let _ = stop_rx.await;
        }));

        tx.send(Message::from_text("T1", "C1", "add slow task")).await.unwrap();
        entered_rx.recv().await.unwrap();

        stop_tx.send(()).unwrap();
        gate.notify_one();

        assert_eq!(runner.await.unwrap(), 1);
        let sent = bot.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("slow task"));

        // The loop is gone, so new events are refused
        assert!(tx.send(Message::from_text("T1", "C1", "list")).await.is_err());
    }
}
