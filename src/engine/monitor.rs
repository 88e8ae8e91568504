use crate::config::Config;
use crate::engine::EngineCore;
use crate::models::Task;
use crate::telegram::IncomingMessage;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MonitorState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

#[derive(Debug)]
pub enum MonitorEvent {
    NewPost(IncomingMessage),
    EditedPost(IncomingMessage),
}

#[derive(Debug)]
pub enum MonitorError {
    NoSources,
    Storage(diesel::result::Error),
    Pool(String),
}

/// One monitor per active task. The engine's update router feeds its bounded
/// intake queue; a consumer task drains it through the engine, which gives
/// natural backpressure instead of unbounded handler fan-out.
pub struct ChannelMonitor {
    pub task_id: i64,
    backend: &'static str,
    state: Arc<Mutex<MonitorState>>,
    sources: Arc<RwLock<HashSet<i64>>>,
    intake: Option<mpsc::Sender<MonitorEvent>>,
    handle: Option<JoinHandle<()>>,
}

impl ChannelMonitor {
    /// Resolves sources and picks the backend, auto-downgrading userbot
    /// tasks whose session is unavailable (persisting the change), then
    /// spawns the consumer.
    pub async fn start(core: Arc<EngineCore>, task: &Task) -> Result<ChannelMonitor, MonitorError> {
        let state = Arc::new(Mutex::new(MonitorState::Starting));

        let mut conn = core
            .connection()
            .map_err(|error| MonitorError::Pool(error.to_string()))?;

        let sources =
            crate::db::tasks::fetch_active_sources(&mut conn, task.id).map_err(MonitorError::Storage)?;

        if sources.is_empty() {
            return Err(MonitorError::NoSources);
        }

        let backend = if task.uses_userbot() {
            if core.userbot_connected().await {
                "userbot"
            } else {
                log::warn!(
                    "Task {} is configured for the userbot but its session is unavailable, switching to the bot backend",
                    task.id
                );

                core.persist_downgrade(&mut conn, task.id);

                "bot"
            }
        } else {
            "bot"
        };

        drop(conn);

        let chat_ids: HashSet<i64> = sources.iter().map(|source| source.chat_id).collect();
        let sources = Arc::new(RwLock::new(chat_ids));

        let (sender, mut receiver) = mpsc::channel::<MonitorEvent>(Config::monitor_queue_size());

        let task_id = task.id;
        let consumer_state = state.clone();
        let consumer_core = core.clone();

        let handle = tokio::spawn(async move {
            // drains admitted messages even while stopping, so a stop never
            // leaves a half-forwarded message without log entries
            while let Some(event) = receiver.recv().await {
                match event {
                    MonitorEvent::NewPost(message) => {
                        consumer_core.process_message(task_id, message).await;
                    }
                    MonitorEvent::EditedPost(message) => {
                        consumer_core.process_edited_message(task_id, message).await;
                    }
                }
            }

            *consumer_state.lock().unwrap() = MonitorState::Stopped;
        });

        *state.lock().unwrap() = MonitorState::Running;

        log::info!(
            "Started monitoring task {task_id} ({} sources) using the {backend} backend",
            sources.read().unwrap().len()
        );

        Ok(ChannelMonitor {
            task_id,
            backend,
            state,
            sources,
            intake: Some(sender),
            handle: Some(handle),
        })
    }

    pub fn watches(&self, chat_id: i64) -> bool {
        self.sources.read().unwrap().contains(&chat_id)
    }

    pub fn source_chat_ids(&self) -> Vec<i64> {
        self.sources.read().unwrap().iter().copied().collect()
    }

    pub fn state(&self) -> MonitorState {
        *self.state.lock().unwrap()
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// Queues an event for processing; applies backpressure when the intake
    /// queue is full. Events offered to a stopping monitor are dropped.
    pub async fn offer(&self, event: MonitorEvent) -> bool {
        if self.state() != MonitorState::Running {
            return false;
        }

        let Some(intake) = &self.intake else {
            return false;
        };

        intake.send(event).await.is_ok()
    }

    /// The routed chat set updates in place; no restart needed.
    pub fn add_source(&self, chat_id: i64) {
        self.sources.write().unwrap().insert(chat_id);
    }

    pub fn remove_source(&self, chat_id: i64) {
        self.sources.write().unwrap().remove(&chat_id);
    }

    /// Idempotent. Closes intake immediately and waits for already-admitted
    /// messages to finish.
    pub async fn stop(&mut self) {
        {
            let mut state = self.state.lock().unwrap();

            if matches!(*state, MonitorState::Stopped | MonitorState::Stopping) && self.handle.is_none() {
                return;
            }

            *state = MonitorState::Stopping;
        }

        // dropping the sender ends the consumer loop after the queue drains
        self.intake.take();

        if let Some(handle) = self.handle.take() {
            if let Err(error) = handle.await {
                log::error!("Monitor consumer for task {} panicked: {error}", self.task_id);
            }
        }

        *self.state.lock().unwrap() = MonitorState::Stopped;

        log::info!("Stopped monitoring task {}", self.task_id);
    }
}
