use crate::approval::{self, ApprovalError, Decision};
use crate::config::Config;
use crate::db;
use crate::db::logs::{self, NewForwardingLog};
use crate::db::{mappings, sending_stats, tasks};
use crate::dedup::Deduplicator;
use crate::deliver::{Delivery, Dispatcher};
use crate::filter::{self, Verdict};
use crate::models::forwarding_log::LogStatus;
use crate::models::{Task, Target};
use crate::schedule::{self, GateVerdict};
use crate::settings::CompiledSettings;
use crate::telegram::gateway::{BotGateway, UserGateway};
use crate::telegram::incoming::MessageSnapshot;
use crate::telegram::{Api, IncomingMessage, UpdateFetcher};
use crate::transform::{self, RenderContext};
use diesel::r2d2::PooledConnection;
use diesel::r2d2::{self, ConnectionManager};
use diesel::PgConnection;
use frankenstein::{AnswerCallbackQueryParams, Message, UpdateContent};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

pub mod monitor;
pub mod stats;

use monitor::{ChannelMonitor, MonitorEvent};
use stats::{EngineStats, StatsReport};

const BACKGROUND_TICK_SECONDS: u64 = 60;
const IDLE_POLL_SECONDS: u64 = 1;

type Connection = PooledConnection<ConnectionManager<PgConnection>>;

/// The per-message machinery shared by every monitor: gateways, dispatcher,
/// deduplicator, statistics and the task cache.
pub struct EngineCore {
    bot_api: Api,
    userbot: Option<Arc<UserGateway>>,
    pub dispatcher: Dispatcher,
    pub dedup: Deduplicator,
    pub stats: EngineStats,
    tasks: RwLock<HashMap<i64, Task>>,
}

impl EngineCore {
    pub fn new() -> Self {
        let bot = Arc::new(BotGateway::new());
        let bot_api = bot.api().clone();
        let userbot = UserGateway::from_config().map(Arc::new);

        let dispatcher = Dispatcher::new(
            bot,
            userbot
                .clone()
                .map(|gateway| gateway as Arc<dyn crate::telegram::MessagingGateway>),
        );

        Self {
            bot_api,
            userbot,
            dispatcher,
            dedup: Deduplicator::new(),
            stats: EngineStats::new(),
            tasks: RwLock::new(HashMap::new()),
        }
    }

    pub fn connection(&self) -> Result<Connection, r2d2::PoolError> {
        db::pool().get()
    }

    pub fn bot_api(&self) -> &Api {
        &self.bot_api
    }

    pub fn userbot_api(&self) -> Option<Api> {
        self.userbot.as_ref().map(|gateway| gateway.api().clone())
    }

    pub async fn userbot_connected(&self) -> bool {
        match &self.userbot {
            Some(gateway) => gateway.probe().await,
            None => false,
        }
    }

    /// The userbot -> bot downgrade path: persists the change and updates the
    /// cached task so later sends skip the dead session.
    pub fn persist_downgrade(&self, conn: &mut PgConnection, task_id: i64) {
        if let Err(error) = tasks::downgrade_to_bot(conn, task_id) {
            log::error!("Failed to persist the bot downgrade for task {task_id}: {error}");
            return;
        }

        let mut cache = self.tasks.write().unwrap();
        if let Some(task) = cache.get_mut(&task_id) {
            task.task_type = crate::models::task::TASK_TYPE_BOT.to_string();
        }
    }

    pub fn load_active_tasks(&self) -> Result<usize, String> {
        let mut conn = self.connection().map_err(|error| error.to_string())?;

        let active = tasks::fetch_active_tasks(&mut conn).map_err(|error| error.to_string())?;
        let count = active.len();

        let mut cache = self.tasks.write().unwrap();
        cache.clear();
        cache.extend(active.into_iter().map(|task| (task.id, task)));

        Ok(count)
    }

    pub fn cached_task(&self, task_id: i64) -> Option<Task> {
        self.tasks.read().unwrap().get(&task_id).cloned()
    }

    pub fn cached_tasks(&self) -> Vec<Task> {
        self.tasks.read().unwrap().values().cloned().collect()
    }

    pub fn forget_task(&self, task_id: i64) {
        self.tasks.write().unwrap().remove(&task_id);
    }

    /// Settings are re-read per message; a task without a row runs on the
    /// documented defaults.
    fn load_settings(&self, conn: &mut PgConnection, task_id: i64) -> CompiledSettings {
        match tasks::find_settings(conn, task_id) {
            Some(row) => CompiledSettings::from_row(&row),
            None => CompiledSettings::defaults(task_id),
        }
    }

    /// Full pipeline for one new message: gate, filters, dedup, then either
    /// the approval hold or transform + dispatch. Every terminal outcome
    /// writes exactly one log row per (task, target); blocks use target 0.
    pub async fn process_message(&self, task_id: i64, message: IncomingMessage) -> bool {
        let started = Instant::now();

        let Some(task) = self.cached_task(task_id) else {
            log::warn!("Task {task_id} vanished from the cache, dropping the message");
            return false;
        };

        let mut conn = match self.connection() {
            Ok(conn) => conn,
            Err(error) => {
                log::error!("No storage connection, dropping the message: {error}");
                return false;
            }
        };

        let settings = self.load_settings(&mut conn, task_id);

        match schedule::check(&mut conn, &settings, db::current_time()) {
            GateVerdict::Block(status) => {
                self.log_block(&mut conn, &task, &message, status, gate_reason(status));
                return false;
            }
            GateVerdict::Allow => (),
        }

        match filter::evaluate(&mut conn, &self.dedup, &message, &settings) {
            Verdict::Block { status, reason } => {
                self.log_block(&mut conn, &task, &message, status, &reason);
                return false;
            }
            Verdict::Pass => (),
        }

        if self
            .dedup
            .seen_before(task_id, message.chat_id(), message.message_id())
        {
            self.log_block(
                &mut conn,
                &task,
                &message,
                LogStatus::Duplicate,
                "message already admitted",
            );
            return false;
        }

        if settings.manual_mode {
            match approval::submit(&mut conn, self.dispatcher.bot_gateway(), &task, &message).await
            {
                Ok(approval) => {
                    log::info!(
                        "Message {} of task {task_id} held as approval {}",
                        message.message_id(),
                        approval.id
                    );
                    self.log_block(
                        &mut conn,
                        &task,
                        &message,
                        LogStatus::PendingApproval,
                        "held for manual approval",
                    );
                }
                Err(error) => {
                    log::error!("Failed to hold the message for approval: {error:?}");
                    self.log_block(
                        &mut conn,
                        &task,
                        &message,
                        LogStatus::Failed,
                        "approval hold failed",
                    );
                }
            }

            return true;
        }

        let successes = self
            .dispatch_to_targets(&mut conn, &task, &settings, &message)
            .await;

        self.stats.record_processing(started.elapsed(), successes);

        successes > 0
    }

    /// Delivers one admitted message to every active target, sequentially in
    /// target order. A failure on one target never aborts the rest.
    pub async fn dispatch_to_targets(
        &self,
        conn: &mut PgConnection,
        task: &Task,
        settings: &CompiledSettings,
        message: &IncomingMessage,
    ) -> usize {
        let targets = match tasks::fetch_active_targets(conn, task.id) {
            Ok(targets) => targets,
            Err(error) => {
                log::error!("Failed to load targets for task {}: {error}", task.id);
                return 0;
            }
        };

        if targets.is_empty() {
            log::warn!("No active targets for task {}", task.id);
            return 0;
        }

        let context = RenderContext {
            source_name: self.source_name(conn, task.id, message),
            now: schedule::local_time(settings, db::current_time()),
        };

        let transformed = transform::apply(message.content_text(), settings, &context).await;

        if transformed.dropped {
            log::info!(
                "Message {} of task {} became empty after transformation, completing as a no-op",
                message.message_id(),
                task.id
            );
            return 0;
        }

        let mut successes = 0;

        for target in &targets {
            schedule::apply_delay(settings).await;

            let reply_to_message_id = if settings.preserve_replies {
                message.reply_to_message_id().and_then(|reply_id| {
                    mappings::find_forwarded_message_id(
                        conn,
                        task.id,
                        message.chat_id(),
                        reply_id,
                        target.chat_id,
                    )
                })
            } else {
                None
            };

            let delivery = Delivery {
                task,
                settings,
                message,
                transformed: &transformed,
                target_chat_id: target.chat_id,
                reply_to_message_id,
            };

            match self.dispatcher.deliver(&delivery).await {
                Ok(forwarded_id) => {
                    self.log_outcome(
                        conn,
                        task,
                        message,
                        target.chat_id,
                        Some(forwarded_id),
                        LogStatus::Success,
                        None,
                    );

                    let now = schedule::local_time(settings, db::current_time());
                    if let Err(error) = sending_stats::increment(conn, task.id, now) {
                        log::error!("Failed to update sending stats for task {}: {error}", task.id);
                    }

                    if settings.preserve_replies || settings.sync_edits {
                        if let Err(error) = mappings::append_target(
                            conn,
                            task.id,
                            message.chat_id(),
                            message.message_id(),
                            target.chat_id,
                            forwarded_id,
                        ) {
                            log::error!(
                                "Failed to record the message mapping for task {}: {error}",
                                task.id
                            );
                        }
                    }

                    successes += 1;
                }

                Err(error) => {
                    if error.is_permission() {
                        log::warn!(
                            "No posting rights in chat {} for task {}: {}",
                            target.chat_id,
                            task.id,
                            error.description()
                        );
                    }

                    self.log_outcome(
                        conn,
                        task,
                        message,
                        target.chat_id,
                        None,
                        LogStatus::Failed,
                        Some(error.description()),
                    );
                }
            }
        }

        successes
    }

    /// Edit propagation entry point; a task with edit sync disabled, or a
    /// message that was never forwarded, is a silent no-op.
    pub async fn process_edited_message(&self, task_id: i64, message: IncomingMessage) -> bool {
        let Some(task) = self.cached_task(task_id) else {
            return false;
        };

        let mut conn = match self.connection() {
            Ok(conn) => conn,
            Err(error) => {
                log::error!("No storage connection for the edit sync: {error}");
                return false;
            }
        };

        let settings = self.load_settings(&mut conn, task_id);

        if !settings.sync_edits {
            return false;
        }

        let targets: Vec<Target> = match tasks::fetch_active_targets(&mut conn, task_id) {
            Ok(targets) => targets,
            Err(error) => {
                log::error!("Failed to load targets for the edit sync: {error}");
                return false;
            }
        };

        let gateway = self.dispatcher.preferred_gateway(&task).await;

        let synced =
            crate::deliver::edit_sync::sync_edit(&mut conn, gateway, &settings, &message, &targets)
                .await;

        if synced > 0 {
            log::info!(
                "Synchronized an edit of message {} to {synced} targets for task {task_id}",
                message.message_id()
            );
        }

        synced > 0
    }

    /// Management-layer entry point for approval decisions. An approved
    /// message re-enters the pipeline as a stored snapshot and runs the
    /// normal transform + dispatch path.
    pub async fn handle_approval_decision(
        &self,
        approval_id: i64,
        approver_id: i64,
        decision: Decision,
    ) -> Result<Decision, ApprovalError> {
        let mut conn = self
            .connection()
            .map_err(|error| ApprovalError::Pool(error.to_string()))?;

        let approval = approval::apply_decision(&mut conn, approval_id, approver_id, decision)?;

        if decision == Decision::Reject {
            log::info!("Approval {approval_id} rejected by {approver_id}");
            return Ok(decision);
        }

        let snapshot: MessageSnapshot = serde_json::from_value(approval.message_data.clone())
            .map_err(ApprovalError::CorruptSnapshot)?;

        let task = match self.cached_task(approval.task_id) {
            Some(task) => task,
            None => tasks::find(&mut conn, approval.task_id).ok_or(ApprovalError::NotFound)?,
        };

        let settings = self.load_settings(&mut conn, task.id);
        let message = IncomingMessage::Snapshot(snapshot);

        let successes = self
            .dispatch_to_targets(&mut conn, &task, &settings, &message)
            .await;

        log::info!(
            "Approval {approval_id} accepted by {approver_id}, forwarded to {successes} targets"
        );

        Ok(decision)
    }

    fn source_name(
        &self,
        conn: &mut PgConnection,
        task_id: i64,
        message: &IncomingMessage,
    ) -> String {
        if let Some(title) = message.source_title() {
            return title;
        }

        tasks::find_source_by_chat(conn, task_id, message.chat_id())
            .and_then(|source| source.name)
            .unwrap_or_else(|| "مصدر غير معروف".to_string())
    }

    fn log_block(
        &self,
        conn: &mut PgConnection,
        task: &Task,
        message: &IncomingMessage,
        status: LogStatus,
        reason: &str,
    ) {
        self.log_outcome(
            conn,
            task,
            message,
            0,
            None,
            status,
            Some(reason.to_string()),
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn log_outcome(
        &self,
        conn: &mut PgConnection,
        task: &Task,
        message: &IncomingMessage,
        target_chat_id: i64,
        forwarded_message_id: Option<i32>,
        status: LogStatus,
        error_message: Option<String>,
    ) {
        let new_log = NewForwardingLog {
            task_id: task.id,
            source_chat_id: message.chat_id(),
            target_chat_id,
            source_message_id: message.message_id(),
            forwarded_message_id,
            status: status.as_str().to_string(),
            error_message,
        };

        if let Err(error) = logs::create(conn, new_log) {
            log::error!("Failed to write a forwarding log row: {error}");
        }
    }
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new()
    }
}

fn gate_reason(status: LogStatus) -> &'static str {
    match status {
        LogStatus::DayFilter => "day filter blocked the message",
        LogStatus::WorkingHours => "outside working hours",
        LogStatus::SendingLimit => "sending limit reached",
        _ => "blocked by the scheduling gate",
    }
}

/// The orchestrator: owns the monitors, the update router and the background
/// maintenance loop.
#[derive(Clone)]
pub struct ForwardingEngine {
    core: Arc<EngineCore>,
    monitors: Arc<tokio::sync::Mutex<HashMap<i64, ChannelMonitor>>>,
    running: Arc<AtomicBool>,
}

impl ForwardingEngine {
    pub fn new() -> Self {
        Self {
            core: Arc::new(EngineCore::new()),
            monitors: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn core(&self) -> Arc<EngineCore> {
        self.core.clone()
    }

    pub async fn initialize(&self) -> Result<(), String> {
        let count = self.core.load_active_tasks()?;
        log::info!("Loaded {count} active tasks");

        Ok(())
    }

    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            log::warn!("The forwarding engine is already running");
            return;
        }

        self.core.stats.mark_started();

        for task in self.core.cached_tasks() {
            self.start_monitor(&task).await;
        }

        let engine = self.clone();
        tokio::spawn(async move {
            engine.run_update_loop(engine.core.bot_api().clone()).await;
        });

        if let Some(userbot_api) = self.core.userbot_api() {
            let engine = self.clone();
            tokio::spawn(async move {
                engine.run_update_loop(userbot_api).await;
            });
        }

        let engine = self.clone();
        tokio::spawn(async move {
            engine.run_background_loop().await;
        });

        log::info!("Forwarding engine started");
    }

    /// Stops intake immediately; messages already admitted to monitor queues
    /// drain before their consumers exit.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        let mut monitors = self.monitors.lock().await;

        for (_, monitor) in monitors.iter_mut() {
            monitor.stop().await;
        }

        monitors.clear();

        log::info!("Forwarding engine stopped");
    }

    pub async fn add_task(&self, task_id: i64) {
        if let Err(error) = self.core.load_active_tasks() {
            log::error!("Failed to reload tasks: {error}");
            return;
        }

        if let Some(task) = self.core.cached_task(task_id) {
            self.restart_monitor(&task).await;
            log::info!("Added task {task_id} to monitoring");
        }
    }

    pub async fn remove_task(&self, task_id: i64) {
        let mut monitors = self.monitors.lock().await;

        if let Some(mut monitor) = monitors.remove(&task_id) {
            monitor.stop().await;
        }

        drop(monitors);

        self.core.forget_task(task_id);
        log::info!("Removed task {task_id} from monitoring");
    }

    /// The watched chat set of a running monitor updates in place; no
    /// monitor restart is needed for source changes.
    pub async fn add_source(&self, task_id: i64, chat_id: i64) {
        let monitors = self.monitors.lock().await;

        if let Some(monitor) = monitors.get(&task_id) {
            monitor.add_source(chat_id);
            log::info!("Added source {chat_id} to the monitor of task {task_id}");
        }
    }

    pub async fn remove_source(&self, task_id: i64, chat_id: i64) {
        let monitors = self.monitors.lock().await;

        if let Some(monitor) = monitors.get(&task_id) {
            monitor.remove_source(chat_id);
            log::info!("Removed source {chat_id} from the monitor of task {task_id}");
        }
    }

    pub async fn toggle_task(&self, task_id: i64, active: bool) {
        if active {
            self.add_task(task_id).await;
        } else {
            self.remove_task(task_id).await;
        }
    }

    pub async fn handle_approval_decision(
        &self,
        approval_id: i64,
        approver_id: i64,
        decision: Decision,
    ) -> Result<Decision, ApprovalError> {
        self.core
            .handle_approval_decision(approval_id, approver_id, decision)
            .await
    }

    /// Probes every source chat of a task through its delivery backend,
    /// reporting the chat title or the failure per source.
    pub async fn test_connectivity(&self, task_id: i64) -> HashMap<i64, Result<Option<String>, String>> {
        let mut results = HashMap::new();

        let Some(task) = self.core.cached_task(task_id) else {
            return results;
        };

        let source_chat_ids = {
            let monitors = self.monitors.lock().await;

            match monitors.get(&task_id) {
                Some(monitor) => monitor.source_chat_ids(),
                None => return results,
            }
        };

        let gateway = self.core.dispatcher.preferred_gateway(&task).await;

        for chat_id in source_chat_ids {
            let outcome = gateway
                .chat_title(chat_id)
                .await
                .map_err(|error| error.description());

            results.insert(chat_id, outcome);
        }

        results
    }

    pub async fn get_stats(&self) -> StatsReport {
        let active_monitors = self.monitors.lock().await.len();

        self.core.stats.report(
            self.running.load(Ordering::SeqCst),
            active_monitors,
            self.core.dedup.tracker_size(),
        )
    }

    async fn start_monitor(&self, task: &Task) {
        match ChannelMonitor::start(self.core.clone(), task).await {
            Ok(monitor) => {
                self.monitors.lock().await.insert(task.id, monitor);
            }
            Err(error) => {
                log::error!("Failed to start monitoring task {}: {error:?}", task.id);
            }
        }
    }

    async fn restart_monitor(&self, task: &Task) {
        {
            let mut monitors = self.monitors.lock().await;

            if let Some(mut monitor) = monitors.remove(&task.id) {
                monitor.stop().await;
            }
        }

        self.start_monitor(task).await;
    }

    async fn run_update_loop(&self, api: Api) {
        let mut fetcher = UpdateFetcher::new(api);

        while self.running.load(Ordering::SeqCst) {
            match fetcher.next_update().await {
                Some(update) => self.route_update(update.content).await,
                None => tokio::time::sleep(Duration::from_secs(IDLE_POLL_SECONDS)).await,
            }
        }
    }

    async fn route_update(&self, content: UpdateContent) {
        match content {
            UpdateContent::ChannelPost(message) | UpdateContent::Message(message) => {
                self.route_post(message, false).await;
            }

            UpdateContent::EditedChannelPost(message) | UpdateContent::EditedMessage(message) => {
                self.route_post(message, true).await;
            }

            UpdateContent::CallbackQuery(query) => {
                let Some(data) = query.data.as_deref() else {
                    return;
                };

                let Some((decision, approval_id)) = approval::parse_callback(data) else {
                    return;
                };

                let outcome = self
                    .core
                    .handle_approval_decision(approval_id, query.from.id as i64, decision)
                    .await;

                let notice = match &outcome {
                    Ok(Decision::Approve) => "✅ تمت الموافقة والنشر",
                    Ok(Decision::Reject) => "❌ تم رفض الرسالة",
                    Err(ApprovalError::AlreadyDecided) => "تم البت في هذا الطلب مسبقا",
                    Err(_) => "تعذر تنفيذ القرار",
                };

                if let Err(error) = outcome {
                    log::warn!("Approval callback failed: {error:?}");
                }

                let mut params = AnswerCallbackQueryParams::builder()
                    .callback_query_id(query.id.clone())
                    .build();
                params.text = Some(notice.to_string());

                if let Err(error) = self.core.bot_api().answer_callback_query(&params).await {
                    log::error!("Failed to answer the approval callback: {error:?}");
                }
            }

            _ => (),
        }
    }

    /// Every task is independent: a chat feeding several tasks fans the
    /// message out to each of their monitors.
    async fn route_post(&self, message: Message, edited: bool) {
        let chat_id = message.chat.id;
        let incoming = IncomingMessage::Live(Box::new(message));

        let monitors = self.monitors.lock().await;

        for monitor in monitors.values() {
            if !monitor.watches(chat_id) {
                continue;
            }

            let event = if edited {
                MonitorEvent::EditedPost(incoming.clone())
            } else {
                MonitorEvent::NewPost(incoming.clone())
            };

            if !monitor.offer(event).await {
                log::warn!(
                    "Monitor for task {} dropped an update from chat {chat_id}",
                    monitor.task_id
                );
            }
        }
    }

    async fn run_background_loop(&self) {
        let mut interval = tokio::time::interval(Duration::from_secs(BACKGROUND_TICK_SECONDS));
        let cache_ttl = Duration::from_secs(Config::task_cache_ttl_seconds());
        let mut last_refresh = Instant::now();

        while self.running.load(Ordering::SeqCst) {
            interval.tick().await;

            if last_refresh.elapsed() >= cache_ttl {
                match self.core.load_active_tasks() {
                    Ok(count) => {
                        last_refresh = Instant::now();
                        self.reconcile_monitors().await;
                        log::info!("Reloaded tasks: {count} active");
                    }
                    Err(error) => log::error!("Task cache refresh failed: {error}"),
                }
            }

            self.check_userbot_health().await;

            self.core.dedup.evict();
            self.core.stats.trim();
        }
    }

    /// Backend connection loss for userbot tasks is handled here, not in the
    /// monitors: every affected task runs the same auto-downgrade path and
    /// its monitor restarts on the bot backend.
    async fn check_userbot_health(&self) {
        let userbot_tasks: Vec<Task> = self
            .core
            .cached_tasks()
            .into_iter()
            .filter(Task::uses_userbot)
            .collect();

        if userbot_tasks.is_empty() {
            return;
        }

        if self.core.userbot_connected().await {
            return;
        }

        log::warn!(
            "Userbot session lost, downgrading {} tasks to the bot backend",
            userbot_tasks.len()
        );

        let mut conn = match self.core.connection() {
            Ok(conn) => conn,
            Err(error) => {
                log::error!("No storage connection for the userbot downgrade: {error}");
                return;
            }
        };

        for task in userbot_tasks {
            self.core.persist_downgrade(&mut conn, task.id);

            if let Some(downgraded) = self.core.cached_task(task.id) {
                self.restart_monitor(&downgraded).await;
            }
        }
    }

    /// Aligns running monitors with the refreshed task cache: stops monitors
    /// for vanished tasks, starts monitors for new ones.
    async fn reconcile_monitors(&self) {
        let cached: HashMap<i64, Task> = self
            .core
            .cached_tasks()
            .into_iter()
            .map(|task| (task.id, task))
            .collect();

        let mut stale = Vec::new();

        {
            let monitors = self.monitors.lock().await;

            for task_id in monitors.keys() {
                if !cached.contains_key(task_id) {
                    stale.push(*task_id);
                }
            }
        }

        for task_id in stale {
            let mut monitors = self.monitors.lock().await;

            if let Some(mut monitor) = monitors.remove(&task_id) {
                monitor.stop().await;
            }
        }

        for (task_id, task) in &cached {
            let known = self.monitors.lock().await.contains_key(task_id);

            if !known {
                self.start_monitor(task).await;
            }
        }
    }
}

impl Default for ForwardingEngine {
    fn default() -> Self {
        Self::new()
    }
}
