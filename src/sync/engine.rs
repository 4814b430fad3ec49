//! The sync engine: reconciles optimistic local edits with the remote
//! blob store under polling-based replication.
//!
//! The engine runs as one task. Timer callbacks and network completions
//! interleave through a single `select!` loop, so state transitions are
//! strictly ordered. Writes are debounced and retried with backoff; reads
//! poll on a fixed period and are suppressed whenever they could clobber
//! a local write that has not reached the store yet.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant};
use tracing::{debug, error, warn};

use super::status::SyncStatus;
use crate::config::SyncConfig;
use crate::mirror::LocalMirror;
use crate::models::{Document, Edit};
use crate::remote::{PushError, RemoteStore};

/// Tuning knobs for the engine.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Period between remote read polls.
    pub poll_interval: Duration,
    /// Quiet period rapid edits are coalesced for before a write.
    pub debounce: Duration,
    /// Automatic attempts per pending document before giving up.
    pub max_retries: u32,
    /// Backoff unit; attempt N waits N times this before retrying.
    pub retry_backoff: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            debounce: Duration::from_millis(1500),
            max_retries: 3,
            retry_backoff: Duration::from_secs(2),
        }
    }
}

impl SyncOptions {
    /// Defaults, with any tuning the config carries applied on top.
    pub fn from_config(config: &SyncConfig) -> Self {
        let mut options = Self::default();
        if let Some(secs) = config.poll_interval_secs {
            options.poll_interval = Duration::from_secs(secs);
        }
        if let Some(ms) = config.debounce_ms {
            options.debounce = Duration::from_millis(ms);
        }
        options
    }
}

/// Intents the display layer sends to the engine.
#[derive(Debug)]
pub enum Command {
    /// Apply an edit to the draft schema on behalf of `user`.
    Edit { user: String, edit: Edit },
    /// Deep-copy the draft over the published snapshot and flush now.
    Promote { user: String },
    /// Manual retry after automatic write retries were exhausted.
    RetryNow,
    /// While held, read polls are suppressed (user mid-edit of free text).
    EditingHold(bool),
    /// Stop the engine loop.
    Shutdown,
}

/// Write-path state machine.
///
/// One write in flight at a time. `SaveQueued` means a newer document
/// arrived while one was in flight; the engine always flushes its current
/// document, so everything older is superseded, never sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveState {
    Idle,
    Saving,
    SaveQueued,
}

/// Clonable handle the display layer holds: emits intents, reads
/// snapshots. It never touches the live document.
#[derive(Clone)]
pub struct SyncHandle {
    commands: mpsc::UnboundedSender<Command>,
    document: watch::Receiver<Document>,
    status: watch::Receiver<SyncStatus>,
}

impl SyncHandle {
    pub fn edit(&self, user: impl Into<String>, edit: Edit) {
        let _ = self.commands.send(Command::Edit {
            user: user.into(),
            edit,
        });
    }

    pub fn promote(&self, user: impl Into<String>) {
        let _ = self.commands.send(Command::Promote { user: user.into() });
    }

    pub fn retry_now(&self) {
        let _ = self.commands.send(Command::RetryNow);
    }

    pub fn set_editing_hold(&self, held: bool) {
        let _ = self.commands.send(Command::EditingHold(held));
    }

    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    /// Latest document snapshot.
    pub fn document(&self) -> Document {
        self.document.borrow().clone()
    }

    /// Latest sync status.
    pub fn status(&self) -> SyncStatus {
        *self.status.borrow()
    }

    /// Watch channel for document snapshots, for reactive consumers.
    pub fn document_watch(&self) -> watch::Receiver<Document> {
        self.document.clone()
    }

    /// Watch channel for status changes.
    pub fn status_watch(&self) -> watch::Receiver<SyncStatus> {
        self.status.clone()
    }
}

pub struct SyncEngine<R: RemoteStore + 'static> {
    core: EngineCore<R>,
    commands: mpsc::UnboundedReceiver<Command>,
    save_results: mpsc::UnboundedReceiver<Result<(), PushError>>,
}

impl<R: RemoteStore + 'static> SyncEngine<R> {
    /// Builds an engine seeded from the local mirror (or the default seed
    /// document), so a populated board is available before any network
    /// activity completes.
    pub fn new(remote: R, mirror: LocalMirror, options: SyncOptions) -> (Self, SyncHandle) {
        let document = match mirror.load() {
            Ok(Some(doc)) => doc,
            Ok(None) => Document::seed(),
            Err(e) => {
                warn!("ignoring unreadable local mirror: {e}");
                Document::seed()
            }
        };

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (save_results_tx, save_results_rx) = mpsc::unbounded_channel();
        let (document_tx, document_rx) = watch::channel(document.clone());
        let (status_tx, status_rx) = watch::channel(SyncStatus::Loading);

        let handle = SyncHandle {
            commands: commands_tx,
            document: document_rx,
            status: status_rx,
        };
        let engine = Self {
            core: EngineCore {
                remote: Arc::new(remote),
                mirror,
                options,
                document,
                status: SyncStatus::Loading,
                save_state: SaveState::Idle,
                retries: 0,
                flush_at: None,
                editing_hold: false,
                save_results_tx,
                document_tx,
                status_tx,
            },
            commands: commands_rx,
            save_results: save_results_rx,
        };
        (engine, handle)
    }

    /// Spawns the engine loop onto the current runtime.
    pub fn spawn(remote: R, mirror: LocalMirror, options: SyncOptions) -> SyncHandle {
        let (engine, handle) = Self::new(remote, mirror, options);
        tokio::spawn(engine.run());
        handle
    }

    /// Runs the engine until shutdown (or until every handle is dropped).
    pub async fn run(self) {
        let SyncEngine {
            mut core,
            mut commands,
            mut save_results,
        } = self;

        // First tick fires immediately: the startup poll.
        let mut poll = time::interval(core.options.poll_interval);
        poll.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            let flush_at = core.flush_at;
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    None | Some(Command::Shutdown) => break,
                    Some(cmd) => core.handle_command(cmd),
                },
                Some(result) = save_results.recv() => core.on_save_complete(result),
                _ = deadline(flush_at) => {
                    core.flush_at = None;
                    core.flush();
                }
                _ = poll.tick() => core.poll_remote().await,
            }
        }
        debug!("sync engine stopped");
    }
}

async fn deadline(at: Option<Instant>) {
    match at {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

struct EngineCore<R: RemoteStore + 'static> {
    remote: Arc<R>,
    mirror: LocalMirror,
    options: SyncOptions,
    document: Document,
    status: SyncStatus,
    save_state: SaveState,
    retries: u32,
    /// When set, a flush (debounced write or backoff retry) is due.
    flush_at: Option<Instant>,
    editing_hold: bool,
    save_results_tx: mpsc::UnboundedSender<Result<(), PushError>>,
    document_tx: watch::Sender<Document>,
    status_tx: watch::Sender<SyncStatus>,
}

impl<R: RemoteStore + 'static> EngineCore<R> {
    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Edit { user, edit } => self.apply_edit(&user, edit),
            Command::Promote { user } => self.promote(&user),
            Command::RetryNow => self.retry_now(),
            Command::EditingHold(held) => self.editing_hold = held,
            // Handled by the run loop before we get here.
            Command::Shutdown => {}
        }
    }

    /// Applies a local mutation: draft changes, the audit log grows, the
    /// mirror is rewritten, and a debounced remote write is (re)scheduled.
    fn apply_edit(&mut self, user: &str, edit: Edit) {
        let Some(draft) = edit.apply(&self.document.draft) else {
            debug!(?edit, "rejected edit");
            return;
        };
        let action = edit.describe(&self.document.draft);
        self.document.draft = draft;
        self.document.record(user, action);
        self.after_local_mutation();

        // A fresh pending document: automatic retries start over, and any
        // earlier debounce window restarts.
        self.retries = 0;
        self.flush_at = Some(Instant::now() + self.options.debounce);
    }

    /// Publishes the draft and pushes right away; an explicit, infrequent
    /// action has no reason to wait out a debounce window.
    fn promote(&mut self, user: &str) {
        self.document = self.document.promote(user);
        self.after_local_mutation();
        self.retries = 0;
        self.flush_at = None;
        self.flush();
    }

    fn retry_now(&mut self) {
        if self.status != SyncStatus::Error {
            return;
        }
        debug!("manual retry requested");
        self.retries = 0;
        self.flush_at = None;
        self.flush();
    }

    fn after_local_mutation(&mut self) {
        self.persist_mirror();
        self.publish_snapshot();
    }

    fn flush(&mut self) {
        if self.save_state != SaveState::Idle {
            // A write is already in flight; remember that one more flush
            // is owed. Only the latest document matters.
            self.save_state = SaveState::SaveQueued;
            return;
        }
        self.start_save();
    }

    fn start_save(&mut self) {
        self.save_state = SaveState::Saving;
        self.set_status(SyncStatus::Syncing);

        let document = self.document.clone();
        let remote = Arc::clone(&self.remote);
        let results = self.save_results_tx.clone();
        debug!("pushing document to remote store");
        tokio::spawn(async move {
            let _ = results.send(remote.push(&document).await);
        });
    }

    fn on_save_complete(&mut self, result: Result<(), PushError>) {
        let queued = self.save_state == SaveState::SaveQueued;
        // Cleared on every exit path, or polls and writes starve forever.
        self.save_state = SaveState::Idle;

        match result {
            Ok(()) => {
                self.retries = 0;
                self.set_status(SyncStatus::Synced);
            }
            Err(e) if queued => {
                // The failed write was superseded while in flight; the
                // newer document below gets its own attempts.
                warn!("write failed but was superseded: {e}");
                self.retries = 0;
            }
            Err(e) => {
                self.retries += 1;
                if e.is_rate_limited() {
                    debug!("remote store rate limited the write");
                }
                if self.retries >= self.options.max_retries {
                    error!("write failed {} times, giving up: {e}", self.retries);
                    self.set_status(SyncStatus::Error);
                } else {
                    let delay = self.options.retry_backoff * self.retries;
                    warn!(
                        "write failed (attempt {} of {}): {e}, retrying in {:?}",
                        self.retries, self.options.max_retries, delay
                    );
                    self.flush_at = Some(Instant::now() + delay);
                }
            }
        }

        if queued {
            // Latest pending document goes out immediately.
            self.start_save();
        }
    }

    /// One poll cycle: fetch, sanitize, adopt on change.
    ///
    /// Skipped whenever an accepted local mutation has not reached the
    /// store yet (write in flight, flush scheduled, or retries exhausted
    /// awaiting a manual trigger); a remote read adopted in any of those
    /// windows would silently discard local data. Also skipped while the
    /// user is composing free text.
    async fn poll_remote(&mut self) {
        if self.save_state != SaveState::Idle
            || self.flush_at.is_some()
            || self.editing_hold
            || self.status == SyncStatus::Error
        {
            debug!("skipping poll cycle");
            return;
        }

        match self.remote.fetch().await {
            Ok(value) => {
                let fetched = Document::sanitize(&value);
                if fetched != self.document {
                    debug!("adopting changed remote document");
                    self.document = fetched;
                    self.persist_mirror();
                    self.publish_snapshot();
                }
                self.set_status(SyncStatus::Synced);
            }
            Err(e) => {
                // Local state stays untouched; editing keeps working.
                warn!("poll failed, staying on local state: {e}");
                self.set_status(SyncStatus::Offline);
            }
        }
    }

    fn persist_mirror(&self) {
        if let Err(e) = self.mirror.save(&self.document) {
            // Local durability is best effort; the remote store is
            // authoritative.
            warn!("failed to persist local mirror: {e}");
        }
    }

    fn publish_snapshot(&self) {
        let _ = self.document_tx.send(self.document.clone());
    }

    fn set_status(&mut self, status: SyncStatus) {
        if self.status != status {
            debug!(%status, "sync status changed");
            self.status = status;
            let _ = self.status_tx.send(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SongPatch;
    use crate::remote::FetchError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory remote with scriptable responses.
    #[derive(Clone, Default)]
    struct FakeRemote {
        fetch_response: Arc<Mutex<Option<Value>>>,
        fetches: Arc<AtomicUsize>,
        pushes: Arc<Mutex<Vec<Document>>>,
        /// Number of upcoming pushes that should fail.
        push_failures: Arc<AtomicUsize>,
        fail_with_rate_limit: Arc<AtomicBool>,
    }

    impl FakeRemote {
        fn pushed(&self) -> Vec<Document> {
            self.pushes.lock().unwrap().clone()
        }

        fn set_fetch(&self, value: Option<Value>) {
            *self.fetch_response.lock().unwrap() = value;
        }
    }

    #[async_trait]
    impl RemoteStore for FakeRemote {
        async fn fetch(&self) -> Result<Value, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match self.fetch_response.lock().unwrap().clone() {
                Some(value) => Ok(value),
                None => Err(FetchError::Transport("connection refused".to_string())),
            }
        }

        async fn push(&self, document: &Document) -> Result<(), PushError> {
            self.pushes.lock().unwrap().push(document.clone());
            let failures = self.push_failures.load(Ordering::SeqCst);
            if failures > 0 {
                self.push_failures.store(failures - 1, Ordering::SeqCst);
                if self.fail_with_rate_limit.load(Ordering::SeqCst) {
                    return Err(PushError::RateLimited);
                }
                return Err(PushError::Transport("connection reset".to_string()));
            }
            Ok(())
        }
    }

    fn test_core(
        remote: FakeRemote,
    ) -> (
        EngineCore<FakeRemote>,
        mpsc::UnboundedReceiver<Result<(), PushError>>,
        TempDir,
    ) {
        let temp = TempDir::new().unwrap();
        let mirror = LocalMirror::new(temp.path().to_path_buf());
        let (save_results_tx, save_results_rx) = mpsc::unbounded_channel();
        let (document_tx, _document_rx) = watch::channel(Document::seed());
        let (status_tx, _status_rx) = watch::channel(SyncStatus::Loading);
        let core = EngineCore {
            remote: Arc::new(remote),
            mirror,
            options: SyncOptions::default(),
            document: Document::seed(),
            status: SyncStatus::Loading,
            save_state: SaveState::Idle,
            retries: 0,
            flush_at: None,
            editing_hold: false,
            save_results_tx,
            document_tx,
            status_tx,
        };
        (core, save_results_rx, temp)
    }

    fn add_ana() -> Edit {
        Edit::AddMinister {
            name: "Ana".to_string(),
        }
    }

    fn fire_flush(core: &mut EngineCore<FakeRemote>) {
        core.flush_at = None;
        core.flush();
    }

    #[tokio::test]
    async fn test_edit_persists_mirror_before_any_write() {
        let remote = FakeRemote::default();
        let (mut core, _save_rx, _temp) = test_core(remote.clone());

        core.apply_edit("ana", add_ana());

        let mirrored = core.mirror.load().unwrap().unwrap();
        assert_eq!(mirrored, core.document);
        assert!(core.flush_at.is_some());
        assert!(remote.pushed().is_empty());
        assert_eq!(core.document.logs[0].action, "added minister Ana");
        assert_eq!(core.document.logs[0].user, "ana");
    }

    #[tokio::test]
    async fn test_rejected_edit_is_a_complete_noop() {
        let remote = FakeRemote::default();
        let (mut core, _save_rx, _temp) = test_core(remote.clone());
        let before = core.document.clone();

        core.apply_edit(
            "ana",
            Edit::AddMinister {
                name: "   ".to_string(),
            },
        );

        assert_eq!(core.document, before);
        assert!(core.flush_at.is_none());
        assert!(!core.mirror.exists());
        assert!(core.document.logs.is_empty());
    }

    #[tokio::test]
    async fn test_poll_skipped_while_save_in_flight() {
        let remote = FakeRemote::default();
        remote.set_fetch(Some(json!({"draft": {"rehearsalInfo": "from remote"}})));
        let (mut core, mut save_rx, _temp) = test_core(remote.clone());

        core.apply_edit("ana", add_ana());
        fire_flush(&mut core);
        assert_eq!(core.save_state, SaveState::Saving);

        let before = core.document.clone();
        core.poll_remote().await;
        assert_eq!(core.document, before);
        assert_eq!(remote.fetches.load(Ordering::SeqCst), 0);

        let result = save_rx.recv().await.unwrap();
        core.on_save_complete(result);
        assert_eq!(core.status, SyncStatus::Synced);
        assert_eq!(core.save_state, SaveState::Idle);

        // With nothing outstanding the next poll goes through.
        core.poll_remote().await;
        assert_eq!(remote.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_poll_skipped_while_flush_scheduled_or_editing() {
        let remote = FakeRemote::default();
        remote.set_fetch(Some(json!({})));
        let (mut core, _save_rx, _temp) = test_core(remote.clone());

        core.apply_edit("ana", add_ana());
        core.poll_remote().await;
        assert_eq!(remote.fetches.load(Ordering::SeqCst), 0);

        core.flush_at = None;
        core.editing_hold = true;
        core.poll_remote().await;
        assert_eq!(remote.fetches.load(Ordering::SeqCst), 0);

        core.editing_hold = false;
        core.poll_remote().await;
        assert_eq!(remote.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_poll_adopts_changed_remote_and_mirrors_it() {
        let remote = FakeRemote::default();
        let remote_doc = json!({
            "ministers": [{"id": "m1", "name": "Visiting", "songs": []}],
            "rehearsalInfo": "Saturday"
        });
        remote.set_fetch(Some(remote_doc));
        let (mut core, _save_rx, _temp) = test_core(remote.clone());

        core.poll_remote().await;

        assert_eq!(core.status, SyncStatus::Synced);
        assert_eq!(core.document.draft.ministers[0].name, "Visiting");
        assert_eq!(core.document.published, core.document.draft);
        let mirrored = core.mirror.load().unwrap().unwrap();
        assert_eq!(mirrored, core.document);
    }

    #[tokio::test]
    async fn test_poll_failure_goes_offline_and_keeps_local_state() {
        let remote = FakeRemote::default();
        let (mut core, _save_rx, _temp) = test_core(remote.clone());
        let before = core.document.clone();

        core.poll_remote().await;

        assert_eq!(core.status, SyncStatus::Offline);
        assert_eq!(core.document, before);
    }

    #[tokio::test]
    async fn test_retry_cap_then_manual_retry() {
        let remote = FakeRemote::default();
        remote.push_failures.store(usize::MAX, Ordering::SeqCst);
        let (mut core, mut save_rx, _temp) = test_core(remote.clone());

        core.apply_edit("ana", add_ana());
        fire_flush(&mut core);

        for attempt in 1..=3u32 {
            let result = save_rx.recv().await.unwrap();
            core.on_save_complete(result);
            if attempt < 3 {
                assert_eq!(core.status, SyncStatus::Syncing);
                assert!(core.flush_at.is_some(), "backoff scheduled");
                fire_flush(&mut core);
            }
        }

        // Cap reached: error status, nothing scheduled, nothing in flight.
        assert_eq!(core.status, SyncStatus::Error);
        assert!(core.flush_at.is_none());
        assert_eq!(core.save_state, SaveState::Idle);
        assert_eq!(remote.pushed().len(), 3);

        // Polls must not clobber the unsaved document while in error.
        remote.set_fetch(Some(json!({})));
        core.poll_remote().await;
        assert_eq!(remote.fetches.load(Ordering::SeqCst), 0);

        // Manual retry with a recovered store drains the pending write.
        remote.push_failures.store(0, Ordering::SeqCst);
        core.retry_now();
        let result = save_rx.recv().await.unwrap();
        core.on_save_complete(result);
        assert_eq!(core.status, SyncStatus::Synced);
        assert_eq!(remote.pushed().len(), 4);
    }

    #[tokio::test]
    async fn test_backoff_grows_with_attempts() {
        let remote = FakeRemote::default();
        remote.push_failures.store(2, Ordering::SeqCst);
        let (mut core, mut save_rx, _temp) = test_core(remote.clone());

        core.apply_edit("ana", add_ana());
        let scheduled = Instant::now();
        fire_flush(&mut core);

        let result = save_rx.recv().await.unwrap();
        core.on_save_complete(result);
        let first = core.flush_at.unwrap() - scheduled;

        fire_flush(&mut core);
        let result = save_rx.recv().await.unwrap();
        core.on_save_complete(result);
        let second = core.flush_at.unwrap() - scheduled;

        assert!(second > first);
    }

    #[tokio::test]
    async fn test_rate_limited_write_still_retries() {
        let remote = FakeRemote::default();
        remote.push_failures.store(1, Ordering::SeqCst);
        remote.fail_with_rate_limit.store(true, Ordering::SeqCst);
        let (mut core, mut save_rx, _temp) = test_core(remote.clone());

        core.apply_edit("ana", add_ana());
        fire_flush(&mut core);
        let result = save_rx.recv().await.unwrap();
        core.on_save_complete(result);

        assert_eq!(core.status, SyncStatus::Syncing);
        assert!(core.flush_at.is_some());
    }

    #[tokio::test]
    async fn test_queued_write_supersedes_in_flight_one() {
        let remote = FakeRemote::default();
        let (mut core, mut save_rx, _temp) = test_core(remote.clone());

        core.apply_edit("ana", add_ana());
        fire_flush(&mut core);
        assert_eq!(core.save_state, SaveState::Saving);

        // A second edit lands while the first write is in flight, and its
        // debounce expires before the write completes.
        core.apply_edit(
            "ana",
            Edit::SetRehearsalInfo {
                text: "Moved to Friday".to_string(),
            },
        );
        fire_flush(&mut core);
        assert_eq!(core.save_state, SaveState::SaveQueued);

        let result = save_rx.recv().await.unwrap();
        core.on_save_complete(result);
        // The follow-up write starts immediately, no debounce.
        assert_eq!(core.save_state, SaveState::Saving);

        let result = save_rx.recv().await.unwrap();
        core.on_save_complete(result);

        let pushes = remote.pushed();
        assert_eq!(pushes.len(), 2);
        assert_eq!(pushes[1], core.document);
        assert_eq!(pushes[1].draft.rehearsal_info, "Moved to Friday");
    }

    #[tokio::test]
    async fn test_promote_flushes_immediately() {
        let remote = FakeRemote::default();
        let (mut core, mut save_rx, _temp) = test_core(remote.clone());

        core.apply_edit("ana", add_ana());
        core.flush_at = None; // clear the edit's debounce for clarity
        core.promote("ana");

        assert_eq!(core.save_state, SaveState::Saving);
        assert!(core.flush_at.is_none());

        let result = save_rx.recv().await.unwrap();
        core.on_save_complete(result);

        let pushes = remote.pushed();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].published, pushes[0].draft);
        assert_eq!(pushes[0].logs[0].action, "published the draft");

        // Draft edits after promote leave the published snapshot alone.
        core.apply_edit(
            "ana",
            Edit::SetRehearsalInfo {
                text: "changed".to_string(),
            },
        );
        assert_ne!(core.document.draft, core.document.published);
        assert_ne!(core.document.published.rehearsal_info, "changed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_coalesces_rapid_edits() {
        let remote = FakeRemote::default();
        let temp = TempDir::new().unwrap();
        let mirror = LocalMirror::new(temp.path().to_path_buf());
        let handle = SyncEngine::spawn(remote.clone(), mirror, SyncOptions::default());

        handle.edit(
            "ana",
            Edit::AddSong {
                minister_id: "minister-neto".to_string(),
                title: "Grace".to_string(),
                artist: "X".to_string(),
            },
        );
        time::sleep(Duration::from_millis(100)).await;

        let song_id = handle
            .document()
            .draft
            .minister("minister-neto")
            .unwrap()
            .songs[0]
            .id
            .clone();
        handle.edit(
            "ana",
            Edit::UpdateSong {
                minister_id: "minister-neto".to_string(),
                song_id,
                patch: SongPatch::new().with_title("Amazing Grace"),
            },
        );

        // Well past the debounce window, well short of a second one.
        time::sleep(Duration::from_secs(4)).await;

        let pushes = remote.pushed();
        assert_eq!(pushes.len(), 1, "rapid edits coalesce into one write");
        assert_eq!(
            pushes[0].draft.minister("minister-neto").unwrap().songs[0].title,
            "Amazing Grace"
        );
        assert_eq!(handle.status(), SyncStatus::Synced);

        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_minister_scenario() {
        let remote = FakeRemote::default();
        let temp = TempDir::new().unwrap();
        let mirror = LocalMirror::new(temp.path().to_path_buf());
        let handle = SyncEngine::spawn(remote.clone(), mirror, SyncOptions::default());

        handle.edit("ana", add_ana());
        time::sleep(Duration::from_millis(100)).await;

        let doc = handle.document();
        let added = doc.draft.ministers.last().unwrap();
        assert_eq!(added.name, "Ana");
        assert!(added.songs.is_empty());
        assert_eq!(doc.logs[0].action, "added minister Ana");

        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_first_startup_from_mirror() {
        let temp = TempDir::new().unwrap();
        let mirror = LocalMirror::new(temp.path().to_path_buf());

        let mut saved = Document::seed();
        saved.draft = Edit::SetRehearsalInfo {
            text: "From the mirror".to_string(),
        }
        .apply(&saved.draft)
        .unwrap();
        mirror.save(&saved).unwrap();

        let (_engine, handle) =
            SyncEngine::new(FakeRemote::default(), mirror, SyncOptions::default());

        // Before the engine even runs, the mirrored state is available.
        assert_eq!(handle.document(), saved);
        assert_eq!(handle.status(), SyncStatus::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_without_mirror_uses_seed() {
        let temp = TempDir::new().unwrap();
        let mirror = LocalMirror::new(temp.path().to_path_buf());

        let (_engine, handle) =
            SyncEngine::new(FakeRemote::default(), mirror, SyncOptions::default());

        assert_eq!(handle.document(), Document::seed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_poll_goes_offline_on_fetch_failure() {
        let remote = FakeRemote::default();
        let temp = TempDir::new().unwrap();
        let mirror = LocalMirror::new(temp.path().to_path_buf());
        let handle = SyncEngine::spawn(remote.clone(), mirror, SyncOptions::default());

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handle.status(), SyncStatus::Offline);
        assert_eq!(handle.document(), Document::seed());

        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_processing() {
        let remote = FakeRemote::default();
        let temp = TempDir::new().unwrap();
        let mirror = LocalMirror::new(temp.path().to_path_buf());
        let handle = SyncEngine::spawn(remote.clone(), mirror, SyncOptions::default());

        handle.shutdown();
        time::sleep(Duration::from_millis(100)).await;

        let before = handle.document();
        handle.edit("ana", add_ana());
        time::sleep(Duration::from_secs(5)).await;

        assert_eq!(handle.document(), before);
        assert!(remote.pushed().is_empty());
    }

    #[test]
    fn test_options_from_config() {
        let mut config = SyncConfig::default();
        let defaults = SyncOptions::from_config(&config);
        assert_eq!(defaults.poll_interval, Duration::from_secs(15));
        assert_eq!(defaults.debounce, Duration::from_millis(1500));

        config.poll_interval_secs = Some(30);
        config.debounce_ms = Some(800);
        let tuned = SyncOptions::from_config(&config);
        assert_eq!(tuned.poll_interval, Duration::from_secs(30));
        assert_eq!(tuned.debounce, Duration::from_millis(800));
        assert_eq!(tuned.max_retries, 3);
    }
}
