//! Generic optimistic sync controller.
//!
//! Each controller runs as one task that owns the entity list. Snapshots,
//! session changes, caller commands and write completions are all delivered to
//! that task over channels, so local state is only ever mutated in one place.
//! Observers read it through a `watch` channel.
//!
//! Flag toggles are optimistic: the flipped value is published before the
//! remote write is issued and reverted if the write fails. While a toggle is
//! unacknowledged its requested value is overlaid on incoming snapshots, so a
//! snapshot computed before the write landed cannot flip it back. Adds and
//! removes are not optimistic; they show up with the next snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use super::{OwnerScope, RemoteWrite, ScopeSource, SyncError, SyncTarget};
use crate::codec::{decode_batch, SyncEntity};
use crate::session::{AuthUser, SessionSource};
use crate::state::SyncState;
use crate::store::{RemoteStore, Snapshot, SnapshotStream, StoreResult};
use crate::util::compact_text;

/// What observers of a controller see.
#[derive(Debug, Clone)]
pub struct SyncView<T> {
    pub state: SyncState,
    /// Scope of the live (or pending) subscription
    pub scope: Option<OwnerScope>,
    pub entities: Vec<T>,
    /// Last failure, kept until dismissed or replaced
    pub last_error: Option<String>,
}

impl<T> Default for SyncView<T> {
    fn default() -> Self {
        Self {
            state: SyncState::Idle,
            scope: None,
            entities: Vec::new(),
            last_error: None,
        }
    }
}

impl<T: SyncEntity> SyncView<T> {
    /// Entity by id.
    pub fn get(&self, id: &str) -> Option<&T> {
        self.entities.iter().find(|entity| entity.id() == id)
    }
}

type Reply = oneshot::Sender<Result<(), SyncError>>;

enum Command<T> {
    Start(OwnerScope),
    Stop(oneshot::Sender<()>),
    ToggleFlag {
        id: String,
        flag: String,
        reply: Reply,
    },
    Add {
        entity: T,
        reply: Reply,
    },
    Remove {
        id: String,
        reply: Reply,
    },
    ClearError,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PendingKey {
    id: String,
    flag: String,
}

#[derive(Debug, Clone, Copy)]
struct PendingFlag {
    previous: bool,
    requested: bool,
}

struct Completion {
    key: Option<PendingKey>,
    generation: u64,
    result: StoreResult<()>,
    reply: Reply,
}

/// Handle to a running sync controller.
///
/// Cloning shares the controller. When the last handle is dropped the task
/// ends and its subscription is released.
pub struct RemoteSyncController<T: SyncEntity> {
    commands: mpsc::UnboundedSender<Command<T>>,
    view: watch::Receiver<SyncView<T>>,
}

impl<T: SyncEntity> Clone for RemoteSyncController<T> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            view: self.view.clone(),
        }
    }
}

impl<T: SyncEntity> RemoteSyncController<T> {
    /// Spawn the controller task on the current tokio runtime.
    ///
    /// Session-scoped targets subscribe as soon as a user is signed in;
    /// explicitly scoped ones wait for [`start`](Self::start).
    pub fn spawn<G>(target: G, store: Arc<dyn RemoteStore>, session: &dyn SessionSource) -> Self
    where
        G: SyncTarget<Entity = T>,
    {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(SyncView::default());

        let actor = SyncActor {
            active: target.scope_source() == ScopeSource::Session,
            target,
            store,
            session: session.watch_session(),
            session_open: true,
            view: view_tx,
            completions_tx,
            completions_rx,
            session_user: None,
            explicit_scope: None,
            scope: None,
            entities_scope: None,
            subscription: None,
            generation: 0,
            pending: HashMap::new(),
        };
        tokio::spawn(actor.run(commands_rx));

        Self {
            commands: commands_tx,
            view: view_rx,
        }
    }

    /// Subscribe to the collection for `scope`, replacing any live subscription.
    pub fn start(&self, scope: impl Into<OwnerScope>) {
        let _ = self.commands.send(Command::Start(scope.into()));
    }

    /// Tear down the subscription. Safe to call repeatedly.
    ///
    /// Returns once no further snapshot can reach the controller.
    pub async fn stop(&self) {
        let (reply, done) = oneshot::channel();
        if self.commands.send(Command::Stop(reply)).is_ok() {
            let _ = done.await;
        }
    }

    /// Optimistically flip a boolean flag of entity `id`.
    ///
    /// A missing entity is a no-op. Resolves when the remote write finishes.
    pub async fn toggle_flag(&self, id: &str, flag: &str) -> Result<(), SyncError> {
        self.request(|reply| Command::ToggleFlag {
            id: id.to_string(),
            flag: flag.to_string(),
            reply,
        })
        .await
    }

    /// Write a new entity. It becomes visible with the next snapshot.
    pub async fn add(&self, entity: T) -> Result<(), SyncError> {
        self.request(|reply| Command::Add { entity, reply }).await
    }

    /// Delete entity `id`. It disappears with the next snapshot.
    pub async fn remove(&self, id: &str) -> Result<(), SyncError> {
        self.request(|reply| Command::Remove {
            id: id.to_string(),
            reply,
        })
        .await
    }

    /// Dismiss the last error.
    pub fn clear_error(&self) {
        let _ = self.commands.send(Command::ClearError);
    }

    /// Current view.
    pub fn view(&self) -> SyncView<T> {
        self.view.borrow().clone()
    }

    pub fn entities(&self) -> Vec<T> {
        self.view.borrow().entities.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.view.borrow().last_error.clone()
    }

    /// Receiver notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<SyncView<T>> {
        self.view.clone()
    }

    /// Wait until the controller has applied a snapshot.
    pub async fn wait_until_live(&self) -> Result<SyncView<T>, SyncError> {
        let mut view = self.view.clone();
        let live = view
            .wait_for(|view| view.state == SyncState::Live)
            .await
            .map_err(|_| SyncError::Closed)?;
        Ok(live.clone())
    }

    async fn request(
        &self,
        command: impl FnOnce(Reply) -> Command<T>,
    ) -> Result<(), SyncError> {
        let (reply, result) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| SyncError::Closed)?;
        result.await.map_err(|_| SyncError::Closed)?
    }
}

struct SyncActor<G: SyncTarget> {
    target: G,
    store: Arc<dyn RemoteStore>,
    session: watch::Receiver<Option<AuthUser>>,
    session_open: bool,
    view: watch::Sender<SyncView<G::Entity>>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    /// Whether the controller should be subscribed when a scope is available
    active: bool,
    /// User the published state was built for
    session_user: Option<String>,
    explicit_scope: Option<OwnerScope>,
    /// Scope of the current subscription
    scope: Option<OwnerScope>,
    /// Scope the published entities belong to
    entities_scope: Option<OwnerScope>,
    subscription: Option<SnapshotStream>,
    /// Bumped on every teardown; completions from older generations leave
    /// local state alone
    generation: u64,
    pending: HashMap<PendingKey, PendingFlag>,
}

impl<G: SyncTarget> SyncActor<G> {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command<G::Entity>>) {
        self.reconcile_scope().await;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(completion) = self.completions_rx.recv() => self.finish_write(completion),
                changed = self.session.changed(), if self.session_open => {
                    if changed.is_err() {
                        self.session_open = false;
                    }
                    self.reconcile_scope().await;
                }
                snapshot = next_snapshot(&mut self.subscription) => match snapshot {
                    Some(snapshot) => self.apply_snapshot(snapshot),
                    None => {
                        tracing::warn!(target_name = self.target.name(), "Subscription closed by store");
                        self.teardown(false);
                    }
                },
            }
        }

        tracing::debug!(target_name = self.target.name(), "Sync controller stopped");
    }

    async fn handle_command(&mut self, command: Command<G::Entity>) {
        match command {
            Command::Start(scope) => {
                if self.target.scope_source() == ScopeSource::Session
                    && self.session_user_id().as_deref() != Some(scope.as_str())
                {
                    tracing::warn!(
                        target_name = self.target.name(),
                        scope = %scope,
                        "Ignoring scope outside the session"
                    );
                }
                self.active = true;
                self.explicit_scope = Some(scope);
                self.teardown(self.session_user_id().is_none());
                self.reconcile_scope().await;
            }
            Command::Stop(reply) => {
                self.active = false;
                self.explicit_scope = None;
                self.teardown(self.session_user_id().is_none());
                let _ = reply.send(());
            }
            Command::ToggleFlag { id, flag, reply } => self.toggle_flag(id, flag, reply),
            Command::Add { entity, reply } => {
                let write = self
                    .write_scope()
                    .map(|scope| self.target.insert_write(&scope, &entity));
                self.dispatch_or_reject(write, reply);
            }
            Command::Remove { id, reply } => {
                let write = self.write_scope().map(|scope| RemoteWrite::Delete {
                    path: self.target.document_path(&scope, &id),
                });
                self.dispatch_or_reject(write, reply);
            }
            Command::ClearError => {
                self.view.send_if_modified(|view| view.last_error.take().is_some());
            }
        }
    }

    fn session_user_id(&self) -> Option<String> {
        self.session.borrow().as_ref().map(|user| user.id.clone())
    }

    fn desired_scope(&self) -> Option<OwnerScope> {
        if !self.active {
            return None;
        }
        let user_id = self.session_user_id()?;
        match self.target.scope_source() {
            ScopeSource::Session => Some(OwnerScope::new(user_id)),
            ScopeSource::Explicit => self.explicit_scope.clone(),
        }
    }

    /// Bring the subscription in line with the session and requested scope.
    ///
    /// Entities never outlive the session user they were read for, whether
    /// or not a subscription is live.
    async fn reconcile_scope(&mut self) {
        let user_id = self.session_user_id();
        if user_id != self.session_user {
            self.session_user = user_id;
            self.teardown(true);
        }

        let desired = self.desired_scope();
        if desired == self.scope {
            return;
        }

        self.teardown(false);
        if let Some(scope) = desired {
            self.subscribe(scope).await;
        }
    }

    async fn subscribe(&mut self, scope: OwnerScope) {
        let query = self.target.query(&scope);
        let stale = self.entities_scope.as_ref() != Some(&scope);
        self.view.send_modify(|view| {
            view.state = SyncState::Subscribing;
            view.scope = Some(scope.clone());
            if stale {
                view.entities.clear();
            }
        });

        match self.store.subscribe_collection(query).await {
            Ok(stream) => {
                tracing::debug!(target_name = self.target.name(), scope = %scope, "Subscribed");
                self.subscription = Some(stream);
                self.scope = Some(scope);
            }
            Err(error) => {
                tracing::warn!(
                    target_name = self.target.name(),
                    scope = %scope,
                    "Subscription failed: {}",
                    error
                );
                self.view.send_modify(|view| {
                    view.state = SyncState::Idle;
                    view.scope = None;
                    view.last_error = Some(compact_text(&error.to_string()));
                });
            }
        }
    }

    /// Drop the subscription and pending overlays. `clear` also empties the
    /// published entities.
    fn teardown(&mut self, clear: bool) {
        if let Some(scope) = self.scope.take() {
            tracing::debug!(target_name = self.target.name(), scope = %scope, "Unsubscribed");
        }
        self.subscription = None;
        self.generation += 1;
        self.pending.clear();
        if clear {
            self.entities_scope = None;
        }

        self.view.send_if_modified(|view| {
            let changed = view.state != SyncState::Idle
                || view.scope.is_some()
                || (clear && !view.entities.is_empty());
            view.state = SyncState::Idle;
            view.scope = None;
            if clear {
                view.entities.clear();
            }
            changed
        });
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        let Some(scope) = self.scope.clone() else {
            return;
        };

        let documents = match snapshot {
            Ok(documents) => documents,
            Err(error) => {
                tracing::warn!(
                    target_name = self.target.name(),
                    scope = %scope,
                    "Snapshot error: {}",
                    error
                );
                self.set_error(&error.to_string());
                return;
            }
        };

        let mut entities: Vec<G::Entity> = decode_batch(&documents);
        entities.retain(|entity| {
            let accepted = self.target.accepts(&scope, entity);
            if !accepted {
                tracing::warn!(
                    target_name = self.target.name(),
                    scope = %scope,
                    document = entity.id(),
                    "Dropping snapshot entry outside scope"
                );
            }
            accepted
        });

        for (key, pending) in &self.pending {
            if let Some(entity) = entities.iter_mut().find(|entity| entity.id() == key.id) {
                entity.set_flag(&key.flag, pending.requested);
            }
        }

        tracing::debug!(
            target_name = self.target.name(),
            scope = %scope,
            count = entities.len(),
            "Snapshot applied"
        );
        self.entities_scope = Some(scope);
        self.view.send_modify(|view| {
            view.entities = entities;
            view.state = SyncState::Live;
        });
    }

    fn toggle_flag(&mut self, id: String, flag: String, reply: Reply) {
        if self.session_user_id().is_none() {
            self.reject(SyncError::SessionRequired, reply);
            return;
        }
        let Some(scope) = self.scope.clone() else {
            tracing::debug!(target_name = self.target.name(), "Toggle ignored, not subscribed");
            let _ = reply.send(Ok(()));
            return;
        };

        let key = PendingKey { id, flag };
        if self.pending.contains_key(&key) {
            let _ = reply.send(Err(SyncError::MutationInFlight(key.id)));
            return;
        }

        let mut flipped = None;
        self.view.send_if_modified(|view| {
            let Some(entity) = view
                .entities
                .iter_mut()
                .find(|entity| entity.id() == key.id)
            else {
                return false;
            };
            let Some(previous) = entity.flag(&key.flag) else {
                return false;
            };
            entity.set_flag(&key.flag, !previous);
            flipped = Some((previous, entity.clone()));
            true
        });

        let Some((previous, entity)) = flipped else {
            tracing::debug!(
                target_name = self.target.name(),
                document = %key.id,
                flag = %key.flag,
                "Toggle ignored, entity or flag not found"
            );
            let _ = reply.send(Ok(()));
            return;
        };

        let requested = !previous;
        let write = self
            .target
            .flag_write(&scope, &entity, &key.flag, requested);
        self.pending.insert(
            key.clone(),
            PendingFlag {
                previous,
                requested,
            },
        );
        self.dispatch(write, Some(key), reply);
    }

    /// Scope for add/remove, or the reason there is none.
    fn write_scope(&self) -> Result<OwnerScope, SyncError> {
        if self.session_user_id().is_none() {
            return Err(SyncError::SessionRequired);
        }
        self.scope.clone().ok_or(SyncError::Inactive)
    }

    fn dispatch_or_reject(&self, write: Result<RemoteWrite, SyncError>, reply: Reply) {
        match write {
            Ok(write) => self.dispatch(write, None, reply),
            Err(error) => self.reject(error, reply),
        }
    }

    fn reject(&self, error: SyncError, reply: Reply) {
        self.set_error(&error.to_string());
        let _ = reply.send(Err(error));
    }

    /// Run the write off the controller task and post the result back.
    fn dispatch(&self, write: RemoteWrite, key: Option<PendingKey>, reply: Reply) {
        let store = Arc::clone(&self.store);
        let completions = self.completions_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = write.apply(store.as_ref()).await;
            let _ = completions.send(Completion {
                key,
                generation,
                result,
                reply,
            });
        });
    }

    fn finish_write(&mut self, completion: Completion) {
        let current = completion.generation == self.generation;
        let pending = match &completion.key {
            Some(key) if current => self.pending.remove(key).map(|pending| (key, pending)),
            _ => None,
        };

        let outcome = match completion.result {
            Ok(()) => Ok(()),
            Err(error) => {
                let error = SyncError::from(error);
                tracing::warn!(target_name = self.target.name(), "{}", error);
                if let Some((key, pending)) = pending {
                    self.view.send_modify(|view| {
                        if let Some(entity) = view
                            .entities
                            .iter_mut()
                            .find(|entity| entity.id() == key.id)
                        {
                            entity.set_flag(&key.flag, pending.previous);
                        }
                    });
                }
                self.set_error(&error.to_string());
                Err(error)
            }
        };
        let _ = completion.reply.send(outcome);
    }

    fn set_error(&self, message: &str) {
        let message = compact_text(message);
        self.view.send_modify(|view| view.last_error = Some(message));
    }
}

async fn next_snapshot(subscription: &mut Option<SnapshotStream>) -> Option<Snapshot> {
    match subscription {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}
