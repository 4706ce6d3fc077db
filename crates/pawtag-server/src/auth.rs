//! Sign-in state.
//!
//! Sessions are opaque bearer tokens persisted in the store. The server
//! answers "who is this?" from an in-memory [`SessionState`] that exactly one
//! task writes to: the listener spawned by [`Auth::start`], which consumes
//! the [`AuthEvent`] broadcast. Operations that change sessions publish an
//! event and wait until the listener has applied it, so a token is usable
//! as soon as the call that issued it returns.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use axum::http::HeaderMap;
use chrono::Utc;
use rand::RngCore;
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use pawtag_shared::profile::normalize_email;
use pawtag_shared::{UserId, UserProfile};
use pawtag_store::{Database, Session, StoreError};

use crate::error::ServerError;

const EVENT_CAPACITY: usize = 256;
const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

/// Something happened to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn { token: String, user_id: UserId },
    SignedOut { token: String },
}

/// In-memory view of live sessions.
#[derive(Clone)]
pub struct SessionState {
    tokens: Arc<RwLock<HashMap<String, UserId>>>,
    /// Number of events the listener has applied so far.
    applied: Arc<watch::Sender<u64>>,
}

impl SessionState {
    fn new() -> Self {
        let (applied, _) = watch::channel(0);
        Self {
            tokens: Arc::new(RwLock::new(HashMap::new())),
            applied: Arc::new(applied),
        }
    }

    pub async fn lookup(&self, token: &str) -> Option<UserId> {
        self.tokens.read().await.get(token).copied()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    async fn apply(&self, event: &AuthEvent) {
        let mut tokens = self.tokens.write().await;
        match event {
            AuthEvent::SignedIn { token, user_id } => {
                tokens.insert(token.clone(), *user_id);
            }
            AuthEvent::SignedOut { token } => {
                tokens.remove(token);
            }
        }
    }

    async fn replace(&self, sessions: Vec<Session>) {
        let mut tokens = self.tokens.write().await;
        *tokens = sessions
            .into_iter()
            .map(|s| (s.token, s.user_id))
            .collect();
    }

    fn mark_applied(&self, count: u64) {
        self.applied.send_modify(|n| *n += count);
    }
}

/// Auth collaborator shared by every handler.
#[derive(Clone)]
pub struct Auth {
    db: Arc<Mutex<Database>>,
    sessions: SessionState,
    events: broadcast::Sender<AuthEvent>,
    /// Events published so far. Locked across `send` so sequence numbers
    /// follow channel order.
    published: Arc<StdMutex<u64>>,
}

impl Auth {
    /// Create the collaborator and spawn its session listener.
    pub fn start(db: Arc<Mutex<Database>>) -> (Self, JoinHandle<()>) {
        let (events, rx) = broadcast::channel(EVENT_CAPACITY);
        let auth = Self {
            db,
            sessions: SessionState::new(),
            events,
            published: Arc::new(StdMutex::new(0)),
        };
        let listener = tokio::spawn(run_listener(auth.db.clone(), auth.sessions.clone(), rx));
        (auth, listener)
    }

    /// Stream of session changes.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub fn sessions(&self) -> &SessionState {
        &self.sessions
    }

    /// Profile behind `token`, if it names a live session.
    pub async fn current_identity(&self, token: &str) -> Result<Option<UserProfile>, ServerError> {
        let Some(user_id) = self.sessions.lookup(token).await else {
            return Ok(None);
        };
        match self.db.lock().await.get_profile(user_id) {
            Ok(profile) => Ok(Some(profile)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Issue a fresh session token for an existing user.
    pub async fn sign_in(&self, user_id: UserId) -> Result<String, ServerError> {
        let session = Session {
            token: generate_token(),
            user_id,
            created_at: Utc::now(),
        };
        self.db.lock().await.insert_session(&session)?;

        self.announce(AuthEvent::SignedIn {
            token: session.token.clone(),
            user_id,
        })
        .await;
        info!(user = %user_id, "Session opened");
        Ok(session.token)
    }

    /// End a session. Returns `false` if the token was unknown.
    pub async fn sign_out(&self, token: &str) -> Result<bool, ServerError> {
        let existed = self.db.lock().await.delete_session(token)?;
        self.announce(AuthEvent::SignedOut {
            token: token.to_string(),
        })
        .await;
        Ok(existed)
    }

    /// Create an identity plus its profile and hand back a first access
    /// token. Privileged: callers must have checked for an admin.
    pub async fn create_user(&self, email: &str) -> Result<(UserProfile, String), ServerError> {
        let profile = UserProfile::new(email)?;
        self.db.lock().await.insert_profile(&profile)?;
        info!(user = %profile.id, email = %profile.email, "User created");

        let token = self.sign_in(profile.id).await?;
        Ok((profile, token))
    }

    /// Make sure `email` exists, is an admin and can sign in with `token`.
    pub async fn ensure_admin(&self, email: &str, token: &str) -> Result<UserProfile, ServerError> {
        let email = normalize_email(email)?;
        let profile = {
            let db = self.db.lock().await;
            let profile = match db.get_profile_by_email(&email) {
                Ok(profile) => profile,
                Err(StoreError::NotFound) => {
                    let profile = UserProfile::new(&email)?;
                    db.insert_profile(&profile)?;
                    profile
                }
                Err(e) => return Err(e.into()),
            };
            let profile = db.set_admin(profile.id, true)?;

            match db.get_session(token) {
                Ok(existing) if existing.user_id == profile.id => {}
                Ok(_) => {
                    return Err(ServerError::Conflict(
                        "bootstrap token belongs to another user".into(),
                    ))
                }
                Err(StoreError::NotFound) => db.insert_session(&Session {
                    token: token.to_string(),
                    user_id: profile.id,
                    created_at: Utc::now(),
                })?,
                Err(e) => return Err(e.into()),
            }
            profile
        };

        self.announce(AuthEvent::SignedIn {
            token: token.to_string(),
            user_id: profile.id,
        })
        .await;
        info!(email = %profile.email, "Bootstrap admin ready");
        Ok(profile)
    }

    /// Publish `event` and wait for the listener to apply it. The database
    /// lock must not be held here: the listener may need it to resync.
    async fn announce(&self, event: AuthEvent) {
        let seq = {
            let mut published = self
                .published
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if self.events.send(event).is_err() {
                warn!("No session listener running, event dropped");
                return;
            }
            *published += 1;
            *published
        };

        let mut applied = self.sessions.applied.subscribe();
        let settled = tokio::time::timeout(SETTLE_TIMEOUT, applied.wait_for(|n| *n >= seq))
            .await
            .map(|confirmed| confirmed.is_ok());
        match settled {
            Ok(true) => {}
            Ok(false) => warn!(seq, "Session listener gone"),
            Err(_) => warn!(seq, "Session listener did not confirm event in time"),
        }
    }
}

/// Sole writer of [`SessionState`].
async fn run_listener(
    db: Arc<Mutex<Database>>,
    sessions: SessionState,
    mut rx: broadcast::Receiver<AuthEvent>,
) {
    resync(&db, &sessions).await;

    loop {
        match rx.recv().await {
            Ok(event) => {
                debug!(?event, "Applying auth event");
                sessions.apply(&event).await;
                sessions.mark_applied(1);
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "Session listener lagged, reloading from store");
                resync(&db, &sessions).await;
                sessions.mark_applied(missed);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    debug!("Session listener stopped");
}

async fn resync(db: &Arc<Mutex<Database>>, sessions: &SessionState) {
    let stored = db.lock().await.list_sessions();
    match stored {
        Ok(stored) => {
            let count = stored.len();
            sessions.replace(stored).await;
            info!(count, "Session table loaded");
        }
        Err(e) => warn!(error = %e, "Failed to load sessions"),
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Any signed-in user.
pub async fn require_user(auth: &Auth, headers: &HeaderMap) -> Result<UserProfile, ServerError> {
    let token = bearer_token(headers).ok_or(ServerError::Unauthorized)?;
    auth.current_identity(token)
        .await?
        .ok_or(ServerError::Unauthorized)
}

/// A signed-in user with the admin flag.
pub async fn require_admin(auth: &Auth, headers: &HeaderMap) -> Result<UserProfile, ServerError> {
    let user = require_user(auth, headers).await?;
    if !user.is_admin {
        return Err(ServerError::Forbidden("Admin access required".into()));
    }
    Ok(user)
}
