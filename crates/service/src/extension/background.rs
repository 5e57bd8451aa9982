use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use configs::ExtensionConfig;

use crate::identity::domain::Profile;
use crate::identity::provider::IdentityProvider;
use crate::identity::IdentityError;

use super::messages::{ExtensionRequest, ExtensionResponse, MessageError};

/// Supplies the browser's OAuth token, prompting the user when `interactive`.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn auth_token(&self, interactive: bool) -> Option<String>;
}

/// A token obtained up front.
pub struct StaticTokenSource(pub Option<String>);

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn auth_token(&self, _interactive: bool) -> Option<String> {
        self.0.clone()
    }
}

pub struct BackgroundWorker {
    tokens: Arc<dyn TokenSource>,
    provider: Arc<dyn IdentityProvider>,
}

impl BackgroundWorker {
    pub fn new(tokens: Arc<dyn TokenSource>, provider: Arc<dyn IdentityProvider>) -> Self {
        Self { tokens, provider }
    }

    pub async fn handle(&self, request: ExtensionRequest) -> ExtensionResponse {
        match request {
            ExtensionRequest::GetUserProfile => {
                let Some(token) = self.tokens.auth_token(true).await else {
                    return ExtensionResponse::Error { error: "Failed to get auth token".into() };
                };
                match self.provider.fetch_profile(&token).await {
                    Ok(profile) => ExtensionResponse::Profile { profile },
                    Err(e) => {
                        warn!(error = %e, "profile lookup failed");
                        ExtensionResponse::Error { error: e.to_string() }
                    }
                }
            }
        }
    }
}

struct Envelope {
    request: ExtensionRequest,
    reply: oneshot::Sender<ExtensionResponse>,
}

/// Sender side of the worker's channel.
#[derive(Clone)]
pub struct BackgroundHandle {
    tx: mpsc::Sender<Envelope>,
    timeout: Duration,
}

/// Runs `worker` on its own task; each request is answered from a separate task.
pub fn spawn_background(worker: BackgroundWorker, timeout: Duration) -> BackgroundHandle {
    let (tx, mut rx) = mpsc::channel::<Envelope>(32);
    let worker = Arc::new(worker);
    tokio::spawn(async move {
        while let Some(env) = rx.recv().await {
            let worker = worker.clone();
            tokio::spawn(async move {
                let response = worker.handle(env.request).await;
                if env.reply.send(response).is_err() {
                    debug!("requester went away before the reply");
                }
            });
        }
        debug!("background worker stopped");
    });
    BackgroundHandle { tx, timeout }
}

/// [`spawn_background`] with the round-trip budget from `[extension]`.
pub fn spawn_background_from_config(worker: BackgroundWorker, cfg: &ExtensionConfig) -> BackgroundHandle {
    spawn_background(worker, Duration::from_millis(cfg.message_timeout_ms))
}

impl BackgroundHandle {
    pub async fn request(&self, request: ExtensionRequest) -> Result<ExtensionResponse, MessageError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope { request, reply })
            .await
            .map_err(|_| MessageError::Disconnected)?;
        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(MessageError::Disconnected),
            Err(_) => Err(MessageError::Timeout(self.timeout)),
        }
    }

    /// Signed-in profile; every failure, timeouts included, is [`IdentityError::AuthFailed`].
    pub async fn user_profile(&self) -> Result<Profile, IdentityError> {
        match self.request(ExtensionRequest::GetUserProfile).await {
            Ok(ExtensionResponse::Profile { profile }) => Ok(profile),
            Ok(ExtensionResponse::Error { error }) => Err(IdentityError::AuthFailed(error)),
            Err(e) => Err(IdentityError::AuthFailed(e.to_string())),
        }
    }
}
