//! IMAP-backed [`MailTransport`].
//!
//! Uses the blocking `imap` client over `native-tls`. Each call moves
//! the session into a `spawn_blocking` closure and back out, so the
//! async watch loop never blocks a runtime worker on socket I/O.
//!
//! IDLE support in the blocking client cannot report *why* a wait
//! returned, so [`wait_for_update`](ImapSession::wait_for_update)
//! infers it from the clock: returning noticeably before the timeout
//! means the server pushed an update. A misclassification only costs
//! one extra bounded sync pass, which store dedup makes idempotent.

use std::net::TcpStream;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use native_tls::TlsStream;
use tokio::task::spawn_blocking;
use tracing::{debug, info};

use codewatch_types::MailError;
use codewatch_types::config::MailboxConfig;

use crate::transport::{MailSession, MailTransport, WatchSignal};

type Session = imap::Session<TlsStream<TcpStream>>;

/// Slack subtracted from the wait interval when classifying a wake as
/// server push vs. timer expiry.
const WAKE_CLASSIFY_SLACK: Duration = Duration::from_millis(100);

/// Connects TLS IMAP sessions from a [`MailboxConfig`].
pub struct ImapTransport {
    config: MailboxConfig,
}

impl ImapTransport {
    /// Create a transport for the given mailbox.
    pub fn new(config: MailboxConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MailTransport for ImapTransport {
    async fn connect(&self) -> Result<Box<dyn MailSession>, MailError> {
        let config = self.config.clone();
        let session = spawn_blocking(move || -> Result<Session, MailError> {
            let tls = native_tls::TlsConnector::builder()
                .build()
                .map_err(|e| MailError::ConnectionFailed(e.to_string()))?;

            let client = imap::connect(
                (config.host.as_str(), config.port),
                config.host.as_str(),
                &tls,
            )
            .map_err(|e| MailError::ConnectionFailed(e.to_string()))?;

            let mut session = client
                .login(&config.username, config.password.expose())
                .map_err(|(e, _)| MailError::AuthFailed(e.to_string()))?;

            session
                .select(&config.folder)
                .map_err(|e| MailError::Protocol(e.to_string()))?;

            Ok(session)
        })
        .await
        .map_err(join_error)??;

        info!(
            host = %self.config.host,
            folder = %self.config.folder,
            "imap session established"
        );
        Ok(Box::new(ImapSession {
            session: Some(session),
        }))
    }
}

/// A live IMAP session. The inner session is `None` only transiently
/// while a blocking call owns it, or after an abandoned wait.
struct ImapSession {
    session: Option<Session>,
}

impl ImapSession {
    /// Run `op` on the session in a blocking task, restoring the
    /// session afterwards.
    async fn with_session<R, F>(&mut self, op: F) -> Result<R, MailError>
    where
        R: Send + 'static,
        F: FnOnce(&mut Session) -> Result<R, MailError> + Send + 'static,
    {
        let mut session = self
            .session
            .take()
            .ok_or_else(|| MailError::Protocol("session no longer available".into()))?;

        let (session, result) = spawn_blocking(move || {
            let result = op(&mut session);
            (session, result)
        })
        .await
        .map_err(join_error)?;

        self.session = Some(session);
        result
    }
}

#[async_trait]
impl MailSession for ImapSession {
    async fn search_from(&mut self, sender: &str) -> Result<Vec<u32>, MailError> {
        let query = format!("FROM {sender:?}");
        self.with_session(move |session| {
            let seqs = session
                .search(&query)
                .map_err(|e| MailError::Protocol(e.to_string()))?;
            let mut seqs: Vec<u32> = seqs.into_iter().collect();
            seqs.sort_unstable();
            Ok(seqs)
        })
        .await
    }

    async fn fetch(&mut self, seq: u32) -> Result<String, MailError> {
        self.with_session(move |session| {
            let messages = session
                .fetch(seq.to_string(), "RFC822")
                .map_err(|e| MailError::FetchFailed(e.to_string()))?;
            let body = messages
                .iter()
                .next()
                .and_then(|m| m.body())
                .ok_or_else(|| MailError::FetchFailed(format!("message {seq} has no body")))?;
            Ok(String::from_utf8_lossy(body).into_owned())
        })
        .await
    }

    async fn wait_for_update(&mut self, timeout: Duration) -> Result<WatchSignal, MailError> {
        self.with_session(move |session| {
            let idle = session
                .idle()
                .map_err(|e| MailError::Protocol(e.to_string()))?;
            let started = Instant::now();
            idle.wait_with_timeout(timeout)
                .map_err(|e| MailError::Protocol(e.to_string()))?;

            let signal = if started.elapsed() + WAKE_CLASSIFY_SLACK < timeout {
                WatchSignal::Changed
            } else {
                WatchSignal::TimedOut
            };
            debug!(?signal, elapsed_ms = started.elapsed().as_millis() as u64, "idle wake");
            Ok(signal)
        })
        .await
    }

    async fn close(&mut self) -> Result<(), MailError> {
        // A session abandoned mid-wait has nothing left to log out.
        if self.session.is_none() {
            return Ok(());
        }
        self.with_session(|session| {
            session
                .logout()
                .map_err(|e| MailError::Protocol(e.to_string()))
        })
        .await
    }
}

fn join_error(e: tokio::task::JoinError) -> MailError {
    MailError::Protocol(format!("blocking mail task failed: {e}"))
}
