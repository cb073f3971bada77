//! Per-browser sessions, each owning its own chain and transcripts.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{chain::CodeGenChain, chat::ChatProvider, error::LLMError};

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "pygpt_session";

/// A session's chain. The mutex serializes runs within one session.
pub type SessionHandle = Arc<Mutex<CodeGenChain>>;

/// Sessions live as long as the server; nothing is evicted. Only a run
/// creates one, so reading the page or the history never grows the store.
pub struct SessionStore {
    llm: Arc<dyn ChatProvider>,
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
}

impl SessionStore {
    pub fn new(llm: Arc<dyn ChatProvider>) -> Self {
        Self {
            llm,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the session for `id` without creating one.
    pub async fn lookup(&self, id: Option<Uuid>) -> Option<SessionHandle> {
        let id = id?;
        self.sessions.lock().await.get(&id).cloned()
    }

    /// Returns the session for `id`, or a fresh one when `id` is unknown.
    ///
    /// The boolean is true when a new session was created, in which case the
    /// caller has to hand the new id back to the client.
    pub async fn resolve(&self, id: Option<Uuid>) -> Result<(Uuid, SessionHandle, bool), LLMError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(id) = id {
            if let Some(handle) = sessions.get(&id) {
                return Ok((id, handle.clone(), false));
            }
        }

        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(CodeGenChain::new(self.llm.clone())?));
        sessions.insert(id, handle.clone());
        log::debug!("Created session {id} ({} live)", sessions.len());
        Ok((id, handle, true))
    }
}

/// Extracts the session id from the request's `Cookie` headers.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// `Set-Cookie` value for a session id.
pub fn session_cookie(id: Uuid) -> HeaderValue {
    // A hyphenated uuid only contains header-safe characters.
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .unwrap_or_else(|_| HeaderValue::from_static(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatMessage, ChatResponse, TextResponse};
    use async_trait::async_trait;

    struct Fixed;

    #[async_trait]
    impl ChatProvider for Fixed {
        async fn chat(&self, _messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
            Ok(Box::new(TextResponse::new("ok")))
        }
    }

    #[tokio::test]
    async fn known_ids_are_reused_and_unknown_ids_replaced() {
        let store = SessionStore::new(Arc::new(Fixed));

        let (id, first, created) = store.resolve(None).await.unwrap();
        assert!(created);
        first.lock().await.generate("bubble sort").await.unwrap();

        let (same, again, created) = store.resolve(Some(id)).await.unwrap();
        assert!(!created);
        assert_eq!(same, id);
        assert_eq!(again.lock().await.transcripts().code.len(), 1);

        let stale = Uuid::new_v4();
        let (fresh, _, created) = store.resolve(Some(stale)).await.unwrap();
        assert!(created);
        assert_ne!(fresh, stale);
        assert!(store.lookup(Some(stale)).await.is_none());
    }

    #[tokio::test]
    async fn lookup_never_creates_a_session() {
        let store = SessionStore::new(Arc::new(Fixed));
        let unknown = Uuid::new_v4();
        for _ in 0..10 {
            assert!(store.lookup(None).await.is_none());
            assert!(store.lookup(Some(unknown)).await.is_none());
        }
        assert!(store.sessions.lock().await.is_empty());

        let (id, _, _) = store.resolve(None).await.unwrap();
        assert!(store.lookup(Some(id)).await.is_some());
        assert_eq!(store.sessions.lock().await.len(), 1);
    }

    #[test]
    fn finds_the_session_cookie_among_others() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_str(&format!("a=1; {SESSION_COOKIE}={id}")).unwrap(),
        );
        assert_eq!(session_id(&headers), Some(id));
    }

    #[test]
    fn malformed_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{SESSION_COOKIE}=not-a-uuid")).unwrap(),
        );
        assert_eq!(session_id(&headers), None);
        assert_eq!(session_id(&HeaderMap::new()), None);
    }

    #[test]
    fn cookie_round_trips_through_headers() {
        let id = Uuid::new_v4();
        let set_cookie = session_cookie(id);
        let value = set_cookie.to_str().unwrap();
        assert!(value.starts_with(&format!("{SESSION_COOKIE}={id};")));

        let mut headers = HeaderMap::new();
        let pair = value.split(';').next().unwrap();
        headers.insert(header::COOKIE, HeaderValue::from_str(pair).unwrap());
        assert_eq!(session_id(&headers), Some(id));
    }
}
