//! Vector-store connection lifecycle.
//!
//! [`ConnectionState`] tracks the endpoint and credential the user is
//! connecting with, the phase of the connection, and the collection names
//! enumerated after a successful handshake.
//!
//! ```text
//!  Disconnected ──begin_connect──▶ Connecting ──connect_succeeded──▶ Connected
//!        ▲                             │                               │
//!        └────────connect_failed───────┘◀────────begin_connect─────────┘
//! ```
//!
//! Changing the endpoint or credential drops back to `Disconnected`; the
//! new settings have to pass a handshake before anything is sent with them.
//!
//! All functions here are pure transitions; the network round trips are
//! driven by [`Console`](crate::console::Console).

use tracing::info;

use crate::models::Credential;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Disconnected,
    Connecting,
    Connected,
}

/// Endpoint and credential forwarded to collaborator calls that act on the
/// vector store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub endpoint: String,
    pub credential: Credential,
}

#[derive(Debug, Clone)]
pub struct ConnectionState {
    endpoint: String,
    credential: Credential,
    phase: ConnectionPhase,
    collections: Vec<String>,
}

impl ConnectionState {
    pub fn new(endpoint: impl Into<String>, credential: Credential) -> Self {
        Self {
            endpoint: endpoint.into(),
            credential,
            phase: ConnectionPhase::Disconnected,
            collections: Vec::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Edit the endpoint. A changed endpoint has not been tested, so an
    /// established connection is dropped along with its collections.
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        let endpoint = endpoint.into();
        if endpoint != self.endpoint {
            self.endpoint = endpoint;
            self.invalidate();
        }
    }

    /// Edit the credential. Same rule as [`set_endpoint`](Self::set_endpoint).
    pub fn set_credential(&mut self, credential: Credential) {
        if credential != self.credential {
            self.credential = credential;
            self.invalidate();
        }
    }

    fn invalidate(&mut self) {
        if self.phase == ConnectionPhase::Connected {
            info!(endpoint = %self.endpoint, "connection settings changed, reconnect required");
        }
        self.phase = ConnectionPhase::Disconnected;
        self.collections.clear();
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn is_connected(&self) -> bool {
        self.phase == ConnectionPhase::Connected
    }

    /// Known collection names. Only meaningful while connected.
    pub fn collections(&self) -> &[String] {
        if self.is_connected() {
            &self.collections
        } else {
            &[]
        }
    }

    pub fn target(&self) -> ConnectionTarget {
        ConnectionTarget {
            endpoint: self.endpoint.clone(),
            credential: self.credential.clone(),
        }
    }

    /// Enter `Connecting` and return the target to test.
    ///
    /// Returns `None` without changing state when an attempt is already in
    /// flight or no endpoint is set.
    pub fn begin_connect(&mut self) -> Option<ConnectionTarget> {
        if self.phase == ConnectionPhase::Connecting || self.endpoint.trim().is_empty() {
            return None;
        }
        self.phase = ConnectionPhase::Connecting;
        info!(endpoint = %self.endpoint, "connecting to vector store");
        Some(self.target())
    }

    /// Handshake succeeded. `collections` is `None` when the follow-up
    /// listing failed; the connection still counts as established.
    pub fn connect_succeeded(&mut self, collections: Option<Vec<String>>) {
        self.phase = ConnectionPhase::Connected;
        match collections {
            Some(names) => self.replace_collections(names),
            None => self.collections.clear(),
        }
        info!(
            endpoint = %self.endpoint,
            collections = self.collections.len(),
            "connected to vector store"
        );
    }

    pub fn connect_failed(&mut self) {
        self.phase = ConnectionPhase::Disconnected;
        self.collections.clear();
        info!(endpoint = %self.endpoint, "vector store connection failed");
    }

    /// Replace the collection set, keeping server order and dropping repeats.
    pub fn replace_collections(&mut self, names: Vec<String>) {
        let mut unique: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        self.collections = unique;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ConnectionState {
        ConnectionState::new("http://qdrant:6333", Credential::new("k"))
    }

    #[test]
    fn connect_passes_through_connecting() {
        let mut s = state();
        assert_eq!(s.phase(), ConnectionPhase::Disconnected);
        let target = s.begin_connect().unwrap();
        assert_eq!(target.endpoint, "http://qdrant:6333");
        assert_eq!(s.phase(), ConnectionPhase::Connecting);
        s.connect_succeeded(Some(vec!["docs-a".into()]));
        assert_eq!(s.phase(), ConnectionPhase::Connected);
        assert_eq!(s.collections(), ["docs-a".to_string()]);
    }

    #[test]
    fn second_begin_while_connecting_is_ignored() {
        let mut s = state();
        assert!(s.begin_connect().is_some());
        assert!(s.begin_connect().is_none());
        assert_eq!(s.phase(), ConnectionPhase::Connecting);
    }

    #[test]
    fn reconnect_goes_back_to_connecting_and_failure_disconnects() {
        let mut s = state();
        s.begin_connect();
        s.connect_succeeded(Some(vec!["a".into()]));
        assert!(s.begin_connect().is_some());
        assert_eq!(s.phase(), ConnectionPhase::Connecting);
        s.connect_failed();
        assert_eq!(s.phase(), ConnectionPhase::Disconnected);
        assert!(s.collections().is_empty());
    }

    #[test]
    fn empty_endpoint_cannot_connect() {
        let mut s = ConnectionState::new("  ", Credential::default());
        assert!(s.begin_connect().is_none());
        assert_eq!(s.phase(), ConnectionPhase::Disconnected);
    }

    #[test]
    fn listing_failure_still_connects_with_empty_set() {
        let mut s = state();
        s.begin_connect();
        s.connect_succeeded(None);
        assert!(s.is_connected());
        assert!(s.collections().is_empty());
    }

    #[test]
    fn editing_settings_requires_reconnect() {
        let mut s = state();
        s.begin_connect();
        s.connect_succeeded(Some(vec!["docs-a".into()]));

        s.set_endpoint("http://qdrant:6333");
        assert!(s.is_connected());

        s.set_endpoint("http://other:6333");
        assert_eq!(s.phase(), ConnectionPhase::Disconnected);
        assert!(s.collections().is_empty());

        s.begin_connect();
        s.connect_succeeded(Some(vec!["docs-b".into()]));
        s.set_credential(Credential::new("k"));
        assert!(s.is_connected());
        s.set_credential(Credential::new("rotated"));
        assert!(!s.is_connected());
        assert_eq!(s.target().credential.expose(), "rotated");
    }

    #[test]
    fn collections_are_deduplicated_in_order() {
        let mut s = state();
        s.begin_connect();
        s.connect_succeeded(Some(vec!["b".into(), "a".into(), "b".into()]));
        assert_eq!(s.collections(), ["b".to_string(), "a".to_string()]);
    }
}
