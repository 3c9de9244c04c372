use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::models::message::Message;
use crate::models::role::Role;

pub const DEFAULT_MAX_HISTORY: usize = 2;

/// Bounded per-session conversation buffers
///
/// Each session keeps its last `max_history` exchanges (user question plus assistant answer).
pub struct SessionManager {
    max_history: usize,
    sessions: Mutex<HashMap<String, Vec<Message>>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl SessionManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Vec<Message>>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions().insert(id.clone(), Vec::new());
        id
    }

    /// Record one question and its answer, dropping the oldest messages beyond the limit
    ///
    /// Unknown ids start a new session under that id.
    pub fn add_exchange(&self, session_id: &str, user: &str, assistant: &str) {
        let mut sessions = self.sessions();
        let history = sessions.entry(session_id.to_string()).or_default();
        history.push(Message::user().with_text(user));
        history.push(Message::assistant().with_text(assistant));

        let keep = self.max_history * 2;
        if history.len() > keep {
            let excess = history.len() - keep;
            history.drain(..excess);
        }
    }

    /// The session's history as `User: ...` / `Assistant: ...` lines
    pub fn conversation_history(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions();
        let history = sessions.get(session_id).filter(|h| !h.is_empty())?;

        let lines: Vec<String> = history
            .iter()
            .map(|message| {
                let speaker = match message.role {
                    Role::User => "User",
                    _ => "Assistant",
                };
                format!("{}: {}", speaker, message.text())
            })
            .collect();
        Some(lines.join("\n"))
    }

    pub fn clear_session(&self, session_id: &str) {
        if let Some(history) = self.sessions().get_mut(session_id) {
            history.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_new_session_has_no_history() {
        let manager = SessionManager::default();
        let id = manager.create_session();
        assert!(manager.conversation_history(&id).is_none());
        assert!(manager.conversation_history("missing").is_none());
        assert_ne!(id, manager.create_session());
    }

    #[test]
    fn test_history_formatting() {
        let manager = SessionManager::default();
        let id = manager.create_session();
        manager.add_exchange(&id, "What is MCP?", "A protocol.");

        assert_eq!(
            manager.conversation_history(&id).unwrap(),
            "User: What is MCP?\nAssistant: A protocol."
        );
    }

    #[test]
    fn test_history_is_bounded() {
        let manager = SessionManager::new(2);
        let id = manager.create_session();
        for i in 1..=3 {
            manager.add_exchange(&id, &format!("q{}", i), &format!("a{}", i));
        }

        assert_eq!(
            manager.conversation_history(&id).unwrap(),
            "User: q2\nAssistant: a2\nUser: q3\nAssistant: a3"
        );
    }

    #[test]
    fn test_clear_session() {
        let manager = SessionManager::default();
        manager.add_exchange("s1", "q", "a");
        manager.clear_session("s1");
        assert!(manager.conversation_history("s1").is_none());
    }

    #[test]
    fn test_concurrent_exchanges() {
        let manager = Arc::new(SessionManager::new(100));
        let id = manager.create_session();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let manager = Arc::clone(&manager);
                let id = id.clone();
                std::thread::spawn(move || manager.add_exchange(&id, &format!("q{}", i), "a"))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let history = manager.conversation_history(&id).unwrap();
        assert_eq!(history.lines().count(), 16);
    }
}
