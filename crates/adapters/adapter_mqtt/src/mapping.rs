//! Topic translation between the local `home` tree and the broker prefix.

use std::collections::VecDeque;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, PoisonError};

/// Root of every local topic.
const LOCAL_ROOT: &str = "home";

/// Maps `home/<rest>` to `<base>/<rest>` and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMap {
    base: String,
}

impl TopicMap {
    #[must_use]
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_matches('/').to_string(),
        }
    }

    /// Filter to subscribe to on the broker.
    #[must_use]
    pub fn broker_filter(&self) -> String {
        format!("{}/#", self.base)
    }

    /// Broker topic for a local topic, or `None` outside the `home` tree.
    #[must_use]
    pub fn to_broker(&self, local: &str) -> Option<String> {
        Self::reroot(local, LOCAL_ROOT, &self.base)
    }

    /// Local topic for a broker topic, or `None` outside the base prefix.
    #[must_use]
    pub fn to_local(&self, broker: &str) -> Option<String> {
        Self::reroot(broker, &self.base, LOCAL_ROOT)
    }

    fn reroot(topic: &str, from: &str, to: &str) -> Option<String> {
        if topic == from {
            return Some(to.to_string());
        }
        let rest = topic.strip_prefix(from)?.strip_prefix('/')?;
        Some(format!("{to}/{rest}"))
    }
}

/// Remembers recently forwarded messages so the broker's copy of our own
/// publish is not injected back into the bus.
#[derive(Debug)]
pub struct EchoFilter {
    capacity: usize,
    recent: Mutex<VecDeque<u64>>,
}

impl EchoFilter {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            recent: Mutex::new(VecDeque::new()),
        }
    }

    fn fingerprint(topic: &str, payload: &[u8]) -> u64 {
        let mut hasher = DefaultHasher::new();
        topic.hash(&mut hasher);
        payload.hash(&mut hasher);
        hasher.finish()
    }

    /// Record an outgoing message, evicting the oldest when full.
    pub fn remember(&self, topic: &str, payload: &[u8]) {
        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        if recent.len() == self.capacity {
            recent.pop_front();
        }
        recent.push_back(Self::fingerprint(topic, payload));
    }

    /// Returns `true` and forgets the entry if the message is one of ours.
    pub fn take(&self, topic: &str, payload: &[u8]) -> bool {
        let fingerprint = Self::fingerprint(topic, payload);
        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        match recent.iter().position(|f| *f == fingerprint) {
            Some(index) => {
                recent.remove(index);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_keep_topics_unchanged_with_home_base() {
        let map = TopicMap::new("home");
        assert_eq!(map.broker_filter(), "home/#");
        assert_eq!(
            map.to_broker("home/security/alarm").as_deref(),
            Some("home/security/alarm")
        );
        assert_eq!(map.to_local("home/light").as_deref(), Some("home/light"));
    }

    #[test]
    fn should_reroot_under_custom_base() {
        let map = TopicMap::new("/flat/12/");
        assert_eq!(map.broker_filter(), "flat/12/#");
        assert_eq!(
            map.to_broker("home/energy/current").as_deref(),
            Some("flat/12/energy/current")
        );
        assert_eq!(
            map.to_local("flat/12/weather/location").as_deref(),
            Some("home/weather/location")
        );
    }

    #[test]
    fn should_ignore_topics_outside_the_tree() {
        let map = TopicMap::new("house");
        assert_eq!(map.to_local("garden/light"), None);
        assert_eq!(map.to_local("housekeeping/light"), None);
        assert_eq!(map.to_broker("homeware/light"), None);
    }

    #[test]
    fn should_drop_own_echo_once() {
        let echoes = EchoFilter::new(8);
        echoes.remember("home/light", br#"{"light":true}"#);

        assert!(echoes.take("home/light", br#"{"light":true}"#));
        assert!(!echoes.take("home/light", br#"{"light":true}"#));
    }

    #[test]
    fn should_not_match_different_payload() {
        let echoes = EchoFilter::new(8);
        echoes.remember("home/light", br#"{"light":true}"#);
        assert!(!echoes.take("home/light", br#"{"light":false}"#));
        assert_eq!(echoes.len(), 1);
    }

    #[test]
    fn should_evict_oldest_fingerprint_when_full() {
        let echoes = EchoFilter::new(2);
        echoes.remember("home/a", b"1");
        echoes.remember("home/b", b"2");
        echoes.remember("home/c", b"3");

        assert_eq!(echoes.len(), 2);
        assert!(!echoes.take("home/a", b"1"));
        assert!(echoes.take("home/c", b"3"));
    }
}
