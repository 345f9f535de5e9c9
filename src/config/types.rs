use std::collections::HashMap;
use std::sync::Arc;

/// Pub/Sub style queue descriptor (topic + subscription).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Queue {
    /// Topic the queue publishes to.
    pub topic: String,
    /// Subscription the queue is consumed from.
    pub subscription: String,
}

impl Queue {
    pub fn new(topic: impl Into<String>, subscription: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            subscription: subscription.into(),
        }
    }
}

/// One subscriber served by a broker.
///
/// Identity is `(namespace, broker, name)`; everything else is payload that the
/// handler consumes and the pool never looks at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Target {
    /// Opaque id (e.g. the trigger's uid). Not part of the key.
    pub id: String,
    /// Target name, unique within its broker.
    pub name: String,
    /// Namespace of the owning broker.
    pub namespace: String,
    /// Name of the owning broker.
    pub broker: String,
    /// Delivery address of the subscriber.
    pub address: String,
    /// Attribute filter applied by the handler.
    pub filter_attributes: HashMap<String, String>,
    /// Queue holding events that must be retried for this target.
    pub retry_queue: Option<Queue>,
}

impl Target {
    /// Creates a target with the given identity and no payload.
    pub fn new(
        namespace: impl Into<String>,
        broker: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            broker: broker.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Stable key of this target: `namespace/broker/name`.
    ///
    /// Depends on identity fields only, so changing the address, filters or
    /// queues of a target keeps its key.
    ///
    /// Each segment is escaped (`%` as `%25`, `/` as `%2F`), so names
    /// containing `/` never collide with a different split of the same text.
    ///
    /// ```
    /// use retrypool::Target;
    ///
    /// let t = Target::new("ns", "default", "trigger-a");
    /// assert_eq!(t.key(), "ns/default/trigger-a");
    ///
    /// let odd = Target::new("a", "b/c", "d");
    /// assert_eq!(odd.key(), "a/b%2Fc/d");
    /// ```
    pub fn key(&self) -> String {
        join_key(&[self.namespace.as_str(), self.broker.as_str(), self.name.as_str()])
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter_attributes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_retry_queue(mut self, queue: Queue) -> Self {
        self.retry_queue = Some(queue);
        self
    }
}

/// A broker: its own delivery configuration plus the targets it serves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Broker {
    pub id: String,
    pub name: String,
    pub namespace: String,
    /// Ingress address of the broker.
    pub address: String,
    /// Queue decoupling ingress from fan-out.
    pub decouple_queue: Option<Queue>,
    /// Targets keyed by name.
    pub targets: HashMap<String, Arc<Target>>,
}

impl Broker {
    pub(crate) fn empty(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Stable key of this broker: `namespace/name`, escaped like [`Target::key`].
    pub fn key(&self) -> String {
        join_key(&[self.namespace.as_str(), self.name.as_str()])
    }
}

fn join_key(segments: &[&str]) -> String {
    let mut key = String::with_capacity(segments.iter().map(|s| s.len() + 1).sum());
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            key.push('/');
        }
        for c in segment.chars() {
            match c {
                '%' => key.push_str("%25"),
                '/' => key.push_str("%2F"),
                c => key.push(c),
            }
        }
    }
    key
}

/// Splits a key produced by [`Target::key`] back into its three segments.
///
/// `None` for anything [`Target::key`] cannot produce.
pub(crate) fn split_target_key(key: &str) -> Option<(String, String, String)> {
    let mut parts = key.split('/');
    let (ns, broker, name) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    Some((unescape(ns)?, unescape(broker)?, unescape(name)?))
}

fn unescape(segment: &str) -> Option<String> {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(i) = rest.find('%') {
        out.push_str(&rest[..i]);
        match rest.get(i + 1..i + 3)? {
            "25" => out.push('%'),
            "2F" => out.push('/'),
            _ => return None,
        }
        rest = &rest[i + 3..];
    }
    out.push_str(rest);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_ignores_payload_fields() {
        let a = Target::new("ns", "b", "t").with_address("http://a");
        let b = Target::new("ns", "b", "t")
            .with_address("http://b")
            .with_filter("type", "x")
            .with_retry_queue(Queue::new("topic", "sub"));
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn key_separates_brokers_and_namespaces() {
        let keys = [
            Target::new("ns-0", "broker-0", "t").key(),
            Target::new("ns-0", "broker-1", "t").key(),
            Target::new("ns-1", "broker-0", "t").key(),
        ];
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[0], keys[2]);
        assert_ne!(keys[1], keys[2]);
        assert_eq!(Broker::empty("ns", "b").key(), "ns/b");
    }

    #[test]
    fn slashes_in_names_do_not_collide() {
        let a = Target::new("a", "b/c", "d");
        let b = Target::new("a/b", "c", "d");
        let c = Target::new("a", "b", "c/d");
        assert_ne!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
        assert_ne!(b.key(), c.key());

        let pct = Target::new("a", "b%2Fc", "d");
        assert_ne!(a.key(), pct.key());
        assert_ne!(Broker::empty("a", "b/c").key(), Broker::empty("a/b", "c").key());
    }

    #[test]
    fn split_reverses_key() {
        for t in [
            Target::new("ns", "default", "trigger-a"),
            Target::new("a", "b/c", "d"),
            Target::new("a/b", "c", "d%2F"),
        ] {
            let (ns, broker, name) = split_target_key(&t.key()).expect("own key");
            assert_eq!(ns, t.namespace);
            assert_eq!(broker, t.broker);
            assert_eq!(name, t.name);
        }
        assert!(split_target_key("a/b").is_none());
        assert!(split_target_key("a/b/c/d").is_none());
        assert!(split_target_key("a/b/%zz").is_none());
        assert!(split_target_key("a/b/%2").is_none());
    }
}
