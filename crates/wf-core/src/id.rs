use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner shared by every workflow id kind.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Monotonic counter feeding generated ids (`state_0`, `transition_1`, ...).
static COUNTER: AtomicU64 = AtomicU64::new(0);

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Prefix used for generated ids of this kind.
            pub const PREFIX: &'static str = $prefix;

            /// Intern a string as an id, or return the existing one.
            pub fn intern(s: &str) -> Self {
                $name(INTERNER.get_or_intern(s))
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &str {
                INTERNER.resolve(&self.0)
            }

            /// Generate a fresh id. Uniqueness within a graph is checked by the
            /// graph's allocator, since loaded ids may already use the prefix.
            pub fn generate() -> Self {
                let n = COUNTER.fetch_add(1, Ordering::Relaxed);
                Self::intern(&format!("{}_{n}", Self::PREFIX))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok($name::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Identifier of a workflow state (node). 4 bytes, `Copy`, O(1) compare.
    StateId,
    "state"
);

interned_id!(
    /// Identifier of a transition (directed edge).
    TransitionId,
    "transition"
);

interned_id!(
    /// Identifier of a gate attached to a transition.
    GateId,
    "gate"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = StateId::intern("draft");
        let b = StateId::intern("draft");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "draft");
    }

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let a = TransitionId::generate();
        let b = TransitionId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("transition_"));
        assert!(GateId::generate().as_str().starts_with("gate_"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = StateId::intern("released");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"released\"");
        let back: StateId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
