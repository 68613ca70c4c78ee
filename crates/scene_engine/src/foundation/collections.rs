//! Specialized collection types

pub use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Stable handle to a model node inside a scene's node arena
    pub struct NodeHandle;
}

/// Handle-based arena of model nodes
pub type NodeArena<T> = SlotMap<NodeHandle, T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_stay_valid_across_removal() {
        let mut arena: NodeArena<&str> = NodeArena::with_key();
        let a = arena.insert("a");
        let b = arena.insert("b");
        arena.remove(a);

        assert!(arena.get(a).is_none());
        assert_eq!(arena.get(b), Some(&"b"));

        // A reused slot gets a new generation, so the stale handle stays dead
        let c = arena.insert("c");
        assert_ne!(a, c);
        assert!(arena.get(a).is_none());
    }
}
