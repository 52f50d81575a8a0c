//! Optional capabilities a node payload may expose to the tree.
//!
//! The tree never needs to know the concrete payload type. It asks the value
//! through [`TreeValue`] whether it is node-aware or disposable and only acts
//! on the capabilities the value hands back.

use crate::arena::NodeId;

/// A value that wants to know which node currently holds it.
pub trait NodeAware {
    fn set_node(&mut self, node: NodeId);
}

/// A value that owns resources released by an explicit disposal pass.
pub trait Disposable {
    fn dispose(&mut self);
}

/// Capability queries for node payloads.
///
/// Both methods default to `None`, so a plain payload only needs an empty impl
/// (see [`plain_tree_value!`](crate::plain_tree_value)).
pub trait TreeValue {
    fn as_node_aware(&mut self) -> Option<&mut dyn NodeAware> {
        None
    }

    fn as_disposable(&mut self) -> Option<&mut dyn Disposable> {
        None
    }
}

/// Implements [`TreeValue`] without capabilities for the listed types.
#[macro_export]
macro_rules! plain_tree_value {
    ($($ty:ty),* $(,)?) => {
        $(impl $crate::value::TreeValue for $ty {})*
    };
}

plain_tree_value!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
);

#[cfg(test)]
mod tests {
    use super::*;

    struct Handle {
        closed: bool,
    }

    impl Disposable for Handle {
        fn dispose(&mut self) {
            self.closed = true;
        }
    }

    impl TreeValue for Handle {
        fn as_disposable(&mut self) -> Option<&mut dyn Disposable> {
            Some(self)
        }
    }

    #[test]
    fn plain_values_expose_no_capabilities() {
        let mut s = String::from("x");
        assert!(s.as_node_aware().is_none());
        assert!(s.as_disposable().is_none());
    }

    #[test]
    fn capability_query_reaches_the_value() {
        let mut h = Handle { closed: false };
        h.as_disposable().expect("disposable").dispose();
        assert!(h.closed);
    }
}
