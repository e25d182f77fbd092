pub mod lifecycle;

pub use lifecycle::{
    ExpiryReason, LifecycleState, SessionEvent, SessionLifecycle, TimeoutPolicy,
};
