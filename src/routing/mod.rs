//! Query routing: text to intent, intent to capability units.

pub mod classifier;
pub mod intent;
pub mod keywords;
pub mod selector;

pub use classifier::{ClassificationSource, LlmIntentClassifier};
pub use intent::{classify, Intent};
pub use selector::{
    apply_mode, select, targeted, RoutingDecision, RoutingPolicy, Selector, Toggles, WorkflowMode,
};
