//! Gesture recognition pipeline: raw perception output to debounced commands.

pub mod classifier;
pub mod debounce;
pub mod features;

pub use classifier::{Classification, ClassifierConfig, GestureClassifier, ThumbPolarity};
pub use debounce::{CommandDebouncer, DebounceConfig, DebounceKind, DebouncePolicy};
pub use features::{observe_frame, HandPose, MalformedObservation, PerceptionMode, PoseObservation};

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;
