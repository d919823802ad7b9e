//! Labeled dataset model (instances, tracks, skeleton) and the read-only store interface.

pub mod error;
pub mod model;
pub mod store;

pub use error::LabelsError;
pub use model::{Instance, LabeledFrame, Point, Skeleton, Track};
pub use store::{LabelStore, Labels};
