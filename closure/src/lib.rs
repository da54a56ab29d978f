mod database;
mod engine;
mod error;
mod metrics;
mod session;
mod threshold;

pub use self::{
    database::{cosine_similarity, DescriptorDatabase},
    engine::{ClosureEngine, Comparison, PredictedClosures},
    error::SessionError,
    metrics::{GroundTruth, Metrics, ThresholdMetrics},
    session::{RunResults, ScanOutcome, Session},
    threshold::ThresholdSet,
};
