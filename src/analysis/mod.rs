//! The spending analysis: classifying categories, aggregating expenses, normalizing them to
//! monthly averages and comparing a year against the one before it.

mod aggregate;
mod classifier;
mod clock;
mod compare;
mod normalize;
mod orchestrator;

pub use aggregate::{aggregate, Aggregates, Bucket};
pub use classifier::{category_names, group_names, CategoryClassifier, UNKNOWN_GROUP};
pub use clock::{Clock, FixedClock, SystemClock};
pub use compare::{compare, Change};
pub use normalize::{monthly_average, months_to_average, Averages, Normalizer};
pub use orchestrator::{
    AnalysisState, FetchOutcome, FetchRequest, Snapshot, SpendingAnalysis, Views, YearSummary,
};
