//! Ranking engine
//!
//! The pairwise comparison interview (`session`), the component that turns a
//! resolved interview into store mutations (`resolver`), and the pure
//! position-to-rating projection (`rating`).

pub mod rating;
pub mod resolver;
pub mod session;

pub use rating::{project_ratings, rating_for, RatedBook};
pub use session::{
    begin_classification, submit_judgment, ClassificationStep, ComparisonSession, JudgmentStep,
    OperationKind, PendingComparison, Resolution,
};
