pub mod ranking;
pub mod scoring;
pub mod similarity;
pub mod weights;

pub use ranking::{MatchingEngine, RankedMatch, RankingOptions};
pub use scoring::{
    MatchScore, MatchScorer, MatchingConfig, ScoreBreakdown, calculate_match_score,
};
pub use similarity::cosine_similarity;
pub use weights::{CATEGORY_CEILINGS, CategoryCeilings};
