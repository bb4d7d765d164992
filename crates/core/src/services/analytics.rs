//! Per-module rating analytics.

use ratemymodule_common::AppResult;
use ratemymodule_db::{
    entities::post::{self, MAX_RATING, MIN_RATING},
    repositories::{ModuleRepository, PostRepository},
};
use serde::Serialize;

/// How often each rating from 1 to 5 was given, and the mean.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RatingDistribution {
    /// `counts[0]` is the number of 1s, `counts[4]` the number of 5s.
    pub counts: [u64; 5],
    pub total: u64,
    pub mean: Option<f64>,
}

impl RatingDistribution {
    fn from_ratings(ratings: impl IntoIterator<Item = i16>) -> Self {
        let mut counts = [0_u64; 5];
        for rating in ratings {
            if (MIN_RATING..=MAX_RATING).contains(&rating) {
                counts[(rating - MIN_RATING) as usize] += 1;
            }
        }

        let total: u64 = counts.iter().sum();
        let mean = (total > 0).then(|| {
            let sum: u64 = counts
                .iter()
                .zip(1_u64..)
                .map(|(count, rating)| count * rating)
                .sum();
            sum as f64 / total as f64
        });

        Self {
            counts,
            total,
            mean,
        }
    }
}

/// Rating summary of a module over the posts everyone can see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    pub module_id: String,
    pub post_count: u64,
    pub overall: RatingDistribution,
    pub difficulty: RatingDistribution,
    pub assessment: RatingDistribution,
    pub teaching: RatingDistribution,
}

impl RatingSummary {
    /// Summarise `posts` for `module_id`.
    #[must_use]
    pub fn from_posts(module_id: &str, posts: &[post::Model]) -> Self {
        Self {
            module_id: module_id.to_string(),
            post_count: posts.len() as u64,
            overall: RatingDistribution::from_ratings(posts.iter().map(|p| p.overall_rating)),
            difficulty: RatingDistribution::from_ratings(
                posts.iter().filter_map(|p| p.difficulty_rating),
            ),
            assessment: RatingDistribution::from_ratings(
                posts.iter().filter_map(|p| p.assessment_rating),
            ),
            teaching: RatingDistribution::from_ratings(
                posts.iter().filter_map(|p| p.teaching_rating),
            ),
        }
    }
}

/// Analytics service.
#[derive(Clone)]
pub struct AnalyticsService {
    post_repo: PostRepository,
    module_repo: ModuleRepository,
}

impl AnalyticsService {
    /// Create a new analytics service.
    #[must_use]
    pub const fn new(post_repo: PostRepository, module_repo: ModuleRepository) -> Self {
        Self {
            post_repo,
            module_repo,
        }
    }

    /// Rating summary of a module. Hidden and reported posts are left out.
    pub async fn rating_summary(&self, module_id: &str) -> AppResult<RatingSummary> {
        self.module_repo.get_by_id(module_id).await?;
        let posts = self.post_repo.public_for_module(module_id).await?;
        Ok(RatingSummary::from_posts(module_id, &posts))
    }
}
