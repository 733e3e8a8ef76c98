use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{similarity::cosine_similarity, weights::CATEGORY_CEILINGS};
use crate::geo::{CachedDistance, DistanceCalculator, GazetteerDistance};
use crate::{AthleteProfile, ClubProfile};

#[derive(Debug, Clone, PartialEq)]
pub struct MatchingConfig {
    /// Points when only a secondary position is sought.
    pub secondary_position_points: f64,
    /// Points when levels are one tier apart.
    pub adjacent_level_points: f64,
    pub style_excellent_threshold: f32,
    pub style_good_threshold: f32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            secondary_position_points: 15.0,
            adjacent_level_points: 15.0,
            style_excellent_threshold: 0.8,
            style_good_threshold: 0.6,
        }
    }
}

impl MatchingConfig {
    /// Defaults overridden by `MP_STYLE_EXCELLENT_THRESHOLD` / `MP_STYLE_GOOD_THRESHOLD`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let (style_excellent_threshold, style_good_threshold) = ordered_thresholds(
            env_threshold("MP_STYLE_EXCELLENT_THRESHOLD", defaults.style_excellent_threshold),
            env_threshold("MP_STYLE_GOOD_THRESHOLD", defaults.style_good_threshold),
        );
        Self {
            style_excellent_threshold,
            style_good_threshold,
            ..defaults
        }
    }

    /// Partial-credit points clamped to their category ceilings, good threshold capped at excellent.
    pub fn normalized(self) -> Self {
        Self {
            secondary_position_points: clamp_points(
                self.secondary_position_points,
                CATEGORY_CEILINGS.position,
            ),
            adjacent_level_points: clamp_points(self.adjacent_level_points, CATEGORY_CEILINGS.level),
            style_good_threshold: self.style_good_threshold.min(self.style_excellent_threshold),
            ..self
        }
    }
}

fn env_threshold(var: &str, default: f32) -> f32 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<f32>().ok())
        .filter(|v| (-1.0..=1.0).contains(v))
        .unwrap_or(default)
}

/// Falls back to both defaults when the good threshold sits above the excellent one.
fn ordered_thresholds(excellent: f32, good: f32) -> (f32, f32) {
    if good <= excellent {
        return (excellent, good);
    }
    let defaults = MatchingConfig::default();
    warn!(excellent, good, "style thresholds out of order; using defaults");
    (defaults.style_excellent_threshold, defaults.style_good_threshold)
}

fn clamp_points(points: f64, ceiling: f64) -> f64 {
    if points.is_finite() {
        points.clamp(0.0, ceiling)
    } else {
        0.0
    }
}

/// Points per category, each within its ceiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub position_match: f64,
    pub level_match: f64,
    pub budget_match: f64,
    pub location_match: f64,
    pub style_match: f64,
}

impl ScoreBreakdown {
    pub fn sum(&self) -> f64 {
        self.position_match
            + self.level_match
            + self.budget_match
            + self.location_match
            + self.style_match
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    /// `round(breakdown.sum())`, 0..=100.
    pub total_score: u8,
    pub breakdown: ScoreBreakdown,
    /// One line per category that scored, in position → level → budget → location → style order.
    pub reasoning: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct CategoryScore {
    score: f64,
    reasoning: Option<String>,
}

impl CategoryScore {
    fn unscored() -> Self {
        Self {
            score: 0.0,
            reasoning: None,
        }
    }

    fn scored(score: f64, reasoning: impl Into<String>) -> Self {
        Self {
            score,
            reasoning: Some(reasoning.into()),
        }
    }
}

static DEFAULT_SCORER: LazyLock<MatchScorer> = LazyLock::new(MatchScorer::default);

/// Scores one athlete/club pair with default thresholds and the built-in gazetteer.
pub fn calculate_match_score(athlete: &AthleteProfile, club: &ClubProfile) -> MatchScore {
    DEFAULT_SCORER.calculate_match_score(athlete, club)
}

#[derive(Clone)]
pub struct MatchScorer {
    config: MatchingConfig,
    distance: Arc<dyn DistanceCalculator>,
}

impl Default for MatchScorer {
    fn default() -> Self {
        Self::new(
            MatchingConfig::default(),
            Arc::new(CachedDistance::new(GazetteerDistance::default())),
        )
    }
}

impl MatchScorer {
    pub fn new(config: MatchingConfig, distance: Arc<dyn DistanceCalculator>) -> Self {
        Self {
            config: config.normalized(),
            distance,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Never fails: every category degrades to zero on missing or inconsistent data.
    pub fn calculate_match_score(&self, athlete: &AthleteProfile, club: &ClubProfile) -> MatchScore {
        let position = self.score_position(athlete, club);
        let level = self.score_level(athlete, club);
        let budget = self.score_budget(athlete, club);
        let location = self.score_location(athlete, club);
        let style = self.score_style(athlete, club);

        let breakdown = ScoreBreakdown {
            position_match: position.score,
            level_match: level.score,
            budget_match: budget.score,
            location_match: location.score,
            style_match: style.score,
        };

        let reasoning: Vec<String> = [position, level, budget, location, style]
            .into_iter()
            .filter_map(|category| category.reasoning)
            .collect();

        let total_score = breakdown.sum().round().clamp(0.0, 100.0) as u8;

        debug!(
            athlete_id = %athlete.id,
            club_id = %club.id,
            total_score,
            ?breakdown,
            "match scored"
        );

        MatchScore {
            total_score,
            breakdown,
            reasoning,
        }
    }

    fn score_position(&self, athlete: &AthleteProfile, club: &ClubProfile) -> CategoryScore {
        let needs = &club.recruitment_needs;

        if needs.seeks(&athlete.position) {
            return CategoryScore::scored(
                CATEGORY_CEILINGS.position,
                format!("Primary position {} matches a club need", athlete.position),
            );
        }

        match athlete
            .secondary_positions
            .iter()
            .find(|position| needs.seeks(position))
        {
            Some(position) => CategoryScore::scored(
                self.config.secondary_position_points,
                format!("Secondary position {} matches a club need", position),
            ),
            None => CategoryScore::unscored(),
        }
    }

    fn score_level(&self, athlete: &AthleteProfile, club: &ClubProfile) -> CategoryScore {
        let (Some(athlete_level), Some(club_level)) =
            (athlete.level, club.recruitment_needs.experience_level)
        else {
            return CategoryScore::unscored();
        };

        match athlete_level.rank().abs_diff(club_level.rank()) {
            0 => CategoryScore::scored(
                CATEGORY_CEILINGS.level,
                "Experience level perfectly aligned",
            ),
            1 => CategoryScore::scored(
                self.config.adjacent_level_points,
                format!(
                    "Experience level close to the {} level sought",
                    club_level.as_ref()
                ),
            ),
            _ => CategoryScore::unscored(),
        }
    }

    fn score_budget(&self, athlete: &AthleteProfile, club: &ClubProfile) -> CategoryScore {
        let (Some(player), Some(offer)) = (athlete.career_goals.salary_expectation, club.budget)
        else {
            return CategoryScore::unscored();
        };

        if !player.is_valid() || !offer.is_valid() {
            debug!(
                athlete_id = %athlete.id,
                club_id = %club.id,
                ?player,
                ?offer,
                "invalid salary range; budget left unscored"
            );
            return CategoryScore::unscored();
        }

        if player.min > offer.max || player.max < offer.min {
            return CategoryScore::unscored();
        }

        let overlap = offer.max.min(player.max) - offer.min.max(player.min);
        let span = offer.max.max(player.max) - offer.min.min(player.min);

        // Zero span means both ranges are the same single amount.
        let score = if span == 0.0 {
            CATEGORY_CEILINGS.budget
        } else {
            (overlap / span) * CATEGORY_CEILINGS.budget
        };

        CategoryScore::scored(
            score,
            format!(
                "Compatible budget: {}-{}€",
                format_amount(offer.min),
                format_amount(offer.max)
            ),
        )
    }

    fn score_location(&self, athlete: &AthleteProfile, club: &ClubProfile) -> CategoryScore {
        let goals = &athlete.career_goals;

        if goals.willing_to_relocate {
            return CategoryScore::scored(CATEGORY_CEILINGS.location, "Open to relocation");
        }

        match self.distance.distance_km(&athlete.city, &club.city) {
            Ok(distance) if distance <= goals.max_distance_km => CategoryScore::scored(
                CATEGORY_CEILINGS.location,
                format!("Only {:.0} km from home", distance),
            ),
            Ok(_) => CategoryScore::unscored(),
            Err(err) => {
                warn!(
                    athlete_id = %athlete.id,
                    club_id = %club.id,
                    error = %err,
                    "distance lookup failed; location left unscored"
                );
                CategoryScore::unscored()
            }
        }
    }

    fn score_style(&self, athlete: &AthleteProfile, club: &ClubProfile) -> CategoryScore {
        if athlete.embedding_vector.is_empty() || club.embedding_vector.is_empty() {
            return CategoryScore::unscored();
        }

        let similarity = cosine_similarity(&athlete.embedding_vector, &club.embedding_vector);
        // Negative similarity would push the category below zero.
        let score = f64::from(similarity.max(0.0)) * CATEGORY_CEILINGS.style;

        let reasoning = if similarity > self.config.style_excellent_threshold {
            Some("Excellent cultural and playing-style fit".to_string())
        } else if similarity > self.config.style_good_threshold {
            Some("Good cultural fit".to_string())
        } else {
            None
        };

        CategoryScore { score, reasoning }
    }
}

fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::DistanceError;
    use crate::{CareerGoals, ExperienceLevel, PositionCode, RecruitmentNeeds, SalaryRange};

    struct FixedDistance(Option<f64>);

    impl DistanceCalculator for FixedDistance {
        fn distance_km(&self, city_a: &str, _city_b: &str) -> Result<f64, DistanceError> {
            self.0
                .ok_or_else(|| DistanceError::UnknownCity(city_a.to_string()))
        }
    }

    fn scorer_with_distance(distance: Option<f64>) -> MatchScorer {
        MatchScorer::new(MatchingConfig::default(), Arc::new(FixedDistance(distance)))
    }

    /// Unit vectors whose cosine similarity is `similarity`.
    fn vectors_with_similarity(similarity: f32) -> (Vec<f32>, Vec<f32>) {
        let orthogonal = (1.0 - similarity * similarity).sqrt();
        (vec![1.0, 0.0], vec![similarity, orthogonal])
    }

    fn base_athlete() -> AthleteProfile {
        let (athlete_vec, _) = vectors_with_similarity(0.9);
        AthleteProfile {
            id: "athlete-1".into(),
            position: PositionCode::new("striker"),
            level: Some(ExperienceLevel::SemiPro),
            city: "Lyon".into(),
            career_goals: CareerGoals {
                salary_expectation: Some(SalaryRange::new(1000.0, 1500.0)),
                willing_to_relocate: true,
                max_distance_km: 0.0,
                ..CareerGoals::default()
            },
            embedding_vector: athlete_vec,
            ..AthleteProfile::default()
        }
    }

    fn base_club() -> ClubProfile {
        let (_, club_vec) = vectors_with_similarity(0.9);
        ClubProfile {
            id: "club-1".into(),
            city: "Marseille".into(),
            recruitment_needs: RecruitmentNeeds {
                positions: [PositionCode::new("striker")].into_iter().collect(),
                experience_level: Some(ExperienceLevel::SemiPro),
            },
            budget: Some(SalaryRange::new(1200.0, 1800.0)),
            embedding_vector: club_vec,
            ..ClubProfile::default()
        }
    }

    #[test]
    fn end_to_end_scenario_scores_86() {
        let score = scorer_with_distance(Some(9999.0))
            .calculate_match_score(&base_athlete(), &base_club());

        assert_eq!(score.breakdown.position_match, 25.0);
        assert_eq!(score.breakdown.level_match, 25.0);
        assert!((score.breakdown.budget_match - 7.5).abs() < 1e-9);
        assert_eq!(score.breakdown.location_match, 15.0);
        assert!((score.breakdown.style_match - 13.5).abs() < 1e-4);
        assert_eq!(score.total_score, 86);
        assert_eq!(score.reasoning.len(), 5);
        assert!(score.reasoning[0].contains("striker"));
        assert_eq!(score.reasoning[3], "Open to relocation");
        assert_eq!(score.reasoning[4], "Excellent cultural and playing-style fit");
    }

    #[test]
    fn primary_position_match_takes_the_full_ceiling() {
        let mut athlete = base_athlete();
        athlete.secondary_positions = vec![PositionCode::new("winger")];
        let mut club = base_club();
        club.recruitment_needs.positions.insert(PositionCode::new("winger"));

        let score = scorer_with_distance(None).calculate_match_score(&athlete, &club);

        assert_eq!(score.breakdown.position_match, 25.0);
        assert!(score.reasoning[0].starts_with("Primary position"));
    }

    #[test]
    fn secondary_position_match_is_not_additive() {
        let mut athlete = base_athlete();
        athlete.position = PositionCode::new("goalkeeper");
        athlete.secondary_positions = vec![
            PositionCode::new("defender"),
            PositionCode::new("winger"),
            PositionCode::new("striker"),
        ];
        let mut club = base_club();
        club.recruitment_needs.positions = ["winger", "striker"]
            .into_iter()
            .map(PositionCode::new)
            .collect();

        let score = scorer_with_distance(None).calculate_match_score(&athlete, &club);

        assert_eq!(score.breakdown.position_match, 15.0);
        assert_eq!(score.reasoning[0], "Secondary position winger matches a club need");
    }

    #[test]
    fn unmatched_positions_score_zero() {
        let mut athlete = base_athlete();
        athlete.position = PositionCode::new("goalkeeper");
        let scorer = scorer_with_distance(None);

        let score = scorer.calculate_match_score(&athlete, &base_club());

        assert_eq!(score.breakdown.position_match, 0.0);
        assert!(!score.reasoning.iter().any(|r| r.contains("position")));
    }

    #[test]
    fn empty_position_never_matches() {
        let mut athlete = base_athlete();
        athlete.position = PositionCode::default();
        let mut club = base_club();
        club.recruitment_needs.positions.insert(PositionCode::default());

        let score = scorer_with_distance(None).calculate_match_score(&athlete, &club);

        assert_eq!(score.breakdown.position_match, 0.0);
    }

    #[test]
    fn level_adjacency_rules() {
        use ExperienceLevel::*;
        let scorer = scorer_with_distance(None);
        let cases = [
            (Amateur, Amateur, 25.0),
            (SemiPro, SemiPro, 25.0),
            (Professional, Professional, 25.0),
            (Amateur, SemiPro, 15.0),
            (SemiPro, Professional, 15.0),
            (Professional, SemiPro, 15.0),
            (Amateur, Professional, 0.0),
            (Professional, Amateur, 0.0),
        ];

        for (athlete_level, club_level, expected) in cases {
            let mut athlete = base_athlete();
            athlete.level = Some(athlete_level);
            let mut club = base_club();
            club.recruitment_needs.experience_level = Some(club_level);

            let score = scorer.calculate_match_score(&athlete, &club);
            assert_eq!(
                score.breakdown.level_match, expected,
                "{athlete_level:?} vs {club_level:?}"
            );
        }
    }

    #[test]
    fn missing_level_scores_zero() {
        let mut athlete = base_athlete();
        athlete.level = None;

        let score = scorer_with_distance(None).calculate_match_score(&athlete, &base_club());

        assert_eq!(score.breakdown.level_match, 0.0);
    }

    #[test]
    fn budget_overlap_is_proportional() {
        let score = scorer_with_distance(None).calculate_match_score(&base_athlete(), &base_club());

        assert!((score.breakdown.budget_match - 7.5).abs() < 1e-9);
        assert!(score.reasoning.contains(&"Compatible budget: 1200-1800€".to_string()));
    }

    #[test]
    fn disjoint_budgets_yield_zero() {
        let mut athlete = base_athlete();
        athlete.career_goals.salary_expectation = Some(SalaryRange::new(500.0, 800.0));
        let mut club = base_club();
        club.budget = Some(SalaryRange::new(2000.0, 2500.0));

        let score = scorer_with_distance(None).calculate_match_score(&athlete, &club);

        assert_eq!(score.breakdown.budget_match, 0.0);
        assert!(!score.reasoning.iter().any(|r| r.contains("budget")));
    }

    #[test]
    fn identical_single_point_budgets_take_the_full_ceiling() {
        let mut athlete = base_athlete();
        athlete.career_goals.salary_expectation = Some(SalaryRange::new(1500.0, 1500.0));
        let mut club = base_club();
        club.budget = Some(SalaryRange::new(1500.0, 1500.0));

        let score = scorer_with_distance(None).calculate_match_score(&athlete, &club);

        assert_eq!(score.breakdown.budget_match, 20.0);
        assert!(score.breakdown.budget_match.is_finite());
    }

    #[test]
    fn touching_ranges_overlap_with_zero_points() {
        let mut athlete = base_athlete();
        athlete.career_goals.salary_expectation = Some(SalaryRange::new(1000.0, 1200.0));

        let score = scorer_with_distance(None).calculate_match_score(&athlete, &base_club());

        assert_eq!(score.breakdown.budget_match, 0.0);
        assert!(score.reasoning.contains(&"Compatible budget: 1200-1800€".to_string()));
    }

    #[test]
    fn unpaid_roles_on_both_sides_take_the_full_ceiling() {
        let mut athlete = base_athlete();
        athlete.career_goals.salary_expectation = Some(SalaryRange::new(0.0, 0.0));
        let mut club = base_club();
        club.budget = Some(SalaryRange::new(0.0, 0.0));

        let score = scorer_with_distance(None).calculate_match_score(&athlete, &club);

        assert_eq!(score.breakdown.budget_match, 20.0);
        assert!(score.reasoning.contains(&"Compatible budget: 0-0€".to_string()));
    }

    #[test]
    fn unpaid_athlete_touches_a_budget_starting_at_zero() {
        let mut athlete = base_athlete();
        athlete.career_goals.salary_expectation = Some(SalaryRange::new(0.0, 0.0));
        let mut club = base_club();
        club.budget = Some(SalaryRange::new(0.0, 500.0));

        let score = scorer_with_distance(None).calculate_match_score(&athlete, &club);

        assert_eq!(score.breakdown.budget_match, 0.0);
        assert!(score.reasoning.contains(&"Compatible budget: 0-500€".to_string()));
    }

    #[test]
    fn missing_budget_on_either_side_is_unscored() {
        let scorer = scorer_with_distance(None);

        let mut athlete = base_athlete();
        athlete.career_goals.salary_expectation = None;
        let score = scorer.calculate_match_score(&athlete, &base_club());
        assert_eq!(score.breakdown.budget_match, 0.0);
        assert!(!score.reasoning.iter().any(|r| r.contains("budget")));

        let mut club = base_club();
        club.budget = None;
        let score = scorer.calculate_match_score(&base_athlete(), &club);
        assert_eq!(score.breakdown.budget_match, 0.0);
        assert!(!score.reasoning.iter().any(|r| r.contains("budget")));
    }

    #[test]
    fn inverted_budget_is_ignored() {
        let mut athlete = base_athlete();
        athlete.career_goals.salary_expectation = Some(SalaryRange::new(1500.0, 1000.0));

        let score = scorer_with_distance(None).calculate_match_score(&athlete, &base_club());

        assert_eq!(score.breakdown.budget_match, 0.0);
    }

    #[test]
    fn relocation_bonus_ignores_distance() {
        let score = scorer_with_distance(None).calculate_match_score(&base_athlete(), &base_club());
        assert_eq!(score.breakdown.location_match, 15.0);

        let score =
            scorer_with_distance(Some(10_000.0)).calculate_match_score(&base_athlete(), &base_club());
        assert_eq!(score.breakdown.location_match, 15.0);
    }

    #[test]
    fn location_threshold_is_inclusive() {
        let mut athlete = base_athlete();
        athlete.career_goals.willing_to_relocate = false;
        athlete.career_goals.max_distance_km = 100.0;

        let near = scorer_with_distance(Some(100.0)).calculate_match_score(&athlete, &base_club());
        assert_eq!(near.breakdown.location_match, 15.0);
        assert!(near.reasoning.contains(&"Only 100 km from home".to_string()));

        let far = scorer_with_distance(Some(100.5)).calculate_match_score(&athlete, &base_club());
        assert_eq!(far.breakdown.location_match, 0.0);
    }

    #[test]
    fn distance_failure_leaves_location_unscored() {
        let mut athlete = base_athlete();
        athlete.career_goals.willing_to_relocate = false;
        athlete.career_goals.max_distance_km = 500.0;

        let score = scorer_with_distance(None).calculate_match_score(&athlete, &base_club());

        assert_eq!(score.breakdown.location_match, 0.0);
        assert_eq!(score.reasoning.len(), 4);
    }

    #[test]
    fn style_reasoning_thresholds() {
        let scorer = scorer_with_distance(None);
        let cases = [
            (0.95, Some("Excellent cultural and playing-style fit")),
            (0.7, Some("Good cultural fit")),
            (0.5, None),
        ];

        for (similarity, expected) in cases {
            let (a, b) = vectors_with_similarity(similarity);
            let mut athlete = base_athlete();
            athlete.embedding_vector = a;
            let mut club = base_club();
            club.embedding_vector = b;

            let score = scorer.calculate_match_score(&athlete, &club);

            assert!((score.breakdown.style_match - similarity as f64 * 15.0).abs() < 1e-4);
            let style_line = score
                .reasoning
                .iter()
                .find(|r| r.contains("fit"))
                .map(String::as_str);
            assert_eq!(style_line, expected, "similarity {similarity}");
        }
    }

    #[test]
    fn negative_similarity_is_clamped_to_zero() {
        let mut athlete = base_athlete();
        athlete.embedding_vector = vec![1.0, 0.0];
        let mut club = base_club();
        club.embedding_vector = vec![-1.0, 0.0];

        let score = scorer_with_distance(None).calculate_match_score(&athlete, &club);

        assert_eq!(score.breakdown.style_match, 0.0);
    }

    #[test]
    fn missing_or_mismatched_vectors_score_zero() {
        let scorer = scorer_with_distance(None);

        let mut athlete = base_athlete();
        athlete.embedding_vector.clear();
        let score = scorer.calculate_match_score(&athlete, &base_club());
        assert_eq!(score.breakdown.style_match, 0.0);

        let mut club = base_club();
        club.embedding_vector = vec![1.0, 0.0, 0.0];
        let score = scorer.calculate_match_score(&base_athlete(), &club);
        assert_eq!(score.breakdown.style_match, 0.0);

        let mut club = base_club();
        club.embedding_vector = vec![0.0; 2];
        let score = scorer.calculate_match_score(&base_athlete(), &club);
        assert_eq!(score.breakdown.style_match, 0.0);
    }

    #[test]
    fn empty_profiles_score_zero_without_reasoning() {
        let athlete = AthleteProfile::default();
        let club = ClubProfile::default();

        let score = scorer_with_distance(None).calculate_match_score(&athlete, &club);

        assert_eq!(score.total_score, 0);
        assert!(score.reasoning.is_empty());
        assert_eq!(score.breakdown, ScoreBreakdown::default());
    }

    #[test]
    fn totals_are_bounded_and_match_the_breakdown() {
        use ExperienceLevel::*;
        let scorer = scorer_with_distance(Some(42.0));
        let levels = [Amateur, SemiPro, Professional];
        let similarities = [-0.9, 0.0, 0.55, 0.81, 1.0];
        let budgets = [(0.0, 0.0), (500.0, 800.0), (1000.0, 5000.0), (1700.0, 1700.0)];

        for level in levels {
            for similarity in similarities {
                for (min, max) in budgets {
                    for relocate in [true, false] {
                        let (a, b) = vectors_with_similarity(similarity);
                        let mut athlete = base_athlete();
                        athlete.level = Some(level);
                        athlete.embedding_vector = a;
                        athlete.career_goals.salary_expectation = Some(SalaryRange::new(min, max));
                        athlete.career_goals.willing_to_relocate = relocate;
                        athlete.career_goals.max_distance_km = 50.0;
                        let mut club = base_club();
                        club.embedding_vector = b;

                        let score = scorer.calculate_match_score(&athlete, &club);
                        let b = score.breakdown;

                        assert!(score.total_score <= 100);
                        assert_eq!(score.total_score as f64, b.sum().round());
                        assert!((0.0..=25.0).contains(&b.position_match));
                        assert!((0.0..=25.0).contains(&b.level_match));
                        assert!((0.0..=20.0).contains(&b.budget_match));
                        assert!((0.0..=15.0).contains(&b.location_match));
                        assert!((0.0..=15.0).contains(&b.style_match));
                        assert!(score.reasoning.len() <= 5);
                    }
                }
            }
        }
    }

    #[test]
    fn scoring_is_idempotent() {
        let scorer = scorer_with_distance(Some(12.0));
        let first = scorer.calculate_match_score(&base_athlete(), &base_club());
        let second = scorer.calculate_match_score(&base_athlete(), &base_club());

        assert_eq!(first, second);
    }

    #[test]
    fn default_scorer_uses_the_gazetteer() {
        let mut athlete = base_athlete();
        athlete.career_goals.willing_to_relocate = false;
        athlete.career_goals.max_distance_km = 50.0;
        athlete.city = "Paris".into();
        let mut club = base_club();
        club.city = "Saint-Denis".into();

        let near = calculate_match_score(&athlete, &club);
        assert_eq!(near.breakdown.location_match, 15.0);

        club.city = "Marseille".into();
        let far = calculate_match_score(&athlete, &club);
        assert_eq!(far.breakdown.location_match, 0.0);
    }

    #[test]
    fn thresholds_can_be_tightened() {
        let config = MatchingConfig {
            style_excellent_threshold: 0.95,
            style_good_threshold: 0.85,
            ..MatchingConfig::default()
        };
        let scorer = MatchScorer::new(config, Arc::new(FixedDistance(None)));

        let score = scorer.calculate_match_score(&base_athlete(), &base_club());

        assert!(score.reasoning.contains(&"Good cultural fit".to_string()));
    }

    #[test]
    fn partial_credit_cannot_exceed_the_category_ceiling() {
        let config = MatchingConfig {
            secondary_position_points: 40.0,
            adjacent_level_points: -5.0,
            ..MatchingConfig::default()
        };
        let scorer = MatchScorer::new(config, Arc::new(FixedDistance(None)));
        assert_eq!(scorer.config().secondary_position_points, 25.0);
        assert_eq!(scorer.config().adjacent_level_points, 0.0);

        let mut athlete = base_athlete();
        athlete.position = PositionCode::new("goalkeeper");
        athlete.secondary_positions = vec![PositionCode::new("striker")];
        athlete.level = Some(ExperienceLevel::Professional);

        let score = scorer.calculate_match_score(&athlete, &base_club());

        assert_eq!(score.breakdown.position_match, 25.0);
        assert_eq!(score.breakdown.level_match, 0.0);
        assert!(score.total_score <= 100);
    }

    #[test]
    fn good_threshold_never_exceeds_excellent() {
        let config = MatchingConfig {
            style_excellent_threshold: 0.6,
            style_good_threshold: 0.8,
            ..MatchingConfig::default()
        }
        .normalized();
        assert_eq!(config.style_good_threshold, 0.6);

        assert_eq!(ordered_thresholds(0.9, 0.7), (0.9, 0.7));
        assert_eq!(ordered_thresholds(0.7, 0.7), (0.7, 0.7));
        assert_eq!(ordered_thresholds(0.5, 0.9), (0.8, 0.6));
    }
}
