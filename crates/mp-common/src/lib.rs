pub mod embedding;
pub mod geo;
pub mod logging;
pub mod matching;
pub mod record;
pub mod run_id;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, EnumString, IntoStaticStr};

pub use matching::{MatchScore, ScoreBreakdown, calculate_match_score, cosine_similarity};

/// Playing position code ("striker", "midfielder", ...), stored trimmed and lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PositionCode(String);

impl PositionCode {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for PositionCode {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for PositionCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<PositionCode> for String {
    fn from(value: PositionCode) -> Self {
        value.0
    }
}

impl fmt::Display for PositionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Skill tier, totally ordered amateur < semi-pro < professional.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, AsRefStr,
    EnumString, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum ExperienceLevel {
    #[serde(rename = "amateur")]
    #[strum(serialize = "amateur")]
    Amateur,
    #[serde(rename = "semi-pro")]
    #[strum(to_string = "semi-pro", serialize = "semi_pro", serialize = "semipro")]
    SemiPro,
    #[serde(rename = "professional")]
    #[strum(to_string = "professional", serialize = "pro")]
    Professional,
}

impl ExperienceLevel {
    pub fn rank(self) -> u8 {
        match self {
            ExperienceLevel::Amateur => 1,
            ExperienceLevel::SemiPro => 2,
            ExperienceLevel::Professional => 3,
        }
    }
}

/// Unknown level strings are treated as "not provided" rather than rejecting the profile.
fn lenient_level<'de, D>(deserializer: D) -> Result<Option<ExperienceLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| ExperienceLevel::from_str(value.trim()).ok()))
}

/// Monthly compensation range in a single currency unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
}

impl SalaryRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `0 <= min <= max`, both finite.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min >= 0.0 && self.min <= self.max
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerGoals {
    /// `None` when the athlete left the expectation blank; `[0, 0]` is an unpaid role.
    #[serde(default)]
    pub salary_expectation: Option<SalaryRange>,
    #[serde(default)]
    pub willing_to_relocate: bool,
    /// Only consulted when `willing_to_relocate` is false.
    #[serde(default)]
    pub max_distance_km: f64,
    #[serde(default)]
    pub desired_divisions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sport: Option<String>,
    pub position: PositionCode,
    #[serde(default)]
    pub secondary_positions: Vec<PositionCode>,
    #[serde(default, deserialize_with = "lenient_level")]
    pub level: Option<ExperienceLevel>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub experience_years: u32,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub playing_style: Vec<String>,
    #[serde(default)]
    pub personality_traits: Vec<String>,
    #[serde(default)]
    pub career_goals: CareerGoals,
    /// Empty when embedding generation failed or never ran.
    #[serde(default)]
    pub embedding_vector: Vec<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecruitmentNeeds {
    #[serde(default)]
    pub positions: BTreeSet<PositionCode>,
    #[serde(default, deserialize_with = "lenient_level")]
    pub experience_level: Option<ExperienceLevel>,
}

impl RecruitmentNeeds {
    pub fn seeks(&self, position: &PositionCode) -> bool {
        !position.is_empty() && self.positions.contains(position)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubProfile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub division: String,
    #[serde(default)]
    pub city: String,
    #[serde(default = "default_active_recruitment")]
    pub active_recruitment: bool,
    #[serde(default)]
    pub recruitment_needs: RecruitmentNeeds,
    #[serde(default)]
    pub budget: Option<SalaryRange>,
    #[serde(default)]
    pub playing_style: Vec<String>,
    #[serde(default)]
    pub team_culture: Vec<String>,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub embedding_vector: Vec<f32>,
}

const fn default_active_recruitment() -> bool {
    true
}

impl Default for ClubProfile {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            sport: None,
            division: String::new(),
            city: String::new(),
            active_recruitment: default_active_recruitment(),
            recruitment_needs: RecruitmentNeeds::default(),
            budget: None,
            playing_style: Vec::new(),
            team_culture: Vec::new(),
            facilities: Vec::new(),
            embedding_vector: Vec::new(),
        }
    }
}
