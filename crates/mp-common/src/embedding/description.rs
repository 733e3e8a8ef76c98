use crate::{AthleteProfile, ClubProfile, SalaryRange};

const UNKNOWN: &str = "Unknown";
const NONE: &str = "None";

fn list_or(values: &[String], fallback: &str) -> String {
    if values.is_empty() {
        fallback.to_string()
    } else {
        values.join(", ")
    }
}

fn budget(range: Option<SalaryRange>, unit: &str) -> String {
    match range {
        Some(range) => format!("{}-{}{unit}", range.min, range.max),
        None => UNKNOWN.to_string(),
    }
}

/// Profile summary fed to the embedding generator. Labels stay in French,
/// the language of the profiles themselves.
pub fn athlete_description(athlete: &AthleteProfile) -> String {
    let name = if athlete.name.trim().is_empty() {
        UNKNOWN
    } else {
        athlete.name.trim()
    };
    let position = if athlete.position.is_empty() {
        UNKNOWN
    } else {
        athlete.position.as_str()
    };
    let level = athlete.level.map(|level| level.into()).unwrap_or(UNKNOWN);
    let goals = &athlete.career_goals;

    [
        format!("Joueur: {name}"),
        format!("Position: {position}"),
        format!("Niveau: {level}"),
        format!("Expérience: {} ans", athlete.experience_years),
        format!("Points forts: {}", list_or(&athlete.strengths, NONE)),
        format!("Style de jeu: {}", list_or(&athlete.playing_style, NONE)),
        format!("Personnalité: {}", list_or(&athlete.personality_traits, NONE)),
        format!(
            "Divisions souhaitées: {}",
            list_or(&goals.desired_divisions, NONE)
        ),
        format!("Budget: {}", budget(goals.salary_expectation, "€")),
        format!(
            "Mobilité: {}",
            if goals.willing_to_relocate { "Oui" } else { "Non" }
        ),
    ]
    .join("\n")
}

pub fn club_description(club: &ClubProfile) -> String {
    let needs = &club.recruitment_needs;
    let positions: Vec<String> = needs.positions.iter().map(ToString::to_string).collect();
    let level = needs.experience_level.map(|level| level.into()).unwrap_or(UNKNOWN);

    [
        format!("Club: {}", club.name.trim()),
        format!("Division: {}", club.division.trim()),
        format!("Recherche: {}", positions.join(", ")),
        format!("Budget: {}", budget(club.budget, "€/mois")),
        format!("Style de jeu: {}", club.playing_style.join(", ")),
        format!("Culture: {}", club.team_culture.join(", ")),
        format!("Installations: {}", club.facilities.join(", ")),
        format!("Niveau: {level}"),
    ]
    .join("\n")
}
