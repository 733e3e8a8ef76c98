use std::collections::BTreeMap;
use std::sync::LazyLock;

use strsim::damerau_levenshtein;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::haversine::Coordinates;

const CITIES: &[(&str, f64, f64)] = &[
    // France
    ("paris", 48.8566, 2.3522),
    ("saint denis", 48.9362, 2.3574),
    ("boulogne billancourt", 48.8397, 2.2399),
    ("nanterre", 48.8924, 2.2071),
    ("versailles", 48.8049, 2.1204),
    ("creteil", 48.7904, 2.4556),
    ("marseille", 43.2965, 5.3698),
    ("lyon", 45.7640, 4.8357),
    ("toulouse", 43.6047, 1.4442),
    ("nice", 43.7102, 7.2620),
    ("nantes", 47.2184, -1.5536),
    ("strasbourg", 48.5734, 7.7521),
    ("montpellier", 43.6108, 3.8767),
    ("bordeaux", 44.8378, -0.5792),
    ("lille", 50.6292, 3.0573),
    ("rennes", 48.1173, -1.6778),
    ("reims", 49.2583, 4.0317),
    ("saint etienne", 45.4397, 4.3872),
    ("toulon", 43.1242, 5.9280),
    ("le havre", 49.4944, 0.1079),
    ("grenoble", 45.1885, 5.7245),
    ("dijon", 47.3220, 5.0415),
    ("angers", 47.4784, -0.5632),
    ("nimes", 43.8367, 4.3601),
    ("clermont ferrand", 45.7772, 3.0870),
    ("brest", 48.3904, -4.4861),
    ("metz", 49.1193, 6.1757),
    ("nancy", 48.6921, 6.1844),
    ("lens", 50.4320, 2.8333),
    ("auxerre", 47.7982, 3.5673),
    ("lorient", 47.7483, -3.3700),
    ("caen", 49.1829, -0.3707),
    ("amiens", 49.8941, 2.2958),
    ("le mans", 48.0061, 0.1996),
    ("tours", 47.3941, 0.6848),
    ("orleans", 47.9030, 1.9093),
    ("rouen", 49.4432, 1.0999),
    ("ajaccio", 41.9192, 8.7386),
    ("bastia", 42.6973, 9.4509),
    ("guingamp", 48.5627, -3.1500),
    ("montbeliard", 47.5097, 6.7983),
    ("troyes", 48.2973, 4.0744),
    ("valenciennes", 50.3570, 3.5235),
    ("niort", 46.3237, -0.4588),
    ("laval", 48.0707, -0.7734),
    ("annecy", 45.8992, 6.1294),
    ("pau", 43.2951, -0.3708),
    ("perpignan", 42.6887, 2.8948),
    ("limoges", 45.8336, 1.2611),
    ("besancon", 47.2378, 6.0241),
    ("monaco", 43.7384, 7.4246),
    // Neighbouring countries
    ("brussels", 50.8503, 4.3517),
    ("liege", 50.6326, 5.5797),
    ("charleroi", 50.4108, 4.4446),
    ("luxembourg", 49.6116, 6.1319),
    ("geneva", 46.2044, 6.1432),
    ("lausanne", 46.5197, 6.6323),
    ("zurich", 47.3769, 8.5417),
    ("london", 51.5074, -0.1278),
    ("manchester", 53.4808, -2.2426),
    ("madrid", 40.4168, -3.7038),
    ("barcelona", 41.3874, 2.1686),
    ("lisbon", 38.7223, -9.1393),
    ("porto", 41.1579, -8.6291),
    ("milan", 45.4642, 9.1900),
    ("turin", 45.0703, 7.6869),
    ("rome", 41.9028, 12.4964),
    ("munich", 48.1351, 11.5820),
    ("berlin", 52.5200, 13.4050),
    ("dortmund", 51.5136, 7.4653),
    ("amsterdam", 52.3676, 4.9041),
    ("rotterdam", 51.9244, 4.4777),
];

const ALIASES: &[(&str, &str)] = &[
    ("marseilles", "marseille"),
    ("lyons", "lyon"),
    ("st denis", "saint denis"),
    ("st etienne", "saint etienne"),
    ("boulogne", "boulogne billancourt"),
    ("sochaux", "montbeliard"),
    ("bruxelles", "brussels"),
    ("brussel", "brussels"),
    ("luik", "liege"),
    ("geneve", "geneva"),
    ("genf", "geneva"),
    ("londres", "london"),
    ("lisboa", "lisbon"),
    ("lisbonne", "lisbon"),
    ("milano", "milan"),
    ("torino", "turin"),
    ("roma", "rome"),
    ("munchen", "munich"),
    ("barcelone", "barcelona"),
    ("monte carlo", "monaco"),
];

static BUILTIN: LazyLock<BTreeMap<String, Coordinates>> = LazyLock::new(|| {
    CITIES
        .iter()
        .map(|(name, lat, lon)| ((*name).to_string(), Coordinates::new(*lat, *lon)))
        .collect()
});

static ALIAS_TO_CITY: LazyLock<BTreeMap<&'static str, &'static str>> =
    LazyLock::new(|| ALIASES.iter().copied().collect());

/// Lookup key for a free-text city name: accents stripped, lower-cased,
/// punctuation and digits folded to single spaces.
///
/// `"  Saint-Étienne (42) "` becomes `"saint etienne"`.
pub fn normalize_city(input: &str) -> String {
    let folded: String = input
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphabetic() { c } else { ' ' })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// City name to coordinates table.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    cities: BTreeMap<String, Coordinates>,
}

impl Default for Gazetteer {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Gazetteer {
    pub fn builtin() -> Self {
        Self {
            cities: BUILTIN.clone(),
        }
    }

    pub fn empty() -> Self {
        Self {
            cities: BTreeMap::new(),
        }
    }

    /// Registers (or replaces) a city under its normalised name.
    pub fn with_city(mut self, name: &str, coordinates: Coordinates) -> Self {
        self.insert(name, coordinates);
        self
    }

    pub fn insert(&mut self, name: &str, coordinates: Coordinates) {
        let key = normalize_city(name);
        if !key.is_empty() {
            self.cities.insert(key, coordinates);
        }
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Exact match, then alias, then a single-edit fuzzy match.
    pub fn lookup(&self, name: &str) -> Option<Coordinates> {
        let key = normalize_city(name);
        if key.is_empty() {
            return None;
        }

        if let Some(coordinates) = self.cities.get(&key) {
            return Some(*coordinates);
        }

        if let Some(canonical) = ALIAS_TO_CITY.get(key.as_str()) {
            if let Some(coordinates) = self.cities.get(*canonical) {
                return Some(*coordinates);
            }
        }

        self.fuzzy_lookup(&key)
    }

    fn fuzzy_lookup(&self, key: &str) -> Option<Coordinates> {
        // Short names ("pau", "lens", "nice") are too close to each other.
        if key.chars().count() < 5 {
            return None;
        }

        // Keys iterate in order, so the first hit wins ties.
        self.cities
            .iter()
            .filter(|(candidate, _)| candidate.chars().count() >= 5)
            .find(|(candidate, _)| damerau_levenshtein(key, candidate) == 1)
            .map(|(_, coordinates)| *coordinates)
    }
}
