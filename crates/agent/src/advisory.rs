//! Advisory deriver: destination and trip length from free text, mapped to
//! weather and disaster-risk narratives.
//!
//! Extraction is a plain token heuristic. Nothing is validated, so
//! "I want to know" yields the destination "Know"; that is accepted.

use serde::{Deserialize, Serialize};
use tracing::debug;
use tripcover_config::AdvisoryConfig;

/// What is currently known about the trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryState {
    pub destination: Option<String>,
    pub duration: Option<String>,
    pub weather: Option<String>,
    pub disaster_risk: Option<String>,
}

impl AdvisoryState {
    /// Both destination and duration are known.
    pub fn is_complete(&self) -> bool {
        self.destination.is_some() && self.duration.is_some()
    }
}

/// High-risk list and narrative templates.
#[derive(Debug, Clone)]
pub struct AdvisoryPolicy {
    high_risk_destinations: Vec<String>,
    high_risk_weather: String,
    moderate_weather: String,
    disaster_risk: String,
}

impl AdvisoryPolicy {
    pub fn from_config(config: &AdvisoryConfig) -> Self {
        Self {
            high_risk_destinations: config.high_risk_destinations.clone(),
            high_risk_weather: config.high_risk_weather.clone(),
            moderate_weather: config.moderate_weather.clone(),
            disaster_risk: config.disaster_risk.clone(),
        }
    }

    /// Case-insensitive exact match against the high-risk list.
    pub fn is_high_risk(&self, destination: &str) -> bool {
        self.high_risk_destinations
            .iter()
            .any(|d| d.eq_ignore_ascii_case(destination))
    }

    /// Fold one user utterance into the prior state.
    ///
    /// Destination and duration are sticky: an utterance that yields nothing
    /// leaves the previous value in place. Narratives are recomputed only
    /// once both are known.
    pub fn derive(&self, utterance: &str, prior: &AdvisoryState) -> AdvisoryState {
        let mut next = prior.clone();

        if let Some(destination) = extract_destination(utterance) {
            next.destination = Some(destination);
        }
        if let Some(duration) = extract_duration(utterance) {
            next.duration = Some(duration);
        }

        if let (Some(destination), Some(duration)) = (&next.destination, &next.duration) {
            let high_risk = self.is_high_risk(destination);
            let weather_template = if high_risk {
                &self.high_risk_weather
            } else {
                &self.moderate_weather
            };

            next.weather = Some(fill(weather_template, destination, duration));
            next.disaster_risk = high_risk.then(|| fill(&self.disaster_risk, destination, duration));

            debug!(destination, duration, high_risk, "Advisory recomputed");
        }

        next
    }
}

impl Default for AdvisoryPolicy {
    fn default() -> Self {
        Self::from_config(&AdvisoryConfig::default())
    }
}

/// The token right after `to`, title-cased.
pub fn extract_destination(utterance: &str) -> Option<String> {
    let lowered = utterance.to_lowercase();
    let mut tokens = lowered.split_whitespace();
    tokens.by_ref().find(|t| *t == "to")?;
    tokens.next().map(title_case)
}

/// The first all-digit token, provided the utterance mentions `day`.
pub fn extract_duration(utterance: &str) -> Option<String> {
    if !utterance.to_lowercase().contains("day") {
        return None;
    }
    utterance
        .split_whitespace()
        .find(|t| t.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn fill(template: &str, destination: &str, duration: &str) -> String {
    template
        .replace("{destination}", destination)
        .replace("{duration}", duration)
}
