use serde::Serialize;

use super::hunter::{HunterConfig, HunterHand};
use super::sweeper::{SweeperConfig, SweeperHand};
use super::{HandManifestEntry, IdleHand, SensorConfig, SyntheticHand};

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(tag = "style", rename_all = "snake_case")]
enum HandStyle {
    Idle,
    Sweeper(SweeperConfig),
    Hunter(HunterConfig),
}

impl HandStyle {
    fn family(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Sweeper(_) => "sweeper",
            Self::Hunter(_) => "hunter",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
struct HandProfile {
    id: &'static str,
    description: &'static str,
    style: HandStyle,
}

const STEADY_SENSOR: SensorConfig = SensorConfig {
    sample_rate_hz: 60.0,
    jitter: 0.003,
    low_confidence_chance: 0.02,
};

const WEBCAM_SENSOR: SensorConfig = SensorConfig {
    sample_rate_hz: 30.0,
    jitter: 0.004,
    low_confidence_chance: 0.03,
};

const SHAKY_SENSOR: SensorConfig = SensorConfig {
    sample_rate_hz: 30.0,
    jitter: 0.012,
    low_confidence_chance: 0.12,
};

const HAND_PROFILES: &[HandProfile] = &[
    HandProfile {
        id: "idle",
        description: "No hand in view. Baseline for how long a round lasts untouched.",
        style: HandStyle::Idle,
    },
    HandProfile {
        id: "sweeper",
        description: "Blind back-and-forth sweeps across the upper field at webcam rate.",
        style: HandStyle::Sweeper(SweeperConfig {
            sensor: WEBCAM_SENSOR,
            amplitude: 0.38,
            period_seconds: 1.1,
            height: 0.42,
            height_sway: 0.22,
            sway_period_seconds: 4.3,
        }),
    },
    HandProfile {
        id: "hunter",
        description: "Targets the lowest fruit and swipes through its predicted position.",
        style: HandStyle::Hunter(HunterConfig {
            sensor: STEADY_SENSOR,
            stroke_length: 0.45,
            stroke_seconds: 0.12,
            rest_seconds: 0.2,
            bomb_clearance: 0.06,
            min_target_y: 0.08,
            max_target_y: 0.92,
        }),
    },
    HandProfile {
        id: "hunter-shaky",
        description: "Hunter behind a noisy low-rate detector with frequent dropouts.",
        style: HandStyle::Hunter(HunterConfig {
            sensor: SHAKY_SENSOR,
            stroke_length: 0.5,
            stroke_seconds: 0.15,
            rest_seconds: 0.22,
            bomb_clearance: 0.08,
            min_target_y: 0.1,
            max_target_y: 0.9,
        }),
    },
];

pub fn hand_ids() -> Vec<&'static str> {
    HAND_PROFILES.iter().map(|profile| profile.id).collect()
}

pub fn describe_hands() -> Vec<(&'static str, &'static str)> {
    HAND_PROFILES
        .iter()
        .map(|profile| (profile.id, profile.description))
        .collect()
}

pub fn create_hand(id: &str) -> Option<Box<dyn SyntheticHand + Send>> {
    let profile = HAND_PROFILES.iter().find(|profile| profile.id == id)?;
    let hand: Box<dyn SyntheticHand + Send> = match profile.style {
        HandStyle::Idle => Box::new(IdleHand),
        HandStyle::Sweeper(cfg) => Box::new(SweeperHand::new(profile.id, profile.description, cfg)),
        HandStyle::Hunter(cfg) => Box::new(HunterHand::new(profile.id, profile.description, cfg)),
    };
    Some(hand)
}

/// FNV-1a over the profile's JSON encoding.
fn hash_json(value: &serde_json::Value) -> Option<String> {
    let encoded = serde_json::to_vec(value).ok()?;
    let digest = encoded.iter().fold(0x811C_9DC5u32, |hash, byte| {
        (hash ^ *byte as u32).wrapping_mul(0x0100_0193)
    });
    Some(format!("{digest:08x}"))
}

pub fn hand_manifest_entries() -> Vec<HandManifestEntry> {
    HAND_PROFILES
        .iter()
        .filter_map(|profile| {
            let config = serde_json::to_value(profile).ok()?;
            Some(HandManifestEntry {
                id: profile.id.to_string(),
                family: profile.style.family().to_string(),
                description: profile.description.to_string(),
                config_hash: hash_json(&config)?,
                config,
            })
        })
        .collect()
}

pub fn hand_fingerprint(id: &str) -> Option<String> {
    hand_manifest_entries()
        .into_iter()
        .find(|entry| entry.id == id)
        .map(|entry| entry.config_hash)
}
