use anyhow::{Context, Result};
use slice_core::{Difficulty, GameConfig};
use std::fs;
use std::path::Path;

/// Reads a JSON config (missing keys take defaults), applies the difficulty
/// override, and validates the result.
pub fn load_config(path: Option<&Path>, difficulty: Option<Difficulty>) -> Result<GameConfig> {
    let mut config = match path {
        Some(path) => {
            let data = fs::read_to_string(path)
                .with_context(|| format!("failed reading config {}", path.display()))?;
            serde_json::from_str::<GameConfig>(&data)
                .with_context(|| format!("failed parsing config {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    if let Some(difficulty) = difficulty {
        config.difficulty = difficulty;
    }
    config.validate().context("invalid game config")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_a_file() -> Result<()> {
        let config = load_config(None, Some(Difficulty::Hard))?;
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.max_lives, GameConfig::default().max_lives);
        Ok(())
    }

    #[test]
    fn partial_file_keeps_other_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("game.json");
        fs::write(&path, r#"{ "spawn_rate": 1.0, "max_lives": 5 }"#)?;
        let config = load_config(Some(&path), None)?;
        assert_eq!(config.spawn_rate, 1.0);
        assert_eq!(config.max_lives, 5);
        assert_eq!(config.gravity, GameConfig::default().gravity);
        Ok(())
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let unknown = dir.path().join("unknown.json");
        fs::write(&unknown, r#"{ "spawn_rat": 1.0 }"#)?;
        assert!(load_config(Some(&unknown), None).is_err());

        let inverted = dir.path().join("inverted.json");
        fs::write(
            &inverted,
            r#"{ "slice_activation_threshold": 0.5, "slice_deactivation_threshold": 0.9 }"#,
        )?;
        let err = load_config(Some(&inverted), None).expect_err("threshold order");
        assert!(format!("{err:#}").contains("deactivation"));
        Ok(())
    }
}
