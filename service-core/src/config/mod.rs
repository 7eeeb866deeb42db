//! Shared settings loader.
//!
//! Services declare the environment variables they read; the loader layers an
//! optional `configuration.*` file under those variables and deserializes the
//! result into the service's settings struct.

use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::env;

/// Collect the given variables from the process environment.
///
/// Loads `.env` first so local development does not need exported variables.
/// Unset variables are left out so serde defaults apply.
pub fn collect_env(keys: &[&str]) -> HashMap<String, String> {
    dotenvy::dotenv().ok();

    keys.iter()
        .filter_map(|key| env::var(key).ok().map(|value| (key.to_string(), value)))
        .collect()
}

/// Build settings from an explicit variable map.
///
/// Values are type-coerced (`"200"` becomes an integer, `"0.7"` a float); a
/// value that cannot be coerced into the target field fails with
/// [`AppError::ConfigError`] naming the key.
pub fn load_settings<T: DeserializeOwned>(vars: HashMap<String, String>) -> Result<T, AppError> {
    let config = Cfg::builder()
        .add_source(File::with_name("configuration").required(false))
        .add_source(Environment::default().source(Some(vars)).try_parsing(true))
        .build()?;

    Ok(config.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default = "default_port")]
        port: u16,
        #[serde(default)]
        name: String,
        #[serde(default)]
        ratio: f32,
    }

    fn default_port() -> u16 {
        8080
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn uppercase_keys_map_onto_fields() {
        let sample: Sample =
            load_settings(vars(&[("PORT", "9000"), ("NAME", "svc"), ("RATIO", "0.5")])).unwrap();
        assert_eq!(sample.port, 9000);
        assert_eq!(sample.name, "svc");
        assert!((sample.ratio - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_keys_use_serde_defaults() {
        let sample: Sample = load_settings(HashMap::new()).unwrap();
        assert_eq!(sample.port, 8080);
        assert!(sample.name.is_empty());
    }

    #[test]
    fn uncoercible_value_is_a_config_error() {
        let result: Result<Sample, _> = load_settings(vars(&[("PORT", "not-a-port")]));
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
