//! Municipality configuration: a display name and the reference point that
//! zones are computed against.
//!
//! Resolution order is config file, then `REFERENCE_LAT` / `REFERENCE_LNG`
//! environment overrides, then the built-in Miahuatlán defaults.
//!
//! ```toml
//! name = "Miahuatlán de Porfirio Díaz"
//!
//! [reference]
//! lat = 16.3219
//! lng = -96.5958
//! ```

use std::path::Path;

use baches_report_models::Coordinate;
use serde::Deserialize;

use crate::ConfigError;
use crate::zone::ZoneClassifier;

/// Center of Miahuatlán de Porfirio Díaz, Oaxaca.
pub const MIAHUATLAN_CENTER: Coordinate = Coordinate::new(16.3219, -96.5958);

/// Default municipality name.
pub const MIAHUATLAN_NAME: &str = "Miahuatlán de Porfirio Díaz";

/// Environment variable overriding the reference latitude.
pub const REFERENCE_LAT_ENV: &str = "REFERENCE_LAT";

/// Environment variable overriding the reference longitude.
pub const REFERENCE_LNG_ENV: &str = "REFERENCE_LNG";

/// A municipality whose reports are zoned around one reference point.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Municipality {
    /// Display name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Reference point for zone classification.
    #[serde(default = "default_reference")]
    pub reference: Coordinate,
}

fn default_name() -> String {
    MIAHUATLAN_NAME.to_string()
}

const fn default_reference() -> Coordinate {
    MIAHUATLAN_CENTER
}

impl Default for Municipality {
    fn default() -> Self {
        Self {
            name: default_name(),
            reference: default_reference(),
        }
    }
}

impl Municipality {
    /// Parses a municipality from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the document is malformed, or
    /// [`ConfigError::Reference`] if the reference point is out of range.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let municipality: Self = toml::from_str(toml_str)?;
        municipality.reference.validated()?;
        Ok(municipality)
    }

    /// Loads a municipality from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Loading municipality config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Resolves the municipality from an optional config file plus the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or an environment
    /// override is not a number.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let municipality = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        let municipality = municipality.with_overrides(
            std::env::var(REFERENCE_LAT_ENV).ok().as_deref(),
            std::env::var(REFERENCE_LNG_ENV).ok().as_deref(),
        )?;

        log::info!(
            "Using municipality {} with reference point {}",
            municipality.name,
            municipality.reference
        );

        Ok(municipality)
    }

    /// Applies raw latitude/longitude overrides (as read from the
    /// environment) on top of this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if a value is not a number, or
    /// [`ConfigError::Reference`] if the result is out of range.
    pub fn with_overrides(
        mut self,
        lat: Option<&str>,
        lng: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if let Some(lat) = lat {
            self.reference.lat = parse_override(REFERENCE_LAT_ENV, lat)?;
        }
        if let Some(lng) = lng {
            self.reference.lng = parse_override(REFERENCE_LNG_ENV, lng)?;
        }
        self.reference.validated()?;
        Ok(self)
    }

    /// A [`ZoneClassifier`] around this municipality's reference point.
    #[must_use]
    pub const fn classifier(&self) -> ZoneClassifier {
        ZoneClassifier::new(self.reference)
    }
}

fn parse_override(name: &'static str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let municipality = Municipality::from_toml_str(
            r#"
            name = "Oaxaca de Juárez"

            [reference]
            lat = 17.0606
            lng = -96.7253
            "#,
        )
        .unwrap();

        assert_eq!(municipality.name, "Oaxaca de Juárez");
        assert_eq!(municipality.reference, Coordinate::new(17.0606, -96.7253));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let municipality = Municipality::from_toml_str("").unwrap();
        assert_eq!(municipality, Municipality::default());
        assert_eq!(municipality.reference, MIAHUATLAN_CENTER);
    }

    #[test]
    fn rejects_out_of_range_reference() {
        let result = Municipality::from_toml_str("[reference]\nlat = 95.0\nlng = 0.0\n");
        assert!(matches!(result, Err(ConfigError::Reference(_))));
    }

    #[test]
    fn rejects_malformed_toml() {
        let result = Municipality::from_toml_str("name = ");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn overrides_replace_reference_components() {
        let municipality = Municipality::default()
            .with_overrides(Some(" 16.5 "), None)
            .unwrap();
        assert_eq!(
            municipality.reference,
            Coordinate::new(16.5, MIAHUATLAN_CENTER.lng)
        );

        let err = Municipality::default()
            .with_overrides(None, Some("west"))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Env {
                name: REFERENCE_LNG_ENV,
                ..
            }
        ));
    }

    #[test]
    fn classifier_uses_reference() {
        let municipality = Municipality::default();
        assert_eq!(municipality.classifier().reference(), MIAHUATLAN_CENTER);
    }
}
