use serde::{Deserialize, Serialize};

use super::errors::LayoutError;

/// Appearance preferences carried inside every snapshot.
///
/// The board only stores and round-trips these; keys it does not know about
/// are kept in `extra` so a newer front-end's settings survive a save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "default_font_scale")]
    pub font_scale: f64,
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_font_scale() -> f64 {
    1.0
}

fn default_background_color() -> String {
    "#ffffff".to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            font_scale: default_font_scale(),
            background_color: default_background_color(),
            extra: serde_json::Map::new(),
        }
    }
}

impl Preferences {
    /// Sets one preference by its wire name, validating the value's type.
    ///
    /// Known keys must keep their type (`fontScale` stays a number); unknown
    /// keys are stored as-is.
    pub fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), LayoutError> {
        if key.is_empty() {
            return Err(LayoutError::Invalid("Preference key cannot be empty".to_string()));
        }

        let mut json_value = serde_json::to_value(&*self)
            .map_err(|e| LayoutError::Invalid(format!("Failed to serialize preferences: {}", e)))?;
        match json_value.as_object_mut() {
            Some(map) => {
                map.insert(key.to_string(), value);
            }
            None => {
                return Err(LayoutError::Invalid("Preferences are not an object".to_string()));
            }
        }

        let updated: Preferences = serde_json::from_value(json_value).map_err(|e| {
            LayoutError::Invalid(format!("Invalid value for preference '{}': {}", key, e))
        })?;
        *self = updated;
        Ok(())
    }
}
