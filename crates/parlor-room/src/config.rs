//! Registry configuration.

use serde::{Deserialize, Serialize};

/// Settings for a [`RoomRegistry`](crate::RoomRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Whether `define_room_type` may replace an existing factory.
    /// When `false`, redefining fails with `RoomTypeAlreadyDefined`.
    pub allow_type_redefinition: bool,

    /// Prefix for ids generated by `join_or_create_room`.
    pub room_id_prefix: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            allow_type_redefinition: true,
            room_id_prefix: "room_".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_config_default() {
        let config = RegistryConfig::default();
        assert!(config.allow_type_redefinition);
        assert_eq!(config.room_id_prefix, "room_");
    }

    #[test]
    fn test_registry_config_missing_fields_use_defaults() {
        let config: RegistryConfig =
            serde_json::from_str(r#"{ "allow_type_redefinition": false }"#)
                .unwrap();
        assert!(!config.allow_type_redefinition);
        assert_eq!(config.room_id_prefix, "room_");
    }
}
