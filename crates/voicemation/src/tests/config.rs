use crate::config::{Config, DEFAULT_BASE_URL};

/// WHAT: Empty config sections fill in with the documented defaults
/// WHY: Upgrades adding new keys must not break existing config files
#[test]
#[allow(clippy::unwrap_used)]
fn given_empty_sections_when_parsing_then_defaults_applied() {
    // Given: A config file with bare section headers
    let contents = "[service]\n[audio]\n[behavior]\n";

    // When: Parsing
    let config: Config = toml::from_str(contents).unwrap();

    // Then: Every field takes its default
    assert_eq!(config.service.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.audio.selected_device, None);
    assert!(config.behavior.auto_open);
    assert!(config.behavior.copy_url);
    assert!(!config.behavior.in_depth_mode);
}

/// WHAT: Config survives a serialize/parse round trip
/// WHY: save() writes what load() reads
#[test]
#[allow(clippy::unwrap_used)]
fn given_modified_config_when_round_tripping_then_values_preserved() {
    // Given: A config with every default overridden
    let contents = "[service]\n[audio]\n[behavior]\n";
    let mut config: Config = toml::from_str(contents).unwrap();
    config.service.base_url = String::from("https://api.example.com");
    config.audio.selected_device = Some(String::from("USB Microphone"));
    config.behavior.auto_open = false;
    config.behavior.in_depth_mode = true;

    // When: Serializing and parsing back
    let serialized = toml::to_string_pretty(&config).unwrap();
    let parsed: Config = toml::from_str(&serialized).unwrap();

    // Then: All values survive
    assert_eq!(parsed.service.base_url, "https://api.example.com");
    assert_eq!(parsed.audio.selected_device.as_deref(), Some("USB Microphone"));
    assert!(!parsed.behavior.auto_open);
    assert!(parsed.behavior.in_depth_mode);
}

/// WHAT: A non-blank environment override replaces the configured base URL
/// WHY: Deployments point at staging services without editing config files
#[test]
fn given_override_when_resolving_base_url_then_override_wins() {
    // Given/When/Then: A real override wins
    assert_eq!(
        Config::base_url_with_override(
            "http://localhost:5001",
            Some(String::from("https://api.example.com"))
        ),
        "https://api.example.com"
    );
    // And: Absent or blank overrides fall back to the configured value
    assert_eq!(
        Config::base_url_with_override("http://localhost:5001", None),
        "http://localhost:5001"
    );
    assert_eq!(
        Config::base_url_with_override("http://localhost:5001", Some(String::from("  "))),
        "http://localhost:5001"
    );
}
