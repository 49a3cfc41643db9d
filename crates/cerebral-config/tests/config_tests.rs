#[cfg(test)]
mod tests {
    use cerebral_config::ConfigLoader;
    use cerebral_config::schema::*;
    use std::io::Write;

    // ── Default tests ──────────────────────────────────────────

    #[test]
    fn test_cerebral_config_defaults() {
        let config = CerebralConfig::default();
        assert_eq!(config.user.user_id, "default_user");
        assert_eq!(config.memory.base_url, "http://localhost:8001/api/memory");
        assert_eq!(config.memory.search_limit, 50);
        assert_eq!(config.memory.fallback_sample_size, 3);
        assert_eq!(config.conversation.refresh_interval_secs, 30);
        assert_eq!(config.conversation.message_type, "user");
    }

    #[test]
    fn test_logging_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, "pretty");
    }

    #[test]
    fn test_local_store_path_resolution() {
        let mut config = MemoryConfig::default();
        assert!(config.resolved_local_store_path().ends_with(".cerebral/local_memories.db"));
        config.local_store_path = Some("/tmp/x.db".into());
        assert_eq!(config.resolved_local_store_path(), std::path::PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_defaults_validate_cleanly() {
        let warnings = CerebralConfig::default().validate().unwrap();
        assert!(warnings.is_empty());
    }

    // ── TOML tests ─────────────────────────────────────────────

    #[test]
    fn test_config_toml_roundtrip() {
        let config = CerebralConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let restored: CerebralConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(restored.memory.base_url, config.memory.base_url);
        assert_eq!(restored.user.user_id, config.user.user_id);
    }

    #[test]
    fn test_partial_toml_applies_defaults() {
        let toml_str = r#"
[memory]
base_url = "https://memory.internal/api/memory"

[user]
user_id = "ana"
"#;
        let config: CerebralConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.memory.base_url, "https://memory.internal/api/memory");
        assert_eq!(config.user.user_id, "ana");
        // Defaults should fill in
        assert_eq!(config.memory.search_limit, 50);
        assert_eq!(config.conversation.refresh_interval_secs, 30);
    }

    // ── Validation ─────────────────────────────────────────────

    #[test]
    fn test_invalid_url_is_an_error() {
        let mut config = CerebralConfig::default();
        config.memory.base_url = "not a url".into();
        let err = config.validate().unwrap_err();
        assert!(err.contains("memory.base_url"));
    }

    #[test]
    fn test_non_http_scheme_is_an_error() {
        let mut config = CerebralConfig::default();
        config.conversation.base_url = "ftp://example.org/api".into();
        let err = config.validate().unwrap_err();
        assert!(err.contains("conversation.base_url"));
    }

    #[test]
    fn test_zero_refresh_interval_is_an_error() {
        let mut config = CerebralConfig::default();
        config.conversation.refresh_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_sample_size_only_warns() {
        let mut config = CerebralConfig::default();
        config.memory.fallback_sample_size = 0;
        let warnings = config.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "memory.fallback_sample_size");
        assert_eq!(warnings[0].severity, WarningSeverity::Warning);
    }

    #[test]
    fn test_unknown_log_format_warns() {
        let mut config = CerebralConfig::default();
        config.logging.format = "xml".into();
        let warnings = config.validate().unwrap();
        assert!(warnings.iter().any(|w| w.field == "logging.format"));
    }

    // ── ConfigLoader tests ─────────────────────────────────────

    #[test]
    fn test_config_loader_with_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("cerebral.toml");
        let mut f = std::fs::File::create(&config_path).unwrap();
        writeln!(
            f,
            r#"
[memory]
search_limit = 10
fallback_sample_size = 5

[conversation]
refresh_interval_secs = 12
"#
        )
        .unwrap();

        let loader = ConfigLoader::load(Some(config_path.as_path())).unwrap();
        let config = loader.get();
        assert_eq!(config.memory.search_limit, 10);
        assert_eq!(config.memory.fallback_sample_size, 5);
        assert_eq!(config.conversation.refresh_interval_secs, 12);
        assert_eq!(loader.path(), config_path.as_path());
    }

    #[test]
    fn test_config_loader_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("cerebral.toml");
        std::fs::write(&config_path, "[memory]\nsearch_limit = 0\n").unwrap();
        assert!(ConfigLoader::load(Some(config_path.as_path())).is_err());
    }

    #[test]
    fn test_config_loader_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("cerebral.toml");
        std::fs::write(&config_path, "[memory\nbase_url = ").unwrap();
        let err = ConfigLoader::load(Some(config_path.as_path())).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn test_from_toml_inline() {
        let loader = ConfigLoader::from_toml("[user]\nuser_id = \"kai\"\n").unwrap();
        assert_eq!(loader.get().user.user_id, "kai");
    }

    // ── JSON roundtrip ─────────────────────────────────────────

    #[test]
    fn test_config_json_roundtrip() {
        let config = CerebralConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: CerebralConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.conversation.base_url, config.conversation.base_url);
    }
}
