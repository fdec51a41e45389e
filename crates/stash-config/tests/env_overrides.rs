use figment::Jail;
use stash_config::{ClassifierBackend, StashConfig};

#[test]
fn env_selects_gemini_backend() {
    Jail::expect_with(|jail| {
        jail.set_env("STASH_CLASSIFIER__BACKEND", "gemini");
        jail.set_env("STASH_CLASSIFIER__API_KEY", "key-from-env");

        let config = StashConfig::load().expect("config loads");
        assert_eq!(config.classifier.backend, ClassifierBackend::Gemini);
        assert_eq!(config.classifier.api_key, "key-from-env");
        assert!(config.classifier.is_configured());
        Ok(())
    });
}

#[test]
fn env_beats_project_toml() {
    Jail::expect_with(|jail| {
        jail.create_dir(".stash")?;
        jail.create_file(
            ".stash/config.toml",
            r#"
[pipeline]
confidence_threshold = 80
classify_timeout_secs = 10
"#,
        )?;
        jail.set_env("STASH_PIPELINE__CONFIDENCE_THRESHOLD", "95");

        let config = StashConfig::load().expect("config loads");
        assert_eq!(config.pipeline.confidence_threshold, 95);
        assert_eq!(config.pipeline.classify_timeout_secs, 10);
        Ok(())
    });
}

#[test]
fn out_of_range_threshold_fails_to_load() {
    Jail::expect_with(|jail| {
        jail.set_env("STASH_PIPELINE__CONFIDENCE_THRESHOLD", "150");

        let err = StashConfig::load().expect_err("threshold above 100 should fail");
        assert!(err.to_string().contains("confidence_threshold"));
        Ok(())
    });
}

#[test]
fn database_path_from_env() {
    Jail::expect_with(|jail| {
        jail.set_env("STASH_DATABASE__PATH", ":memory:");

        let config = StashConfig::load().expect("config loads");
        assert!(config.database.is_in_memory());
        Ok(())
    });
}
