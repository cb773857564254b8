#[cfg(test)]
mod tests {
    use crate::config::{Config, load_config_from_file, save_config_to_file};

    #[test]
    fn defaults_are_audible_with_ghost_shown() {
        let config = Config::default();
        assert!(config.audio.sound);
        assert!(config.audio.music);
        assert!((config.audio.volume - 0.5).abs() < f32::EPSILON);
        assert!(config.ui.show_ghost);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str("[audio]\nvolume = 0.9\n").unwrap();
        assert!((config.audio.volume - 0.9).abs() < f32::EPSILON);
        assert!(config.audio.sound);
        assert!(config.ui.show_ghost);
    }

    #[test]
    fn empty_toml_is_the_default_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn config_survives_a_toml_round_trip() {
        let mut config = Config::default();
        config.audio.sound = false;
        config.audio.volume = 0.3;
        config.ui.show_ghost = false;

        let serialized = toml::to_string_pretty(&config).unwrap();
        let restored: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(restored, config);
    }

    // File-backed load/save share the GRIDFALL_CONFIG override, so the whole
    // lifecycle runs in one test to keep parallel tests from racing on it.
    #[test]
    fn file_lifecycle_under_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        unsafe {
            std::env::set_var("GRIDFALL_CONFIG", &path);
        }

        // First load writes the defaults to disk
        let loaded = load_config_from_file().unwrap();
        assert_eq!(loaded, Config::default());
        assert!(path.exists());

        // A modified config written out comes back intact
        let mut modified = loaded;
        modified.audio.music = false;
        modified.audio.volume = 0.75;
        save_config_to_file(&modified).unwrap();
        let reloaded = load_config_from_file().unwrap();
        assert_eq!(reloaded, modified);

        // A malformed file is an error, not a panic
        std::fs::write(&path, "this is not toml [").unwrap();
        assert!(load_config_from_file().is_err());

        unsafe {
            std::env::remove_var("GRIDFALL_CONFIG");
        }
    }
}
