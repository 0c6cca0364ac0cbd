use std::{collections::HashMap, fs};

#[derive(Debug, Clone)]
pub struct Settings {
    pub assistant_url: String,
    pub maps_api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            assistant_url: "http://127.0.0.1:5000".into(),
            maps_api_key: None,
        }
    }
}

/// Defaults, then `assistant.toml`, then environment overrides.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("assistant.toml") {
        apply_file_settings(&mut settings, &raw);
    }

    if let Ok(v) = std::env::var("ASSISTANT_URL") {
        settings.assistant_url = v;
    }
    if let Ok(v) = std::env::var("APP__ASSISTANT_URL") {
        settings.assistant_url = v;
    }

    if let Ok(v) = std::env::var("GOOGLE_MAPS_API_KEY") {
        settings.maps_api_key = Some(v);
    }
    if let Ok(v) = std::env::var("APP__GOOGLE_MAPS_API_KEY") {
        settings.maps_api_key = Some(v);
    }

    settings
}

fn apply_file_settings(settings: &mut Settings, raw: &str) {
    if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) {
        if let Some(v) = file_cfg.get("assistant_url") {
            settings.assistant_url = v.clone();
        }
        if let Some(v) = file_cfg.get("maps_api_key") {
            settings.maps_api_key = Some(v.clone());
        }
    }
}
