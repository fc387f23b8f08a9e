use anyhow::{anyhow, bail, Context, Result};
use std::env;

use phasebot_core::{ActionKind, PhaseLabelConfig, PhraseConfig, DEFAULT_API_URL};

/// How the server authenticates to GitHub.
#[derive(Clone)]
pub enum Credentials {
    /// A fixed token (personal access token or similar).
    Token(String),
    /// A GitHub App; each delivery is served with its installation's token.
    App { app_id: u64, private_key: String },
}

#[derive(Clone)]
pub struct Config {
    pub github_webhook_secret: String,
    pub credentials: Credentials,
    pub github_api_url: String,
    pub port: u16,
    pub phrases: PhraseConfig,
    pub phases: PhaseLabelConfig,
    pub recording_enabled: bool,
    pub recording_log_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source. Blank values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let github_webhook_secret = get("GITHUB_WEBHOOK_SECRET")
            .context("GITHUB_WEBHOOK_SECRET environment variable is required")?;

        let credentials = match (get("GITHUB_TOKEN"), get("GITHUB_APP_ID")) {
            (Some(token), None) => Credentials::Token(token),
            (None, Some(app_id)) => {
                let app_id = app_id
                    .parse::<u64>()
                    .context("GITHUB_APP_ID must be a valid number")?;
                let private_key = get("GITHUB_PRIVATE_KEY")
                    .context("GITHUB_PRIVATE_KEY is required when GITHUB_APP_ID is set")?
                    .replace("\\n", "\n");
                Credentials::App {
                    app_id,
                    private_key,
                }
            }
            (Some(_), Some(_)) => bail!("Set either GITHUB_TOKEN or GITHUB_APP_ID, not both"),
            (None, None) => bail!("GITHUB_TOKEN or GITHUB_APP_ID environment variable is required"),
        };

        let github_api_url = get("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let port = get("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid number")?;

        let mut phrases = PhraseConfig::new();
        for action in ActionKind::ALL {
            if let Some(phrase) = get(&phrase_variable(action)) {
                phrases.insert(action, phrase);
            }
        }
        phrases
            .validate()
            .map_err(|e| anyhow!("Invalid phrase configuration: {e}"))?;

        let labels = get("PHASE_LABELS").context("PHASE_LABELS environment variable is required")?;
        let phases = parse_phase_labels(&labels).context("Invalid PHASE_LABELS")?;

        let recording_enabled = get("RECORDING_ENABLED")
            .and_then(|value| value.parse::<bool>().ok())
            .unwrap_or(false);

        let recording_log_path =
            get("RECORDING_LOG_PATH").unwrap_or_else(|| "recordings.jsonl".to_string());

        Ok(Config {
            github_webhook_secret,
            credentials,
            github_api_url,
            port,
            phrases,
            phases,
            recording_enabled,
            recording_log_path,
        })
    }
}

/// `assign_phrase` -> `ASSIGN_PHRASE`
pub fn phrase_variable(action: ActionKind) -> String {
    action.input_name().to_uppercase()
}

/// Parse a comma-separated, ordered list of phase labels.
pub fn parse_phase_labels(value: &str) -> Result<PhaseLabelConfig> {
    Ok(PhaseLabelConfig::new(value.split(',').map(str::trim))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("GITHUB_WEBHOOK_SECRET", "s3cret"),
            ("GITHUB_TOKEN", "ghp_token"),
            ("ASSIGN_PHRASE", "I would like to work on this please!"),
            ("COMPLETE_PHRASE", "Ready for review!"),
            ("PHASE_LABELS", "phase1, phase2,phase3"),
        ]
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_lookup(lookup(&minimal())).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.github_api_url, "https://api.github.com");
        assert!(!config.recording_enabled);
        assert_eq!(config.recording_log_path, "recordings.jsonl");
        assert!(matches!(config.credentials, Credentials::Token(ref t) if t == "ghp_token"));
        assert_eq!(config.phases.labels(), ["phase1", "phase2", "phase3"]);
        assert_eq!(
            config.phrases.phrase(ActionKind::Assign),
            Some("i would like to work on this please!")
        );
        assert_eq!(config.phrases.phrase(ActionKind::Unroll), None);
    }

    #[test]
    fn test_optional_values_are_read() {
        let mut pairs = minimal();
        pairs.extend([
            ("PORT", "8080"),
            ("GITHUB_API_URL", "https://ghe.example.com/api/v3"),
            ("UNROLL_PHRASE", "Unroll please"),
            ("PHASE1_RESULTS_PHRASE", "   "),
            ("RECORDING_ENABLED", "true"),
            ("RECORDING_LOG_PATH", "/var/log/phasebot.jsonl"),
        ]);

        let config = Config::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.github_api_url, "https://ghe.example.com/api/v3");
        assert_eq!(
            config.phrases.phrase(ActionKind::Unroll),
            Some("unroll please")
        );
        // Blank counts as unset
        assert_eq!(config.phrases.phrase(ActionKind::Phase1Results), None);
        assert!(config.recording_enabled);
        assert_eq!(config.recording_log_path, "/var/log/phasebot.jsonl");
    }

    #[test]
    fn test_app_credentials() {
        let pairs: Vec<_> = minimal()
            .into_iter()
            .filter(|(k, _)| *k != "GITHUB_TOKEN")
            .chain([
                ("GITHUB_APP_ID", "4242"),
                ("GITHUB_PRIVATE_KEY", "-----BEGIN-----\\nabc\\n-----END-----"),
            ])
            .collect();

        let config = Config::from_lookup(lookup(&pairs)).unwrap();

        match config.credentials {
            Credentials::App {
                app_id,
                private_key,
            } => {
                assert_eq!(app_id, 4242);
                assert_eq!(private_key, "-----BEGIN-----\nabc\n-----END-----");
            }
            Credentials::Token(_) => panic!("expected app credentials"),
        }
    }

    #[test]
    fn test_missing_required_values() {
        for missing in [
            "GITHUB_WEBHOOK_SECRET",
            "GITHUB_TOKEN",
            "ASSIGN_PHRASE",
            "COMPLETE_PHRASE",
            "PHASE_LABELS",
        ] {
            let pairs: Vec<_> = minimal()
                .into_iter()
                .filter(|(k, _)| *k != missing)
                .collect();
            assert!(
                Config::from_lookup(lookup(&pairs)).is_err(),
                "config without {missing} should be rejected"
            );
        }
    }

    #[test]
    fn test_both_credentials_rejected() {
        let mut pairs = minimal();
        pairs.extend([("GITHUB_APP_ID", "1"), ("GITHUB_PRIVATE_KEY", "k")]);
        let err = Config::from_lookup(lookup(&pairs)).err().unwrap();
        assert!(err.to_string().contains("not both"));
    }

    #[test]
    fn test_bad_phase_labels_rejected() {
        assert!(parse_phase_labels("phase1,,phase2").is_err());
        assert!(parse_phase_labels("phase1,phase1").is_err());
        assert_eq!(
            parse_phase_labels(" a ,b").unwrap().labels(),
            ["a", "b"]
        );
    }

    #[test]
    fn test_phrase_variable_names() {
        assert_eq!(phrase_variable(ActionKind::Assign), "ASSIGN_PHRASE");
        assert_eq!(
            phrase_variable(ActionKind::Phase2Results),
            "PHASE2_RESULTS_PHRASE"
        );
    }
}
