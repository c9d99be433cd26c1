use crate::config::Options;
use crate::error::TaskError;
use crate::jscs::{Checker, RuleConfig};
use serde_json::Value;

/// Snippets rarely end in a newline, so this rule is always switched off.
const TRAILING_NEWLINE_RULE: &str = "requireLineFeedAtFileEnd";

/// Builds a checker from the run options.
///
/// Explicit `jscs_options` take precedence over `preset`. There is no
/// fallback when neither is given: style presets are a matter of opinion, so
/// no default would be a safe guess.
pub fn build_checker(options: &Options) -> Result<Checker, TaskError> {
    let mut config = match (&options.jscs_options, &options.preset) {
        (Some(jscs_options), preset) => {
            if let Some(preset) = preset {
                log::warn!(
                    "Both a preset ({}) and explicit JSCS options were given; \
                     the preset is ignored",
                    preset
                );
            }
            jscs_options.clone()
        }
        (None, Some(preset)) => {
            let mut config = RuleConfig::new();
            config.insert("preset".to_string(), Value::String(preset.clone()));
            config
        }
        (None, None) => {
            return Err(TaskError::configuration(
                "No options provided & no preset specified",
            ));
        }
    };
    config.insert(TRAILING_NEWLINE_RULE.to_string(), Value::Null);

    let mut checker = Checker::new();
    checker.register_default_rules();
    checker
        .configure(&config)
        .map_err(|e| TaskError::configuration(e.to_string()))?;

    log::debug!("Enabled rules: {}", checker.active_rules().join(", "));
    Ok(checker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules(value: Value) -> RuleConfig {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_preset_disables_trailing_newline_rule() {
        let checker = build_checker(&Options::with_preset("jquery")).unwrap();
        let active = checker.active_rules();
        assert!(active.contains(&"validateQuoteMarks"));
        assert!(!active.contains(&TRAILING_NEWLINE_RULE));
        assert!(checker.check_string("foo();").unwrap().is_empty());
    }

    #[test]
    fn test_explicit_options_cannot_enable_trailing_newline_rule() {
        let options = Options::with_jscs_options(rules(json!({
            "validateQuoteMarks": "\"",
            "requireLineFeedAtFileEnd": true
        })));
        let checker = build_checker(&options).unwrap();
        assert_eq!(checker.active_rules(), vec!["validateQuoteMarks"]);
    }

    #[test]
    fn test_explicit_options_take_precedence_over_preset() {
        let options = Options {
            preset: Some("google".to_string()),
            ..Options::with_jscs_options(rules(json!({ "validateQuoteMarks": "\"" })))
        };
        let checker = build_checker(&options).unwrap();
        assert!(checker.check_string("var x = \"y\";").unwrap().is_empty());
    }

    #[test]
    fn test_missing_configuration_fails() {
        let err = build_checker(&Options::default()).err().unwrap();
        assert!(matches!(err, TaskError::Configuration(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: No options provided & no preset specified"
        );
    }

    #[test]
    fn test_unknown_preset_fails() {
        let err = build_checker(&Options::with_preset("nonexistent")).err().unwrap();
        assert_eq!(
            err.to_string(),
            "Configuration error: Preset \"nonexistent\" does not exist"
        );
    }
}
