//! YAML configuration file: severity label overrides, Starlark translator
//! plugins and default CLI options.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ReportError;
use crate::event::Severity;
use crate::input_format::InputFormat;
use crate::query::{GroupKey, SortKey};
use crate::render::OutputFormat;
use crate::severity::SeverityMap;
use crate::translate::{StarlarkTranslator, TranslatorRegistry};

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV: &str = "TEAMSLOG_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Source label → severity, merged over the built-in table
    #[serde(default)]
    pub severity_map: BTreeMap<String, Severity>,
    #[serde(default)]
    pub translators: Vec<TranslatorSpec>,
    #[serde(default)]
    pub defaults: Defaults,
    /// Directory relative script paths resolve against
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// One plugin: inline `script` or a `file`, exactly one of the two.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslatorSpec {
    pub event_type: String,
    pub script: Option<String>,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    pub format: Option<OutputFormat>,
    pub input_format: Option<InputFormat>,
    pub verbose: Option<bool>,
    pub group_by: Option<GroupKey>,
    pub sort_by: Option<SortKey>,
    pub title: Option<String>,
}

impl ReportConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ReportError> {
        serde_yaml::from_str(text).map_err(|e| ReportError::ConfigError(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ReportError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_yaml(&text)
            .map_err(|e| ReportError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        log::debug!(
            "loaded config {} ({} severity labels, {} translators)",
            path.display(),
            config.severity_map.len(),
            config.translators.len()
        );
        Ok(config)
    }

    /// Load `explicit`, else the file named by `TEAMSLOG_CONFIG`, else
    /// defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ReportError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    pub fn severity_map(&self) -> SeverityMap {
        let mut map = SeverityMap::default();
        map.extend(&self.severity_map);
        map
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if file.is_relative() => base.join(file),
            _ => file.to_path_buf(),
        }
    }

    /// Register every configured plugin into `registry`, later entries
    /// replacing earlier ones.
    pub fn register_translators(&self, registry: &mut TranslatorRegistry) -> Result<(), ReportError> {
        for spec in &self.translators {
            let translator = match (&spec.script, &spec.file) {
                (Some(script), None) => {
                    StarlarkTranslator::from_script(&format!("config:{}", spec.event_type), script)?
                }
                (None, Some(file)) => StarlarkTranslator::from_file(&self.resolve(file))?,
                _ => {
                    return Err(ReportError::ConfigError(format!(
                        "translator for '{}' needs exactly one of 'script' or 'file'",
                        spec.event_type
                    )))
                }
            };
            registry.register(&spec.event_type, translator)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::CanonicalFields;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let config = ReportConfig::from_yaml(
            r#"
severity_map:
  high: critical
  Medium: warning
translators:
  - event_type: MeetingCreated
    script: '"meeting!"'
defaults:
  format: text
  group_by: user
  verbose: true
"#,
        )
        .unwrap();
        assert_eq!(config.severity_map.len(), 2);
        assert_eq!(config.severity_map().resolve("HIGH"), Some(Severity::Critical));
        assert_eq!(config.defaults.format, Some(OutputFormat::Text));
        assert_eq!(config.defaults.group_by, Some(GroupKey::User));
        assert_eq!(config.defaults.verbose, Some(true));

        let mut registry = TranslatorRegistry::with_builtins();
        config.register_translators(&mut registry).unwrap();
        assert!(registry.contains("MeetingCreated"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            ReportConfig::from_yaml("colour: red\n"),
            Err(ReportError::ConfigError(_))
        ));
    }

    #[test]
    fn test_translator_needs_one_source() {
        let config = ReportConfig::from_yaml(
            "translators:\n  - event_type: Call\n",
        )
        .unwrap();
        let mut registry = TranslatorRegistry::new();
        assert!(config.register_translators(&mut registry).is_err());
    }

    #[test]
    fn test_relative_plugin_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut plugin = std::fs::File::create(dir.path().join("policy.star")).unwrap();
        writeln!(plugin, "\"policy by \" + event[\"user_id\"]").unwrap();

        let config_path = dir.path().join("teamslog.yaml");
        std::fs::write(
            &config_path,
            "translators:\n  - event_type: PolicyChange\n    file: policy.star\n",
        )
        .unwrap();

        let config = ReportConfig::load(&config_path).unwrap();
        let mut registry = TranslatorRegistry::with_builtins();
        config.register_translators(&mut registry).unwrap();

        let fields = CanonicalFields {
            event_type: "PolicyChange".to_string(),
            user_id: Some("admin@contoso.com".to_string()),
            ..Default::default()
        };
        assert_eq!(
            registry.describe(&fields, &Default::default()),
            "policy by admin@contoso.com"
        );
    }
}
