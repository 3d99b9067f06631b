use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sluice_plugin_protocol::SpriteOptions;

use crate::configs::frontend::{BundleConfig, PathsConfig, ServerConfig, ToolsConfig, WatchConfig};
use crate::configs::tasks::TaskConfig;
use crate::types::{SluiceError, SluiceResult};

pub const CONFIG_FILE: &str = "sluice.yml";

/// Contents of `sluice.yml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ProjectConfig {
    pub paths: PathsConfig,
    pub tools: ToolsConfig,
    pub bundle: BundleConfig,
    pub sprite: SpriteOptions,
    pub server: ServerConfig,
    pub watch: WatchConfig,
    /// Additional command tasks.
    pub tasks: Vec<TaskConfig>,
}

pub fn parse_project_config(yaml_str: &str) -> SluiceResult<ProjectConfig> {
    if yaml_str.trim().is_empty() {
        return Ok(ProjectConfig::default());
    }
    let config: ProjectConfig = serde_yaml::from_str(yaml_str)?;
    Ok(config)
}

/// Load `sluice.yml` from the project root; a missing file means defaults
pub fn load_project_config(root: &Path) -> SluiceResult<ProjectConfig> {
    let path = root.join(CONFIG_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ProjectConfig::default()),
        Err(e) => {
            return Err(SluiceError::Config(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };
    parse_project_config(&content).map_err(|e| {
        SluiceError::Config(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// JSON schema of `sluice.yml`
pub fn project_config_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(ProjectConfig)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(parse_project_config("").unwrap(), ProjectConfig::default());
        assert_eq!(parse_project_config("  \n").unwrap(), ProjectConfig::default());
    }

    #[test]
    fn test_parse_sections() {
        let config = parse_project_config(
            r#"
server:
  proxy: localhost/shop/
  port: 3000
sprite:
  example: false
watch:
  debounceMs: 250
tasks:
  - name: sassdoc
    command: npx sassdoc src/css -d docs
    dependencies: [css:build]
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "localhost");
        assert!(!config.sprite.example);
        assert_eq!(config.sprite.max_width, 30);
        assert_eq!(config.watch.debounce_ms, 250);
        assert_eq!(config.tasks[0].dependencies(), ["css:build".to_string()]);
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(parse_project_config("plugins: []").is_err());
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_project_config(dir.path()).unwrap(),
            ProjectConfig::default()
        );

        std::fs::write(dir.path().join(CONFIG_FILE), "server: [").unwrap();
        let err = load_project_config(dir.path()).unwrap_err();
        assert!(matches!(err, SluiceError::Config(_)));
    }

    #[test]
    fn test_schema_lists_sections() {
        let schema = project_config_schema();
        let properties = schema["properties"].as_object().unwrap();
        for section in ["paths", "tools", "bundle", "sprite", "server", "watch", "tasks"] {
            assert!(properties.contains_key(section), "missing {}", section);
        }
    }
}
