//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::app::naming::{SuffixPolicy, TagStyle};
use crate::app::scanner::BlockScan;
use crate::app::synthesize::DEFAULT_TEMPLATE;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".ngextract/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default = "Naming::unset")]
    pub naming: Naming,
    #[serde(default = "Template::unset")]
    pub template: Template,
    #[serde(default = "Rewrite::unset")]
    pub rewrite: Rewrite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Naming {
    #[serde(default)]
    suffix: Option<String>,
    #[serde(default)]
    suffix_policy: Option<SuffixPolicy>,
    #[serde(default)]
    selector_prefix: Option<String>,
    #[serde(default)]
    file_suffix: Option<String>,
    #[serde(default)]
    tag_style: Option<TagStyle>,
}

impl Naming {
    fn unset() -> Self {
        Self {
            suffix: None,
            suffix_policy: None,
            selector_prefix: None,
            file_suffix: None,
            tag_style: None,
        }
    }

    pub fn suffix(&self) -> String {
        self.suffix.clone().unwrap_or_else(|| "Component".into())
    }

    pub fn suffix_policy(&self) -> SuffixPolicy {
        self.suffix_policy.unwrap_or_default()
    }

    pub fn selector_prefix(&self) -> String {
        self.selector_prefix.clone().unwrap_or_else(|| "app".into())
    }

    pub fn file_suffix(&self) -> String {
        self.file_suffix
            .clone()
            .unwrap_or_else(|| ".component".into())
    }

    pub fn tag_style(&self) -> TagStyle {
        self.tag_style.unwrap_or_default()
    }
}

impl Default for Naming {
    fn default() -> Self {
        Self {
            suffix: Some("Component".into()),
            suffix_policy: Some(SuffixPolicy::default()),
            selector_prefix: Some("app".into()),
            file_suffix: Some(".component".into()),
            tag_style: Some(TagStyle::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    import_source: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    file_extension: Option<String>,
}

impl Template {
    fn unset() -> Self {
        Self {
            import_source: None,
            name: None,
            file_extension: None,
        }
    }

    pub fn import_source(&self) -> String {
        self.import_source
            .clone()
            .unwrap_or_else(|| "@angular/core".into())
    }

    pub fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| DEFAULT_TEMPLATE.to_owned())
    }

    pub fn file_extension(&self) -> String {
        self.file_extension.clone().unwrap_or_else(|| "ts".into())
    }
}

impl Default for Template {
    fn default() -> Self {
        Self {
            import_source: Some("@angular/core".into()),
            name: Some(DEFAULT_TEMPLATE.to_owned()),
            file_extension: Some("ts".into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewrite {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    block_scan: Option<BlockScan>,
    #[serde(default)]
    keep_import_without_block: Option<bool>,
}

impl Rewrite {
    fn unset() -> Self {
        Self {
            enabled: None,
            block_scan: None,
            keep_import_without_block: None,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn block_scan(&self) -> BlockScan {
        self.block_scan.unwrap_or_default()
    }

    pub fn keep_import_without_block(&self) -> bool {
        self.keep_import_without_block.unwrap_or(true)
    }
}

impl Default for Rewrite {
    fn default() -> Self {
        Self {
            enabled: Some(true),
            block_scan: Some(BlockScan::default()),
            keep_import_without_block: Some(true),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    suffix_policy: Option<String>,
    rewire: Option<String>,
    block_scan: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            suffix_policy: env::var("NGEXTRACT_SUFFIX_POLICY").ok(),
            rewire: env::var("NGEXTRACT_REWIRE").ok(),
            block_scan: env::var("NGEXTRACT_BLOCK_SCAN").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(suffix_policy: &str, rewire: &str, block_scan: &str) -> Self {
        Self {
            suffix_policy: Some(suffix_policy.to_owned()),
            rewire: Some(rewire.to_owned()),
            block_scan: Some(block_scan.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading user config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        apply_env_overrides(merged, env_overrides)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize configuration")
    }

    fn merge(self, other: Self) -> Self {
        Self {
            naming: merge_naming(self.naming, other.naming),
            template: merge_template(self.template, other.template),
            rewrite: merge_rewrite(self.rewrite, other.rewrite),
        }
    }
}

fn merge_naming(mut base: Naming, overlay: Naming) -> Naming {
    if let Some(value) = overlay.suffix {
        base.suffix = Some(value);
    }
    if let Some(value) = overlay.suffix_policy {
        base.suffix_policy = Some(value);
    }
    if let Some(value) = overlay.selector_prefix {
        base.selector_prefix = Some(value);
    }
    if let Some(value) = overlay.file_suffix {
        base.file_suffix = Some(value);
    }
    if let Some(value) = overlay.tag_style {
        base.tag_style = Some(value);
    }
    base
}

fn merge_template(mut base: Template, overlay: Template) -> Template {
    if let Some(value) = overlay.import_source {
        base.import_source = Some(value);
    }
    if let Some(value) = overlay.name {
        base.name = Some(value);
    }
    if let Some(value) = overlay.file_extension {
        base.file_extension = Some(value);
    }
    base
}

fn merge_rewrite(mut base: Rewrite, overlay: Rewrite) -> Rewrite {
    if let Some(value) = overlay.enabled {
        base.enabled = Some(value);
    }
    if let Some(value) = overlay.block_scan {
        base.block_scan = Some(value);
    }
    if let Some(value) = overlay.keep_import_without_block {
        base.keep_import_without_block = Some(value);
    }
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("ngextract/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Result<Config> {
    if let Some(policy) = env.suffix_policy {
        config.naming.suffix_policy = Some(
            policy
                .parse::<SuffixPolicy>()
                .context("invalid NGEXTRACT_SUFFIX_POLICY")?,
        );
    }
    if let Some(rewire) = env.rewire {
        config.rewrite.enabled = Some(parse_flag(&rewire).context("invalid NGEXTRACT_REWIRE")?);
    }
    if let Some(scan) = env.block_scan {
        config.rewrite.block_scan = Some(
            scan.parse::<BlockScan>()
                .context("invalid NGEXTRACT_BLOCK_SCAN")?,
        );
    }
    Ok(config)
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{other}'"),
    }
}
