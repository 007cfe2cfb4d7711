//! `primc.json` loading.
//!
//! ```json
//! {
//!   "extends": "../primc.base.json",
//!   "binderOptions": { "shadowPolicy": "memberBiased", "parallel": false }
//! }
//! ```

use anyhow::{Context, Result, anyhow, bail};
use primc_binder::{BinderOptions, ShadowPolicy};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::args::CliArgs;

pub const CONFIG_FILE_NAME: &str = "primc.json";

/// Accepts `true`, `"true"`, `"yes"`, `"on"`, `"1"` and their negations.
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(Error::custom(format!(
                "invalid boolean value: '{s}'. Expected true, false, 'true', or 'false'"
            ))),
        },
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PrimcConfig {
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub binder_options: Option<ConfigOptions>,
}

/// Options as written in a config file; unset keys inherit from `extends`
/// and finally from [`BinderOptions::default`].
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOptions {
    #[serde(default)]
    pub shadow_policy: Option<ShadowPolicy>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub color_color_allowed: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub report_unread_parameters: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub report_advisory_warnings: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub parallel: Option<bool>,
}

impl ConfigOptions {
    /// `self` wins over `base` key by key.
    #[must_use]
    pub fn merged_over(self, base: ConfigOptions) -> ConfigOptions {
        ConfigOptions {
            shadow_policy: self.shadow_policy.or(base.shadow_policy),
            color_color_allowed: self.color_color_allowed.or(base.color_color_allowed),
            report_unread_parameters: self
                .report_unread_parameters
                .or(base.report_unread_parameters),
            report_advisory_warnings: self
                .report_advisory_warnings
                .or(base.report_advisory_warnings),
            parallel: self.parallel.or(base.parallel),
        }
    }

    #[must_use]
    pub fn resolve(&self) -> BinderOptions {
        let defaults = BinderOptions::default();
        BinderOptions {
            shadow_policy: self.shadow_policy.unwrap_or(defaults.shadow_policy),
            color_color_allowed: self
                .color_color_allowed
                .unwrap_or(defaults.color_color_allowed),
            report_unread_parameters: self
                .report_unread_parameters
                .unwrap_or(defaults.report_unread_parameters),
            report_advisory_warnings: self
                .report_advisory_warnings
                .unwrap_or(defaults.report_advisory_warnings),
            parallel: self.parallel.unwrap_or(defaults.parallel),
        }
    }
}

pub fn parse_config(source: &str) -> Result<PrimcConfig> {
    let config = serde_json::from_str(source)?;
    Ok(config)
}

/// Load a config file, following `extends` chains.
pub fn load_config(path: &Path) -> Result<ConfigOptions> {
    let mut visited = HashSet::new();
    load_config_inner(path, &mut visited)
}

fn load_config_inner(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<ConfigOptions> {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical.clone()) {
        bail!("config extends cycle detected at {}", canonical.display());
    }

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config = parse_config(&source)
        .with_context(|| format!("failed to parse config: {}", path.display()))?;

    let own = config.binder_options.unwrap_or_default();
    match config.extends {
        Some(extends) => {
            let base_path = resolve_extends_path(path, &extends)?;
            let base = load_config_inner(&base_path, visited)?;
            Ok(own.merged_over(base))
        }
        None => Ok(own),
    }
}

fn resolve_extends_path(current_path: &Path, extends: &str) -> Result<PathBuf> {
    let base_dir = current_path
        .parent()
        .ok_or_else(|| anyhow!("config has no parent directory"))?;
    let mut candidate = PathBuf::from(extends);
    if candidate.extension().is_none() {
        candidate.set_extension("json");
    }
    if candidate.is_absolute() {
        Ok(candidate)
    } else {
        Ok(base_dir.join(candidate))
    }
}

/// The config file to use: `--config`, else `primc.json` in `cwd` if present.
#[must_use]
pub fn find_config(args: &CliArgs, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = &args.config {
        return Some(if path.is_absolute() {
            path.clone()
        } else {
            cwd.join(path)
        });
    }
    let default = cwd.join(CONFIG_FILE_NAME);
    default.is_file().then_some(default)
}

/// Options from the config file with command-line flags applied on top.
pub fn resolve_options(args: &CliArgs, cwd: &Path) -> Result<BinderOptions> {
    let file = match find_config(args, cwd) {
        Some(path) => load_config(&path)?,
        None => ConfigOptions::default(),
    };
    let mut options = file.resolve();
    apply_flags(&mut options, args);
    Ok(options)
}

pub fn apply_flags(options: &mut BinderOptions, args: &CliArgs) {
    if args.member_biased {
        options.shadow_policy = ShadowPolicy::MemberBiased;
    }
    if args.no_color_color {
        options.color_color_allowed = false;
    }
    if args.sequential {
        options.parallel = false;
    }
    if args.no_advisory_warnings {
        options.report_advisory_warnings = false;
    }
}
