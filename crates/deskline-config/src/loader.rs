// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Where configuration comes from and how the layers merge.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::DesklineConfig;

/// Top-level tables of `deskline.toml`, also the `DESKLINE_<SECTION>_` env prefixes.
pub const SECTIONS: &[&str] = &["logging", "liveagent", "rate_limit", "warehouse", "pipeline"];

/// One way of obtaining a configuration. Every source starts from the
/// compiled defaults.
#[derive(Debug, Clone, Copy)]
pub enum ConfigSource<'a> {
    /// The search path (see [`search_paths`]) followed by `DESKLINE_*` env vars.
    Standard,
    /// A single file given on the command line, followed by env vars.
    File(&'a Path),
    /// Inline TOML only; no files, no environment.
    Inline(&'a str),
}

impl ConfigSource<'_> {
    pub fn figment(&self) -> Figment {
        let defaults = Figment::from(Serialized::defaults(DesklineConfig::default()));
        match self {
            ConfigSource::Standard => search_paths()
                .into_iter()
                .fold(defaults, |figment, path| figment.merge(Toml::file(path)))
                .merge(env_provider()),
            ConfigSource::File(path) => defaults.merge(Toml::file(path)).merge(env_provider()),
            ConfigSource::Inline(toml) => defaults.merge(Toml::string(toml)),
        }
    }

    pub fn load(&self) -> Result<DesklineConfig, figment::Error> {
        self.figment().extract()
    }

    /// `(name, text)` of every TOML text this source merges, for error spans.
    pub fn texts(&self) -> Vec<(String, String)> {
        let read = |path: &Path| {
            let name = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
            std::fs::read_to_string(path)
                .ok()
                .map(|text| (name.display().to_string(), text))
        };
        match self {
            ConfigSource::Standard => search_paths().iter().filter_map(|p| read(p.as_path())).collect(),
            ConfigSource::File(path) => read(*path).into_iter().collect(),
            ConfigSource::Inline(toml) => vec![("<inline>".to_string(), toml.to_string())],
        }
    }
}

/// Files read by [`ConfigSource::Standard`], lowest precedence first:
/// `/etc/deskline/deskline.toml`, the user config dir, then `./deskline.toml`.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/deskline/deskline.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("deskline").join("deskline.toml"));
    }
    paths.push(PathBuf::from("deskline.toml"));
    paths
}

/// Parses inline TOML over the defaults.
pub fn load_config_from_str(toml: &str) -> Result<DesklineConfig, figment::Error> {
    ConfigSource::Inline(toml).load()
}

/// `DESKLINE_LIVEAGENT_API_KEY` -> `liveagent.api_key`. Field names contain
/// underscores, so only the section prefix is split off.
fn env_provider() -> Env {
    Env::prefixed("DESKLINE_").map(|key| {
        let key = key.as_str().to_ascii_lowercase();
        SECTIONS
            .iter()
            .find_map(|section| {
                key.strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|field| format!("{section}.{field}"))
            })
            .unwrap_or(key)
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_prefix_only() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("DESKLINE_RATE_LIMIT_THROTTLE_MS", "25");
            jail.set_env("DESKLINE_WAREHOUSE_PROJECT_ID", "from-env");
            let config: DesklineConfig = Figment::from(Serialized::defaults(DesklineConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.rate_limit.throttle_ms, 25);
            assert_eq!(config.warehouse.project_id, "from-env");
            Ok(())
        });
    }

    #[test]
    fn local_file_has_highest_file_precedence() {
        let paths = search_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from("/etc/deskline/deskline.toml")));
        assert_eq!(paths.last(), Some(&PathBuf::from("deskline.toml")));
    }

    #[test]
    fn inline_source_reports_its_text() {
        let texts = ConfigSource::Inline("[logging]\nlevel = \"debug\"\n").texts();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, "<inline>");
    }
}
