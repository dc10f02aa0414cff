// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! deskline configuration.
//!
//! `deskline.toml` has five tables: `[logging]`, `[liveagent]`,
//! `[rate_limit]`, `[warehouse]` and `[pipeline]`. Every key has a default and
//! unknown keys are rejected. `DESKLINE_<SECTION>_<KEY>` environment variables
//! override files.
//!
//! ```no_run
//! use deskline_config::{ConfigSource, load_and_validate_from};
//!
//! let config = load_and_validate_from(ConfigSource::Standard).expect("config errors");
//! println!("upstream: {}", config.liveagent.base_url);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{ConfigSource, load_config_from_str};
pub use model::{DesklineConfig, MessageFailurePolicy};

/// Loads inline TOML over the defaults, then validates.
pub fn load_and_validate_str(toml: &str) -> Result<DesklineConfig, Vec<ConfigError>> {
    load_and_validate_from(ConfigSource::Inline(toml))
}

/// Deserialization errors come back as diagnostics pointing into the source
/// text; validation reports every failed rule at once.
pub fn load_and_validate_from(source: ConfigSource<'_>) -> Result<DesklineConfig, Vec<ConfigError>> {
    let config = source
        .load()
        .map_err(|err| diagnostic::from_figment(err, &source.texts()))?;
    validation::validate_config(&config)?;
    Ok(config)
}
