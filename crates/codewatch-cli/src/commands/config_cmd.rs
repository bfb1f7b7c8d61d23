//! `cwatch config` -- show resolved configuration.
//!
//! Prints the configuration after discovery, parsing, and defaulting.
//! Secrets serialize redacted, so the output is safe to paste into an
//! issue.

use super::load_config;

/// Show the full resolved configuration as pretty JSON.
pub fn show(config_override: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_override)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
