//! Subcommand handlers. Each returns whether the operation succeeded.

use crate::output;
use anyhow::{bail, Context, Result};
use std::path::Path;
use toolbox_core::{
    updates, Action, Diagnostic, Engine, EngineConfig, ExecutionResult, Params, ResolveError,
};
use tracing::debug;

/// Parse a `key=value` parameter
pub fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

pub fn load_config(path: Option<&Path>) -> EngineConfig {
    match path {
        Some(path) => EngineConfig::load_or_default(path),
        None => EngineConfig::load(),
    }
}

fn to_params(pairs: Vec<(String, String)>) -> Params {
    pairs.into_iter().collect()
}

fn engine_for(mut config: EngineConfig, background: bool) -> Engine {
    if background {
        config.force_background = true;
    }
    Engine::new(&config)
}

pub fn host(config: &EngineConfig) -> bool {
    let engine = Engine::new(config);
    output::display_host(engine.detect_host(), engine.dispatcher().select_terminal());
    true
}

pub fn actions(config: &EngineConfig) -> bool {
    let engine = Engine::new(config);
    let family = engine.detect_host().family();
    let rows: Vec<(Action, bool)> = Action::ALL
        .iter()
        .map(|a| (*a, engine.registry().is_supported(*a, family)))
        .collect();
    output::display_actions(&rows);
    true
}

pub fn resolve(config: &EngineConfig, action: &str, params: Vec<(String, String)>) -> Result<bool> {
    let engine = Engine::new(config);
    match engine.resolve(action, &to_params(params)) {
        Ok(command) => {
            println!("{}", command);
            Ok(true)
        }
        Err(e) => report_resolve_error(e),
    }
}

pub async fn run(
    config: EngineConfig,
    action: &str,
    params: Vec<(String, String)>,
    background: bool,
    json: bool,
) -> Result<bool> {
    let engine = engine_for(config, background);
    match engine.perform(action, &to_params(params)).await {
        Ok(result) => Ok(show_result(&result, json)?),
        Err(e) => report_resolve_error(e),
    }
}

pub async fn exec(
    config: EngineConfig,
    command: &str,
    title: &str,
    sudo: bool,
    background: bool,
    json: bool,
) -> Result<bool> {
    if command.trim().is_empty() {
        bail!("empty command");
    }
    let engine = engine_for(config, background);
    let result = engine.run(command, title, sudo).await;
    show_result(&result, json)
}

pub async fn updates(config: &EngineConfig) -> bool {
    let engine = Engine::new(config);
    let status = updates::check(&engine).await;
    output::display_update_status(&status);
    !matches!(status, toolbox_core::UpdateStatus::Unavailable(_))
}

pub async fn info(
    config: &EngineConfig,
    diagnostic: Option<&str>,
    network: bool,
) -> Result<bool> {
    let engine = Engine::new(config);
    let results = match diagnostic {
        None if network => engine.diagnose_all(&Diagnostic::NETWORK).await,
        Some(key) => {
            let diagnostic = Diagnostic::parse(key).with_context(|| {
                let known: Vec<&str> = Diagnostic::ALL.iter().map(|d| d.key()).collect();
                format!("unknown diagnostic '{}' (known: {})", key, known.join(", "))
            })?;
            vec![(diagnostic, engine.diagnose(diagnostic).await)]
        }
        None => engine.snapshot().await,
    };

    let mut all_ok = true;
    for (diagnostic, result) in &results {
        all_ok &= result.succeeded;
        output::display_diagnostic(*diagnostic, result);
    }
    Ok(all_ok)
}

pub fn config(path: Option<&Path>, init: bool) -> Result<bool> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => EngineConfig::default_path().context("no config directory on this system")?,
    };

    if init {
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        EngineConfig::save_default(&path)?;
        println!("Wrote default config to {}", path.display());
    } else {
        let config = EngineConfig::load_or_default(&path);
        debug!("Showing config from {}", path.display());
        println!("# {}", path.display());
        print!("{}", toml::to_string_pretty(&config)?);
    }
    Ok(true)
}

fn show_result(result: &ExecutionResult, json: bool) -> Result<bool> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        output::display_result(result);
    }
    Ok(result.succeeded)
}

fn report_resolve_error(e: ResolveError) -> Result<bool> {
    output::display_resolve_error(&e);
    Ok(false)
}
