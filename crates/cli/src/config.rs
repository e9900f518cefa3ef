use anyhow::{Context, Result, bail};
use tokentrack_runtime_config::{
    TrackerConfig, apply_env_overrides, apply_fallbacks, load_from_path, save_to_path,
};

/// Config file contents with `TOKENTRACK_SERVER_URL` applied.
pub fn load_config() -> Result<TrackerConfig> {
    let path = tokentrack_paths::config_path()?;
    let mut config = load_from_path(&path)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Run `config show`.
pub fn show_config() -> Result<()> {
    let config_path = tokentrack_paths::config_path()?;
    let token_path = tokentrack_paths::token_path()?;
    let config = load_config()?;
    let rendered = toml::to_string_pretty(&config).context("Failed to render config")?;

    println!("# config file: {}", config_path.display());
    println!("# token file:  {}", token_path.display());
    println!();
    print!("{rendered}");
    Ok(())
}

/// Run `config set`. Env overrides are not written back.
pub fn set_config(server: Option<String>, timeout: Option<u64>) -> Result<()> {
    if server.is_none() && timeout.is_none() {
        bail!("Nothing to set. Pass --server and/or --timeout.");
    }

    let path = tokentrack_paths::config_path()?;
    let mut config = load_from_path(&path)?;

    if let Some(url) = server {
        let url = url.trim().trim_end_matches('/').to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("Server URL must start with http:// or https://, got '{url}'");
        }
        config.server.url = url;
    }
    if let Some(secs) = timeout {
        if secs == 0 {
            bail!("Timeout must be at least one second");
        }
        config.server.timeout_secs = secs;
    }
    apply_fallbacks(&mut config);

    save_to_path(&config, &path)?;
    println!("Saved {}", path.display());
    Ok(())
}

/// Run `models`.
pub fn show_models() -> Result<()> {
    let config = load_config()?;
    let registry = config.model_registry();
    let default_model = config.dashboard.default_model.as_str();

    for model in registry.iter() {
        let marker = if model.id == default_model { "*" } else { " " };
        println!(
            "{marker} {:<16} {:<16} ${} / token",
            model.id, model.name, model.cost_per_token
        );
    }
    Ok(())
}
