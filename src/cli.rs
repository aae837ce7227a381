use std::{env, path::PathBuf};

use anyhow::{Result, anyhow, bail};

const DEFAULT_CONFIG_FILE: &str = "advisory.jsonc";

pub fn config_path_from_args() -> Result<PathBuf> {
    parse_config_path(env::args().skip(1), env::current_dir()?)
}

/// Accepts `[<config-path>]` or `--config <config-path>`.
fn parse_config_path(args: impl IntoIterator<Item = String>, cwd: PathBuf) -> Result<PathBuf> {
    let args: Vec<String> = args.into_iter().collect();
    let path = match args.as_slice() {
        [] => return Ok(cwd.join(DEFAULT_CONFIG_FILE)),
        [flag] if flag == "--config" => bail!("--config expects a path"),
        [flag, path] if flag == "--config" => path,
        [path] if !path.starts_with('-') => path,
        _ => {
            return Err(anyhow!(
                "usage: agri-advisory [--config] <config-path>. Example: agri-advisory ./advisory.jsonc"
            ));
        }
    };
    Ok(PathBuf::from(path))
}
