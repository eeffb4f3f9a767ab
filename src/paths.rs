use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub fn database_file_path() -> Result<PathBuf> {
    if let Some(path) = database_path_from_env(env::var_os("DRSVIEW_DB")) {
        return Ok(path);
    }
    let base = dirs::data_dir().context("unable to resolve data directory")?;
    Ok(base.join("drsview").join("drsview.db"))
}

fn database_path_from_env(env_value: Option<OsString>) -> Option<PathBuf> {
    env_value
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
