use std::path::PathBuf;
use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct File {
    pub root: Option<String>,
    pub workspace_root: Option<String>,
    pub workspace_dir: Option<PathBuf>,
    pub max_depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct Listener {
    pub addr: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub listeners: Option<HashMap<String, Listener>>,

    pub file: Option<File>,

    pub timeout: Option<u64>,
}
