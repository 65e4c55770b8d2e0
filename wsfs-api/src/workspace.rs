use serde::{Serialize, Deserialize};

use crate::fs::Metadata;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Project {
    pub name: String,
    pub location: String,
}

/// listing of the top level directories exposed under the workspace root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Workspace {
    pub name: String,
    pub location: String,
    pub children_location: String,
    pub children: Vec<Metadata>,
    pub projects: Vec<Project>,
}
