//! Container of the map navigation tree widget. The tree itself is built client-side from
//! the script data. Library renderer; the caller supplies the tree and problem counts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::html::{div, Tag};
use crate::types::ObjectId;

pub const MAX_DEPTH: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavTreeData {
    #[serde(default)]
    pub problems: Value,
    #[serde(default)]
    pub severity_config: Value,
    #[serde(default)]
    pub navtree: Value,
    #[serde(default)]
    pub navtree_items_opened: Vec<String>,
    #[serde(default)]
    pub navtree_item_selected: Option<String>,
    #[serde(default)]
    pub maps_accessible: Vec<ObjectId>,
    #[serde(default)]
    pub show_unavailable: bool,
    #[serde(default)]
    pub initial_load: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptData {
    pub problems: Value,
    pub severity_levels: Value,
    pub navtree: Value,
    pub navtree_items_opened: Vec<String>,
    pub navtree_item_selected: Option<String>,
    /// Map ids as strings
    pub maps_accessible: Vec<String>,
    pub show_unavailable: bool,
    pub initial_load: bool,
    pub max_depth: u32,
}

pub struct NavigationTree {
    id: String,
    data: NavTreeData,
}

impl NavigationTree {
    pub fn new(data: NavTreeData) -> Self {
        Self {
            id: format!("navtree-{}", uuid::Uuid::new_v4().simple()),
            data,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn script_data(&self) -> ScriptData {
        ScriptData {
            problems: self.data.problems.clone(),
            severity_levels: self.data.severity_config.clone(),
            navtree: self.data.navtree.clone(),
            navtree_items_opened: self.data.navtree_items_opened.clone(),
            navtree_item_selected: self.data.navtree_item_selected.clone(),
            maps_accessible: self.data.maps_accessible.iter().map(|id| id.to_string()).collect(),
            show_unavailable: self.data.show_unavailable,
            initial_load: self.data.initial_load,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn to_tag(&self) -> Tag {
        div()
            .id(self.id.as_str())
            .class("navtree")
            .child(div().class("tree"))
    }
}
