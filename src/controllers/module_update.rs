use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::access::UiCapability;
use crate::api::{ModuleApi, ModuleFilter, ModuleStatusUpdate};
use crate::controller::{ActionContext, Controller, ControllerResponse, Layout, ResponseData};
use crate::error::ConsoleError;
use crate::modules::{ManifestLoader, ModuleManager, ModuleStatus};
use crate::types::ObjectId;
use crate::validation::{RuleError, RuleTable};

static RULES: Lazy<Result<RuleTable, RuleError>> = Lazy::new(|| {
    RuleTable::parse([
        ("moduleids", "required|array_db module.moduleid"),
        // form update fields
        ("status", "in 1"),
        ("form_refresh", "int32"),
    ])
});

/// `module.update`: enable or disable a set of frontend modules.
pub struct ModuleUpdate {
    modules: Arc<dyn ModuleApi>,
    loader: Arc<dyn ManifestLoader>,
    selected: BTreeSet<ObjectId>,
}

impl ModuleUpdate {
    pub fn new(modules: Arc<dyn ModuleApi>, loader: Arc<dyn ManifestLoader>) -> Self {
        Self {
            modules,
            loader,
            selected: BTreeSet::new(),
        }
    }
}

fn json_response(ctx: &mut ActionContext, output: Value) {
    ctx.set_response(ControllerResponse::Data(ResponseData::json(&output)));
}

#[async_trait]
impl Controller for ModuleUpdate {
    fn layout(&self) -> Layout {
        Layout::Json
    }

    async fn validate_step(&mut self, ctx: &mut ActionContext) -> Result<bool, ConsoleError> {
        let rules = RULES.as_ref().map_err(|e| ConsoleError::from(e.clone()))?;
        let ok = ctx.validate_input(rules);

        if !ok {
            let messages = ctx.messages.take_texts();
            json_response(ctx, json!({ "error": { "messages": messages } }));
        }

        Ok(ok)
    }

    async fn authorize_step(&mut self, ctx: &mut ActionContext) -> Result<bool, ConsoleError> {
        if !ctx.check_access(UiCapability::AdministrationGeneral) {
            return Ok(false);
        }

        // Duplicates stay in the list so that they fail the count match
        let requested = ctx.get_input_ids("moduleids");
        let found = self
            .modules
            .get(&ctx.user.sessionid, &ModuleFilter::ids(requested.clone()))
            .await?;

        if found.len() != requested.len() {
            warn!("Requested {} module(s), {} found", requested.len(), found.len());
            return Ok(false);
        }

        self.selected = found.into_iter().map(|m| m.moduleid).collect();

        Ok(true)
    }

    async fn execute_step(&mut self, ctx: &mut ActionContext) -> Result<(), ConsoleError> {
        let set_status = if ctx.has_input("status") {
            ModuleStatus::Enabled
        } else {
            ModuleStatus::Disabled
        };

        let db_modules = self.modules.get(&ctx.user.sessionid, &ModuleFilter::all_by_path()).await?;

        // What-if registries: modules that would be enabled, and the rest
        let mut module_manager = ModuleManager::new(self.loader.clone());
        let mut module_manager_enabled = ModuleManager::new(self.loader.clone());
        let mut update_names = Vec::new();

        for db_module in &db_modules {
            let is_selected = self.selected.contains(&db_module.moduleid);
            let new_status = if is_selected { set_status } else { db_module.status };

            let manifest = if new_status == ModuleStatus::Enabled {
                module_manager_enabled.add_module(&db_module.relative_path).await
            } else {
                module_manager.add_module(&db_module.relative_path).await
            };

            if let (true, Some(manifest)) = (is_selected, manifest) {
                update_names.push(manifest.name);
            }
        }

        // Conflicts among modules that stay disabled do not block the update
        let conflicts = module_manager_enabled.check_conflicts();
        for conflict in &conflicts.conflicts {
            ctx.messages.error(conflict.clone());
        }

        let result = if conflicts.is_empty() {
            let updates: Vec<ModuleStatusUpdate> = self
                .selected
                .iter()
                .map(|&moduleid| ModuleStatusUpdate { moduleid, status: set_status })
                .collect();

            match self.modules.update(&ctx.user.sessionid, &updates).await {
                Ok(updated) => updated,
                Err(e) => match e.user_message() {
                    Some(message) => {
                        ctx.messages.error(message.to_string());
                        false
                    }
                    None => return Err(e.into()),
                },
            }
        } else {
            false
        };

        let first_name = update_names
            .first()
            .cloned()
            .or_else(|| {
                db_modules
                    .iter()
                    .find(|m| self.selected.contains(&m.moduleid))
                    .map(|m| m.relative_path.clone())
            })
            .unwrap_or_default();

        let output = if result {
            info!("Module status set to {:?} for {:?}", set_status, self.selected);
            let mut success = Map::new();
            success.insert("title".to_string(), json!(format!("Module updated: {}.", first_name)));

            let messages = ctx.messages.take_texts();
            if !messages.is_empty() {
                success.insert("messages".to_string(), json!(messages));
            }

            json!({ "success": success })
        } else {
            warn!("Module update rejected for {:?}", self.selected);
            json!({
                "error": {
                    "title": format!("Cannot update module: {}.", first_name),
                    "messages": ctx.messages.take_texts(),
                }
            })
        };

        json_response(ctx, output);
        Ok(())
    }
}
