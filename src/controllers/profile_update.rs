use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::json;

use crate::controller::{ActionContext, Controller, ControllerResponse, Layout, ResponseData};
use crate::error::ConsoleError;
use crate::profile::ProfileValue;
use crate::validation::{RuleError, RuleTable};

static RULES: Lazy<Result<RuleTable, RuleError>> = Lazy::new(|| {
    RuleTable::parse([
        ("idx", "required|db profiles.idx"),
        ("value_int", "int32"),
        ("value_str", "db profiles.value_str"),
        ("idx2", "array_id"),
    ])
});

/// `profile.update`: store a UI preference of the current user.
#[derive(Default)]
pub struct ProfileUpdate;

#[async_trait]
impl Controller for ProfileUpdate {
    fn layout(&self) -> Layout {
        Layout::Json
    }

    async fn validate_step(&mut self, ctx: &mut ActionContext) -> Result<bool, ConsoleError> {
        let rules = RULES.as_ref().map_err(|e| ConsoleError::from(e.clone()))?;
        let ok = ctx.validate_input(rules);

        if !ok {
            let messages = ctx.messages.take_texts();
            ctx.set_response(ControllerResponse::Data(ResponseData::json(
                &json!({ "error": { "messages": messages } }),
            )));
        }

        Ok(ok)
    }

    async fn authorize_step(&mut self, ctx: &mut ActionContext) -> Result<bool, ConsoleError> {
        Ok(!ctx.user.is_guest())
    }

    async fn execute_step(&mut self, ctx: &mut ActionContext) -> Result<(), ConsoleError> {
        let idx = ctx.get_input_str("idx").unwrap_or_default();
        let idx2s = if ctx.has_input("idx2") {
            ctx.get_input_ids("idx2")
        } else {
            vec![0]
        };

        let value = if let Some(v) = ctx.get_input_str("value_int") {
            v.parse::<i32>().ok().map(ProfileValue::Int)
        } else {
            ctx.get_input_str("value_str").map(ProfileValue::Str)
        };

        match value {
            Some(value) => {
                for idx2 in idx2s {
                    ctx.profile.update(idx.clone(), idx2, value.clone());
                }
            }
            None => ctx.profile.delete(&idx, &idx2s),
        }

        ctx.set_response(ControllerResponse::Data(ResponseData::json(&json!({}))));
        Ok(())
    }
}
