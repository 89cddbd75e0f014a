use serde_json::Value;
use std::sync::Arc;

use super::messages::MessageBag;
use super::response::ControllerResponse;
use crate::access::{AccessPolicy, UiCapability};
use crate::params::{self, array_values, scalar_string, Params};
use crate::profile::Profile;
use crate::session::Session;
use crate::types::{ConsoleUser, ObjectId};
use crate::validation::{RuleTable, ValidationResult, ValidationStatus, Validator};

/// Everything a controller may touch while handling one request.
pub struct ActionContext {
    pub action: String,
    pub user: ConsoleUser,
    pub session: Session,
    pub profile: Profile,
    pub messages: MessageBag,
    access: Arc<dyn AccessPolicy>,
    raw: Params,
    input: Params,
    validation: Option<ValidationResult>,
    response: Option<ControllerResponse>,
}

impl ActionContext {
    pub fn new(
        action: impl Into<String>,
        raw: Params,
        user: ConsoleUser,
        session: Session,
        profile: Profile,
        access: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            action: action.into(),
            user,
            session,
            profile,
            messages: MessageBag::new(),
            access,
            raw,
            input: Params::new(),
            validation: None,
            response: None,
        }
    }

    /// Validate the request against `rules`, with remembered form data from the session
    /// taking precedence over transport parameters. Failure messages go to the message bag.
    pub fn validate_input(&mut self, rules: &RuleTable) -> bool {
        let raw = match self.session.take_form_data() {
            Some(form) => params::merge(self.raw.clone(), form),
            None => self.raw.clone(),
        };

        let result = Validator::validate(&raw, rules);
        for error in &result.errors {
            self.messages.error(error.message.clone());
        }

        self.input = result.input.clone();
        let ok = result.is_ok();
        self.validation = Some(result);
        ok
    }

    pub fn validation_status(&self) -> Option<ValidationStatus> {
        self.validation.as_ref().map(|v| v.status)
    }

    pub fn has_input(&self, key: &str) -> bool {
        self.input.contains_key(key)
    }

    pub fn get_input(&self, key: &str) -> Option<&Value> {
        self.input.get(key)
    }

    pub fn get_input_str(&self, key: &str) -> Option<String> {
        self.input.get(key).and_then(scalar_string)
    }

    pub fn get_input_or(&self, key: &str, default: Value) -> Value {
        self.input.get(key).cloned().unwrap_or(default)
    }

    /// Identifier list input; entries that are not valid ids are skipped.
    pub fn get_input_ids(&self, key: &str) -> Vec<ObjectId> {
        self.input
            .get(key)
            .and_then(array_values)
            .map(|items| {
                items
                    .into_iter()
                    .filter_map(scalar_string)
                    .filter_map(|s| s.parse().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn input_all(&self) -> &Params {
        &self.input
    }

    /// Transport parameters as received, before validation.
    pub fn raw_params(&self) -> &Params {
        &self.raw
    }

    pub fn check_access(&self, capability: UiCapability) -> bool {
        self.access.check_access(&self.user, capability)
    }

    pub fn access_policy(&self) -> &dyn AccessPolicy {
        self.access.as_ref()
    }

    pub fn set_response(&mut self, response: ControllerResponse) {
        self.response = Some(response);
    }

    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    pub fn take_response(&mut self) -> Option<ControllerResponse> {
        self.response.take()
    }
}
