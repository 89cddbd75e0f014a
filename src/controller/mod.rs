//! Controller dispatch: validate, authorize, execute, then flush the user's profile.
//!
//! Every action implements [`Controller`]; [`dispatch`] drives the three steps and guarantees
//! that a controller whose input was rejected never executes, that a denied request ends with
//! the access policy's denial, and that buffered profile writes are committed as one unit.

pub mod context;
pub mod messages;
pub mod response;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ConsoleError;
use crate::profile::ProfileBackend;

pub use context::ActionContext;
pub use messages::{Message, MessageBag, MessageKind};
pub use response::{ControllerResponse, Layout, ResponseData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Created,
    Validating,
    Authorized,
    Executing,
    Responded,
    Denied,
    InputRejected,
}

#[async_trait]
pub trait Controller: Send {
    fn layout(&self) -> Layout {
        Layout::Html
    }

    /// Returning `false` ends the request with whatever response has been set so far.
    async fn validate_step(&mut self, ctx: &mut ActionContext) -> Result<bool, ConsoleError>;

    /// Anything other than `true` is a hard denial.
    async fn authorize_step(&mut self, ctx: &mut ActionContext) -> Result<bool, ConsoleError>;

    /// Must set the response.
    async fn execute_step(&mut self, ctx: &mut ActionContext) -> Result<(), ConsoleError>;
}

#[derive(Debug)]
pub struct Dispatched {
    pub state: DispatchState,
    pub layout: Layout,
    pub response: ControllerResponse,
}

fn transition(ctx: &ActionContext, state: &mut DispatchState, next: DispatchState) {
    debug!("{}: {:?} -> {:?}", ctx.action, state, next);
    *state = next;
}

pub async fn dispatch<C: Controller + ?Sized>(
    controller: &mut C,
    ctx: &mut ActionContext,
    profiles: &dyn ProfileBackend,
) -> Result<Dispatched, ConsoleError> {
    let mut state = DispatchState::Created;
    let layout = controller.layout();

    transition(ctx, &mut state, DispatchState::Validating);
    if !controller.validate_step(ctx).await? {
        transition(ctx, &mut state, DispatchState::InputRejected);
        flush_profile(ctx, profiles).await?;
        let response = take_response(ctx)?;
        return Ok(Dispatched { state, layout, response });
    }

    if !controller.authorize_step(ctx).await? {
        transition(ctx, &mut state, DispatchState::Denied);
        warn!("Access denied to {} for user {}", ctx.action, ctx.user.username);
        let denial = ctx.access_policy().deny_access(&ctx.user);
        return Ok(Dispatched {
            state,
            layout,
            response: ControllerResponse::AccessDenied(denial),
        });
    }

    transition(ctx, &mut state, DispatchState::Authorized);
    transition(ctx, &mut state, DispatchState::Executing);
    controller.execute_step(ctx).await?;
    flush_profile(ctx, profiles).await?;

    let response = take_response(ctx)?;
    transition(ctx, &mut state, DispatchState::Responded);
    Ok(Dispatched { state, layout, response })
}

fn take_response(ctx: &mut ActionContext) -> Result<ControllerResponse, ConsoleError> {
    ctx.take_response().ok_or_else(|| {
        tracing::error!("Controller for {} finished without a response", ctx.action);
        ConsoleError::internal_server_error(format!("Action \"{}\" produced no response", ctx.action))
    })
}

async fn flush_profile(ctx: &mut ActionContext, profiles: &dyn ProfileBackend) -> Result<(), ConsoleError> {
    if !ctx.profile.is_modified() {
        return Ok(());
    }
    if ctx.user.is_guest() {
        debug!("Discarding profile writes of the guest user");
        return Ok(());
    }

    debug!("{}: begin profile transaction", ctx.action);
    let result = ctx.profile.flush(profiles).await;
    debug!("{}: end profile transaction (committed: {})", ctx.action, result.is_ok());
    result.map_err(ConsoleError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{RoleAccessPolicy, UiCapability};
    use crate::profile::{MemoryProfileBackend, Profile, ProfileValue};
    use crate::session::Session;
    use crate::types::{ConsoleUser, UserType};
    use crate::validation::RuleTable;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Default)]
    struct StubController {
        accept_input: bool,
        allow: bool,
        set_response: bool,
        authorize_calls: usize,
        execute_calls: usize,
    }

    #[async_trait]
    impl Controller for StubController {
        fn layout(&self) -> Layout {
            Layout::Json
        }

        async fn validate_step(&mut self, ctx: &mut ActionContext) -> Result<bool, ConsoleError> {
            ctx.profile.update("web.stub.validated", 0, ProfileValue::Int(1));
            if !self.accept_input {
                ctx.set_response(ControllerResponse::Data(ResponseData::json(&json!({"error": {}}))));
            }
            Ok(self.accept_input)
        }

        async fn authorize_step(&mut self, ctx: &mut ActionContext) -> Result<bool, ConsoleError> {
            self.authorize_calls += 1;
            Ok(self.allow && ctx.check_access(UiCapability::MonitoringHosts))
        }

        async fn execute_step(&mut self, ctx: &mut ActionContext) -> Result<(), ConsoleError> {
            self.execute_calls += 1;
            ctx.profile.update("web.stub.executed", 0, ProfileValue::Int(1));
            if self.set_response {
                ctx.set_response(ControllerResponse::Data(ResponseData::json(&json!({}))));
            }
            Ok(())
        }
    }

    fn context() -> ActionContext {
        let mut user = ConsoleUser::guest();
        user.userid = 7;
        user.username = "operator".to_string();
        user.user_type = UserType::User;
        user.ui_rules.insert(UiCapability::MonitoringHosts.as_str().to_string());

        ActionContext::new(
            "stub.action",
            Default::default(),
            user,
            Session::start(),
            Profile::new(7, Default::default()),
            Arc::new(RoleAccessPolicy),
        )
    }

    #[tokio::test]
    async fn test_rejected_input_never_executes() {
        let backend = MemoryProfileBackend::default();
        let mut controller = StubController::default();
        let mut ctx = context();

        let dispatched = dispatch(&mut controller, &mut ctx, &backend).await.unwrap();

        assert_eq!(dispatched.state, DispatchState::InputRejected);
        assert_eq!(controller.authorize_calls, 0);
        assert_eq!(controller.execute_calls, 0);
        assert_eq!(dispatched.response.json_body(), Some(json!({"error": {}})));
        // Writes made before the rejection are still committed
        assert_eq!(backend.commit_count(), 1);
    }

    #[tokio::test]
    async fn test_denial_skips_execution_and_flush() {
        let backend = MemoryProfileBackend::default();
        let mut controller = StubController {
            accept_input: true,
            ..Default::default()
        };
        let mut ctx = context();

        let dispatched = dispatch(&mut controller, &mut ctx, &backend).await.unwrap();

        assert_eq!(dispatched.state, DispatchState::Denied);
        assert!(dispatched.response.is_access_denied());
        assert_eq!(controller.execute_calls, 0);
        assert_eq!(backend.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_success_flushes_profile_once() {
        let backend = MemoryProfileBackend::default();
        let mut controller = StubController {
            accept_input: true,
            allow: true,
            set_response: true,
            ..Default::default()
        };
        let mut ctx = context();

        let dispatched = dispatch(&mut controller, &mut ctx, &backend).await.unwrap();

        assert_eq!(dispatched.state, DispatchState::Responded);
        assert_eq!(dispatched.layout, Layout::Json);
        assert_eq!(controller.execute_calls, 1);
        assert_eq!(backend.commit_count(), 1);

        let stored = Profile::load(&backend, 7).await.unwrap();
        assert_eq!(stored.get_int("web.stub.validated", 0), 1);
        assert_eq!(stored.get_int("web.stub.executed", 0), 1);
    }

    #[tokio::test]
    async fn test_missing_response_is_an_error() {
        let backend = MemoryProfileBackend::default();
        let mut controller = StubController {
            accept_input: true,
            allow: true,
            ..Default::default()
        };
        let mut ctx = context();

        let err = dispatch(&mut controller, &mut ctx, &backend).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_validate_input_consumes_session_form_data() {
        let mut ctx = context();
        let mut form = crate::params::Params::new();
        form.insert("rows".to_string(), json!("25"));
        ctx.session.set_form_data(form);

        let rules = RuleTable::parse([("rows", "int32")]).unwrap();
        assert!(ctx.validate_input(&rules));
        assert_eq!(ctx.get_input_str("rows").as_deref(), Some("25"));
        assert!(ctx.session.take_form_data().is_none());
    }
}
