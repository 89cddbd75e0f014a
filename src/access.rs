//! UI capability checks and the terminal access-denied outcome.

use serde::Serialize;

use crate::types::{ConsoleUser, UserType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiCapability {
    MonitoringDashboard,
    MonitoringProblems,
    MonitoringHosts,
    ConfigurationHosts,
    ConfigurationTemplates,
    AdministrationGeneral,
    AdministrationUsers,
}

impl UiCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiCapability::MonitoringDashboard => "ui.monitoring.dashboard",
            UiCapability::MonitoringProblems => "ui.monitoring.problems",
            UiCapability::MonitoringHosts => "ui.monitoring.hosts",
            UiCapability::ConfigurationHosts => "ui.configuration.hosts",
            UiCapability::ConfigurationTemplates => "ui.configuration.templates",
            UiCapability::AdministrationGeneral => "ui.administration.general",
            UiCapability::AdministrationUsers => "ui.administration.users",
        }
    }

    pub fn is_administration(&self) -> bool {
        self.as_str().starts_with("ui.administration.")
    }
}

/// What the user sees when a permission check fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDenial {
    pub header: String,
    pub messages: Vec<String>,
    /// Offer a login button instead of a dashboard link
    pub login_required: bool,
}

impl AccessDenial {
    pub fn status_code(&self) -> u16 {
        if self.login_required {
            401
        } else {
            403
        }
    }
}

pub trait AccessPolicy: Send + Sync {
    fn check_access(&self, user: &ConsoleUser, capability: UiCapability) -> bool;

    fn deny_access(&self, user: &ConsoleUser) -> AccessDenial {
        if user.is_guest() {
            AccessDenial {
                header: "You are not logged in".to_string(),
                messages: vec!["You must login to view this page.".to_string()],
                login_required: true,
            }
        } else {
            AccessDenial {
                header: "Access denied".to_string(),
                messages: vec![
                    format!("You are logged in as \"{}\".", user.username),
                    "You have no permissions to access this page.".to_string(),
                ],
                login_required: false,
            }
        }
    }
}

/// Grants a capability when the user's role lists it. Administration pages additionally
/// require the super admin user type.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAccessPolicy;

impl AccessPolicy for RoleAccessPolicy {
    fn check_access(&self, user: &ConsoleUser, capability: UiCapability) -> bool {
        if user.is_guest() && capability.is_administration() {
            return false;
        }
        if capability.is_administration() && user.user_type != UserType::SuperAdmin {
            return false;
        }
        user.has_rule(capability.as_str())
    }
}
