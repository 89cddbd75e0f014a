//! Main menu layout and the first page a user may open after login.

use crate::access::{AccessPolicy, UiCapability};
use crate::types::ConsoleUser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub url: &'static str,
    pub capability: UiCapability,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSection {
    pub label: &'static str,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub sections: Vec<MenuSection>,
}

fn item(label: &'static str, url: &'static str, capability: UiCapability) -> MenuItem {
    MenuItem { label, url, capability }
}

impl Menu {
    pub fn main() -> Self {
        Self {
            sections: vec![
                MenuSection {
                    label: "Dashboards",
                    items: vec![item("Dashboards", "zabbix.php?action=dashboard.view", UiCapability::MonitoringDashboard)],
                },
                MenuSection {
                    label: "Monitoring",
                    items: vec![
                        item("Problems", "zabbix.php?action=problem.view", UiCapability::MonitoringProblems),
                        item("Hosts", "zabbix.php?action=host.view", UiCapability::MonitoringHosts),
                    ],
                },
                MenuSection {
                    label: "Data collection",
                    items: vec![
                        item("Templates", "zabbix.php?action=template.list", UiCapability::ConfigurationTemplates),
                        item("Hosts", "zabbix.php?action=host.list", UiCapability::ConfigurationHosts),
                    ],
                },
                MenuSection {
                    label: "Administration",
                    items: vec![
                        item("General", "zabbix.php?action=module.list", UiCapability::AdministrationGeneral),
                        item("Users", "zabbix.php?action=user.list", UiCapability::AdministrationUsers),
                    ],
                },
            ],
        }
    }

    /// Items the user may open, in menu order.
    pub fn accessible<'a>(&'a self, user: &'a ConsoleUser, policy: &'a dyn AccessPolicy) -> impl Iterator<Item = &'a MenuItem> {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter())
            .filter(move |i| policy.check_access(user, i.capability))
    }

    pub fn first_url(&self, user: &ConsoleUser, policy: &dyn AccessPolicy) -> Option<String> {
        self.accessible(user, policy).next().map(|i| i.url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::RoleAccessPolicy;
    use crate::types::UserType;

    #[test]
    fn test_first_url_honours_capabilities() {
        let menu = Menu::main();
        let mut user = ConsoleUser::guest();
        user.userid = 2;
        user.user_type = UserType::User;

        assert_eq!(menu.first_url(&user, &RoleAccessPolicy), None);

        user.ui_rules.insert("ui.monitoring.hosts".to_string());
        assert_eq!(
            menu.first_url(&user, &RoleAccessPolicy).as_deref(),
            Some("zabbix.php?action=host.view")
        );

        user.ui_rules.insert("ui.monitoring.dashboard".to_string());
        assert_eq!(
            menu.first_url(&user, &RoleAccessPolicy).as_deref(),
            Some("zabbix.php?action=dashboard.view")
        );
    }
}
