//! Concrete actions reachable through `zabbix.php?action=<name>`.

pub mod module_update;
pub mod profile_update;

pub use module_update::ModuleUpdate;
pub use profile_update::ProfileUpdate;
