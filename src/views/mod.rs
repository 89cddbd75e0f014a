//! HTML and JSON renderers for pages and dashboard widgets.
//!
//! `layout` and `pages` serve the console's own routes. `tophosts`, `triggers_list`, `navtree`
//! and `widgets` are library renderers: they take data that a widget or list controller has
//! already fetched from the monitoring backend, and no route in this crate calls them.

pub mod html;
pub mod layout;
pub mod navtree;
pub mod pages;
pub mod tophosts;
pub mod triggers_list;
pub mod widgets;

pub use layout::render;
pub use pages::{mfa_login_page, warning_page, MfaLoginPage, WarningPage};
