//! Frame decisions for dashboard widgets, used by library callers.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetViewMode {
    Normal,
    HiddenHeader,
}

/// Host availability widget fields that affect its frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostAvailFields {
    #[serde(default)]
    pub only_totals: Option<i64>,
    #[serde(default)]
    pub interface_type: Option<Vec<Value>>,
}

/// Padded unless the header is hidden, only totals are shown, or a single interface type is selected.
pub fn host_avail_has_padding(view_mode: WidgetViewMode, fields: &HostAvailFields) -> bool {
    view_mode == WidgetViewMode::Normal
        && fields.only_totals.map_or(true, |v| v == 0)
        && fields.interface_type.as_ref().map_or(true, |types| types.len() != 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_padding_rules() {
        let normal = WidgetViewMode::Normal;
        assert!(host_avail_has_padding(normal, &HostAvailFields::default()));
        assert!(!host_avail_has_padding(WidgetViewMode::HiddenHeader, &HostAvailFields::default()));

        let totals = HostAvailFields { only_totals: Some(1), interface_type: None };
        assert!(!host_avail_has_padding(normal, &totals));

        let one = HostAvailFields { only_totals: Some(0), interface_type: Some(vec![json!(1)]) };
        assert!(!host_avail_has_padding(normal, &one));

        let two = HostAvailFields { only_totals: None, interface_type: Some(vec![json!(1), json!(2)]) };
        assert!(host_avail_has_padding(normal, &two));

        let none = HostAvailFields { only_totals: None, interface_type: Some(vec![]) };
        assert!(host_avail_has_padding(normal, &none));
    }
}
