//! Body of the "Top hosts" dashboard widget.
//!
//! Library renderer: the caller supplies the resolved hosts, items and column configuration.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::html::{div, Node, Tag};
use crate::params::scalar_string;
use crate::types::ObjectId;

/// Longest text shown in a value hint.
pub const HINTBOX_CONTENT_LIMIT: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnData {
    ItemValue,
    HostName,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDisplay {
    AsIs,
    Bar,
    Indicators,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub threshold: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    pub data: ColumnData,
    #[serde(default = "default_display")]
    pub display: ColumnDisplay,
    #[serde(default)]
    pub base_color: Option<String>,
    #[serde(default)]
    pub thresholds: Option<Vec<Threshold>>,
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
}

fn default_display() -> ColumnDisplay {
    ColumnDisplay::AsIs
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    #[serde(default)]
    pub units: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: Value,
    #[serde(default)]
    pub hostid: Option<ObjectId>,
    #[serde(default)]
    pub item: Option<ItemInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopHostsData {
    pub name: String,
    pub configuration: Vec<ColumnConfig>,
    pub rows: Vec<Vec<Cell>>,
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default)]
    pub debug: Option<String>,
}

fn value_text(value: &Value) -> String {
    scalar_string(value).unwrap_or_default()
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn format_history_value(value: &str, item: Option<&ItemInfo>) -> String {
    match item.map(|i| i.units.as_str()).filter(|u| !u.is_empty()) {
        Some(units) if value.trim().parse::<f64>().is_ok() => format!("{} {}", value, units),
        _ => value.to_string(),
    }
}

/// Colour of an as-is cell: the base colour, replaced by every threshold the value reaches.
/// Thresholds apply to numeric values only.
fn cell_color(column: &ColumnConfig, value: &Value) -> String {
    let mut color = column.base_color.clone().unwrap_or_default();

    if column.display != ColumnDisplay::AsIs {
        return color;
    }
    let (Some(thresholds), Some(number)) = (&column.thresholds, numeric(value)) else {
        return color;
    };

    for threshold in thresholds {
        if number < threshold.threshold {
            break;
        }
        color = threshold.color.clone();
    }
    color
}

fn host_menu_popup(hostid: ObjectId) -> String {
    json!({ "type": "host", "data": { "hostid": hostid.to_string() } }).to_string()
}

fn render_cell(column: &ColumnConfig, cell: &Cell) -> Tag {
    let text = value_text(&cell.value);

    let (content, is_gauge): (Tag, bool) = match column.data {
        ColumnData::HostName => {
            let link = Tag::new("a")
                .class("link-action")
                .attr("role", "button")
                .attr_if(cell.hostid.is_some(), "data-menu-popup", host_menu_popup(cell.hostid.unwrap_or_default()))
                .child(text.as_str());
            (link, false)
        }
        ColumnData::Text => (div().child(text.as_str()), false),
        ColumnData::ItemValue if column.display == ColumnDisplay::AsIs => {
            let hint: String = text.chars().take(HINTBOX_CONTENT_LIMIT).collect();
            let hint_html = div().class("hintbox-wrap").child(hint).render();
            let value = div()
                .class("item-value")
                .class("cursor-pointer")
                .attr("data-hintbox", "1")
                .attr("data-hintbox-contents", hint_html)
                .child(format_history_value(&text, cell.item.as_ref()));
            (value, false)
        }
        ColumnData::ItemValue => {
            let mut gauge = Tag::new("z-bar-gauge").class("item-value").attr("value", text.as_str());
            for threshold in column.thresholds.iter().flatten() {
                gauge = gauge.child(
                    Tag::new("threshold")
                        .attr("threshold", threshold.threshold.to_string())
                        .attr("color", threshold.color.as_str()),
                );
            }
            if column.display == ColumnDisplay::Bar {
                gauge = gauge.attr("solid", "1");
            }
            if let Some(base) = &column.base_color {
                gauge = gauge.attr("fill", format!("#{}", base));
            }
            if let Some(min) = &column.min {
                gauge = gauge.attr("min", min.as_str());
            }
            if let Some(max) = &column.max {
                gauge = gauge.attr("max", max.as_str());
            }
            (gauge, true)
        }
    };

    let color = cell_color(column, &cell.value);
    let td = Tag::new("td").child(content);
    if !is_gauge && !color.is_empty() {
        td.style(format!("background-color: #{}", color))
    } else {
        td
    }
}

pub fn render_table(data: &TopHostsData) -> Tag {
    let header = Tag::new("tr").children(data.configuration.iter().map(|c| Tag::new("th").child(c.name.as_str())));

    let mut body = Tag::new("tbody");
    for row in &data.rows {
        let cells = row
            .iter()
            .zip(&data.configuration)
            .map(|(cell, column)| Node::from(render_cell(column, cell)));
        body = body.child(Tag::new("tr").children(cells));
    }

    if data.rows.is_empty() {
        let colspan = data.configuration.len().max(1).to_string();
        body = body.child(
            Tag::new("tr")
                .class("nothing-to-show")
                .child(Tag::new("td").attr("colspan", colspan).child("No data found.")),
        );
    }

    Tag::new("table")
        .class("list-table")
        .child(Tag::new("thead").child(header))
        .child(body)
}

/// Widget response JSON: `{name, body, messages?, debug?}`.
pub fn render(data: &TopHostsData) -> Value {
    let body = div().class("dashboard-grid-widget-tophosts").child(render_table(data)).render();

    let mut output = json!({
        "name": data.name,
        "body": body,
    });

    if !data.messages.is_empty() {
        output["messages"] = json!(super::pages::message_box(&data.messages).render());
    }

    if data.debug_mode {
        output["debug"] = json!(data.debug.clone().unwrap_or_default());
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(data: ColumnData, display: ColumnDisplay) -> ColumnConfig {
        ColumnConfig {
            name: "Col".to_string(),
            data,
            display,
            base_color: None,
            thresholds: None,
            min: None,
            max: None,
        }
    }

    fn cell(value: Value) -> Cell {
        Cell { value, hostid: None, item: None }
    }

    #[test]
    fn test_host_name_cell_has_menu_popup() {
        let mut c = cell(json!("web-01"));
        c.hostid = Some(10084);
        let html = render_cell(&column(ColumnData::HostName, ColumnDisplay::AsIs), &c).render();
        assert!(html.contains("link-action"));
        assert!(html.contains("&quot;hostid&quot;:&quot;10084&quot;"));
        assert!(html.contains(">web-01</a>"));
    }

    #[test]
    fn test_last_reached_threshold_colors_as_is_cell() {
        let mut col = column(ColumnData::ItemValue, ColumnDisplay::AsIs);
        col.base_color = Some("AAAAAA".to_string());
        col.thresholds = Some(vec![
            Threshold { threshold: 10.0, color: "FFFF00".to_string() },
            Threshold { threshold: 50.0, color: "FF0000".to_string() },
        ]);

        assert_eq!(cell_color(&col, &json!("5")), "AAAAAA");
        assert_eq!(cell_color(&col, &json!("10")), "FFFF00");
        assert_eq!(cell_color(&col, &json!(75)), "FF0000");
        assert_eq!(cell_color(&col, &json!("n/a")), "AAAAAA");

        let html = render_cell(&col, &cell(json!("20"))).render();
        assert!(html.starts_with("<td style=\"background-color: #FFFF00\">"));
    }

    #[test]
    fn test_bar_gauge_is_not_colored_by_cell() {
        let mut col = column(ColumnData::ItemValue, ColumnDisplay::Bar);
        col.base_color = Some("00FF00".to_string());
        col.min = Some("0".to_string());
        col.max = Some("100".to_string());
        col.thresholds = Some(vec![Threshold { threshold: 80.0, color: "FF0000".to_string() }]);

        let html = render_cell(&col, &cell(json!("90"))).render();
        assert!(html.starts_with("<td><z-bar-gauge"));
        assert!(html.contains("solid=\"1\""));
        assert!(html.contains("fill=\"#00FF00\""));
        assert!(html.contains("<threshold threshold=\"80\" color=\"FF0000\"></threshold>"));
    }

    #[test]
    fn test_hint_is_truncated() {
        let long = "x".repeat(HINTBOX_CONTENT_LIMIT + 100);
        let html = render_cell(&column(ColumnData::ItemValue, ColumnDisplay::AsIs), &cell(json!(long))).render();
        let hint_len = format!("{}{}", "x".repeat(HINTBOX_CONTENT_LIMIT), "&lt;/div&gt;");
        assert!(html.contains(&hint_len));
        assert!(!html.contains(&format!("{}x&lt;", "x".repeat(HINTBOX_CONTENT_LIMIT))));
    }

    #[test]
    fn test_units_are_appended_to_numbers() {
        assert_eq!(format_history_value("42", Some(&ItemInfo { units: "%".to_string() })), "42 %");
        assert_eq!(format_history_value("up", Some(&ItemInfo { units: "%".to_string() })), "up");
    }

    #[test]
    fn test_output_envelope() {
        let mut data = TopHostsData {
            name: "Top hosts".to_string(),
            configuration: vec![column(ColumnData::Text, ColumnDisplay::AsIs)],
            rows: vec![vec![cell(json!("hello"))]],
            messages: vec![],
            debug_mode: false,
            debug: Some("profiler".to_string()),
        };

        let output = render(&data);
        assert_eq!(output["name"], "Top hosts");
        assert!(output["body"].as_str().unwrap().starts_with("<div class=\"dashboard-grid-widget-tophosts\"><table"));
        assert!(output.get("debug").is_none());
        assert!(output.get("messages").is_none());

        data.debug_mode = true;
        data.messages = vec!["Item not found".to_string()];
        let output = render(&data);
        assert_eq!(output["debug"], "profiler");
        assert!(output["messages"].as_str().unwrap().contains("Item not found"));
    }
}
