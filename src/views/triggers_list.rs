//! Trigger configuration list: filter form, sortable table and bulk actions.
//!
//! Library renderer over trigger rows the caller has already loaded.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::html::{br, button, div, hidden, link, radio_list, span, text_box, Node, Tag};
use crate::csrf::CSRF_TOKEN_NAME;
use crate::types::ObjectId;
use crate::urls::ConsoleUrl;

pub const NAME_DELIMITER: &str = ": ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerContext {
    Host,
    Template,
}

impl TriggerContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerContext::Host => "host",
            TriggerContext::Template => "template",
        }
    }
}

pub const TRIGGER_STATUS_ENABLED: u8 = 0;
pub const TRIGGER_STATUS_DISABLED: u8 = 1;
pub const TRIGGER_STATE_NORMAL: u8 = 0;
pub const TRIGGER_STATE_UNKNOWN: u8 = 1;
pub const TRIGGER_VALUE_OK: u8 = 0;
pub const TRIGGER_VALUE_PROBLEM: u8 = 1;
pub const HOST_STATUS_MONITORED: u8 = 0;
pub const HOST_STATUS_NOT_MONITORED: u8 = 1;

const SEVERITIES: [(&str, &str); 6] = [
    ("Not classified", "na-bg"),
    ("Information", "info-bg"),
    ("Warning", "warning-bg"),
    ("Average", "average-bg"),
    ("High", "high-bg"),
    ("Disaster", "disaster-bg"),
];

const TAG_OPERATORS: [(u8, &str); 6] = [
    (4, "Exists"),
    (1, "Equals"),
    (0, "Contains"),
    (5, "Does not exist"),
    (3, "Does not equal"),
    (2, "Does not contain"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: ObjectId,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagFilter {
    pub tag: String,
    pub value: String,
    /// Contains (0) by default
    #[serde(default)]
    pub operator: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerFilter {
    #[serde(default)]
    pub groups: Vec<NamedRef>,
    #[serde(default)]
    pub hosts: Vec<NamedRef>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub priority: Vec<u8>,
    pub state: i64,
    pub status: i64,
    pub value: i64,
    #[serde(default)]
    pub tags: Vec<TagFilter>,
    #[serde(default)]
    pub evaltype: i64,
    pub inherited: i64,
    pub discovered: i64,
    pub dependent: i64,
}

impl Default for TriggerFilter {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            hosts: Vec::new(),
            name: String::new(),
            priority: Vec::new(),
            state: -1,
            status: -1,
            value: -1,
            tags: Vec::new(),
            evaltype: 0,
            inherited: -1,
            discovered: -1,
            dependent: -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerHost {
    pub hostid: ObjectId,
    pub name: String,
    pub status: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDependency {
    pub triggerid: ObjectId,
    pub description: String,
    pub hosts: Vec<String>,
    pub status: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryRuleRef {
    pub itemid: ObjectId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRow {
    pub triggerid: ObjectId,
    pub description: String,
    pub priority: u8,
    pub expression: String,
    #[serde(default)]
    pub recovery_expression: Option<String>,
    pub status: u8,
    #[serde(default)]
    pub state: u8,
    #[serde(default)]
    pub value: u8,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub opdata: String,
    pub hosts: Vec<TriggerHost>,
    #[serde(default)]
    pub discovery_rule: Option<DiscoveryRuleRef>,
    /// Template the trigger is inherited from
    #[serde(default)]
    pub parent_template: Option<NamedRef>,
    #[serde(default)]
    pub dependencies: Vec<TriggerDependency>,
    #[serde(default)]
    pub tags: Vec<(String, String)>,
    /// Deletion time of a lost discovered trigger
    #[serde(default)]
    pub ts_delete: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    fn reversed(&self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerListData {
    pub context: TriggerContext,
    pub filter: TriggerFilter,
    pub profile_idx: String,
    pub active_tab: i64,
    /// Non-zero when the filter selects exactly one host or template
    pub single_selected_hostid: ObjectId,
    pub sort: String,
    pub sortorder: SortOrder,
    pub show_value_column: bool,
    pub show_info_column: bool,
    pub triggers: Vec<TriggerRow>,
    pub checkbox_hash: String,
    /// CSRF tokens of the session, keyed by action; see [`TRIGGER_ACTIONS`]
    pub csrf_tokens: BTreeMap<String, String>,
}

/// Actions the list links to; the caller signs a token for each.
pub const TRIGGER_ACTIONS: &[&str] = &[
    "trigger.massenable",
    "trigger.massdisable",
    "trigger.masscopyto",
    "trigger.massdelete",
];

impl TriggerListData {
    fn csrf_token(&self, action: &str) -> &str {
        self.csrf_tokens.get(action).map(String::as_str).unwrap_or_default()
    }
}

fn list_url(context: TriggerContext) -> ConsoleUrl {
    ConsoleUrl::parse("triggers.php").set_argument("context", context.as_str())
}

pub fn severity_cell(priority: u8) -> Tag {
    let (name, class) = SEVERITIES.get(priority as usize).copied().unwrap_or(SEVERITIES[0]);
    Tag::new("td").class(class).child(name)
}

/// Label and style of the status column.
pub fn trigger_indicator(status: u8, state: u8) -> (&'static str, &'static str) {
    match (status, state) {
        (TRIGGER_STATUS_ENABLED, TRIGGER_STATE_UNKNOWN) => ("Unknown", "grey"),
        (TRIGGER_STATUS_ENABLED, _) => ("Enabled", "green"),
        _ => ("Disabled", "red"),
    }
}

fn sorting_header(label: &str, field: &str, data: &TriggerListData) -> Tag {
    let is_current = data.sort == field;
    let next_order = if is_current { data.sortorder.reversed() } else { SortOrder::Asc };
    let url = list_url(data.context)
        .set_argument("sort", field)
        .set_argument("sortorder", next_order.as_str());

    let mut header = Tag::new("th").child(link(label, url.to_string()));
    if is_current {
        let arrow = match data.sortorder {
            SortOrder::Asc => "arrow-up",
            SortOrder::Desc => "arrow-down",
        };
        header = header.child(span().class(arrow));
    }
    header
}

fn filter_form(data: &TriggerListData) -> Tag {
    let filter = &data.filter;
    let is_host = data.context == TriggerContext::Host;

    let multiselect = |name: &str, items: &[NamedRef]| {
        div()
            .class("multiselect")
            .attr("data-name", format!("{}[]", name))
            .children(items.iter().map(|i| {
                span()
                    .class("subfilter-item")
                    .child(i.name.as_str())
                    .child(hidden(&format!("{}[]", name), i.id.to_string()))
            }))
    };

    let row = |label: &str, field: Tag| {
        Tag::new("li")
            .child(div().class("table-forms-td-left").child(Tag::new("label").child(label)))
            .child(div().class("table-forms-td-right").child(field))
    };

    let severities = Tag::new("ul").class("checkbox-list").children(SEVERITIES.iter().enumerate().map(|(i, (name, _))| {
        let id = format!("filter_priority_{}", i);
        Tag::new("li")
            .child(
                Tag::new("input")
                    .attr("type", "checkbox")
                    .attr("id", id.clone())
                    .attr("name", format!("filter_priority[{}]", i))
                    .attr("value", i.to_string())
                    .attr_if(filter.priority.contains(&(i as u8)), "checked", "checked"),
            )
            .child(Tag::new("label").attr("for", id).child(*name))
    }));

    let mut column1 = Tag::new("ul")
        .class("table-forms")
        .child(row("Host groups", multiselect("filter_groupids", &filter.groups)))
        .child(row(if is_host { "Hosts" } else { "Templates" }, multiselect("filter_hostids", &filter.hosts)))
        .child(row("Name", text_box("filter_name", &filter.name)))
        .child(row("Severity", severities));

    if is_host {
        column1 = column1.child(row(
            "State",
            radio_list("filter_state", filter.state, &[("all", -1), ("Normal", 0), ("Unknown", 1)]),
        ));
    }
    column1 = column1.child(row(
        "Status",
        radio_list("filter_status", filter.status, &[("all", -1), ("Enabled", 0), ("Disabled", 1)]),
    ));
    if is_host {
        column1 = column1.child(row(
            "Value",
            radio_list("filter_value", filter.value, &[("all", -1), ("Ok", 0), ("Problem", 1)]),
        ));
    }

    // At least one empty tag row is always shown
    let default_tags = [TagFilter::default()];
    let tags: &[TagFilter] = if filter.tags.is_empty() { &default_tags } else { &filter.tags };

    let mut tags_table = Tag::new("table").id("filter-tags").child(
        Tag::new("tr").child(
            Tag::new("td")
                .attr("colspan", "4")
                .child(radio_list("filter_evaltype", filter.evaltype, &[("And/Or", 0), ("Or", 2)])),
        ),
    );
    for (i, tag) in tags.iter().enumerate() {
        let operator = Tag::new("select")
            .attr("name", format!("filter_tags[{}][operator]", i))
            .attr("id", format!("filter_tags_{}_operator", i))
            .children(TAG_OPERATORS.iter().map(|(value, label)| {
                Tag::new("option")
                    .attr("value", value.to_string())
                    .attr_if(*value == tag.operator, "selected", "selected")
                    .child(*label)
            }));

        tags_table = tags_table.child(
            Tag::new("tr")
                .class("form_row")
                .child(Tag::new("td").child(text_box(&format!("filter_tags[{}][tag]", i), &tag.tag).attr("placeholder", "tag")))
                .child(Tag::new("td").child(operator))
                .child(
                    Tag::new("td")
                        .child(text_box(&format!("filter_tags[{}][value]", i), &tag.value).attr("placeholder", "value")),
                )
                .child(
                    Tag::new("td")
                        .class("nowrap")
                        .child(button(&format!("filter_tags[{}][remove]", i), "Remove").class("btn-link").class("element-table-remove")),
                ),
        );
    }
    tags_table = tags_table.child(
        Tag::new("tr").child(
            Tag::new("td")
                .attr("colspan", "3")
                .child(button("filter_tags_add", "Add").class("btn-link").class("element-table-add")),
        ),
    );

    let yes_no = [("all", -1), ("Yes", 1), ("No", 0)];
    let mut column2 = Tag::new("ul")
        .class("table-forms")
        .child(row("Tags", tags_table))
        .child(row("Inherited", radio_list("filter_inherited", filter.inherited, &yes_no)));
    if is_host {
        column2 = column2.child(row("Discovered", radio_list("filter_discovered", filter.discovered, &yes_no)));
    }
    column2 = column2.child(row("With dependencies", radio_list("filter_dependent", filter.dependent, &yes_no)));

    Tag::new("form")
        .attr("method", "get")
        .attr("action", list_url(data.context).to_string())
        .class("filter-container")
        .attr("data-profile-idx", data.profile_idx.as_str())
        .attr("data-active-tab", data.active_tab.to_string())
        .child(hidden("context", data.context.as_str()))
        .child(
            div()
                .class("filter-tab")
                .attr("data-label", "Filter")
                .child(div().class("filter-column-1").child(column1))
                .child(div().class("filter-column-2").child(column2)),
        )
}

fn create_button(data: &TriggerListData) -> Tag {
    let control = if data.single_selected_hostid != 0 {
        let url = ConsoleUrl::parse("triggers.php")
            .set_argument("hostid", data.single_selected_hostid.to_string())
            .set_argument("form", "create")
            .set_argument("context", data.context.as_str());
        button("form", "Create trigger")
            .attr("data-url", url.to_string())
            .attr("onclick", "document.location = this.dataset.url;")
    } else {
        let label = match data.context {
            TriggerContext::Host => "Create trigger (select host first)",
            TriggerContext::Template => "Create trigger (select template first)",
        };
        button("form", label).attr("disabled", "disabled")
    };

    Tag::new("nav").attr("aria-label", "Content controls").child(control)
}

fn description_cell(trigger: &TriggerRow, data: &TriggerListData) -> Tag {
    let mut cell = Tag::new("td");

    if let Some(template) = &trigger.parent_template {
        cell = cell
            .child(span().class("grey").child(template.name.as_str()))
            .child(NAME_DELIMITER);
    }

    if let Some(rule) = &trigger.discovery_rule {
        let url = ConsoleUrl::parse("trigger_prototypes.php")
            .set_argument("parent_discoveryid", rule.itemid.to_string())
            .set_argument("context", data.context.as_str());
        cell = cell
            .child(link(rule.name.as_str(), url.to_string()).class("link-alt").class("orange"))
            .child(NAME_DELIMITER);
    }

    let edit = ConsoleUrl::parse("triggers.php")
        .set_argument("form", "update")
        .set_argument("triggerid", trigger.triggerid.to_string())
        .set_argument("context", data.context.as_str());
    cell = cell.child(link(trigger.description.as_str(), edit.to_string()).class("wordwrap"));

    if !trigger.dependencies.is_empty() {
        let mut deps: Vec<Node> = Vec::new();
        for dep in &trigger.dependencies {
            if !deps.is_empty() {
                deps.push(br().into());
            }
            let url = ConsoleUrl::parse("triggers.php")
                .set_argument("form", "update")
                .set_argument("triggerid", dep.triggerid.to_string())
                .set_argument("context", data.context.as_str());
            let text = format!("{}{}{}", dep.hosts.join(", "), NAME_DELIMITER, dep.description);
            let (_, style) = trigger_indicator(dep.status, TRIGGER_STATE_NORMAL);
            deps.push(link(text, url.to_string()).class("link-alt").class(style).into());
        }

        cell = cell
            .child(br())
            .child(Tag::new("b").child("Depends on:"))
            .child(div().class("dependencies").children(deps));
    }

    cell
}

fn status_link(trigger: &TriggerRow, data: &TriggerListData) -> Tag {
    let action = if trigger.status == TRIGGER_STATUS_DISABLED {
        "trigger.massenable"
    } else {
        "trigger.massdisable"
    };
    let url = ConsoleUrl::parse("triggers.php")
        .set_argument("g_triggerid", trigger.triggerid.to_string())
        .set_argument("action", action)
        .set_argument("context", data.context.as_str())
        .set_argument(CSRF_TOKEN_NAME, data.csrf_token(action));

    let (label, style) = trigger_indicator(trigger.status, trigger.state);
    link(label, url.to_string()).class("link-action").class(style)
}

fn expression_cell(trigger: &TriggerRow) -> Tag {
    let content = match &trigger.recovery_expression {
        Some(recovery) if !recovery.is_empty() => div()
            .class("wordwrap")
            .child("Problem: ")
            .child(trigger.expression.as_str())
            .child(br())
            .child("Recovery: ")
            .child(recovery.as_str()),
        _ => div().class("wordwrap").child(trigger.expression.as_str()),
    };
    Tag::new("td").child(content)
}

fn value_cell(trigger: &TriggerRow) -> Tag {
    let monitored = trigger
        .hosts
        .first()
        .is_some_and(|h| h.status == HOST_STATUS_MONITORED || h.status == HOST_STATUS_NOT_MONITORED);
    if !monitored {
        return Tag::new("td");
    }
    let (label, class) = if trigger.value == TRIGGER_VALUE_PROBLEM {
        ("PROBLEM", "problem-unack-fg")
    } else {
        ("OK", "ok-unack-fg")
    };
    Tag::new("td").child(span().class(class).child(label))
}

fn info_cell(trigger: &TriggerRow) -> Tag {
    let mut icons = Tag::new("div").class("rel-container");
    if trigger.status == TRIGGER_STATUS_ENABLED && !trigger.error.is_empty() {
        icons = icons.child(
            Tag::new("button")
                .attr("type", "button")
                .class("icon-info")
                .class("status-red")
                .attr("data-hintbox", "1")
                .attr("data-hintbox-contents", div().class("wordwrap").child(trigger.error.as_str()).render()),
        );
    }
    if let Some(ts_delete) = trigger.ts_delete.filter(|ts| *ts > 0) {
        icons = icons.child(
            Tag::new("button")
                .attr("type", "button")
                .class("icon-inform")
                .class("status-yellow")
                .attr("data-ts-delete", ts_delete.to_string()),
        );
    }
    Tag::new("td").child(icons)
}

fn tags_cell(trigger: &TriggerRow) -> Tag {
    Tag::new("td").children(trigger.tags.iter().map(|(tag, value)| {
        let text = if value.is_empty() {
            tag.clone()
        } else {
            format!("{}: {}", tag, value)
        };
        span().class("tag").child(text)
    }))
}

fn actions_bar(data: &TriggerListData) -> Tag {
    let action = |name: &str, label: &str, confirm: Option<&str>| {
        let mut b = Tag::new("button")
            .attr("type", "submit")
            .attr("name", "action")
            .attr("value", name)
            .attr("data-required", "g_triggerid")
            .attr("data-csrf-token", data.csrf_token(name))
            .class("btn-alt")
            .child(label);
        if let Some(confirm) = confirm {
            b = b.attr("data-confirmation", confirm);
        }
        Tag::new("li").child(b)
    };

    let mass_update = Tag::new("li").child(
        button("", "Mass update")
            .class("btn-alt")
            .attr("onclick", "return openMassupdatePopup(this, 'popup.massupdate.trigger');"),
    );

    div()
        .id("action_buttons")
        .class("action-buttons")
        .attr("data-checkbox-hash", data.checkbox_hash.as_str())
        .child(span().id("selected_count").class("selected-item-count").child("0 selected"))
        .child(
            Tag::new("ul")
                .child(action("trigger.massenable", "Enable", Some("Enable selected triggers?")))
                .child(action("trigger.massdisable", "Disable", Some("Disable selected triggers?")))
                .child(action("trigger.masscopyto", "Copy", None))
                .child(mass_update)
                .child(action("trigger.massdelete", "Delete", Some("Delete selected triggers?"))),
        )
}

pub fn render(data: &TriggerListData) -> Tag {
    let show_hosts = data.single_selected_hostid == 0;

    let mut header = Tag::new("tr")
        .child(
            Tag::new("th").class("cell-width").child(
                Tag::new("input")
                    .attr("type", "checkbox")
                    .attr("id", "all_triggers")
                    .attr("onclick", "checkAll('triggersForm', 'all_triggers', 'g_triggerid');"),
            ),
        )
        .child(sorting_header("Severity", "priority", data));
    if data.show_value_column {
        header = header.child(Tag::new("th").child("Value"));
    }
    if show_hosts {
        header = header.child(Tag::new("th").child(match data.context {
            TriggerContext::Host => "Host",
            TriggerContext::Template => "Template",
        }));
    }
    header = header
        .child(sorting_header("Name", "description", data))
        .child(Tag::new("th").child("Operational data"))
        .child(Tag::new("th").child("Expression"))
        .child(sorting_header("Status", "status", data));
    if data.show_info_column {
        header = header.child(Tag::new("th").child("Info"));
    }
    header = header.child(Tag::new("th").child("Tags"));

    let mut body = Tag::new("tbody");
    for trigger in &data.triggers {
        let mut row = Tag::new("tr")
            .child(
                Tag::new("td").child(
                    Tag::new("input")
                        .attr("type", "checkbox")
                        .attr("name", format!("g_triggerid[{}]", trigger.triggerid))
                        .attr("value", trigger.triggerid.to_string()),
                ),
            )
            .child(severity_cell(trigger.priority));
        if data.show_value_column {
            row = row.child(value_cell(trigger));
        }
        if show_hosts {
            let hosts: Vec<&str> = trigger.hosts.iter().map(|h| h.name.as_str()).collect();
            row = row.child(Tag::new("td").child(hosts.join(", ")));
        }
        row = row
            .child(description_cell(trigger, data))
            .child(Tag::new("td").child(trigger.opdata.as_str()))
            .child(expression_cell(trigger))
            .child(Tag::new("td").child(status_link(trigger, data)));
        if data.show_info_column {
            row = row.child(info_cell(trigger));
        }
        body = body.child(row.child(tags_cell(trigger)));
    }

    let table = Tag::new("table")
        .class("list-table")
        .child(Tag::new("thead").child(header))
        .child(body);

    let form = Tag::new("form")
        .attr("method", "post")
        .attr("action", list_url(data.context).to_string())
        .attr("name", "triggersForm")
        .child(hidden("checkbox_hash", data.checkbox_hash.as_str()))
        .child(hidden("context", data.context.as_str()))
        .child(table)
        .child(actions_bar(data));

    div()
        .class("wrapper")
        .child(
            Tag::new("header")
                .class("header-title")
                .child(Tag::new("h1").child("Triggers"))
                .child(create_button(data)),
        )
        .child(filter_form(data))
        .child(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csrf::CsrfKey;

    fn trigger(triggerid: ObjectId, status: u8) -> TriggerRow {
        TriggerRow {
            triggerid,
            description: "CPU load is too high".to_string(),
            priority: 4,
            expression: "avg(/web-01/system.cpu.load,5m)>5".to_string(),
            recovery_expression: None,
            status,
            state: TRIGGER_STATE_NORMAL,
            value: TRIGGER_VALUE_OK,
            error: String::new(),
            opdata: String::new(),
            hosts: vec![TriggerHost { hostid: 10084, name: "web-01".to_string(), status: HOST_STATUS_MONITORED }],
            discovery_rule: None,
            parent_template: None,
            dependencies: vec![],
            tags: vec![("scope".to_string(), "performance".to_string())],
            ts_delete: None,
        }
    }

    fn data(triggers: Vec<TriggerRow>) -> TriggerListData {
        TriggerListData {
            context: TriggerContext::Host,
            filter: TriggerFilter::default(),
            profile_idx: "web.triggers.filter".to_string(),
            active_tab: 1,
            single_selected_hostid: 0,
            sort: "description".to_string(),
            sortorder: SortOrder::Asc,
            show_value_column: true,
            show_info_column: true,
            triggers,
            checkbox_hash: "10084".to_string(),
            csrf_tokens: CsrfKey::new("console-secret").tokens("abc", TRIGGER_ACTIONS),
        }
    }

    #[test]
    fn test_create_button_requires_single_host() {
        let mut d = data(vec![]);
        let html = render(&d).render();
        assert!(html.contains("Create trigger (select host first)"));
        assert!(html.contains("disabled=\"disabled\""));

        d.single_selected_hostid = 10084;
        d.context = TriggerContext::Template;
        let html = create_button(&d).render();
        assert!(html.contains("triggers.php?hostid=10084&amp;form=create&amp;context=template"));
        assert!(!html.contains("disabled"));
    }

    #[test]
    fn test_status_link_toggles_with_token() {
        let d = data(vec![]);
        let enabled = status_link(&trigger(1, TRIGGER_STATUS_ENABLED), &d).render();
        assert!(enabled.contains("action=trigger.massdisable"));
        assert!(enabled.contains(&CsrfKey::new("console-secret").token("abc", "trigger.massdisable")));
        assert!(enabled.contains(">Enabled</a>"));

        let disabled = status_link(&trigger(1, TRIGGER_STATUS_DISABLED), &d).render();
        assert!(disabled.contains("action=trigger.massenable"));
        assert!(disabled.contains("class=\"link-action red\""));
    }

    #[test]
    fn test_sorting_header_reverses_current_order() {
        let d = data(vec![]);
        let name = sorting_header("Name", "description", &d).render();
        assert!(name.contains("sortorder=DESC"));
        assert!(name.contains("arrow-up"));

        let status = sorting_header("Status", "status", &d).render();
        assert!(status.contains("sortorder=ASC"));
        assert!(!status.contains("arrow"));
    }

    #[test]
    fn test_description_with_discovery_rule_and_dependencies() {
        let mut t = trigger(5, TRIGGER_STATUS_ENABLED);
        t.discovery_rule = Some(DiscoveryRuleRef { itemid: 77, name: "Mounted filesystems".to_string() });
        t.dependencies = vec![
            TriggerDependency { triggerid: 6, description: "Host down".to_string(), hosts: vec!["web-01".to_string()], status: 0 },
            TriggerDependency { triggerid: 7, description: "Link down".to_string(), hosts: vec!["sw-01".to_string()], status: 1 },
        ];

        let html = description_cell(&t, &data(vec![])).render();
        assert!(html.contains("parent_discoveryid=77"));
        assert!(html.contains(">Mounted filesystems</a>: "));
        assert!(html.contains("<b>Depends on:</b>"));
        assert!(html.contains(">web-01: Host down</a><br><a"));
        assert!(html.contains("class=\"link-alt red\""));
    }

    #[test]
    fn test_recovery_expression_is_shown() {
        let mut t = trigger(5, TRIGGER_STATUS_ENABLED);
        t.recovery_expression = Some("last(/web-01/cpu)<2".to_string());
        let html = expression_cell(&t).render();
        assert!(html.contains("Problem: avg"));
        assert!(html.contains("<br>Recovery: last"));
    }

    #[test]
    fn test_table_columns_follow_flags() {
        let mut d = data(vec![trigger(1, TRIGGER_STATUS_ENABLED)]);
        let html = render(&d).render();
        assert!(html.contains("<th>Value</th>"));
        assert!(html.contains("<th>Host</th>"));
        assert!(html.contains("<th>Info</th>"));
        assert!(html.contains("<td class=\"high-bg\">High</td>"));
        assert!(html.contains("scope: performance"));
        assert!(html.contains("data-confirmation=\"Delete selected triggers?\""));

        d.show_value_column = false;
        d.show_info_column = false;
        d.single_selected_hostid = 10084;
        let html = render(&d).render();
        assert!(!html.contains("<th>Value</th>"));
        assert!(!html.contains("<th>Host</th>"));
        assert!(!html.contains("<th>Info</th>"));
    }

    #[test]
    fn test_template_context_hides_host_only_filters() {
        let mut d = data(vec![]);
        d.context = TriggerContext::Template;
        let html = filter_form(&d).render();
        assert!(html.contains(">Templates</label>"));
        assert!(!html.contains("filter_state"));
        assert!(!html.contains("filter_discovered"));
        assert!(html.contains("filter_dependent"));
        // Empty tag row is always present
        assert!(html.contains("filter_tags[0][tag]"));
    }
}
