//! Display model: matched rule groups annotated with ledger state and
//! expand/collapse defaults, ready for a panel to render.

use crate::dom::dom_tree::NodeId;
use crate::inspect::ledger::ChangeLedger;
use crate::inspect::rules::{MatchOutcome, Provenance, RuleGroup};

/// One property row: the declared value, the effective value shown to
/// the user (the ledger's current value when edited), and the edit flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayProperty {
    pub name: String,
    pub declared_value: String,
    pub display_value: String,
    pub is_changed: bool,
}

#[derive(Debug, Clone)]
pub struct DisplayGroup {
    pub selector_label: String,
    pub provenance: Provenance,
    pub specificity: u32,
    pub properties: Vec<DisplayProperty>,
    pub expanded: bool,
}

/// The full panel content for one inspected element.
#[derive(Debug, Clone)]
pub struct DisplayModel {
    pub groups: Vec<DisplayGroup>,
    /// True when matching found nothing at all; the panel shows an
    /// explicit notice instead of an empty list.
    pub no_rules: bool,
}

/// Groups auto-expand when they are the inline group or small enough
/// to scan at a glance. Inherited groups always start collapsed, they
/// are the noisiest and least actionable.
const AUTO_EXPAND_LIMIT: usize = 5;

pub fn render(outcome: &MatchOutcome, ledger: &ChangeLedger, element_id: NodeId) -> DisplayModel {
    let groups = outcome
        .groups()
        .iter()
        .map(|group| render_group(group, ledger, element_id))
        .collect();
    DisplayModel {
        groups,
        no_rules: matches!(outcome, MatchOutcome::NoRules),
    }
}

fn render_group(group: &RuleGroup, ledger: &ChangeLedger, element_id: NodeId) -> DisplayGroup {
    let properties: Vec<DisplayProperty> = group
        .properties
        .iter()
        .map(|prop| {
            let is_changed = ledger.has_changed(element_id, &prop.name);
            let display_value = ledger
                .current_value(element_id, &prop.name)
                .unwrap_or(&prop.value)
                .to_string();
            DisplayProperty {
                name: prop.name.clone(),
                declared_value: prop.value.clone(),
                display_value,
                is_changed,
            }
        })
        .collect();

    let expanded = match group.provenance {
        Provenance::Inherited => false,
        Provenance::Inline => true,
        _ => properties.len() <= AUTO_EXPAND_LIMIT,
    };

    DisplayGroup {
        selector_label: group.selector_label.clone(),
        provenance: group.provenance,
        specificity: group.specificity,
        properties,
        expanded,
    }
}
