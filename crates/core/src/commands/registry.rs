//! Static intent catalog and shortcut index.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::domain::command::{IntentDefinition, IntentId, SuggestedAction};
use crate::domain::execution::ExecutableAction;
use crate::domain::task::Floor;

pub const SHORTCUT_SENTINEL: char = '/';

struct Registry {
    definitions: Vec<IntentDefinition>,
    shortcuts: HashMap<String, IntentId>,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        let definitions = build_definitions();
        let shortcuts = definitions
            .iter()
            .flat_map(|definition| {
                definition.shortcuts.iter().map(move |shortcut| (shortcut.clone(), definition.id))
            })
            .collect();
        Registry { definitions, shortcuts }
    })
}

/// All definitions in registry order. Order breaks keyword-score ties.
pub fn intent_registry() -> &'static [IntentDefinition] {
    &registry().definitions
}

pub fn intent_by_id(id: IntentId) -> Option<&'static IntentDefinition> {
    registry().definitions.iter().find(|definition| definition.id == id)
}

pub fn intent_for_shortcut(token: &str) -> Option<IntentId> {
    registry().shortcuts.get(&token.trim().to_ascii_lowercase()).copied()
}

pub fn all_shortcuts() -> Vec<&'static str> {
    registry()
        .definitions
        .iter()
        .flat_map(|definition| definition.shortcuts.iter().map(String::as_str))
        .collect()
}

/// Translates a registry suggested-action id into the executor's vocabulary.
pub fn map_action_intent_to_execution(suggested_action_id: &str) -> Option<ExecutableAction> {
    match suggested_action_id.trim() {
        "send_payment_reminder" | "text_store" => Some(ExecutableAction::SendText),
        "mark_paid" => Some(ExecutableAction::UpdateInvoiceStatus),
        "create_collection_task" | "create_followup" => Some(ExecutableAction::AddFollowupTask),
        "export_list" => Some(ExecutableAction::ExportData),
        "create_restock_batch" | "create_batch" => Some(ExecutableAction::CreateProductionBatch),
        "notify_team" | "notify_driver" | "notify_ambassador" => {
            Some(ExecutableAction::SendNotification)
        }
        "tag_store" => Some(ExecutableAction::MarkStoreTag),
        "assign_driver" => Some(ExecutableAction::AssignDriver),
        "send_route" => Some(ExecutableAction::SendRouteToDriver),
        "push_wholesale" => Some(ExecutableAction::PushWholesaleItem),
        _ => None,
    }
}

fn build_definitions() -> Vec<IntentDefinition> {
    vec![
        definition(
            IntentId::QueryUnpaid,
            "Unpaid Invoices",
            &[
                "unpaid",
                "unpaid invoices",
                "owe",
                "outstanding",
                "overdue",
                "past due",
                "balance due",
                "collections",
            ],
            &["/unpaid", "/owed"],
            Floor::FinanceCollections,
            &[
                ("send_payment_reminder", "Text payment reminder"),
                ("mark_paid", "Mark as paid"),
                ("create_collection_task", "Create collection follow-up"),
                ("export_list", "Export list"),
            ],
        ),
        definition(
            IntentId::QueryLowStock,
            "Low Stock",
            &[
                "low stock",
                "running low",
                "restock",
                "low inventory",
                "out of stock",
                "inventory",
                "tubes left",
            ],
            &["/low", "/restock"],
            Floor::StoresInventory,
            &[
                ("create_restock_batch", "Schedule production batch"),
                ("notify_team", "Notify inventory team"),
                ("export_list", "Export list"),
            ],
        ),
        definition(
            IntentId::QueryInactiveStores,
            "Inactive Stores",
            &[
                "inactive stores",
                "inactive",
                "haven't ordered",
                "no orders",
                "not ordering",
                "stopped ordering",
            ],
            &["/inactive"],
            Floor::StoresInventory,
            &[
                ("text_store", "Text stores"),
                ("create_followup", "Add follow-up task"),
                ("tag_store", "Tag as at-risk"),
            ],
        ),
        definition(
            IntentId::QueryDeliveries,
            "Deliveries & Routes",
            &["deliveries", "delivery", "routes", "deliveries today", "drop offs", "dropoffs"],
            &["/routes", "/deliveries"],
            Floor::DeliveryRoutes,
            &[
                ("assign_driver", "Assign driver"),
                ("send_route", "Send route to driver"),
                ("export_list", "Export list"),
            ],
        ),
        definition(
            IntentId::QueryDrivers,
            "Driver Performance",
            &["driver", "drivers", "late drivers", "driver performance", "on time"],
            &["/drivers"],
            Floor::DeliveryRoutes,
            &[("notify_driver", "Notify drivers"), ("export_list", "Export list")],
        ),
        definition(
            IntentId::QueryAmbassadors,
            "Ambassadors",
            &["ambassador", "ambassadors", "inactive ambassadors", "ambassador performance"],
            &["/ambassadors"],
            Floor::Ambassadors,
            &[("notify_ambassador", "Notify ambassadors"), ("create_followup", "Add follow-up task")],
        ),
        definition(
            IntentId::QueryProduction,
            "Production Queue",
            &["production", "batch", "batches", "production queue", "manufacturing"],
            &["/production"],
            Floor::Production,
            &[("create_batch", "Create production batch"), ("notify_team", "Notify production team")],
        ),
        definition(
            IntentId::QueryTopStores,
            "Top Stores",
            &[
                "top stores",
                "best stores",
                "biggest stores",
                "highest volume",
                "top accounts",
                "best customers",
            ],
            &["/top"],
            Floor::CommandCenter,
            &[
                ("create_followup", "Schedule check-in"),
                ("tag_store", "Tag as VIP"),
                ("export_list", "Export list"),
            ],
        ),
        definition(
            IntentId::QueryFollowups,
            "Communication Follow-ups",
            &[
                "follow up",
                "follow-up",
                "followups",
                "haven't contacted",
                "no contact",
                "not contacted",
                "check in",
            ],
            &["/followups"],
            Floor::Communications,
            &[("text_store", "Text stores"), ("create_followup", "Add follow-up task")],
        ),
        definition(
            IntentId::QueryWholesale,
            "Wholesale Listings",
            &["wholesale", "wholesale items", "marketplace", "listings"],
            &["/wholesale"],
            Floor::Wholesale,
            &[("push_wholesale", "Push to wholesale"), ("export_list", "Export list")],
        ),
        definition(
            IntentId::ShowHelp,
            "Help",
            &["help", "what can you do", "commands"],
            &["/help"],
            Floor::CommandCenter,
            &[],
        ),
    ]
}

fn definition(
    id: IntentId,
    name: &str,
    keywords: &[&str],
    shortcuts: &[&str],
    floor: Floor,
    suggested_actions: &[(&str, &str)],
) -> IntentDefinition {
    IntentDefinition {
        id,
        name: name.to_string(),
        keywords: keywords.iter().map(|keyword| keyword.to_string()).collect(),
        shortcuts: shortcuts.iter().map(|shortcut| shortcut.to_string()).collect(),
        floor,
        suggested_actions: suggested_actions
            .iter()
            .map(|(id, label)| SuggestedAction { id: id.to_string(), label: label.to_string() })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{
        all_shortcuts, intent_by_id, intent_for_shortcut, intent_registry,
        map_action_intent_to_execution, SHORTCUT_SENTINEL,
    };
    use crate::domain::command::IntentId;
    use crate::domain::execution::ExecutableAction;

    #[test]
    fn every_shortcut_is_unique_and_well_formed() {
        let shortcuts = all_shortcuts();
        let unique: HashSet<_> = shortcuts.iter().collect();
        assert_eq!(unique.len(), shortcuts.len(), "shortcuts must not collide");

        for shortcut in shortcuts {
            let word = shortcut.strip_prefix(SHORTCUT_SENTINEL).expect("sentinel prefix");
            assert!(!word.is_empty());
            assert!(word.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit()));
        }
    }

    #[test]
    fn lookup_by_id_and_shortcut() {
        let unpaid = intent_by_id(IntentId::QueryUnpaid).expect("registered");
        assert!(unpaid.shortcuts.contains(&"/unpaid".to_string()));
        assert_eq!(intent_for_shortcut("/UNPAID"), Some(IntentId::QueryUnpaid));
        assert_eq!(intent_for_shortcut("/restock"), Some(IntentId::QueryLowStock));
        assert_eq!(intent_for_shortcut("/nothing"), None);
        assert!(intent_by_id(IntentId::Unknown).is_none());
    }

    #[test]
    fn every_suggested_action_maps_to_an_executable_action() {
        for definition in intent_registry() {
            for action in &definition.suggested_actions {
                assert!(
                    map_action_intent_to_execution(&action.id).is_some(),
                    "{} has unmapped suggestion {}",
                    definition.id.as_str(),
                    action.id
                );
            }
        }
        assert_eq!(map_action_intent_to_execution("mark_paid"), Some(ExecutableAction::UpdateInvoiceStatus));
        assert_eq!(map_action_intent_to_execution("dance"), None);
    }
}
