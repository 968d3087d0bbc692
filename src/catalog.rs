//! Entity catalog.
//!
//! One row per API collection. The `entity_catalog!` macro turns the table
//! into a `static ResourceConfig` per row, the `CATALOG` lookup slice, and an
//! accessor method on `AutotaskClient` per row, so adding a collection is a
//! one-line change and descriptors can never drift from the accessors.

use crate::client::AutotaskClient;
use crate::models::PageSizeKey::{MaxRecords, MaxRecordsCamel, PageSize};
use crate::resource::Capabilities as Caps;
use crate::resource::ListTransport::{GetQuery, PostQuery};
use crate::resource::{ResourceClient, ResourceConfig};

/// A catalog row: accessor name and configuration.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    /// Snake-case accessor name on `AutotaskClient` (e.g. `time_off_requests`).
    pub accessor: &'static str,
    /// Resource configuration.
    pub config: &'static ResourceConfig,
}

macro_rules! entity_catalog {
    ($( $accessor:ident => $konst:ident ($name:literal, $caps:expr, $key:expr, $transport:expr); )*) => {
        $(
            #[doc = concat!("Configuration of the `", $name, "` collection.")]
            pub static $konst: ResourceConfig = ResourceConfig {
                name: $name,
                path: concat!("/", $name),
                capabilities: $caps,
                page_size_key: $key,
                list_transport: $transport,
            };
        )*

        /// Every known collection, in table order.
        pub static CATALOG: &[CatalogEntry] = &[
            $( CatalogEntry { accessor: stringify!($accessor), config: &$konst }, )*
        ];

        impl AutotaskClient {
            $(
                #[doc = concat!("Client for the `", $name, "` collection (`/", $name, "`).")]
                pub fn $accessor(&self) -> ResourceClient {
                    self.resource(&$konst)
                }
            )*
        }
    };
}

entity_catalog! {
    action_types => ACTION_TYPES("ActionTypes", Caps::ALL, MaxRecords, PostQuery);
    appointments => APPOINTMENTS("Appointments", Caps::ALL, MaxRecords, PostQuery);
    billing_codes => BILLING_CODES("BillingCodes", Caps::READ_ONLY, MaxRecords, PostQuery);
    companies => COMPANIES("Companies", Caps::NO_DELETE, MaxRecords, PostQuery);
    company_locations => COMPANY_LOCATIONS("CompanyLocations", Caps::ALL, MaxRecords, PostQuery);
    company_notes => COMPANY_NOTES("CompanyNotes", Caps::NO_DELETE, MaxRecords, PostQuery);
    configuration_items => CONFIGURATION_ITEMS("ConfigurationItems", Caps::NO_DELETE, MaxRecords, PostQuery);
    contacts => CONTACTS("Contacts", Caps::ALL, MaxRecords, PostQuery);
    contract_charges => CONTRACT_CHARGES("ContractCharges", Caps::ALL, MaxRecords, PostQuery);
    contract_services => CONTRACT_SERVICES("ContractServices", Caps::NO_DELETE, MaxRecords, PostQuery);
    contracts => CONTRACTS("Contracts", Caps::NO_DELETE, MaxRecords, PostQuery);
    countries => COUNTRIES("Countries", Caps::READ_ONLY, PageSize, GetQuery);
    currencies => CURRENCIES("Currencies", Caps::READ_ONLY, PageSize, GetQuery);
    departments => DEPARTMENTS("Departments", Caps::NO_DELETE, MaxRecords, PostQuery);
    expense_items => EXPENSE_ITEMS("ExpenseItems", Caps::ALL, MaxRecords, PostQuery);
    expense_reports => EXPENSE_REPORTS("ExpenseReports", Caps::NO_DELETE, MaxRecords, PostQuery);
    holiday_sets => HOLIDAY_SETS("HolidaySets", Caps::ALL, MaxRecords, PostQuery);
    holidays => HOLIDAYS("Holidays", Caps::ALL, MaxRecords, PostQuery);
    invoices => INVOICES("Invoices", Caps::READ_UPDATE, MaxRecords, PostQuery);
    opportunities => OPPORTUNITIES("Opportunities", Caps::NO_DELETE, MaxRecords, PostQuery);
    phases => PHASES("Phases", Caps::NO_DELETE, MaxRecords, PostQuery);
    price_list_services => PRICE_LIST_SERVICES("PriceListServices", Caps::READ_UPDATE, MaxRecordsCamel, PostQuery);
    products => PRODUCTS("Products", Caps::NO_DELETE, MaxRecords, PostQuery);
    projects => PROJECTS("Projects", Caps::NO_DELETE, MaxRecords, PostQuery);
    purchase_orders => PURCHASE_ORDERS("PurchaseOrders", Caps::NO_DELETE, MaxRecords, PostQuery);
    quote_items => QUOTE_ITEMS("QuoteItems", Caps::ALL, MaxRecords, PostQuery);
    quotes => QUOTES("Quotes", Caps::NO_DELETE, MaxRecords, PostQuery);
    resources => RESOURCES("Resources", Caps::READ_UPDATE, MaxRecords, PostQuery);
    roles => ROLES("Roles", Caps::NO_DELETE, MaxRecords, PostQuery);
    service_calls => SERVICE_CALLS("ServiceCalls", Caps::ALL, MaxRecords, PostQuery);
    services => SERVICES("Services", Caps::NO_DELETE, MaxRecords, PostQuery);
    tasks => TASKS("Tasks", Caps::ALL, MaxRecords, PostQuery);
    ticket_categories => TICKET_CATEGORIES("TicketCategories", Caps::READ_ONLY, PageSize, GetQuery);
    ticket_charges => TICKET_CHARGES("TicketCharges", Caps::ALL, MaxRecords, PostQuery);
    ticket_notes => TICKET_NOTES("TicketNotes", Caps::NO_DELETE, MaxRecords, PostQuery);
    tickets => TICKETS("Tickets", Caps::NO_DELETE, MaxRecords, PostQuery);
    time_entries => TIME_ENTRIES("TimeEntries", Caps::ALL, MaxRecords, PostQuery);
    time_off_requests => TIME_OFF_REQUESTS("TimeOffRequests", Caps::CREATE_READ_DELETE, MaxRecordsCamel, PostQuery);
}

/// Finds a collection by API name (`TimeOffRequests`) or accessor name
/// (`time_off_requests`, `time-off-requests`), ignoring ASCII case.
pub fn find(name: &str) -> Option<&'static ResourceConfig> {
    let wanted = name.trim().replace('-', "_");
    CATALOG
        .iter()
        .find(|entry| {
            entry.config.name.eq_ignore_ascii_case(&wanted)
                || entry.accessor.eq_ignore_ascii_case(&wanted)
        })
        .map(|entry| entry.config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Operation;
    use std::collections::HashSet;

    #[test]
    fn test_find_by_api_and_accessor_name() {
        assert_eq!(find("Tickets").map(|c| c.path), Some("/Tickets"));
        assert_eq!(find("tickets").map(|c| c.name), Some("Tickets"));
        assert_eq!(
            find("time-off-requests").map(|c| c.name),
            Some("TimeOffRequests")
        );
        assert!(find("Widgets").is_none());
    }

    #[test]
    fn test_catalog_names_are_unique() {
        let names: HashSet<_> = CATALOG.iter().map(|e| e.config.name).collect();
        assert_eq!(names.len(), CATALOG.len());
    }

    #[test]
    fn test_paths_derive_from_names() {
        for entry in CATALOG {
            assert_eq!(entry.config.path, format!("/{}", entry.config.name));
        }
    }

    #[test]
    fn test_descriptors_match_capabilities_for_every_resource() {
        for entry in CATALOG {
            let described: HashSet<&str> = entry
                .config
                .describe_operations()
                .iter()
                .map(|d| d.name)
                .collect();
            for op in Operation::ALL {
                assert_eq!(
                    described.contains(op.name()),
                    entry.config.capabilities.supports(op),
                    "{} {}",
                    entry.config.name,
                    op.name()
                );
            }
            assert_eq!(
                described.contains("count"),
                entry.config.capabilities.list,
                "{} count",
                entry.config.name
            );
        }
    }

    #[test]
    fn test_lookup_collections_use_get_queries() {
        for name in ["Countries", "Currencies", "TicketCategories"] {
            let config = find(name).unwrap();
            assert_eq!(config.list_transport, GetQuery);
            assert_eq!(config.page_size_key, PageSize);
        }
    }
}
