//! Table contracts.
//!
//! Every table is declared once with its columns grouped by default semantics:
//!
//! - `required`: no default, never null.
//! - `defaulted`: never null, the server fills it in when omitted on insert.
//! - `nullable`: may be null; omitted on insert means `null`.
//!
//! From that declaration each table module gets:
//!
//! - `Row`: every column present, nullable columns as `Option<T>` (explicit `null`).
//! - `Insert`: required columns as `T`, everything else `Option<T>` and skipped when `None`.
//! - `Update`: every column `Option<_>`; nullable columns are `Option<Option<T>>` so that
//!   "leave unchanged" (`None`) and "clear" (`Some(None)`) stay distinct.
//! - `DEF`: the runtime [`TableDef`](crate::table::TableDef) used for validation and export.

use crate::table::{Table, TableDef};

macro_rules! column_name {
    ($col:ident) => {
        stringify!($col)
    };
    ($col:ident, $name:literal) => {
        $name
    };
}

macro_rules! table {
    (
        $(#[$meta:meta])*
        $marker:ident => $module:ident {
            required { $($req:ident $(as $req_name:literal)? : $req_ty:ty),* $(,)? }
            defaulted { $($def:ident $(as $def_name:literal)? : $def_ty:ty),* $(,)? }
            nullable { $($null:ident $(as $null_name:literal)? : $null_ty:ty),* $(,)? }
            references { $($fk:literal => $target:literal),* $(,)? }
        }
    ) => {
        $(#[$meta])*
        pub mod $module {
            #![allow(unused_imports)]

            use serde::{Deserialize, Serialize};

            use crate::column::{ColumnDef, ColumnValue, Timestamp};
            use crate::enums::*;
            use crate::json::Json;
            use crate::table::{ForeignKey, TableDef};

            pub const NAME: &str = stringify!($module);

            pub const DEF: TableDef = TableDef {
                name: NAME,
                columns: &[
                    $(ColumnDef {
                        name: column_name!($req $(, $req_name)?),
                        kind: <$req_ty as ColumnValue>::KIND,
                        nullable: false,
                        has_default: false,
                    },)*
                    $(ColumnDef {
                        name: column_name!($def $(, $def_name)?),
                        kind: <$def_ty as ColumnValue>::KIND,
                        nullable: false,
                        has_default: true,
                    },)*
                    $(ColumnDef {
                        name: column_name!($null $(, $null_name)?),
                        kind: <$null_ty as ColumnValue>::KIND,
                        nullable: true,
                        has_default: true,
                    },)*
                ],
                foreign_keys: &[$(ForeignKey { column: $fk, references: $target },)*],
            };

            /// Full record as returned by a read.
            #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
            #[serde(deny_unknown_fields)]
            pub struct Row {
                $(pub $req: $req_ty,)*
                $(pub $def: $def_ty,)*
                $(
                    #[serde(deserialize_with = "crate::present::nullable")]
                    pub $null: Option<$null_ty>,
                )*
            }

            /// Payload accepted when creating a record.
            #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
            #[serde(deny_unknown_fields)]
            pub struct Insert {
                $(pub $req: $req_ty,)*
                $(
                    #[serde(
                        default,
                        deserialize_with = "crate::present::deserialize",
                        skip_serializing_if = "Option::is_none"
                    )]
                    pub $def: Option<$def_ty>,
                )*
                $(
                    #[serde(default, skip_serializing_if = "Option::is_none")]
                    pub $null: Option<$null_ty>,
                )*
            }

            impl Insert {
                /// Insert carrying only the required columns; defaults apply to the rest.
                #[allow(clippy::too_many_arguments)]
                pub fn new($($req: $req_ty),*) -> Self {
                    Self {
                        $($req,)*
                        $($def: None,)*
                        $($null: None,)*
                    }
                }
            }

            /// Partial modification of a record.
            #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
            #[serde(deny_unknown_fields)]
            pub struct Update {
                $(
                    #[serde(
                        default,
                        deserialize_with = "crate::present::deserialize",
                        skip_serializing_if = "Option::is_none"
                    )]
                    pub $req: Option<$req_ty>,
                )*
                $(
                    #[serde(
                        default,
                        deserialize_with = "crate::present::deserialize",
                        skip_serializing_if = "Option::is_none"
                    )]
                    pub $def: Option<$def_ty>,
                )*
                $(
                    #[serde(
                        default,
                        deserialize_with = "crate::present::deserialize",
                        skip_serializing_if = "Option::is_none"
                    )]
                    pub $null: Option<Option<$null_ty>>,
                )*
            }

            impl From<Row> for Update {
                fn from(row: Row) -> Self {
                    Self {
                        $($req: Some(row.$req),)*
                        $($def: Some(row.$def),)*
                        $($null: Some(row.$null),)*
                    }
                }
            }
        }

        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $marker;

        impl Table for $marker {
            const NAME: &'static str = $module::NAME;
            const DEF: TableDef = $module::DEF;

            type Row = $module::Row;
            type Insert = $module::Insert;
            type Update = $module::Update;
        }
    };
}

table! {
    /// Automation steps.
    Actions => actions {
        required {
            name: String,
            r#type as "type": ActionType,
            automation_id: String,
            order: i64,
        }
        defaulted {
            id: String,
            created_at: Timestamp,
            updated_at: Timestamp,
            lane_id: String,
        }
        nullable {}
        references {
            "automation_id" => "automations",
            "lane_id" => "lanes",
        }
    }
}

table! {
    /// Purchasable add-ons of an agency.
    AddOns => add_ons {
        required {
            name: String,
            price_id: String,
        }
        defaulted {
            id: String,
            created_at: Timestamp,
            updated_at: Timestamp,
            active: bool,
        }
        nullable {
            agency_id: String,
        }
        references {
            "agency_id" => "agencies",
        }
    }
}

table! {
    /// Tenant root.
    Agencies => agencies {
        required {
            name: String,
            agency_logo: String,
            company_email: String,
            company_phone: String,
            address: String,
            city: String,
            zip_code: String,
            state: String,
            country: String,
        }
        defaulted {
            id: String,
            connect_account_id: String,
            customer_id: String,
            white_label: bool,
            goal: i64,
            created_at: Timestamp,
            updated_at: Timestamp,
        }
        nullable {}
        references {}
    }
}

table! {
    AgencySidebarOptions => agency_sidebar_options {
        required {
            agency_id: String,
        }
        defaulted {
            id: String,
            name: String,
            link: String,
            icon: Icon,
            created_at: Timestamp,
            updated_at: Timestamp,
        }
        nullable {}
        references {
            "agency_id" => "agencies",
        }
    }
}

table! {
    AutomationInstances => automation_instances {
        required {
            automation_id: String,
        }
        defaulted {
            id: String,
            created_at: Timestamp,
            updated_at: Timestamp,
            active: bool,
        }
        nullable {}
        references {
            "automation_id" => "automations",
        }
    }
}

table! {
    Automations => automations {
        required {
            name: String,
            sub_account_id: String,
        }
        defaulted {
            id: String,
            created_at: Timestamp,
            updated_at: Timestamp,
            published: bool,
        }
        nullable {
            trigger_id: String,
        }
        references {
            "sub_account_id" => "sub_accounts",
            "trigger_id" => "triggers",
        }
    }
}

table! {
    /// Funnel editor CSS classes.
    ClassNames => class_names {
        required {
            name: String,
            color: String,
            funnel_id: String,
        }
        defaulted {
            id: String,
            created_at: Timestamp,
            updated_at: Timestamp,
        }
        nullable {
            custom_data: String,
        }
        references {
            "funnel_id" => "funnels",
        }
    }
}

table! {
    Contacts => contacts {
        required {
            name: String,
            email: String,
            sub_account_id: String,
        }
        defaulted {
            id: String,
            created_at: Timestamp,
            updated_at: Timestamp,
        }
        nullable {}
        references {
            "sub_account_id" => "sub_accounts",
        }
    }
}

table! {
    FunnelPages => funnel_pages {
        required {
            name: String,
            order: i64,
            funnel_id: String,
        }
        defaulted {
            id: String,
            path_name: String,
            created_at: Timestamp,
            updated_at: Timestamp,
            visits: i64,
        }
        nullable {
            content: String,
            preview_image: String,
        }
        references {
            "funnel_id" => "funnels",
        }
    }
}

table! {
    Funnels => funnels {
        required {
            name: String,
            sub_account_id: String,
        }
        defaulted {
            id: String,
            created_at: Timestamp,
            updated_at: Timestamp,
            published: bool,
            live_products: String,
        }
        nullable {
            description: String,
            sub_domain_name: String,
            favicon: String,
        }
        references {
            "sub_account_id" => "sub_accounts",
        }
    }
}

table! {
    Invitations => invitations {
        required {
            email: String,
            agency_id: String,
        }
        defaulted {
            id: String,
            status: InvitationStatus,
            role: Role,
        }
        nullable {}
        references {
            "agency_id" => "agencies",
        }
    }
}

table! {
    /// Pipeline columns.
    Lanes => lanes {
        required {
            name: String,
            pipeline_id: String,
        }
        defaulted {
            id: String,
            created_at: Timestamp,
            updated_at: Timestamp,
            order: i64,
        }
        nullable {}
        references {
            "pipeline_id" => "pipelines",
        }
    }
}

table! {
    Media => media {
        required {
            name: String,
            link: String,
            sub_account_id: String,
        }
        defaulted {
            id: String,
            created_at: Timestamp,
            updated_at: Timestamp,
        }
        nullable {
            r#type as "type": String,
        }
        references {
            "sub_account_id" => "sub_accounts",
        }
    }
}

table! {
    Notifications => notifications {
        required {
            notification: String,
            agency_id: String,
            user_id: String,
        }
        defaulted {
            id: String,
            created_at: Timestamp,
            updated_at: Timestamp,
        }
        nullable {
            sub_account_id: String,
        }
        references {
            "agency_id" => "agencies",
            "sub_account_id" => "sub_accounts",
            "user_id" => "users",
        }
    }
}

table! {
    /// Per-user access to a sub-account, keyed by email.
    Permissions => permissions {
        required {
            email: String,
            sub_account_id: String,
            access: bool,
        }
        defaulted {
            id: String,
        }
        nullable {}
        references {
            "sub_account_id" => "sub_accounts",
        }
    }
}

table! {
    Pipelines => pipelines {
        required {
            name: String,
            sub_account_id: String,
        }
        defaulted {
            id: String,
            created_at: Timestamp,
            updated_at: Timestamp,
        }
        nullable {}
        references {
            "sub_account_id" => "sub_accounts",
        }
    }
}

table! {
    SubAccountSidebarOptions => sub_account_sidebar_options {
        required {}
        defaulted {
            id: String,
            name: String,
            link: String,
            icon: Icon,
            created_at: Timestamp,
            updated_at: Timestamp,
        }
        nullable {
            sub_account_id: String,
        }
        references {
            "sub_account_id" => "sub_accounts",
        }
    }
}

table! {
    /// Client businesses owned by an agency.
    SubAccounts => sub_accounts {
        required {
            name: String,
            sub_account_logo: String,
            company_email: String,
            company_phone: String,
            address: String,
            city: String,
            zip_code: String,
            state: String,
            country: String,
            agency_id: String,
        }
        defaulted {
            id: String,
            connect_account_id: String,
            created_at: Timestamp,
            updated_at: Timestamp,
            goal: i64,
        }
        nullable {}
        references {
            "agency_id" => "agencies",
        }
    }
}

table! {
    /// Agency billing subscriptions mirrored from the payment provider.
    Subscriptions => subscriptions {
        required {
            price_id: String,
            customer_id: String,
            current_period_end_date: Timestamp,
            subscription_id: String,
        }
        defaulted {
            id: String,
            created_at: Timestamp,
            updated_at: Timestamp,
            active: bool,
        }
        nullable {
            plan: Plan,
            price: String,
            agency_id: String,
        }
        references {
            "agency_id" => "agencies",
        }
    }
}

table! {
    Tags => tags {
        required {
            name: String,
            color: String,
            sub_account_id: String,
        }
        defaulted {
            id: String,
            created_at: Timestamp,
            updated_at: Timestamp,
        }
        nullable {}
        references {
            "sub_account_id" => "sub_accounts",
        }
    }
}

table! {
    /// Join table between tickets and tags.
    TicketTags => ticket_tags {
        required {
            ticket_id: String,
            tag_id: String,
        }
        defaulted {}
        nullable {}
        references {
            "ticket_id" => "tickets",
            "tag_id" => "tags",
        }
    }
}

table! {
    /// Leads moving through pipeline lanes.
    Tickets => tickets {
        required {
            name: String,
            lane_id: String,
        }
        defaulted {
            id: String,
            created_at: Timestamp,
            updated_at: Timestamp,
            order: i64,
        }
        nullable {
            value: String,
            description: String,
            customer_id: String,
            assigned_user_id: String,
        }
        references {
            "lane_id" => "lanes",
            "customer_id" => "contacts",
            "assigned_user_id" => "users",
        }
    }
}

table! {
    Triggers => triggers {
        required {
            name: String,
            r#type as "type": TriggerType,
            sub_account_id: String,
        }
        defaulted {
            id: String,
            created_at: Timestamp,
            updated_at: Timestamp,
        }
        nullable {}
        references {
            "sub_account_id" => "sub_accounts",
        }
    }
}

table! {
    Users => users {
        required {
            name: String,
            avatar_url: String,
            email: String,
        }
        defaulted {
            id: String,
            created_at: Timestamp,
            updated_at: Timestamp,
            role: Role,
        }
        nullable {
            agency_id: String,
        }
        references {
            "agency_id" => "agencies",
        }
    }
}

/// Every table, ordered by name.
pub static ALL: &[TableDef] = &[
    actions::DEF,
    add_ons::DEF,
    agencies::DEF,
    agency_sidebar_options::DEF,
    automation_instances::DEF,
    automations::DEF,
    class_names::DEF,
    contacts::DEF,
    funnel_pages::DEF,
    funnels::DEF,
    invitations::DEF,
    lanes::DEF,
    media::DEF,
    notifications::DEF,
    permissions::DEF,
    pipelines::DEF,
    sub_account_sidebar_options::DEF,
    sub_accounts::DEF,
    subscriptions::DEF,
    tags::DEF,
    ticket_tags::DEF,
    tickets::DEF,
    triggers::DEF,
    users::DEF,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnKind;
    use crate::enums::{ActionType, StringEnum};
    use crate::table::Shape;

    #[test]
    fn raw_identifier_columns_keep_database_names() {
        let column = actions::DEF.column("type").expect("type column");
        assert_eq!(column.kind, ColumnKind::Enum(ActionType::DEF));
        assert!(actions::DEF.column("r#type").is_none());
    }

    #[test]
    fn marker_types_expose_module_contracts() {
        assert_eq!(<Tickets as Table>::NAME, "tickets");
        assert_eq!(<Tickets as Table>::DEF, tickets::DEF);
    }

    #[test]
    fn ticket_tags_insert_has_no_optional_fields() {
        assert_eq!(
            ticket_tags::DEF.required_columns(Shape::Insert),
            vec!["ticket_id", "tag_id"]
        );
        assert_eq!(ticket_tags::DEF.columns.len(), 2);
    }
}
