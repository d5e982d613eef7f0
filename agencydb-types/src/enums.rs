//! Database enums as closed Rust enums.
//!
//! Each enum serializes to exactly the literal stored in the database; any other string
//! fails to deserialize.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::column::{ColumnKind, ColumnValue};

/// Name and permitted literals of a database enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumDef {
    pub name: &'static str,
    pub values: &'static [&'static str],
}

impl EnumDef {
    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(&value)
    }
}

/// Implemented by every generated database enum.
pub trait StringEnum: Sized + Copy + 'static {
    const DEF: EnumDef;
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;
}

/// Error returned when a string is not one of an enum's literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub enum_name: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a value of {}", self.value, self.enum_name)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident => $db_name:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl StringEnum for $name {
            const DEF: EnumDef = EnumDef {
                name: $db_name,
                values: &[$($value),+],
            };
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl ColumnValue for $name {
            const KIND: ColumnKind = ColumnKind::Enum(<$name as StringEnum>::DEF);
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        enum_name: $db_name,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Automation step kinds.
    ActionType => "action_type_enum" {
        CreateContact = "CREATE_CONTACT",
    }
}

string_enum! {
    /// Sidebar icons.
    Icon => "icon_enum" {
        Settings = "settings",
        Chart = "chart",
        Calendar = "calendar",
        Check = "check",
        Chip = "chip",
        Compass = "compass",
        Database = "database",
        Flag = "flag",
        Home = "home",
        Info = "info",
        Link = "link",
        Lock = "lock",
        Messages = "messages",
        Notification = "notification",
        Payment = "payment",
        Power = "power",
        Receipt = "receipt",
        Shield = "shield",
        Star = "star",
        Tune = "tune",
        Videorecorder = "videorecorder",
        Wallet = "wallet",
        Warning = "warning",
        Headphone = "headphone",
        Send = "send",
        Pipelines = "pipelines",
        Person = "person",
        Category = "category",
        Contact = "contact",
        ClipboardIcon = "clipboardIcon",
    }
}

string_enum! {
    InvitationStatus => "invitation_status_enum" {
        Accepted = "ACCEPTED",
        Revoked = "REVOKED",
        Pending = "PENDING",
    }
}

string_enum! {
    /// Billing plans, stored as the payment provider's price ids.
    Plan => "plan_enum" {
        /// Unlimited SaaS tier.
        Unlimited = "price_1OYxkqFj9oKEERu1NbKUxXxN",
        /// Basic tier.
        Basic = "price_1OYxkqFj9oKEERu1KfJGWxgN",
    }
}

string_enum! {
    Role => "role_enum" {
        AgencyOwner = "AGENCY_OWNER",
        AgencyAdmin = "AGENCY_ADMIN",
        SubaccountUser = "SUBACCOUNT_USER",
        SubaccountGuest = "SUBACCOUNT_GUEST",
    }
}

string_enum! {
    /// Events that start an automation.
    TriggerType => "trigger_types_enum" {
        ContactForm = "CONTACT_FORM",
    }
}

/// Every database enum, ordered by name.
pub static ENUMS: &[EnumDef] = &[
    ActionType::DEF,
    Icon::DEF,
    InvitationStatus::DEF,
    Plan::DEF,
    Role::DEF,
    TriggerType::DEF,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_enum_has_every_declared_icon() {
        assert_eq!(Icon::DEF.values.len(), 30);
        assert_eq!(Icon::ALL.len(), Icon::DEF.values.len());
        assert!(Icon::DEF.contains("clipboardIcon"));
        assert!(!Icon::DEF.contains("clipboardicon"));
    }

    #[test]
    fn from_str_round_trips_every_literal() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(*role));
        }
        let err = "OWNER".parse::<Role>().expect_err("unknown literal");
        assert_eq!(err.enum_name, "role_enum");
        assert_eq!(err.to_string(), "'OWNER' is not a value of role_enum");
    }

    #[test]
    fn enums_are_sorted_by_name() {
        let names: Vec<_> = ENUMS.iter().map(|e| e.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
