use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const MENU_KEY: &str = "menu";
pub const SESSION_COOKIE: &str = "session";

/// Redis key of the rendered menu of one establishment in one language.
pub fn menu_cache_key(establishment_id: i64, language: &str) -> String {
    format!("{MENU_KEY}_{establishment_id}_{language}")
}

/// Pattern matching every cached menu of an establishment.
pub fn menu_cache_pattern(establishment_id: i64) -> String {
    format!("{MENU_KEY}_{establishment_id}_*")
}

#[derive(Debug)]
pub struct UnknownVariant(pub String);

impl Display for UnknownVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Kitchen,
    Waiter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Kitchen => "kitchen",
            Role::Waiter => "waiter",
        }
    }

    /// Roles bound to a single establishment.
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::SuperAdmin)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            "kitchen" => Ok(Role::Kitchen),
            "waiter" => Ok(Role::Waiter),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Once the food has left the kitchen pass the order can no longer be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Preparing | OrderStatus::Ready
        )
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_walks_linearly_to_completed() {
        let mut status = OrderStatus::Pending;
        let mut visited = vec![status];
        while let Some(next) = status.next() {
            visited.push(next);
            status = next;
        }

        assert_eq!(
            visited,
            vec![
                OrderStatus::Pending,
                OrderStatus::Preparing,
                OrderStatus::Ready,
                OrderStatus::Delivered,
                OrderStatus::Completed,
            ]
        );
        assert_eq!(OrderStatus::Cancelled.next(), None);
    }

    #[test]
    fn only_kitchen_side_statuses_are_cancellable() {
        let cancellable: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(OrderStatus::can_cancel)
            .collect();

        assert_eq!(
            cancellable,
            vec![OrderStatus::Pending, OrderStatus::Preparing, OrderStatus::Ready]
        );
    }

    #[test]
    fn status_strings_match_storage_format() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                serde_json::Value::String(status.to_string())
            );
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn roles_parse_from_storage_format() {
        assert_eq!("super_admin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!("waiter".parse::<Role>().unwrap(), Role::Waiter);
        assert!("chef".parse::<Role>().is_err());
        assert!(!Role::SuperAdmin.is_staff());
        assert!(Role::Kitchen.is_staff());
    }

    #[test]
    fn menu_keys_share_establishment_prefix() {
        assert_eq!(menu_cache_key(7, "en"), "menu_7_en");
        assert_eq!(menu_cache_pattern(7), "menu_7_*");
    }
}
