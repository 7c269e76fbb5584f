//! Order lifecycle and money rules shared by the order handlers.

use crate::errors::ApiError;
use crate::types::{OrderStatus, Role};

pub const MAX_QUANTITY: i32 = 99;
pub const MAX_LINES: usize = 50;

/// Price of one order line in minor units.
pub fn line_total(quantity: i32, unit_price: i32) -> Result<i32, ApiError> {
    if !(1..=MAX_QUANTITY).contains(&quantity) {
        return Err(ApiError::validation(format!(
            "Quantity must be between 1 and {MAX_QUANTITY}"
        )));
    }
    if unit_price < 0 {
        return Err(ApiError::validation("Unit price must not be negative"));
    }

    quantity
        .checked_mul(unit_price)
        .ok_or_else(|| ApiError::validation("Order line total is too large"))
}

/// Sum of quantity × unit price over `(quantity, unit_price)` lines.
pub fn order_total<I>(lines: I) -> Result<i32, ApiError>
where
    I: IntoIterator<Item = (i32, i32)>,
{
    lines.into_iter().try_fold(0_i32, |acc, (quantity, unit_price)| {
        acc.checked_add(line_total(quantity, unit_price)?)
            .ok_or_else(|| ApiError::validation("Order total is too large"))
    })
}

pub fn check_line_count(lines: usize) -> Result<(), ApiError> {
    if lines == 0 {
        return Err(ApiError::validation("Order must contain at least one item"));
    }
    if lines > MAX_LINES {
        return Err(ApiError::validation(format!(
            "Order must not contain more than {MAX_LINES} items"
        )));
    }
    Ok(())
}

fn may_advance_from(role: Role, current: OrderStatus) -> bool {
    match role {
        Role::Admin => true,
        Role::Kitchen => matches!(current, OrderStatus::Pending | OrderStatus::Preparing),
        Role::Waiter => matches!(current, OrderStatus::Ready | OrderStatus::Delivered),
        Role::SuperAdmin => false,
    }
}

fn may_cancel(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Waiter)
}

/// Next status of an order moved forward by `role`.
pub fn advance(role: Role, current: OrderStatus) -> Result<OrderStatus, ApiError> {
    let next = current
        .next()
        .ok_or_else(|| ApiError::conflict(format!("Order is already {current}")))?;

    if !may_advance_from(role, current) {
        return Err(ApiError::forbidden(format!(
            "Role {role} cannot move an order from {current} to {next}"
        )));
    }

    Ok(next)
}

pub fn cancel(role: Role, current: OrderStatus) -> Result<OrderStatus, ApiError> {
    if !may_cancel(role) {
        return Err(ApiError::forbidden(format!("Role {role} cannot cancel orders")));
    }
    if !current.can_cancel() {
        return Err(ApiError::conflict(format!(
            "Order is {current} and can no longer be cancelled"
        )));
    }

    Ok(OrderStatus::Cancelled)
}

/// Explicit status change; only the single forward step or a cancellation is accepted.
pub fn set_status(
    role: Role,
    current: OrderStatus,
    requested: OrderStatus,
) -> Result<OrderStatus, ApiError> {
    if requested == OrderStatus::Cancelled {
        return cancel(role, current);
    }

    match current.next() {
        Some(next) if next == requested => advance(role, current),
        _ => Err(ApiError::conflict(format!(
            "Order cannot move from {current} to {requested}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_sum_of_quantity_times_price() {
        assert_eq!(order_total([(2, 450), (1, 1200), (3, 99)]).unwrap(), 2397);
        assert_eq!(order_total(Vec::<(i32, i32)>::new()).unwrap(), 0);
    }

    #[test]
    fn free_items_are_allowed() {
        assert_eq!(line_total(4, 0).unwrap(), 0);
    }

    #[test]
    fn quantity_bounds_are_enforced() {
        assert!(matches!(line_total(0, 100), Err(ApiError::Validation(_))));
        assert!(matches!(line_total(100, 100), Err(ApiError::Validation(_))));
        assert!(matches!(line_total(-1, 100), Err(ApiError::Validation(_))));
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let result = order_total([(99, i32::MAX / 50), (1, 1)]);
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn line_count_limits() {
        assert!(check_line_count(0).is_err());
        assert!(check_line_count(1).is_ok());
        assert!(check_line_count(MAX_LINES).is_ok());
        assert!(check_line_count(MAX_LINES + 1).is_err());
    }

    #[test]
    fn kitchen_moves_orders_until_ready() {
        assert_eq!(
            advance(Role::Kitchen, OrderStatus::Pending).unwrap(),
            OrderStatus::Preparing
        );
        assert_eq!(
            advance(Role::Kitchen, OrderStatus::Preparing).unwrap(),
            OrderStatus::Ready
        );
        assert!(matches!(
            advance(Role::Kitchen, OrderStatus::Ready),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn waiter_takes_ready_orders_to_completed() {
        assert!(matches!(
            advance(Role::Waiter, OrderStatus::Pending),
            Err(ApiError::Forbidden(_))
        ));
        assert_eq!(
            advance(Role::Waiter, OrderStatus::Ready).unwrap(),
            OrderStatus::Delivered
        );
        assert_eq!(
            advance(Role::Waiter, OrderStatus::Delivered).unwrap(),
            OrderStatus::Completed
        );
    }

    #[test]
    fn terminal_orders_do_not_advance() {
        for status in [OrderStatus::Completed, OrderStatus::Cancelled] {
            assert!(matches!(advance(Role::Admin, status), Err(ApiError::Conflict(_))));
        }
    }

    #[test]
    fn cancel_rules() {
        assert_eq!(
            cancel(Role::Waiter, OrderStatus::Preparing).unwrap(),
            OrderStatus::Cancelled
        );
        assert!(matches!(
            cancel(Role::Kitchen, OrderStatus::Pending),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            cancel(Role::Admin, OrderStatus::Delivered),
            Err(ApiError::Conflict(_))
        ));
    }

    #[test]
    fn explicit_status_must_be_next_step_or_cancel() {
        assert_eq!(
            set_status(Role::Admin, OrderStatus::Pending, OrderStatus::Preparing).unwrap(),
            OrderStatus::Preparing
        );
        assert!(matches!(
            set_status(Role::Admin, OrderStatus::Pending, OrderStatus::Ready),
            Err(ApiError::Conflict(_))
        ));
        assert!(matches!(
            set_status(Role::Admin, OrderStatus::Ready, OrderStatus::Pending),
            Err(ApiError::Conflict(_))
        ));
        assert_eq!(
            set_status(Role::Admin, OrderStatus::Ready, OrderStatus::Cancelled).unwrap(),
            OrderStatus::Cancelled
        );
    }
}
