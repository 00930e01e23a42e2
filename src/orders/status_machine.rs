use crate::document::BookingStatus;
use crate::error::AppError;

/// Service for managing booking and order status transitions
///
/// Shared by hotel/tour bookings, food orders, cab and bus bookings.
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Pending → Confirmed, Cancelled
    /// - Confirmed → Completed, Cancelled
    /// - Completed → Cancelled (refund scenario)
    /// - Cancelled → (no transitions allowed except to itself)
    /// - Any status → Same status (idempotent)
    pub fn is_valid_transition(from: BookingStatus, to: BookingStatus) -> bool {
        if from == to {
            return true;
        }

        match (from, to) {
            (BookingStatus::Pending, BookingStatus::Confirmed) => true,
            (BookingStatus::Pending, BookingStatus::Cancelled) => true,

            (BookingStatus::Confirmed, BookingStatus::Completed) => true,
            (BookingStatus::Confirmed, BookingStatus::Cancelled) => true,

            (BookingStatus::Completed, BookingStatus::Cancelled) => true,

            (BookingStatus::Cancelled, _) => false,

            _ => false,
        }
    }

    /// Status a new record starts in; only pending or confirmed may be requested
    pub fn initial(requested: Option<BookingStatus>) -> Result<BookingStatus, AppError> {
        match requested.unwrap_or_default() {
            status @ (BookingStatus::Pending | BookingStatus::Confirmed) => Ok(status),
            other => Err(AppError::Validation(format!("New records cannot start as {}", other))),
        }
    }

    /// Attempt to transition from one status to another
    pub fn transition(from: BookingStatus, to: BookingStatus) -> Result<BookingStatus, AppError> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(AppError::InvalidTransition(format!(
                "Invalid status transition from {} to {}",
                from, to
            )))
        }
    }
}
