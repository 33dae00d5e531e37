pub mod availability;
pub mod booking;
pub mod cursor;
pub mod identity;
pub mod listing;
pub mod memory;
pub mod preference;
pub mod pricing;
pub mod repository;
pub mod spot;

pub use availability::AvailabilityService;
pub use booking::{BookingService, SellerFilter};
pub use cursor::{Cursor, Page, Pagination};
pub use identity::{Access, Resolve, Resolved};
pub use listing::ListingService;
pub use preference::PreferenceService;
pub use spot::SpotService;

/// Coarse classification of every error the engine returns. The route layer
/// maps these onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Duplicate,
    Conflict,
    InvalidInput,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Absent, or present but hidden from the caller.
    #[error("Resource not found")]
    NotFound,
    #[error("Operation not permitted on this resource")]
    Forbidden,
    #[error("Time unit already exists for this listing")]
    DuplicatedTimeUnit,
    #[error("Spot is already in preferences")]
    DuplicatedPreference,
    #[error("Requested time is already booked")]
    AlreadyBooked,
    #[error("Resource is still referenced: {0}")]
    InUse(String),
    #[error("Booking times must not be empty")]
    EmptyBookingTimes,
    #[error("Paid amount must be positive")]
    NonPositiveAmount,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NotFound => ErrorKind::NotFound,
            DomainError::Forbidden => ErrorKind::Forbidden,
            DomainError::DuplicatedTimeUnit | DomainError::DuplicatedPreference => ErrorKind::Duplicate,
            DomainError::AlreadyBooked | DomainError::InUse(_) => ErrorKind::Conflict,
            DomainError::EmptyBookingTimes
            | DomainError::NonPositiveAmount
            | DomainError::InvalidInput(_) => ErrorKind::InvalidInput,
            DomainError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        DomainError::InvalidInput(msg.into())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(DomainError::NotFound.kind(), ErrorKind::NotFound);
        assert_eq!(DomainError::DuplicatedPreference.kind(), ErrorKind::Duplicate);
        assert_eq!(DomainError::DuplicatedTimeUnit.kind(), ErrorKind::Duplicate);
        assert_eq!(DomainError::AlreadyBooked.kind(), ErrorKind::Conflict);
        assert_eq!(DomainError::EmptyBookingTimes.kind(), ErrorKind::InvalidInput);
        assert_eq!(DomainError::invalid("count").kind(), ErrorKind::InvalidInput);
        assert_eq!(DomainError::Internal("boom".into()).kind(), ErrorKind::Internal);
    }
}
