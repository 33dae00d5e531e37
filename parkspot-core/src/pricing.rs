use parkspot_shared::models::time_unit::UNIT_MINUTES;
use parkspot_shared::{TimeRange, TimeUnitKey, UnitRange};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{DomainError, DomainResult};

/// Requested ranges converted to unit runs, with the total to charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingPlan {
    pub ranges: Vec<UnitRange>,
    pub unit_count: usize,
    pub paid_amount: Decimal,
}

impl BookingPlan {
    pub fn new(requested: &[TimeRange], price_per_hour: Decimal) -> DomainResult<Self> {
        let ranges = unit_ranges(requested)?;
        let unit_count = ranges.iter().map(UnitRange::len).sum();
        let paid_amount = paid_amount(unit_count, price_per_hour)?;
        Ok(Self { ranges, unit_count, paid_amount })
    }
}

/// Validates requested ranges and maps them onto unit runs.
///
/// Every bound must sit on a unit boundary, each range must be non-empty, and
/// ranges within one request must not overlap.
pub fn unit_ranges(requested: &[TimeRange]) -> DomainResult<Vec<UnitRange>> {
    if requested.is_empty() {
        return Err(DomainError::EmptyBookingTimes);
    }

    let mut ranges = Vec::with_capacity(requested.len());
    for range in requested {
        if range.start >= range.end {
            return Err(DomainError::invalid(format!(
                "booking range {} - {} ends before it starts",
                range.start, range.end
            )));
        }
        let start = TimeUnitKey::at(range.start).ok_or_else(|| misaligned(range))?;
        let end = TimeUnitKey::at(range.end).ok_or_else(|| misaligned(range))?;
        ranges.push(UnitRange { start, end });
    }

    let mut sorted = ranges.clone();
    sorted.sort();
    if sorted.windows(2).any(|pair| pair[0].overlaps(&pair[1])) {
        return Err(DomainError::invalid("booking ranges overlap"));
    }

    Ok(ranges)
}

fn misaligned(range: &TimeRange) -> DomainError {
    DomainError::invalid(format!(
        "booking range {} - {} is not aligned to {} minute units",
        range.start, range.end, UNIT_MINUTES
    ))
}

/// Hours covered by `units` consecutive units.
pub fn hours(units: usize) -> Decimal {
    Decimal::from(units as u64 * UNIT_MINUTES as u64) / Decimal::from(60)
}

/// `hours × price`, rounded to cents (half away from zero). Zero or negative
/// totals are rejected.
pub fn paid_amount(units: usize, price_per_hour: Decimal) -> DomainResult<Decimal> {
    let amount = (hours(units) * price_per_hour)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if amount <= Decimal::ZERO {
        return Err(DomainError::NonPositiveAmount);
    }
    Ok(amount)
}
