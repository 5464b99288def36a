//! Annual registration fee table for Korean patents.
//!
//! Fees are charged per payment year and change every three years.
//! The last band covers the two final years of the 20-year patent term.

/// Last payment year of a patent right.
pub const MAX_PAYMENT_YEAR: u32 = 20;

/// Fee in won for each three-year band, indexed by `(year - 1) / 3`.
const FEE_BANDS: [u32; 7] = [42_000, 95_000, 250_000, 500_000, 660_000, 850_000, 1_100_000];

/// Get the annual fee in won for the given payment year.
///
/// Returns `None` for year zero and for years past the end of the patent term.
///
/// ```rust
/// use patent_fees::fees::fee_for;
///
/// assert_eq!(fee_for(1), Some(42_000));
/// assert_eq!(fee_for(20), Some(1_100_000));
/// assert_eq!(fee_for(21), None);
/// ```
#[must_use]
pub const fn fee_for(year: u32) -> Option<u32> {
    if year == 0 || year > MAX_PAYMENT_YEAR {
        return None;
    }
    Some(FEE_BANDS[((year - 1) / 3) as usize])
}
