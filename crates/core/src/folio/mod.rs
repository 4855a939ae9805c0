//! Human-readable document identifiers (folios).
//!
//! A folio has the form `<TYPE>-<YYYYMM>-<NNNNNN>`: a record-type
//! prefix, a calendar-month bucket, and a 6-digit zero-padded sequence
//! that is monotonically increasing per (type, month) and resets each
//! month. Sequence generation itself is the store's job; this module
//! owns the format and the next-in-sequence rule.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Record types that carry a folio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolioKind {
    /// Accounts receivable (CXC).
    Receivable,
    /// Accounts payable (CXP).
    Payable,
    /// Payment document.
    Payment,
}

impl FolioKind {
    /// The folio prefix for this record type.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Receivable => "CXC",
            Self::Payable => "CXP",
            Self::Payment => "PAY",
        }
    }
}

/// A calendar-month sequence bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FolioPeriod {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
}

impl FolioPeriod {
    /// The period containing the given date.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl std::fmt::Display for FolioPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

/// A fully-formed folio: kind, month bucket, and sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Folio {
    /// The record type this folio identifies.
    pub kind: FolioKind,
    /// The calendar-month bucket.
    pub period: FolioPeriod,
    /// 1-based sequence within the (kind, period) bucket.
    pub sequence: u32,
}

/// Errors that can occur constructing or parsing folios.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FolioError {
    /// The 6-digit sequence space for the bucket is exhausted.
    #[error("Folio sequence exhausted for {prefix}-{period}")]
    SequenceExhausted {
        /// The record type prefix.
        prefix: &'static str,
        /// The exhausted month bucket.
        period: FolioPeriod,
    },

    /// The input is not a valid folio string.
    #[error("Malformed folio: {0}")]
    Malformed(String),
}

impl Folio {
    /// The largest representable sequence in a 6-digit folio.
    pub const MAX_SEQUENCE: u32 = 999_999;

    /// The folio following `last_sequence` in the given bucket.
    ///
    /// Pass `0` when the bucket has no folio yet.
    ///
    /// # Errors
    ///
    /// Returns `FolioError::SequenceExhausted` when the bucket's 6-digit
    /// sequence space is used up.
    pub fn next(
        kind: FolioKind,
        period: FolioPeriod,
        last_sequence: u32,
    ) -> Result<Self, FolioError> {
        if last_sequence >= Self::MAX_SEQUENCE {
            return Err(FolioError::SequenceExhausted {
                prefix: kind.prefix(),
                period,
            });
        }
        Ok(Self {
            kind,
            period,
            sequence: last_sequence + 1,
        })
    }
}

impl std::fmt::Display for Folio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{:06}", self.kind.prefix(), self.period, self.sequence)
    }
}

impl std::str::FromStr for Folio {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || FolioError::Malformed(s.to_string());

        let mut parts = s.split('-');
        let prefix = parts.next().ok_or_else(malformed)?;
        let period = parts.next().ok_or_else(malformed)?;
        let sequence = parts.next().ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }

        let kind = match prefix {
            "CXC" => FolioKind::Receivable,
            "CXP" => FolioKind::Payable,
            "PAY" => FolioKind::Payment,
            _ => return Err(malformed()),
        };

        if period.len() != 6 || sequence.len() != 6 {
            return Err(malformed());
        }
        // get() instead of indexing: a multi-byte character in the
        // period would make byte offset 4 a non-boundary and panic.
        let year: i32 = period
            .get(..4)
            .and_then(|s| s.parse().ok())
            .ok_or_else(malformed)?;
        let month: u32 = period
            .get(4..)
            .and_then(|s| s.parse().ok())
            .ok_or_else(malformed)?;
        if !(1..=12).contains(&month) {
            return Err(malformed());
        }
        let sequence: u32 = sequence.parse().map_err(|_| malformed())?;
        if sequence == 0 || sequence > Self::MAX_SEQUENCE {
            return Err(malformed());
        }

        Ok(Self {
            kind,
            period: FolioPeriod { year, month },
            sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn period() -> FolioPeriod {
        FolioPeriod {
            year: 2026,
            month: 8,
        }
    }

    #[test]
    fn test_display_format() {
        let folio = Folio {
            kind: FolioKind::Receivable,
            period: period(),
            sequence: 42,
        };
        assert_eq!(folio.to_string(), "CXC-202608-000042");
    }

    #[test]
    fn test_next_increments() {
        let folio = Folio::next(FolioKind::Payment, period(), 0).unwrap();
        assert_eq!(folio.sequence, 1);
        assert_eq!(folio.to_string(), "PAY-202608-000001");

        let folio = Folio::next(FolioKind::Payment, period(), 41).unwrap();
        assert_eq!(folio.sequence, 42);
    }

    #[test]
    fn test_next_exhausted() {
        let result = Folio::next(FolioKind::Payable, period(), Folio::MAX_SEQUENCE);
        assert!(matches!(result, Err(FolioError::SequenceExhausted { .. })));
    }

    #[test]
    fn test_period_from_date() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let period = FolioPeriod::from_date(date);
        assert_eq!(period.to_string(), "202608");
    }

    #[test]
    fn test_roundtrip_parse() {
        for input in ["CXC-202608-000001", "CXP-202512-999999", "PAY-202601-000317"] {
            let folio = Folio::from_str(input).unwrap();
            assert_eq!(folio.to_string(), input);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in [
            "",
            "CXC",
            "CXC-202608",
            "XXX-202608-000001",
            "CXC-20268-000001",
            "CXC-202£8-000001",
            "CXC-202613-000001",
            "CXC-202608-000000",
            "CXC-202608-0001",
            "CXC-202608-000001-extra",
        ] {
            assert!(Folio::from_str(input).is_err(), "{input} should be rejected");
        }
    }
}
