//! Seat positions in turn order

use crate::TableError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of seats at the table
pub const SEAT_COUNT: usize = 4;

/// One of the four ordinal player positions
///
/// Seats are numbered clockwise in turn order, so `next()` is always the
/// seat that plays after this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Seat(u8);

impl Seat {
    pub const ALL: [Seat; SEAT_COUNT] = [Seat(0), Seat(1), Seat(2), Seat(3)];

    /// Create a seat; the index is reduced modulo four
    pub const fn new(index: u8) -> Self {
        Seat(index % SEAT_COUNT as u8)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// The seat that plays after this one
    pub const fn next(self) -> Seat {
        Seat((self.0 + 1) % SEAT_COUNT as u8)
    }

    /// Clockwise steps from `from` to this seat (0 when equal)
    pub const fn distance_from(self, from: Seat) -> u8 {
        (self.0 + SEAT_COUNT as u8 - from.0) % SEAT_COUNT as u8
    }

    /// The three other seats, clockwise starting with `next()`
    pub fn others(self) -> impl Iterator<Item = Seat> {
        (1..SEAT_COUNT as u8).map(move |step| Seat((self.0 + step) % SEAT_COUNT as u8))
    }
}

impl TryFrom<u8> for Seat {
    type Error = TableError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        if (index as usize) < SEAT_COUNT {
            Ok(Seat(index))
        } else {
            Err(TableError::InvalidSeat(index))
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_wraps() {
        assert_eq!(Seat::new(0).next(), Seat::new(1));
        assert_eq!(Seat::new(3).next(), Seat::new(0));
    }

    #[test]
    fn test_distance_from() {
        let discarder = Seat::new(2);
        assert_eq!(Seat::new(3).distance_from(discarder), 1);
        assert_eq!(Seat::new(0).distance_from(discarder), 2);
        assert_eq!(Seat::new(1).distance_from(discarder), 3);
        assert_eq!(discarder.distance_from(discarder), 0);
    }

    #[test]
    fn test_others_clockwise() {
        let others: Vec<_> = Seat::new(2).others().collect();
        assert_eq!(others, vec![Seat::new(3), Seat::new(0), Seat::new(1)]);
    }

    #[test]
    fn test_try_from_rejects_out_of_range() {
        assert_eq!(Seat::try_from(3).unwrap(), Seat::new(3));
        assert!(matches!(Seat::try_from(4), Err(TableError::InvalidSeat(4))));
    }
}
