//! Tile identities
//!
//! A `Tile` is one of the 136 physical tiles. Four copies exist of each of
//! the 34 kinds; most rules only care about the kind.

use crate::TableError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of physical tiles in a full set
pub const TILE_COUNT: usize = 136;

/// Number of distinct tile kinds
pub const KIND_COUNT: usize = 34;

const HONOR_NAMES: [&str; 7] = ["E", "S", "W", "N", "P", "F", "C"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suit {
    Man,
    Pin,
    Sou,
    Honor,
}

impl Suit {
    fn letter(self) -> char {
        match self {
            Suit::Man => 'm',
            Suit::Pin => 'p',
            Suit::Sou => 's',
            Suit::Honor => 'z',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tile(u8);

impl Tile {
    /// Build a tile from its physical id (`0..136`)
    pub fn new(id: u8) -> crate::Result<Self> {
        if (id as usize) < TILE_COUNT {
            Ok(Tile(id))
        } else {
            Err(TableError::InvalidTile(format!("tile id {id} out of range")))
        }
    }

    /// Build a tile from its kind (`0..34`) and copy (`0..4`)
    pub fn from_kind(kind: u8, copy: u8) -> crate::Result<Self> {
        if (kind as usize) < KIND_COUNT && copy < 4 {
            Ok(Tile(kind * 4 + copy))
        } else {
            Err(TableError::InvalidTile(format!(
                "kind {kind} copy {copy} out of range"
            )))
        }
    }

    /// Every physical tile in id order
    pub fn all() -> impl Iterator<Item = Tile> {
        (0..TILE_COUNT as u8).map(Tile)
    }

    pub const fn id(self) -> u8 {
        self.0
    }

    pub const fn kind(self) -> u8 {
        self.0 / 4
    }

    pub const fn copy(self) -> u8 {
        self.0 % 4
    }

    pub fn suit(self) -> Suit {
        match self.kind() / 9 {
            0 => Suit::Man,
            1 => Suit::Pin,
            2 => Suit::Sou,
            _ => Suit::Honor,
        }
    }

    pub fn is_honor(self) -> bool {
        self.suit() == Suit::Honor
    }

    /// Face number for suited tiles
    pub fn number(self) -> Option<u8> {
        if self.is_honor() {
            None
        } else {
            Some(self.kind() % 9 + 1)
        }
    }

    pub fn same_kind(self, other: Tile) -> bool {
        self.kind() == other.kind()
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.number() {
            Some(n) => write!(f, "{}{}", n, self.suit().letter()),
            None => write!(f, "{}", HONOR_NAMES[(self.kind() - 27) as usize]),
        }
    }
}

impl FromStr for Tile {
    type Err = TableError;

    /// Parse `5m`, `1p`, `9s` or an honor letter; yields copy 0 of the kind
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(pos) = HONOR_NAMES.iter().position(|h| h.eq_ignore_ascii_case(s)) {
            return Tile::from_kind(27 + pos as u8, 0);
        }

        let mut chars = s.chars();
        let (Some(digit), Some(letter), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(TableError::InvalidTile(s.to_string()));
        };
        let number = digit
            .to_digit(10)
            .filter(|n| (1..=9).contains(n))
            .ok_or_else(|| TableError::InvalidTile(s.to_string()))? as u8;
        let base = match letter.to_ascii_lowercase() {
            'm' => 0,
            'p' => 9,
            's' => 18,
            _ => return Err(TableError::InvalidTile(s.to_string())),
        };
        Tile::from_kind(base + number - 1, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_copy() {
        let tile = Tile::new(21).unwrap();
        assert_eq!(tile.kind(), 5);
        assert_eq!(tile.copy(), 1);
        assert_eq!(tile.to_string(), "6m");
        assert!(Tile::new(136).is_err());
    }

    #[test]
    fn test_parse_suited_and_honors() {
        let five_pin: Tile = "5p".parse().unwrap();
        assert_eq!(five_pin.kind(), 13);
        assert_eq!(five_pin.number(), Some(5));
        assert_eq!(five_pin.suit(), Suit::Pin);

        let red: Tile = "c".parse().unwrap();
        assert!(red.is_honor());
        assert_eq!(red.to_string(), "C");
        assert_eq!(red.number(), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("0m".parse::<Tile>().is_err());
        assert!("5x".parse::<Tile>().is_err());
        assert!("55m".parse::<Tile>().is_err());
        assert!("".parse::<Tile>().is_err());
    }
}
