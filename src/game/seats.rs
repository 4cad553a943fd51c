//! Who sits where
//!
//! Every seat is either an AI decision provider or the single interactive
//! seat fed by the presentation side.

use crate::core::{Seat, SEAT_COUNT};
use crate::game::controller::DecisionProvider;
use crate::game::interactive_controller::InteractiveSeat;
use crate::{Result, TableError};

pub enum Actor {
    Ai(Box<dyn DecisionProvider>),
    Interactive(InteractiveSeat),
}

impl Actor {
    pub fn seat(&self) -> Seat {
        match self {
            Actor::Ai(provider) => provider.seat(),
            Actor::Interactive(seat) => seat.seat(),
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Actor::Interactive(_))
    }
}

impl std::fmt::Debug for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::Ai(provider) => write!(f, "Ai({}, {})", provider.seat(), provider.name()),
            Actor::Interactive(seat) => write!(f, "Interactive({})", seat.seat()),
        }
    }
}

/// The four actors, indexed by seat
#[derive(Debug)]
pub struct SeatTable {
    actors: Vec<Actor>,
}

impl SeatTable {
    /// Seat four actors given in seat order
    ///
    /// At most one seat may be interactive.
    pub fn new(actors: Vec<Actor>) -> Result<Self> {
        if actors.len() != SEAT_COUNT {
            return Err(TableError::InvalidConfig(format!(
                "expected {SEAT_COUNT} actors, got {}",
                actors.len()
            )));
        }
        for (index, actor) in actors.iter().enumerate() {
            if actor.seat().index() != index {
                return Err(TableError::InvalidConfig(format!(
                    "actor for {} placed at index {index}",
                    actor.seat()
                )));
            }
        }
        if actors.iter().filter(|a| a.is_interactive()).count() > 1 {
            return Err(TableError::InvalidConfig(
                "at most one interactive seat is supported".to_string(),
            ));
        }
        Ok(SeatTable { actors })
    }

    /// Four AI seats built by `make`
    pub fn all_ai(mut make: impl FnMut(Seat) -> Box<dyn DecisionProvider>) -> Self {
        SeatTable {
            actors: Seat::ALL.iter().map(|&seat| Actor::Ai(make(seat))).collect(),
        }
    }

    pub fn actor_mut(&mut self, seat: Seat) -> &mut Actor {
        &mut self.actors[seat.index()]
    }

    pub fn has_interactive(&self) -> bool {
        self.actors.iter().any(Actor::is_interactive)
    }

    pub fn interactive_mut(&mut self) -> Option<&mut InteractiveSeat> {
        self.actors.iter_mut().find_map(|actor| match actor {
            Actor::Interactive(seat) => Some(seat),
            Actor::Ai(_) => None,
        })
    }

    /// Iterate AI providers (for round-end hooks)
    pub fn providers_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn DecisionProvider>> {
        self.actors.iter_mut().filter_map(|actor| match actor {
            Actor::Ai(provider) => Some(provider),
            Actor::Interactive(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::tsumogiri_controller::TsumogiriController;

    fn ai(seat: u8) -> Actor {
        Actor::Ai(Box::new(TsumogiriController::new(Seat::new(seat))))
    }

    #[test]
    fn test_all_ai_table() {
        let mut table = SeatTable::all_ai(|seat| Box::new(TsumogiriController::new(seat)));
        assert!(!table.has_interactive());
        assert_eq!(table.actor_mut(Seat::new(2)).seat(), Seat::new(2));
        assert_eq!(table.providers_mut().count(), 4);
    }

    #[test]
    fn test_one_interactive_seat() {
        let (human, _input) = InteractiveSeat::channel(Seat::new(0));
        let mut table =
            SeatTable::new(vec![Actor::Interactive(human), ai(1), ai(2), ai(3)]).unwrap();
        assert!(table.has_interactive());
        assert_eq!(table.interactive_mut().map(|s| s.seat()), Some(Seat::new(0)));
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert!(SeatTable::new(vec![ai(0), ai(1), ai(2)]).is_err());
        assert!(SeatTable::new(vec![ai(0), ai(2), ai(1), ai(3)]).is_err());

        let (a, _ia) = InteractiveSeat::channel(Seat::new(0));
        let (b, _ib) = InteractiveSeat::channel(Seat::new(1));
        let two = vec![Actor::Interactive(a), Actor::Interactive(b), ai(2), ai(3)];
        assert!(SeatTable::new(two).is_err());
    }
}
