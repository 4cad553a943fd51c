//! Scripted controller for tests
//!
//! Follows a predetermined queue of choices. The front of the queue is
//! consumed only when it answers the current offer; otherwise the seat
//! acts passively (tsumogiri discard, decline calls).

use crate::core::{ChiiOption, Seat, Tile};
use crate::game::controller::{DecisionProvider, TableView};
use crate::game::offer::{Choice, Offer};
use std::collections::VecDeque;

pub struct ScriptedController {
    seat: Seat,
    script: VecDeque<Choice>,
}

impl ScriptedController {
    pub fn new(seat: Seat, script: Vec<Choice>) -> Self {
        ScriptedController {
            seat,
            script: script.into(),
        }
    }

    /// Choices not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Pop the next scripted choice if it answers `offer`
    fn next_for(&mut self, offer: &Offer) -> Option<Choice> {
        let front = self.script.front()?;
        let resolved = offer.resolve(front)?;
        self.script.pop_front();
        Some(resolved)
    }
}

impl DecisionProvider for ScriptedController {
    fn seat(&self) -> Seat {
        self.seat
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn choose_discard(
        &mut self,
        _view: &TableView<'_>,
        options: &[Tile],
        drawn: Option<Tile>,
    ) -> Option<Tile> {
        let offer = Offer::Discard {
            options: options.to_vec(),
            drawn,
        };
        match self.next_for(&offer) {
            Some(Choice::Discard(tile)) => Some(tile),
            _ => None,
        }
    }

    fn choose_chii(
        &mut self,
        _view: &TableView<'_>,
        tile: Tile,
        options: &[ChiiOption],
    ) -> Option<ChiiOption> {
        let offer = Offer::Chii {
            tile,
            options: options.to_vec(),
        };
        match self.next_for(&offer) {
            Some(Choice::Chii(start)) => options.iter().find(|o| o.start == start).copied(),
            _ => None,
        }
    }

    fn choose_pon(&mut self, _view: &TableView<'_>, tile: Tile) -> bool {
        let offer = Offer::Meld {
            tile,
            pon: true,
            kan: false,
        };
        matches!(self.next_for(&offer), Some(Choice::Pon))
    }

    fn choose_kan(&mut self, _view: &TableView<'_>, options: &[Tile]) -> Option<Tile> {
        // A pon/kan offer asks for kan first; leave declines for the pon half
        if !matches!(self.script.front(), Some(Choice::Kan(_) | Choice::Accept)) {
            return None;
        }
        let offer = Offer::SelfKan {
            options: options.to_vec(),
        };
        match self.next_for(&offer) {
            Some(Choice::Kan(tile)) => tile,
            _ => None,
        }
    }

    fn choose_riichi(&mut self, _view: &TableView<'_>, options: &[Tile]) -> Option<Tile> {
        let offer = Offer::Riichi {
            options: options.to_vec(),
        };
        match self.next_for(&offer) {
            Some(Choice::Riichi(tile)) => Some(tile),
            _ => None,
        }
    }

    fn choose_ron(&mut self, _view: &TableView<'_>, tile: Tile, from: Seat) -> bool {
        matches!(
            self.next_for(&Offer::Ron { tile, from }),
            Some(Choice::Ron)
        )
    }

    fn choose_tsumo(&mut self, _view: &TableView<'_>, tile: Option<Tile>) -> bool {
        let offer = Offer::Tsumo {
            tile,
            compensation: false,
        };
        matches!(self.next_for(&offer), Some(Choice::Tsumo))
    }
}
