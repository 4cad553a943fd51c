//! Tsumogiri controller for testing and automation
//!
//! Discards whatever it draws, takes every win and declines every meld and
//! riichi. Rounds played by four of these complete without any input.

use crate::core::{ChiiOption, Seat, Tile};
use crate::game::controller::{DecisionProvider, TableView};

/// A provider that always discards the drawn tile
///
/// This is useful for:
/// - Automated testing
/// - Benchmarking the scheduler
/// - Filling seats deterministically
pub struct TsumogiriController {
    seat: Seat,
}

impl TsumogiriController {
    pub fn new(seat: Seat) -> Self {
        TsumogiriController { seat }
    }
}

impl DecisionProvider for TsumogiriController {
    fn seat(&self) -> Seat {
        self.seat
    }

    fn name(&self) -> &str {
        "tsumogiri"
    }

    fn choose_discard(
        &mut self,
        _view: &TableView<'_>,
        options: &[Tile],
        drawn: Option<Tile>,
    ) -> Option<Tile> {
        drawn
            .filter(|d| options.contains(d))
            .or_else(|| options.last().copied())
    }

    fn choose_chii(
        &mut self,
        _view: &TableView<'_>,
        _tile: Tile,
        _options: &[ChiiOption],
    ) -> Option<ChiiOption> {
        None
    }

    fn choose_pon(&mut self, _view: &TableView<'_>, _tile: Tile) -> bool {
        false
    }

    fn choose_kan(&mut self, _view: &TableView<'_>, _options: &[Tile]) -> Option<Tile> {
        None
    }

    fn choose_riichi(&mut self, _view: &TableView<'_>, _options: &[Tile]) -> Option<Tile> {
        None
    }

    fn choose_ron(&mut self, _view: &TableView<'_>, _tile: Tile, _from: Seat) -> bool {
        true
    }

    fn choose_tsumo(&mut self, _view: &TableView<'_>, _tile: Option<Tile>) -> bool {
        true
    }
}
