//! Decision provider trait and table view
//!
//! This module defines the interface between the scheduler and AI seats.
//! The scheduler calls a provider whenever its seat must decide, handing it
//! a read-only view of the round. Providers answer synchronously.

use crate::core::{CallKind, ChiiOption, Seat, Tile};
use crate::engine::{RoundEngine, RoundSnapshot};
use crate::game::arbiter::resolve_meld_intent;
use crate::game::events::RoundOutcome;
use crate::game::offer::{Choice, Offer};

/// Read-only view of the round for one seat
pub struct TableView<'a> {
    engine: &'a dyn RoundEngine,
    seat: Seat,
}

impl<'a> TableView<'a> {
    pub fn new(engine: &'a dyn RoundEngine, seat: Seat) -> Self {
        TableView { engine, seat }
    }

    /// The seat this view belongs to
    pub fn seat(&self) -> Seat {
        self.seat
    }

    pub fn hand(&self) -> Vec<Tile> {
        self.engine.hand(self.seat)
    }

    pub fn is_riichi(&self, seat: Seat) -> bool {
        self.engine.is_riichi(seat)
    }

    pub fn wall_remaining(&self) -> usize {
        self.engine.wall_remaining()
    }

    pub fn last_discard(&self) -> Option<Tile> {
        self.engine.last_discard()
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        self.engine.snapshot()
    }
}

/// Decision provider trait
///
/// Implement this trait to seat an AI. Every method returns the provider's
/// selection, or "no action" (`None`/`false`), which the scheduler treats
/// as declining. Discards that return `None` fall back to the default
/// discard.
pub trait DecisionProvider: Send {
    /// The seat this provider plays
    fn seat(&self) -> Seat;

    /// Short name used in decision logs
    fn name(&self) -> &str {
        "ai"
    }

    fn choose_discard(
        &mut self,
        view: &TableView<'_>,
        options: &[Tile],
        drawn: Option<Tile>,
    ) -> Option<Tile>;

    fn choose_chii(
        &mut self,
        view: &TableView<'_>,
        tile: Tile,
        options: &[ChiiOption],
    ) -> Option<ChiiOption>;

    fn choose_pon(&mut self, view: &TableView<'_>, tile: Tile) -> bool;

    /// Pick a kan from `options`, or decline
    fn choose_kan(&mut self, view: &TableView<'_>, options: &[Tile]) -> Option<Tile>;

    /// Pick the discard that goes with a riichi declaration, or decline
    fn choose_riichi(&mut self, view: &TableView<'_>, options: &[Tile]) -> Option<Tile>;

    fn choose_ron(&mut self, view: &TableView<'_>, tile: Tile, from: Seat) -> bool;

    fn choose_tsumo(&mut self, view: &TableView<'_>, tile: Option<Tile>) -> bool;

    /// Called when the round ends (for cleanup/logging)
    fn on_round_end(&mut self, _view: &TableView<'_>, _outcome: &RoundOutcome) {}
}

/// Put an offer to a provider and translate the answer into a `Choice`
pub fn ask(provider: &mut dyn DecisionProvider, view: &TableView<'_>, offer: &Offer) -> Choice {
    match offer {
        Offer::Discard { options, drawn } => provider
            .choose_discard(view, options, *drawn)
            .map(Choice::Discard)
            .unwrap_or(Choice::Accept),
        Offer::Chii { tile, options } => provider
            .choose_chii(view, *tile, options)
            .map(|o| Choice::Chii(o.start))
            .unwrap_or(Choice::Skip),
        Offer::Meld { tile, pon, kan } => {
            let kan_accepted = *kan && provider.choose_kan(view, &[*tile]).is_some();
            let pon_accepted = *pon && !kan_accepted && provider.choose_pon(view, *tile);
            match resolve_meld_intent(pon_accepted, kan_accepted) {
                Some(CallKind::Kan) => Choice::Kan(Some(*tile)),
                Some(_) => Choice::Pon,
                None => Choice::Skip,
            }
        }
        Offer::SelfKan { options } => provider
            .choose_kan(view, options)
            .map(|t| Choice::Kan(Some(t)))
            .unwrap_or(Choice::Skip),
        Offer::Riichi { options } => provider
            .choose_riichi(view, options)
            .map(Choice::Riichi)
            .unwrap_or(Choice::Skip),
        Offer::Ron { tile, from } => {
            if provider.choose_ron(view, *tile, *from) {
                Choice::Ron
            } else {
                Choice::Skip
            }
        }
        Offer::Tsumo { tile, .. } => {
            if provider.choose_tsumo(view, *tile) {
                Choice::Tsumo
            } else {
                Choice::Skip
            }
        }
    }
}
