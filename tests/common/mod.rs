//! Shared fixtures for the end-to-end suites
//!
//! `MockEngine` answers eligibility queries from plain tables instead of
//! real hand evaluation, so each test states exactly who may call what.

#![allow(dead_code)]

use riichi_table::core::{CallKind, ChiiOption, Seat, Tile};
use riichi_table::engine::RoundEngine;
use riichi_table::game::{
    events, Actor, CancellationScope, DecisionProvider, EventStream, SchedulerEvent, SeatTable,
    TableView, TsumogiriController,
};
use std::collections::VecDeque;

pub fn tile(s: &str) -> Tile {
    s.parse().unwrap()
}

pub fn tiles(spec: &str) -> Vec<Tile> {
    spec.split_whitespace().map(tile).collect()
}

#[derive(Debug, Clone)]
pub struct MockEngine {
    pub current: Seat,
    pub previous: Option<Seat>,
    pub wall: VecDeque<Tile>,
    pub dead_wall: Vec<Tile>,
    pub hands: [Vec<Tile>; 4],
    pub riichi: [bool; 4],
    pub drawn: Option<Tile>,
    /// The tile others may currently call, with who released it
    pub target: Option<(Seat, Tile)>,
    pub last_discard: Option<Tile>,
    pub pending_compensation: bool,
    compensations: Vec<(Seat, Tile)>,

    // Eligibility tables, matched by tile kind
    pub ron: Vec<(Seat, Tile)>,
    pub tsumo: Vec<(Seat, Tile)>,
    pub pon: Vec<(Seat, Tile)>,
    pub open_kan: Vec<(Seat, Tile)>,
    /// Own-turn kans; `true` marks an added kan that others may rob
    pub self_kan: Vec<(Seat, Tile, bool)>,
    pub chii: Vec<(Seat, ChiiOption)>,
    pub riichi_options: Vec<(Seat, Tile)>,
    /// Calls the engine refuses even though it reported them legal
    pub reject: Vec<(Seat, CallKind)>,
    pub reject_discards: bool,

    /// Every mutating command received, in order
    pub commands: Vec<String>,
    pub undo_calls: usize,
}

impl MockEngine {
    /// Thirteen distinct honor-free tiles per seat and the given wall
    pub fn new(dealer: Seat, wall: &str) -> Self {
        let hands = [0u8, 1, 2, 3].map(|seat| {
            (0..13)
                .map(|kind| Tile::from_kind(kind, seat).unwrap())
                .collect::<Vec<_>>()
        });
        MockEngine {
            current: dealer,
            previous: None,
            wall: tiles(wall).into(),
            dead_wall: tiles("N N N N"),
            hands,
            riichi: [false; 4],
            drawn: None,
            target: None,
            last_discard: None,
            pending_compensation: false,
            compensations: Vec::new(),
            ron: Vec::new(),
            tsumo: Vec::new(),
            pon: Vec::new(),
            open_kan: Vec::new(),
            self_kan: Vec::new(),
            chii: Vec::new(),
            riichi_options: Vec::new(),
            reject: Vec::new(),
            reject_discards: false,
            commands: Vec::new(),
            undo_calls: 0,
        }
    }

    fn listed(table: &[(Seat, Tile)], seat: Seat, tile: Tile) -> bool {
        table
            .iter()
            .any(|(s, t)| *s == seat && t.same_kind(tile))
    }

    fn claimable(&self, seat: Seat) -> Option<Tile> {
        self.target
            .filter(|(from, _)| *from != seat)
            .map(|(_, tile)| tile)
    }

    fn own_turn(&self, seat: Seat) -> bool {
        seat == self.current && self.drawn.is_some()
    }

    fn refuses(&mut self, seat: Seat, kind: CallKind) -> bool {
        if self.reject.contains(&(seat, kind)) {
            self.commands.push(format!("{kind} {seat} refused"));
            return true;
        }
        false
    }

    fn draw_compensation(&mut self, seat: Seat) -> Option<Tile> {
        let tile = self.dead_wall.pop()?;
        self.hands[seat.index()].push(tile);
        self.drawn = Some(tile);
        self.pending_compensation = true;
        self.compensations.push((seat, tile));
        Some(tile)
    }

    fn claim(&mut self, seat: Seat) {
        self.current = seat;
        self.target = None;
        self.drawn = None;
    }

    fn remove(&mut self, seat: Seat, tile: Tile) -> bool {
        let hand = &mut self.hands[seat.index()];
        match hand.iter().position(|t| *t == tile) {
            Some(idx) => {
                hand.remove(idx);
                true
            }
            None => false,
        }
    }

    fn put_in_river(&mut self, seat: Seat, tile: Tile) {
        self.remove(seat, tile);
        self.target = Some((seat, tile));
        self.last_discard = Some(tile);
        self.previous = Some(seat);
        self.drawn = None;
        self.pending_compensation = false;
    }
}

impl RoundEngine for MockEngine {
    fn pick(&mut self) -> Option<Tile> {
        let tile = self.wall.pop_front()?;
        self.commands.push(format!("pick {}", self.current));
        self.hands[self.current.index()].push(tile);
        self.drawn = Some(tile);
        self.target = None;
        Some(tile)
    }

    fn discard(&mut self, seat: Seat, tile: Tile) -> bool {
        if self.reject_discards || seat != self.current || !self.hands[seat.index()].contains(&tile)
        {
            self.commands.push(format!("discard {seat} {tile} refused"));
            return false;
        }
        self.commands.push(format!("discard {seat} {tile}"));
        self.put_in_river(seat, tile);
        true
    }

    fn can_call_ron(&self, seat: Seat) -> bool {
        self.claimable(seat)
            .is_some_and(|tile| Self::listed(&self.ron, seat, tile))
    }

    fn can_call_tsumo(&self, seat: Seat, _is_kan_compensation: bool) -> bool {
        self.own_turn(seat)
            && self
                .drawn
                .is_some_and(|tile| Self::listed(&self.tsumo, seat, tile))
    }

    fn can_call_pon(&self, seat: Seat) -> bool {
        self.claimable(seat)
            .is_some_and(|tile| Self::listed(&self.pon, seat, tile))
    }

    fn can_call_kan(&self, seat: Seat) -> Vec<Tile> {
        if self.own_turn(seat) {
            return self
                .self_kan
                .iter()
                .filter(|(s, t, _)| {
                    *s == seat && self.hands[seat.index()].iter().any(|h| h.same_kind(*t))
                })
                .map(|(_, t, _)| *t)
                .collect();
        }
        match self.claimable(seat) {
            Some(tile) if Self::listed(&self.open_kan, seat, tile) => vec![tile],
            _ => Vec::new(),
        }
    }

    fn can_call_chii(&self, seat: Seat) -> Vec<ChiiOption> {
        match self.target {
            Some((from, tile)) if from.next() == seat => self
                .chii
                .iter()
                .filter(|(s, o)| *s == seat && o.claimed.same_kind(tile))
                .map(|(_, o)| *o)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn can_call_riichi(&self, seat: Seat) -> Vec<Tile> {
        if !self.own_turn(seat) || self.riichi[seat.index()] {
            return Vec::new();
        }
        self.riichi_options
            .iter()
            .filter(|(s, t)| *s == seat && self.hands[seat.index()].contains(t))
            .map(|(_, t)| *t)
            .collect()
    }

    fn call_pon(&mut self, seat: Seat) -> bool {
        if self.refuses(seat, CallKind::Pon) || !self.can_call_pon(seat) {
            return false;
        }
        self.commands.push(format!("pon {seat}"));
        self.claim(seat);
        true
    }

    fn call_kan(&mut self, seat: Seat, tile: Option<Tile>) -> Option<Tile> {
        if self.refuses(seat, CallKind::Kan) {
            return None;
        }
        let options = self.can_call_kan(seat);
        let chosen = match tile {
            Some(wanted) => options.into_iter().find(|o| o.same_kind(wanted))?,
            None => options.into_iter().next()?,
        };
        self.commands.push(format!("kan {seat} {chosen}"));

        if self.own_turn(seat) {
            let added = self
                .self_kan
                .iter()
                .any(|(s, t, added)| *s == seat && t.same_kind(chosen) && *added);
            self.target = added.then_some((seat, chosen));
        } else {
            self.claim(seat);
        }
        self.draw_compensation(seat)
    }

    fn call_chii(&mut self, seat: Seat, start: u8) -> bool {
        if self.refuses(seat, CallKind::Chii)
            || !self.can_call_chii(seat).iter().any(|o| o.start == start)
        {
            return false;
        }
        self.commands.push(format!("chii {seat} {start}"));
        self.claim(seat);
        true
    }

    fn call_riichi(&mut self, seat: Seat, tile: Tile) -> bool {
        if self.refuses(seat, CallKind::Riichi) || !self.can_call_riichi(seat).contains(&tile) {
            return false;
        }
        self.commands.push(format!("riichi {seat} {tile}"));
        self.riichi[seat.index()] = true;
        self.put_in_river(seat, tile);
        true
    }

    fn undo_pick_compensation_tile(&mut self) -> bool {
        self.undo_calls += 1;
        let Some((seat, tile)) = self.compensations.pop() else {
            return false;
        };
        self.commands.push(format!("undo {seat} {tile}"));
        self.remove(seat, tile);
        self.dead_wall.push(tile);
        self.drawn = None;
        self.pending_compensation = false;
        true
    }

    fn advance_seat(&mut self) {
        self.commands.push("advance".to_string());
        self.current = self.current.next();
        self.target = None;
        self.drawn = None;
    }

    fn current_seat(&self) -> Seat {
        self.current
    }

    fn previous_seat(&self) -> Option<Seat> {
        self.previous
    }

    fn is_wall_exhaustion(&self) -> bool {
        self.wall.is_empty()
    }

    fn wall_remaining(&self) -> usize {
        self.wall.len()
    }

    fn hand(&self, seat: Seat) -> Vec<Tile> {
        self.hands[seat.index()].clone()
    }

    fn legal_discards(&self, seat: Seat) -> Vec<Tile> {
        if seat != self.current {
            return Vec::new();
        }
        if self.riichi[seat.index()] {
            return self.drawn.into_iter().collect();
        }
        self.hands[seat.index()].clone()
    }

    fn last_drawn(&self, seat: Seat) -> Option<Tile> {
        if seat == self.current {
            self.drawn
        } else {
            None
        }
    }

    fn last_discard(&self) -> Option<Tile> {
        self.last_discard
    }

    fn is_riichi(&self, seat: Seat) -> bool {
        self.riichi[seat.index()]
    }

    fn has_pending_compensation(&self) -> bool {
        self.pending_compensation
    }
}

/// Cancels the session the first time it is asked to discard
pub struct CancellingProvider {
    pub seat: Seat,
    pub scope: CancellationScope,
}

impl DecisionProvider for CancellingProvider {
    fn seat(&self) -> Seat {
        self.seat
    }

    fn choose_discard(
        &mut self,
        _view: &TableView<'_>,
        _options: &[Tile],
        _drawn: Option<Tile>,
    ) -> Option<Tile> {
        self.scope.cancel();
        self.scope.cancel();
        None
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
        false
    }

    fn choose_tsumo(&mut self, _view: &TableView<'_>, _tile: Option<Tile>) -> bool {
        false
    }
}

/// A seat table with the given actors where provided, tsumogiri elsewhere
pub fn seats_with(mut custom: Vec<(Seat, Actor)>) -> SeatTable {
    let actors = Seat::ALL
        .iter()
        .map(|&seat| match custom.iter().position(|(s, _)| *s == seat) {
            Some(idx) => custom.remove(idx).1,
            None => Actor::Ai(Box::new(TsumogiriController::new(seat))),
        })
        .collect();
    SeatTable::new(actors).unwrap()
}

pub fn ai(provider: impl DecisionProvider + 'static) -> Actor {
    Actor::Ai(Box::new(provider))
}

pub fn event_channel() -> (CancellationScope, events::EventSink, EventStream) {
    let scope = CancellationScope::new();
    let (sink, stream) = events::channel(&scope);
    (scope, sink, stream)
}

/// Events of a kind, for counting
pub fn count(events: &[SchedulerEvent], pred: impl Fn(&SchedulerEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}
