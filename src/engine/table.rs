//! Reference round engine
//!
//! A compact rules engine good enough to drive real rounds: a shuffled
//! 136-tile wall, melds, riichi, compensation draws and win-shape checks.
//! Yaku and scoring are not modelled; any complete hand wins.

use crate::core::{ChiiOption, Seat, Tile, KIND_COUNT, SEAT_COUNT};
use crate::engine::agari::{counts_of, is_agari, is_tenpai};
use crate::engine::{EngineFactory, RoundEngine};
use crate::undo::{MeldKind, TableAction, UndoLog};
use crate::{Result, TableError};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

const DEAD_WALL_SIZE: usize = 14;
const HAND_SIZE: usize = 13;
const MAX_KANS: u8 = 4;
const RIICHI_MIN_WALL: usize = 4;

/// A called or declared meld
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meld {
    pub kind: MeldKind,
    pub tiles: SmallVec<[Tile; 4]>,
    /// Seat the claimed tile came from (None for closed kans)
    pub from: Option<Seat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
    Draw,
    Discard,
    Claims,
}

/// Tile other seats may currently win on
#[derive(Debug, Clone, Copy)]
struct RonTarget {
    seat: Seat,
    tile: Tile,
}

/// A stacked table for deterministic rounds
///
/// Walls are listed in draw order.
#[derive(Debug, Clone)]
pub struct TableLayout {
    pub dealer: Seat,
    pub hands: [Vec<Tile>; SEAT_COUNT],
    pub live_wall: Vec<Tile>,
    pub dead_wall: Vec<Tile>,
}

impl TableLayout {
    /// Build a layout from tile notation, assigning distinct copies per kind
    ///
    /// # Example
    /// ```ignore
    /// let layout = TableLayout::from_notation(
    ///     Seat::new(0),
    ///     ["1m 2m 3m ...", "...", "...", "..."],
    ///     "5p E",
    ///     "9s",
    /// )?;
    /// ```
    pub fn from_notation(
        dealer: Seat,
        hands: [&str; SEAT_COUNT],
        live_wall: &str,
        dead_wall: &str,
    ) -> Result<Self> {
        let mut used = [0u8; KIND_COUNT];
        let mut take = |spec: &str| -> Result<Vec<Tile>> {
            spec.split_whitespace()
                .map(|s| {
                    let kind = s.parse::<Tile>()?.kind();
                    let copy = used[kind as usize];
                    used[kind as usize] += 1;
                    Tile::from_kind(kind, copy)
                })
                .collect()
        };

        let hands = [
            take(hands[0])?,
            take(hands[1])?,
            take(hands[2])?,
            take(hands[3])?,
        ];
        let live_wall = take(live_wall)?;
        let dead_wall = take(dead_wall)?;
        Ok(TableLayout {
            dealer,
            hands,
            live_wall,
            dead_wall,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TableEngine {
    /// Next draw at the end
    live_wall: Vec<Tile>,
    /// Next compensation draw at the end
    dead_wall: Vec<Tile>,
    hands: [Vec<Tile>; SEAT_COUNT],
    melds: [Vec<Meld>; SEAT_COUNT],
    rivers: [Vec<Tile>; SEAT_COUNT],
    riichi: [bool; SEAT_COUNT],
    current: Seat,
    previous: Option<Seat>,
    drawn: Option<Tile>,
    last_discard: Option<(Seat, Tile)>,
    ron_target: Option<RonTarget>,
    awaiting: Awaiting,
    pending_compensation: bool,
    kan_count: u8,
    undo_log: UndoLog,
}

impl TableEngine {
    /// Shuffle a full set with the given seed and deal from the dealer
    pub fn new(seed: u64, dealer: Seat) -> Self {
        let mut tiles: Vec<Tile> = Tile::all().collect();
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        tiles.shuffle(&mut rng);

        let dead_wall = tiles.split_off(tiles.len() - DEAD_WALL_SIZE);
        let mut live_wall = tiles;
        let mut hands: [Vec<Tile>; SEAT_COUNT] = Default::default();
        for _ in 0..HAND_SIZE {
            for step in 0..SEAT_COUNT as u8 {
                let seat = Seat::new(dealer.as_u8() + step);
                if let Some(tile) = live_wall.pop() {
                    hands[seat.index()].push(tile);
                }
            }
        }
        for hand in &mut hands {
            hand.sort();
        }

        Self::with_walls(dealer, hands, live_wall, dead_wall)
    }

    /// Build an engine from a stacked layout
    pub fn from_layout(layout: TableLayout) -> Result<Self> {
        let mut seen = FxHashSet::default();
        let all = layout
            .hands
            .iter()
            .flatten()
            .chain(&layout.live_wall)
            .chain(&layout.dead_wall);
        for tile in all {
            if !seen.insert(*tile) {
                return Err(TableError::InvalidTile(format!(
                    "tile {tile} (id {}) appears twice in layout",
                    tile.id()
                )));
            }
        }

        let mut hands = layout.hands;
        for hand in &mut hands {
            hand.sort();
        }
        let mut live_wall = layout.live_wall;
        live_wall.reverse();
        let mut dead_wall = layout.dead_wall;
        dead_wall.reverse();
        Ok(Self::with_walls(layout.dealer, hands, live_wall, dead_wall))
    }

    fn with_walls(
        dealer: Seat,
        hands: [Vec<Tile>; SEAT_COUNT],
        live_wall: Vec<Tile>,
        dead_wall: Vec<Tile>,
    ) -> Self {
        TableEngine {
            live_wall,
            dead_wall,
            hands,
            melds: Default::default(),
            rivers: Default::default(),
            riichi: [false; SEAT_COUNT],
            current: dealer,
            previous: None,
            drawn: None,
            last_discard: None,
            ron_target: None,
            awaiting: Awaiting::Draw,
            pending_compensation: false,
            kan_count: 0,
            undo_log: UndoLog::new(),
        }
    }

    pub fn melds(&self, seat: Seat) -> &[Meld] {
        &self.melds[seat.index()]
    }

    pub fn river(&self, seat: Seat) -> &[Tile] {
        &self.rivers[seat.index()]
    }

    pub fn dead_wall_remaining(&self) -> usize {
        self.dead_wall.len()
    }

    pub fn kan_count(&self) -> u8 {
        self.kan_count
    }

    pub fn undo_log(&self) -> &UndoLog {
        &self.undo_log
    }

    fn count_kind(&self, seat: Seat, kind: u8) -> usize {
        self.hands[seat.index()]
            .iter()
            .filter(|t| t.kind() == kind)
            .count()
    }

    fn has_open_melds(&self, seat: Seat) -> bool {
        self.melds[seat.index()]
            .iter()
            .any(|m| m.kind != MeldKind::ClosedKan)
    }

    /// The discard `seat` could claim right now, with its discarder
    fn claimable(&self, seat: Seat) -> Option<(Seat, Tile)> {
        if self.awaiting != Awaiting::Claims
            || self.riichi[seat.index()]
            || self.live_wall.is_empty()
        {
            return None;
        }
        self.last_discard.filter(|(discarder, _)| *discarder != seat)
    }

    fn own_turn(&self, seat: Seat) -> bool {
        seat == self.current && self.awaiting == Awaiting::Discard
    }

    fn remove_tile(&mut self, seat: Seat, tile: Tile) -> bool {
        let hand = &mut self.hands[seat.index()];
        match hand.iter().position(|&t| t == tile) {
            Some(idx) => {
                hand.remove(idx);
                true
            }
            None => false,
        }
    }

    fn take_kind(&mut self, seat: Seat, kind: u8, count: usize) -> SmallVec<[Tile; 4]> {
        let mut taken = SmallVec::new();
        let hand = &mut self.hands[seat.index()];
        while taken.len() < count {
            match hand.iter().position(|t| t.kind() == kind) {
                Some(idx) => taken.push(hand.remove(idx)),
                None => break,
            }
        }
        taken
    }

    fn claim_from_river(&mut self, discarder: Seat) {
        self.rivers[discarder.index()].pop();
    }

    /// Hand the turn to a seat that just claimed a discard
    fn enter_claimer_turn(&mut self, seat: Seat) {
        self.current = seat;
        self.awaiting = Awaiting::Discard;
        self.drawn = None;
        self.ron_target = None;
        self.pending_compensation = false;
    }

    fn put_in_river(&mut self, seat: Seat, tile: Tile) {
        self.remove_tile(seat, tile);
        self.rivers[seat.index()].push(tile);
        self.last_discard = Some((seat, tile));
        self.previous = Some(seat);
        self.ron_target = Some(RonTarget { seat, tile });
        self.drawn = None;
        self.awaiting = Awaiting::Claims;
        self.pending_compensation = false;
        self.undo_log.log(TableAction::Discard { seat, tile });
    }

    fn draw_compensation(&mut self, seat: Seat) -> Option<Tile> {
        let tile = self.dead_wall.pop()?;
        let replenished = if self.live_wall.is_empty() {
            None
        } else {
            Some(self.live_wall.remove(0))
        };
        if let Some(moved) = replenished {
            self.dead_wall.insert(0, moved);
        }

        let hand = &mut self.hands[seat.index()];
        hand.push(tile);
        hand.sort();
        self.drawn = Some(tile);
        self.awaiting = Awaiting::Discard;
        self.pending_compensation = true;
        self.undo_log.log(TableAction::CompensationDraw {
            seat,
            tile,
            replenished,
        });
        Some(tile)
    }
}

impl RoundEngine for TableEngine {
    fn pick(&mut self) -> Option<Tile> {
        if self.awaiting != Awaiting::Draw {
            return None;
        }
        let tile = self.live_wall.pop()?;
        let seat = self.current;
        let hand = &mut self.hands[seat.index()];
        hand.push(tile);
        hand.sort();
        self.drawn = Some(tile);
        self.awaiting = Awaiting::Discard;
        self.ron_target = None;
        self.pending_compensation = false;
        self.undo_log.log(TableAction::Draw { seat, tile });
        Some(tile)
    }

    fn discard(&mut self, seat: Seat, tile: Tile) -> bool {
        if !self.legal_discards(seat).contains(&tile) {
            return false;
        }
        self.put_in_river(seat, tile);
        true
    }

    fn can_call_ron(&self, seat: Seat) -> bool {
        let Some(target) = self.ron_target else {
            return false;
        };
        if target.seat == seat {
            return false;
        }
        // Discard furiten: never win on a kind from one's own river
        if self.rivers[seat.index()]
            .iter()
            .any(|t| t.same_kind(target.tile))
        {
            return false;
        }
        let mut counts = counts_of(self.hands[seat.index()].iter().copied());
        counts[target.tile.kind() as usize] += 1;
        is_agari(&counts)
    }

    fn can_call_tsumo(&self, seat: Seat, _is_kan_compensation: bool) -> bool {
        self.own_turn(seat)
            && self.drawn.is_some()
            && is_agari(&counts_of(self.hands[seat.index()].iter().copied()))
    }

    fn can_call_pon(&self, seat: Seat) -> bool {
        self.claimable(seat)
            .is_some_and(|(_, tile)| self.count_kind(seat, tile.kind()) >= 2)
    }

    fn can_call_kan(&self, seat: Seat) -> Vec<Tile> {
        if self.kan_count >= MAX_KANS || self.live_wall.is_empty() || self.dead_wall.is_empty() {
            return Vec::new();
        }

        if self.own_turn(seat) {
            if self.drawn.is_none() || self.riichi[seat.index()] {
                return Vec::new();
            }
            let hand = &self.hands[seat.index()];
            let counts = counts_of(hand.iter().copied());
            let mut options: Vec<Tile> = Vec::new();
            for tile in hand {
                let closed = counts[tile.kind() as usize] == 4;
                let added = self.melds[seat.index()]
                    .iter()
                    .any(|m| m.kind == MeldKind::Pon && m.tiles[0].same_kind(*tile));
                if (closed || added) && !options.iter().any(|o| o.same_kind(*tile)) {
                    options.push(*tile);
                }
            }
            return options;
        }

        match self.claimable(seat) {
            Some((_, tile)) if self.count_kind(seat, tile.kind()) >= 3 => vec![tile],
            _ => Vec::new(),
        }
    }

    fn can_call_chii(&self, seat: Seat) -> Vec<ChiiOption> {
        let Some((discarder, tile)) = self.claimable(seat) else {
            return Vec::new();
        };
        let Some(number) = tile.number() else {
            return Vec::new();
        };
        if discarder.next() != seat {
            return Vec::new();
        }

        let one = tile.kind() - (number - 1);
        let counts = counts_of(self.hands[seat.index()].iter().copied());
        let mut options = Vec::new();
        for start in number.saturating_sub(2).max(1)..=number.min(7) {
            let complete = (start..start + 3)
                .filter(|&n| n != number)
                .all(|n| counts[(one + n - 1) as usize] > 0);
            if complete {
                options.push(ChiiOption {
                    start,
                    claimed: tile,
                });
            }
        }
        options
    }

    fn can_call_riichi(&self, seat: Seat) -> Vec<Tile> {
        if !self.own_turn(seat)
            || self.riichi[seat.index()]
            || self.has_open_melds(seat)
            || self.live_wall.len() < RIICHI_MIN_WALL
        {
            return Vec::new();
        }

        let hand = &self.hands[seat.index()];
        let counts = counts_of(hand.iter().copied());
        let mut seen = [false; KIND_COUNT];
        let mut options = Vec::new();
        for &tile in hand {
            let kind = tile.kind() as usize;
            if seen[kind] {
                continue;
            }
            seen[kind] = true;
            let mut rest = counts;
            rest[kind] -= 1;
            if is_tenpai(&rest) {
                // Prefer offering the drawn copy of a kind
                let offered = self.drawn.filter(|d| d.same_kind(tile)).unwrap_or(tile);
                options.push(offered);
            }
        }
        options
    }

    fn call_pon(&mut self, seat: Seat) -> bool {
        if !self.can_call_pon(seat) {
            return false;
        }
        let Some((discarder, tile)) = self.last_discard else {
            return false;
        };
        let mut tiles = self.take_kind(seat, tile.kind(), 2);
        tiles.push(tile);
        self.claim_from_river(discarder);
        self.melds[seat.index()].push(Meld {
            kind: MeldKind::Pon,
            tiles,
            from: Some(discarder),
        });
        self.enter_claimer_turn(seat);
        self.undo_log.log(TableAction::Meld {
            seat,
            kind: MeldKind::Pon,
            tile,
        });
        true
    }

    fn call_kan(&mut self, seat: Seat, tile: Option<Tile>) -> Option<Tile> {
        let options = self.can_call_kan(seat);
        let chosen = match tile {
            Some(wanted) => options.iter().copied().find(|o| o.same_kind(wanted))?,
            None => options.first().copied()?,
        };
        let kind = chosen.kind();

        if let Some((discarder, claimed)) = self.claimable(seat) {
            let mut tiles = self.take_kind(seat, kind, 3);
            tiles.push(claimed);
            self.claim_from_river(discarder);
            self.melds[seat.index()].push(Meld {
                kind: MeldKind::OpenKan,
                tiles,
                from: Some(discarder),
            });
            self.enter_claimer_turn(seat);
            self.undo_log.log(TableAction::Meld {
                seat,
                kind: MeldKind::OpenKan,
                tile: claimed,
            });
        } else if self.count_kind(seat, kind) == 4 {
            let tiles = self.take_kind(seat, kind, 4);
            self.melds[seat.index()].push(Meld {
                kind: MeldKind::ClosedKan,
                tiles,
                from: None,
            });
            self.ron_target = None;
            self.undo_log.log(TableAction::Meld {
                seat,
                kind: MeldKind::ClosedKan,
                tile: chosen,
            });
        } else {
            let idx = self.melds[seat.index()]
                .iter()
                .position(|m| m.kind == MeldKind::Pon && m.tiles[0].same_kind(chosen))?;
            let added = *self.take_kind(seat, kind, 1).first()?;
            let meld = &mut self.melds[seat.index()][idx];
            meld.kind = MeldKind::AddedKan;
            meld.tiles.push(added);
            // The added tile can be robbed
            self.ron_target = Some(RonTarget { seat, tile: added });
            self.undo_log.log(TableAction::Meld {
                seat,
                kind: MeldKind::AddedKan,
                tile: added,
            });
        }

        self.kan_count += 1;
        self.draw_compensation(seat)
    }

    fn call_chii(&mut self, seat: Seat, start: u8) -> bool {
        let Some(option) = self
            .can_call_chii(seat)
            .into_iter()
            .find(|o| o.start == start)
        else {
            return false;
        };
        let Some((discarder, claimed)) = self.last_discard else {
            return false;
        };
        let Some(number) = claimed.number() else {
            return false;
        };

        let one = claimed.kind() - (number - 1);
        let mut tiles: SmallVec<[Tile; 4]> = SmallVec::new();
        for n in (option.start..option.start + 3).filter(|&n| n != number) {
            tiles.extend(self.take_kind(seat, one + n - 1, 1));
        }
        tiles.push(claimed);
        tiles.sort();
        self.claim_from_river(discarder);
        self.melds[seat.index()].push(Meld {
            kind: MeldKind::Chii,
            tiles,
            from: Some(discarder),
        });
        self.enter_claimer_turn(seat);
        self.undo_log.log(TableAction::Meld {
            seat,
            kind: MeldKind::Chii,
            tile: claimed,
        });
        true
    }

    fn call_riichi(&mut self, seat: Seat, tile: Tile) -> bool {
        let offered = self.can_call_riichi(seat);
        if !offered.iter().any(|t| t.same_kind(tile)) || !self.hands[seat.index()].contains(&tile)
        {
            return false;
        }
        self.riichi[seat.index()] = true;
        self.undo_log.log(TableAction::Riichi { seat });
        self.put_in_river(seat, tile);
        true
    }

    fn undo_pick_compensation_tile(&mut self) -> bool {
        let Some(TableAction::CompensationDraw {
            seat,
            tile,
            replenished,
        }) = self.undo_log.peek().cloned()
        else {
            return false;
        };
        self.undo_log.pop();

        self.remove_tile(seat, tile);
        if let Some(moved) = replenished {
            if self.dead_wall.first() == Some(&moved) {
                self.dead_wall.remove(0);
            }
            self.live_wall.insert(0, moved);
        }
        self.dead_wall.push(tile);
        self.drawn = None;
        self.pending_compensation = false;
        true
    }

    fn advance_seat(&mut self) {
        let from = self.current;
        self.current = from.next();
        self.awaiting = Awaiting::Draw;
        self.drawn = None;
        self.ron_target = None;
        self.pending_compensation = false;
        self.undo_log.log(TableAction::AdvanceSeat {
            from,
            to: self.current,
        });
    }

    fn current_seat(&self) -> Seat {
        self.current
    }

    fn previous_seat(&self) -> Option<Seat> {
        self.previous
    }

    fn is_wall_exhaustion(&self) -> bool {
        self.live_wall.is_empty()
    }

    fn wall_remaining(&self) -> usize {
        self.live_wall.len()
    }

    fn hand(&self, seat: Seat) -> Vec<Tile> {
        self.hands[seat.index()].clone()
    }

    fn legal_discards(&self, seat: Seat) -> Vec<Tile> {
        if !self.own_turn(seat) {
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
        self.last_discard.map(|(_, tile)| tile)
    }

    fn is_riichi(&self, seat: Seat) -> bool {
        self.riichi[seat.index()]
    }

    fn has_pending_compensation(&self) -> bool {
        self.pending_compensation
    }
}

/// Deals a freshly shuffled table per round, rotating the dealer
#[derive(Debug, Clone)]
pub struct TableEngineFactory {
    seed: u64,
}

impl TableEngineFactory {
    pub fn new(seed: u64) -> Self {
        TableEngineFactory { seed }
    }

    pub fn round_seed(&self, round: u32) -> u64 {
        self.seed
            .wrapping_add((round as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

impl EngineFactory for TableEngineFactory {
    type Engine = TableEngine;

    fn new_round(&mut self, round: u32) -> TableEngine {
        let dealer = Seat::new((round % SEAT_COUNT as u32) as u8);
        TableEngine::new(self.round_seed(round), dealer)
    }
}
