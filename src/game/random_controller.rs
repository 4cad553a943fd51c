//! Random AI controller for testing and baseline play
//!
//! Makes random choices among legal options. Calls are accepted with a
//! configurable probability; wins are always taken.

use crate::core::{ChiiOption, Seat, Tile};
use crate::game::controller::{DecisionProvider, TableView};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;

const DEFAULT_CALL_RATE: f64 = 0.3;

pub struct RandomController {
    seat: Seat,
    rng: ChaCha12Rng,
    /// Probability of accepting a chii, pon, kan or riichi offer
    call_rate: f64,
}

impl RandomController {
    /// Create a random controller with a seeded RNG (for deterministic play)
    pub fn with_seed(seat: Seat, seed: u64) -> Self {
        RandomController {
            seat,
            rng: ChaCha12Rng::seed_from_u64(seed),
            call_rate: DEFAULT_CALL_RATE,
        }
    }

    pub fn with_call_rate(mut self, call_rate: f64) -> Self {
        self.call_rate = call_rate.clamp(0.0, 1.0);
        self
    }

    fn pick<T: Copy>(&mut self, options: &[T]) -> Option<T> {
        if options.is_empty() {
            None
        } else {
            Some(options[self.rng.gen_range(0..options.len())])
        }
    }

    fn wants_call(&mut self) -> bool {
        self.rng.gen_bool(self.call_rate)
    }
}

impl DecisionProvider for RandomController {
    fn seat(&self) -> Seat {
        self.seat
    }

    fn name(&self) -> &str {
        "random"
    }

    fn choose_discard(
        &mut self,
        _view: &TableView<'_>,
        options: &[Tile],
        _drawn: Option<Tile>,
    ) -> Option<Tile> {
        self.pick(options)
    }

    fn choose_chii(
        &mut self,
        _view: &TableView<'_>,
        _tile: Tile,
        options: &[ChiiOption],
    ) -> Option<ChiiOption> {
        if self.wants_call() {
            self.pick(options)
        } else {
            None
        }
    }

    fn choose_pon(&mut self, _view: &TableView<'_>, _tile: Tile) -> bool {
        self.wants_call()
    }

    fn choose_kan(&mut self, _view: &TableView<'_>, options: &[Tile]) -> Option<Tile> {
        if self.wants_call() {
            self.pick(options)
        } else {
            None
        }
    }

    fn choose_riichi(&mut self, _view: &TableView<'_>, options: &[Tile]) -> Option<Tile> {
        if self.wants_call() {
            self.pick(options)
        } else {
            None
        }
    }

    fn choose_ron(&mut self, _view: &TableView<'_>, _tile: Tile, _from: Seat) -> bool {
        true
    }

    fn choose_tsumo(&mut self, _view: &TableView<'_>, _tile: Option<Tile>) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{RoundEngine, TableEngine};

    fn hand_view_engine() -> TableEngine {
        TableEngine::new(9, Seat::new(0))
    }

    #[test]
    fn test_choose_from_options() {
        let engine = hand_view_engine();
        let view = TableView::new(&engine, Seat::new(1));
        let mut controller = RandomController::with_seed(Seat::new(1), 42);

        let options = engine.hand(Seat::new(1));
        let choice = controller.choose_discard(&view, &options, None).unwrap();
        assert!(options.contains(&choice));
        assert_eq!(controller.choose_discard(&view, &[], None), None);
    }

    #[test]
    fn test_seeded_determinism() {
        let engine = hand_view_engine();
        let view = TableView::new(&engine, Seat::new(1));
        let options = engine.hand(Seat::new(1));

        let mut a = RandomController::with_seed(Seat::new(1), 7);
        let mut b = RandomController::with_seed(Seat::new(1), 7);
        for _ in 0..10 {
            assert_eq!(
                a.choose_discard(&view, &options, None),
                b.choose_discard(&view, &options, None)
            );
        }
    }

    #[test]
    fn test_call_rate_bounds() {
        let engine = hand_view_engine();
        let view = TableView::new(&engine, Seat::new(1));
        let five: Tile = "5s".parse().unwrap();

        let mut never = RandomController::with_seed(Seat::new(1), 1).with_call_rate(0.0);
        let mut always = RandomController::with_seed(Seat::new(1), 1).with_call_rate(4.0);
        for _ in 0..20 {
            assert!(!never.choose_pon(&view, five));
            assert!(always.choose_pon(&view, five));
        }
        assert!(never.choose_ron(&view, five, Seat::new(0)));
    }
}
