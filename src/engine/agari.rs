//! Winning-shape detection
//!
//! Works on per-kind tile counts. A concealed part is complete when it
//! decomposes into sets plus one pair; with no melds, seven pairs and
//! thirteen orphans also count.

use crate::core::{Tile, KIND_COUNT};

pub type TileCounts = [u8; KIND_COUNT];

const ORPHANS: [usize; 13] = [0, 8, 9, 17, 18, 26, 27, 28, 29, 30, 31, 32, 33];

pub fn counts_of<I: IntoIterator<Item = Tile>>(tiles: I) -> TileCounts {
    let mut counts = [0u8; KIND_COUNT];
    for tile in tiles {
        counts[tile.kind() as usize] += 1;
    }
    counts
}

fn total(counts: &TileCounts) -> usize {
    counts.iter().map(|&c| c as usize).sum()
}

/// Complete hand: one pair plus sets, seven pairs or thirteen orphans
pub fn is_agari(counts: &TileCounts) -> bool {
    let n = total(counts);
    if n % 3 != 2 {
        return false;
    }
    if n == 14 && (is_chiitoitsu(counts) || is_kokushi(counts)) {
        return true;
    }
    is_standard(counts)
}

/// One tile away from a complete hand
pub fn is_tenpai(counts: &TileCounts) -> bool {
    if total(counts) % 3 != 1 {
        return false;
    }
    let mut trial = *counts;
    for kind in 0..KIND_COUNT {
        if trial[kind] >= 4 {
            continue;
        }
        trial[kind] += 1;
        let complete = is_agari(&trial);
        trial[kind] -= 1;
        if complete {
            return true;
        }
    }
    false
}

fn is_standard(counts: &TileCounts) -> bool {
    let mut work = *counts;
    for head in 0..KIND_COUNT {
        if work[head] >= 2 {
            work[head] -= 2;
            let ok = decompose(&mut work, 0);
            work[head] += 2;
            if ok {
                return true;
            }
        }
    }
    false
}

fn decompose(counts: &mut TileCounts, start: usize) -> bool {
    let Some(i) = (start..KIND_COUNT).find(|&k| counts[k] > 0) else {
        return true;
    };

    if counts[i] >= 3 {
        counts[i] -= 3;
        let ok = decompose(counts, i);
        counts[i] += 3;
        if ok {
            return true;
        }
    }

    // Runs only within a suit and never across 8-9-1
    if i < 27 && i % 9 <= 6 && counts[i + 1] > 0 && counts[i + 2] > 0 {
        counts[i] -= 1;
        counts[i + 1] -= 1;
        counts[i + 2] -= 1;
        let ok = decompose(counts, i);
        counts[i] += 1;
        counts[i + 1] += 1;
        counts[i + 2] += 1;
        if ok {
            return true;
        }
    }

    false
}

fn is_chiitoitsu(counts: &TileCounts) -> bool {
    counts.iter().filter(|&&c| c == 2).count() == 7
}

fn is_kokushi(counts: &TileCounts) -> bool {
    let mut pair = false;
    for (kind, &c) in counts.iter().enumerate() {
        let orphan = ORPHANS.contains(&kind);
        match (orphan, c) {
            (_, 0) if !orphan => {}
            (true, 1) => {}
            (true, 2) if !pair => pair = true,
            _ => return false,
        }
    }
    pair
}
