/// Tetromino definitions: per-rotation block offsets, wall-kick offsets,
/// and the 7-bag randomizer.
///
/// Rotation states are explicit offset tables rather than computed
/// rotations; pieces with rotational symmetry list fewer states and the
/// rotation index wraps over the table length.

use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

pub const ALL_KINDS: [PieceKind; 7] = [
    PieceKind::I,
    PieceKind::O,
    PieceKind::T,
    PieceKind::S,
    PieceKind::Z,
    PieceKind::J,
    PieceKind::L,
];

/// Kick offsets tried in order when rotating. (0,0) first means an
/// unobstructed rotation never displaces the piece.
pub const KICKS: [(i32, i32); 6] = [(0, 0), (-1, 0), (1, 0), (0, -1), (-2, 0), (2, 0)];

type Blocks = [(i32, i32); 4];

const I_ROTS: [Blocks; 2] = [
    [(0, 1), (1, 1), (2, 1), (3, 1)],
    [(2, 0), (2, 1), (2, 2), (2, 3)],
];
const O_ROTS: [Blocks; 1] = [[(1, 1), (2, 1), (1, 2), (2, 2)]];
const T_ROTS: [Blocks; 4] = [
    [(1, 1), (0, 2), (1, 2), (2, 2)],
    [(1, 1), (1, 2), (2, 2), (1, 3)],
    [(0, 2), (1, 2), (2, 2), (1, 3)],
    [(1, 1), (0, 2), (1, 2), (1, 3)],
];
const S_ROTS: [Blocks; 2] = [
    [(1, 1), (2, 1), (0, 2), (1, 2)],
    [(1, 1), (1, 2), (2, 2), (2, 3)],
];
const Z_ROTS: [Blocks; 2] = [
    [(0, 1), (1, 1), (1, 2), (2, 2)],
    [(2, 1), (1, 2), (2, 2), (1, 3)],
];
const J_ROTS: [Blocks; 4] = [
    [(0, 1), (0, 2), (1, 2), (2, 2)],
    [(1, 1), (2, 1), (1, 2), (1, 3)],
    [(0, 2), (1, 2), (2, 2), (2, 3)],
    [(1, 1), (1, 2), (0, 3), (1, 3)],
];
const L_ROTS: [Blocks; 4] = [
    [(2, 1), (0, 2), (1, 2), (2, 2)],
    [(1, 1), (1, 2), (1, 3), (2, 3)],
    [(0, 2), (1, 2), (2, 2), (0, 3)],
    [(0, 1), (1, 1), (1, 2), (1, 3)],
];

impl PieceKind {
    fn rotations(self) -> &'static [Blocks] {
        match self {
            PieceKind::I => &I_ROTS,
            PieceKind::O => &O_ROTS,
            PieceKind::T => &T_ROTS,
            PieceKind::S => &S_ROTS,
            PieceKind::Z => &Z_ROTS,
            PieceKind::J => &J_ROTS,
            PieceKind::L => &L_ROTS,
        }
    }

    /// Block offsets for a rotation index (wraps over the state count).
    pub fn blocks(self, rot: usize) -> Blocks {
        let rots = self.rotations();
        rots[rot % rots.len()]
    }
}

/// 7-bag randomizer: every run of 7 pieces contains each kind exactly once.
pub struct SevenBag {
    queue: Vec<PieceKind>,
}

impl SevenBag {
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut bag = SevenBag { queue: Vec::with_capacity(7) };
        bag.refill(rng);
        bag
    }

    pub fn next(&mut self, rng: &mut impl Rng) -> PieceKind {
        if self.queue.is_empty() {
            self.refill(rng);
        }
        // refill always leaves 7 entries
        self.queue.pop().unwrap_or(PieceKind::I)
    }

    fn refill(&mut self, rng: &mut impl Rng) {
        self.queue.extend_from_slice(&ALL_KINDS);
        self.queue.shuffle(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_rotation_has_four_blocks_in_box() {
        for kind in ALL_KINDS {
            for rot in 0..4 {
                let blocks = kind.blocks(rot);
                assert_eq!(blocks.len(), 4);
                for (bx, by) in blocks {
                    assert!((0..4).contains(&bx) && (0..4).contains(&by));
                }
            }
        }
    }

    #[test]
    fn rotation_index_wraps() {
        assert_eq!(PieceKind::O.blocks(0), PieceKind::O.blocks(3));
        assert_eq!(PieceKind::I.blocks(0), PieceKind::I.blocks(2));
        assert_eq!(PieceKind::T.blocks(1), PieceKind::T.blocks(5));
    }

    #[test]
    fn bag_yields_each_kind_once_per_seven() {
        let mut rng = rand::rng();
        let mut bag = SevenBag::new(&mut rng);
        for _ in 0..10 {
            let mut seen = vec![];
            for _ in 0..7 {
                seen.push(bag.next(&mut rng));
            }
            for kind in ALL_KINDS {
                assert_eq!(seen.iter().filter(|&&k| k == kind).count(), 1);
            }
        }
    }

    #[test]
    fn fourteen_draw_window_has_each_kind_at_most_twice() {
        let mut rng = rand::rng();
        let mut bag = SevenBag::new(&mut rng);
        let draws: Vec<_> = (0..140).map(|_| bag.next(&mut rng)).collect();
        for win in draws.windows(14) {
            for kind in ALL_KINDS {
                let n = win.iter().filter(|&&k| k == kind).count();
                assert!((1..=3).contains(&n), "{kind:?} appeared {n} times in a 14-window");
            }
        }
    }

    #[test]
    fn kicks_start_with_identity() {
        assert_eq!(KICKS[0], (0, 0));
    }
}
