pub mod board;
pub mod clock;
pub mod effect;
pub mod grid;
pub mod input;
pub mod maze;
pub mod pathing;
pub mod piece;
