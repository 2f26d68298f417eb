//! A live cell dies if it has fewer than two live neighbors.
//! A live cell with two or three live neighbors lives on to the next generation.
//! A live cell with more than three live neighbors dies.
//! A dead cell will be brought back to live if it has exactly three live neighbors.
//!
//! Cells on the border only see their in-bounds neighbors; the grid does not wrap.

pub mod config;
pub mod grid;
pub mod session;
