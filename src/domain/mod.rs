pub mod entity;
pub mod grid;
pub mod random;
pub mod tile;
