pub mod event;
pub mod generator;
pub mod step;
pub mod world;
