pub mod completion;
pub mod event;
pub mod level;
pub mod overlay;
pub mod step;
pub mod tracker;
pub mod world;
pub mod zones;
