//! Environments bundled with the library, for tests and examples.
mod mountain_car;

pub use mountain_car::MountainCar;
