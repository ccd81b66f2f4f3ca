pub mod acoustics;
pub mod engine;
pub mod rays;
