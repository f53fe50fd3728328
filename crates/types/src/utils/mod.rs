pub mod display;
pub mod escape;
