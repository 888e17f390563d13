pub mod analysis;
pub mod deal;
