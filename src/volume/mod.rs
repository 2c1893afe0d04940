pub mod accountant;
pub mod target;

pub use accountant::{VolumeAccountant, VolumeState};
