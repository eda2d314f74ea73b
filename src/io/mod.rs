//! Data access: subject lists, npz archives, region masks and surface maps.

pub mod npz;
pub mod regions;
pub mod subjects;
pub mod surface;
