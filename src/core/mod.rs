pub mod aggregate;
pub mod features;
pub mod jaccard;
pub mod mask;
pub mod measure;
pub mod similarity;
pub mod spectral;
