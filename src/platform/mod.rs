pub mod paper;

pub use paper::PaperPlatform;
