pub mod suggestions;
pub mod video;
