pub mod frame_list;
pub mod labels;
pub mod render;
pub mod suggestions;
pub mod video;
