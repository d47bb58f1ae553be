pub mod callbacks;
pub mod utils;
