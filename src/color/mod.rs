pub mod index;
pub mod kdtree;
pub mod matcher;
pub mod oklab;
pub mod source;
