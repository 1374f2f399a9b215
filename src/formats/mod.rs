pub mod palette;
pub mod schem;
pub mod snapshot;
pub mod varint;
