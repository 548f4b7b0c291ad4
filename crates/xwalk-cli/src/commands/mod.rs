pub mod channels;
pub mod migrate;
