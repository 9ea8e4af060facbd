pub mod demo;
pub mod index;
pub mod neighbors;
pub mod search;
