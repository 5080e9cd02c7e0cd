pub mod exploitability;
pub mod showdown;
pub mod strength;
pub mod value;
