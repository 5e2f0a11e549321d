pub mod prelude;

pub mod nominee;
pub mod vote;
