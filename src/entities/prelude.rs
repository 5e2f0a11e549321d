#![allow(unused_imports)]

pub use super::nominee::Entity as Nominee;
pub use super::vote::Entity as Vote;
