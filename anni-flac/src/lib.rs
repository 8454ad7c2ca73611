#[macro_use]
extern crate nom;

mod parser;
mod stream;

pub use parser::*;
pub use stream::Stream;