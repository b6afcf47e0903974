pub mod ast;
pub mod charset;
pub mod compile;
pub mod gen;
pub mod optimize;
pub mod reference;
pub mod util;
