pub mod context;
#[cfg(test)]
pub(crate) mod testing;
pub mod utils;
