pub mod money;
pub mod tag;
