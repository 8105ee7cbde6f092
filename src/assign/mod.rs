mod assignment;
mod engine;

pub use assignment::Assignment;
pub use engine::assign;
