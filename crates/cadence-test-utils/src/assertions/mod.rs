/// Pool and leak assertions
pub mod pool;
