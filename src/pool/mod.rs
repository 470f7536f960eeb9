pub mod parimutuel;

pub use parimutuel::{ParimutuelPool, PoolError, PoolResult};
