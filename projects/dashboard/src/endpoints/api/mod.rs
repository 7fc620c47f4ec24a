pub mod cached;
pub mod evoznode;
