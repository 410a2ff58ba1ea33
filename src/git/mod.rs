pub mod backend;
pub mod repository;

pub use repository::{find_repository, find_repository_in_path};

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
