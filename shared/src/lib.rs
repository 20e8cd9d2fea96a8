pub mod error;
pub mod models;
pub mod store;


// Test utilities - publicly exposed with the test_utils feature
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
