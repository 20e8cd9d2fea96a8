pub mod http_test_utils;
pub mod mock_row_store;
pub mod test_logging;
