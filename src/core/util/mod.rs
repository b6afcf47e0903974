pub mod string_utils;
pub mod thread_pool;
