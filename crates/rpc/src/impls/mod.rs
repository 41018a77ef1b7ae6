mod hive;

pub use hive::HiveApi;
