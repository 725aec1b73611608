//! 存储模块
//!
//! 提供共享的 SQLite 连接池与表结构初始化

pub mod db;

pub use db::{COLLECTION_CONTENT_TABLES, Database, SINGLETON_CONTENT_TABLES, is_unique_violation};
