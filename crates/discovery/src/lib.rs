//! # Discovery
//!
//! 分区发现模块。
//!
//! 负责：
//! - 在集合输出根目录下选出最新分区 (`PartitionLocator`)
//! - 列出分区内的数据文件 (`PartFileEnumerator`)
//! - 提供列举后端：外部命令 / 本地目录 / 内存

pub mod enumerator;
pub mod listing;
pub mod locator;

pub use contracts::{ListingClient, PartFile, Partition};
pub use enumerator::{PartFileEnumerator, is_part_file};
pub use listing::{CommandListing, InMemoryListing, ListingBackend, LocalListing};
pub use locator::{PartitionLocator, select_latest};
