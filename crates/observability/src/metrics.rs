//! 分发管道指标
//!
//! 通过 `metrics` facade 记录；未安装 recorder 时为 no-op。

use metrics::{counter, histogram};

/// 记录定位到的分区
pub fn record_partition_located(collection: &str) {
    counter!(
        "batch_dispatch_partitions_located_total",
        "collection" => collection.to_string()
    )
    .increment(1);
}

/// 记录枚举出的 part file 数量
pub fn record_part_files(count: usize) {
    counter!("batch_dispatch_part_files_total").increment(count as u64);
}

/// 记录一次成功发布
pub fn record_message_published(queue: &str) {
    counter!(
        "batch_dispatch_messages_published_total",
        "queue" => queue.to_string()
    )
    .increment(1);
}

/// 批量记录成功发布
pub fn record_messages_published(queue: &str, count: usize) {
    counter!(
        "batch_dispatch_messages_published_total",
        "queue" => queue.to_string()
    )
    .increment(count as u64);
}

/// 记录一次发布失败
pub fn record_publish_failure(queue: &str) {
    counter!(
        "batch_dispatch_publish_failures_total",
        "queue" => queue.to_string()
    )
    .increment(1);
}

/// 记录整次运行耗时
pub fn record_run_duration_ms(duration_ms: f64) {
    histogram!("batch_dispatch_run_duration_ms").record(duration_ms);
}
