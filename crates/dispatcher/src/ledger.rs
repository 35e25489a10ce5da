//! DispatchLedger - 已分发分区记录
//!
//! 可选功能：记录 (collection, partition)，避免重复运行时重复分发。
//! JSON 文件，写入时先写临时文件再 rename。

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use contracts::{CollectionId, ContractError, Partition};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// 单个分区的分发记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// 分发完成时间
    pub dispatched_at: DateTime<Utc>,
    /// 分发的 part file 数量
    pub part_files: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    /// collection -> partition name -> record
    #[serde(default)]
    collections: BTreeMap<String, BTreeMap<String, LedgerRecord>>,
}

/// 已分发分区的持久化集合
#[derive(Debug)]
pub struct DispatchLedger {
    path: PathBuf,
    file: LedgerFile,
}

impl DispatchLedger {
    /// 打开 ledger；文件不存在时视为空
    #[instrument(name = "ledger_open", fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self, ContractError> {
        let file = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| ContractError::ledger(path.display().to_string(), e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Ledger file missing, starting empty");
                LedgerFile::default()
            }
            Err(e) => {
                return Err(ContractError::ledger(
                    path.display().to_string(),
                    e.to_string(),
                ))
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// 查询已有记录
    pub fn get(&self, collection: &CollectionId, partition: &Partition) -> Option<&LedgerRecord> {
        self.file
            .collections
            .get(collection.as_str())
            .and_then(|partitions| partitions.get(&partition.name))
    }

    /// 分区是否已分发
    pub fn contains(&self, collection: &CollectionId, partition: &Partition) -> bool {
        self.get(collection, partition).is_some()
    }

    /// 记录一次成功分发 (内存中，需调用 `save` 持久化)
    pub fn record(&mut self, collection: &CollectionId, partition: &Partition, part_files: usize) {
        self.file
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(
                partition.name.clone(),
                LedgerRecord {
                    dispatched_at: Utc::now(),
                    part_files,
                },
            );
    }

    /// 原子写入
    #[instrument(name = "ledger_save", skip(self), fields(path = %self.path.display()))]
    pub fn save(&self) -> Result<(), ContractError> {
        let to_err = |e: &dyn std::fmt::Display| {
            ContractError::ledger(self.path.display().to_string(), e.to_string())
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| to_err(&e))?;
        }

        let content = serde_json::to_string_pretty(&self.file).map_err(|e| to_err(&e))?;
        let tmp = self.tmp_path();
        fs::write(&tmp, content).map_err(|e| to_err(&e))?;
        fs::rename(&tmp, &self.path).map_err(|e| to_err(&e))?;

        info!("Ledger saved");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
