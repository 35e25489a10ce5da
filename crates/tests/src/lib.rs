//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 内存 e2e 测试（无需 HDFS / RabbitMQ）
//! - 本地目录 e2e 测试

#[cfg(test)]
mod contract_tests {
    use contracts::{AuditRecord, DispatchBlueprint, PartFile, WorkItem};

    #[test]
    fn test_wire_format_snapshot() {
        let ts = chrono::DateTime::from_timestamp(1_580_000_000, 123_456_000).unwrap();
        let file = PartFile::new("/out/foo/2020-02-15/part-00000");

        let audit = AuditRecord::at("nsfw", ts, &file).encode();
        assert_eq!(
            &audit[..],
            b"nsfw,1580000000.123456,/out/foo/2020-02-15/part-00000"
        );
        assert_eq!(&WorkItem::new(file).encode()[..], b"/out/foo/2020-02-15/part-00000");
    }

    #[test]
    fn test_reference_defaults_snapshot() {
        let bp = DispatchBlueprint::default();
        assert_eq!(bp.storage.output_root_template, "/image-search-indexing/output/{}");
        assert_eq!(bp.queues.work, "nsfw");
        assert_eq!(bp.queues.log, "log");
        assert_eq!(bp.broker.endpoint(), "localhost:5672");
        assert_eq!(bp.broker.vhost, "/");
    }
}

#[cfg(test)]
mod e2e_tests {
    use chrono::Utc;
    use contracts::{AuditRecord, BrokerConnector, CollectionId, DispatchBlueprint, ListingKind, MessageBroker};
    use discovery::{InMemoryListing, ListingBackend, PartFileEnumerator, PartitionLocator};
    use dispatcher::{Dispatcher, DispatcherConfig, InMemoryBroker};

    fn blueprint() -> DispatchBlueprint {
        let mut bp = DispatchBlueprint::default();
        bp.storage.output_root_template = "/out/{}".into();
        bp
    }

    /// End-to-end test: InMemoryListing -> Locator -> Enumerator -> Dispatcher
    ///
    /// 验证完整的数据流：
    /// 1. 定位 "foo" 的最新分区
    /// 2. 枚举其中的 part files
    /// 3. 每个 part file 产生一条 work 消息与一条 audit 消息
    #[tokio::test]
    async fn test_e2e_memory_pipeline() {
        let bp = blueprint();
        let listing = InMemoryListing::new()
            .with_entries("/out/foo", ["2019-12-31", "2020-01-01", "2020-02-15"])
            .with_entries(
                "/out/foo/2020-02-15",
                ["part-00000", "_SUCCESS", "part-00001", ".crc"],
            );
        let broker = InMemoryBroker::new();
        let collection = CollectionId::new("foo").unwrap();

        let start = Utc::now().timestamp_micros();

        let partition = PartitionLocator::new(listing.clone(), &bp.storage)
            .locate(&collection)
            .await
            .unwrap();
        assert_eq!(partition.name, "2020-02-15");

        let part_files = PartFileEnumerator::new(listing.clone(), &bp.storage)
            .enumerate(&partition)
            .await
            .unwrap();
        assert_eq!(part_files, vec!["part-00000", "part-00001"]);

        let dispatcher = Dispatcher::new(broker.clone(), DispatcherConfig::from_blueprint(&bp));
        let report = dispatcher.dispatch(&part_files).await.unwrap();

        let end = Utc::now().timestamp_micros();

        assert!(report.is_clean());
        assert_eq!(report.work_published, 2);

        let work = broker.messages_utf8("nsfw");
        let audits: Vec<AuditRecord> = broker
            .messages("log")
            .iter()
            .map(|m| AuditRecord::decode(m).unwrap())
            .collect();

        assert_eq!(work, vec!["part-00000", "part-00001"]);
        assert_eq!(audits.len(), work.len());
        for (audit, payload) in audits.iter().zip(&work) {
            assert_eq!(&audit.payload, payload);
            assert_eq!(audit.source, "nsfw");
            let ts = audit.timestamp.timestamp_micros();
            assert!(start <= ts && ts <= end);
        }

        // 每个路径只列举一次
        assert_eq!(listing.calls("/out/foo"), 1);
        assert_eq!(listing.calls("/out/foo/2020-02-15"), 1);
        assert_eq!(broker.connect_attempts(), 1);
        assert_eq!(broker.close_count(), 1);
    }

    #[tokio::test]
    async fn test_e2e_repeated_runs_redeclare_queues() {
        let bp = blueprint();
        let broker = InMemoryBroker::new();
        let dispatcher = Dispatcher::new(broker.clone(), DispatcherConfig::from_blueprint(&bp));
        let files = vec![contracts::PartFile::new("part-00000")];

        dispatcher.dispatch(&files).await.unwrap();
        dispatcher.dispatch(&files).await.unwrap();

        assert_eq!(broker.declare_count(), 4);
        assert_eq!(broker.messages("nsfw").len(), 2);
        assert_eq!(broker.messages("log").len(), 2);
    }

    #[tokio::test]
    async fn test_e2e_preexisting_matching_queue() {
        let broker = InMemoryBroker::new();
        {
            let mut channel = broker.connect().await.unwrap();
            channel
                .declare_queue(&contracts::QueueSpec::new("nsfw", true))
                .await
                .unwrap();
            channel.close().await.unwrap();
        }

        let dispatcher = Dispatcher::new(broker.clone(), DispatcherConfig::default());
        let report = dispatcher
            .dispatch(&[contracts::PartFile::new("part-00000")])
            .await
            .unwrap();
        assert!(report.is_clean());
    }

    /// Local directory backend: 真实文件系统，完整路径作为 payload
    #[tokio::test]
    async fn test_e2e_local_directory() {
        let root = tempfile::tempdir().unwrap();
        let collection_dir = root.path().join("foo");
        for partition in ["2019-12-31", "2020-02-15"] {
            std::fs::create_dir_all(collection_dir.join(partition)).unwrap();
        }
        let latest = collection_dir.join("2020-02-15");
        for file in ["part-00001", "part-00000", "_SUCCESS", ".part-00000.crc"] {
            std::fs::write(latest.join(file), b"").unwrap();
        }

        let mut bp = DispatchBlueprint::default();
        bp.storage.listing = ListingKind::Local;
        bp.storage.output_root_template = format!("{}/{{}}", root.path().display());
        let listing = ListingBackend::from_config(&bp.storage).unwrap();
        let collection = CollectionId::new("foo").unwrap();

        let partition = PartitionLocator::new(listing.clone(), &bp.storage)
            .locate(&collection)
            .await
            .unwrap();
        assert_eq!(partition.path, latest.display().to_string());

        let part_files = PartFileEnumerator::new(listing, &bp.storage)
            .enumerate(&partition)
            .await
            .unwrap();

        let expected: Vec<String> = ["part-00000", "part-00001"]
            .iter()
            .map(|f| latest.join(f).display().to_string())
            .collect();
        let actual: Vec<String> = part_files.iter().map(|f| f.as_str().to_string()).collect();
        assert_eq!(actual, expected);

        let broker = InMemoryBroker::new();
        Dispatcher::new(broker.clone(), DispatcherConfig::from_blueprint(&bp))
            .dispatch(&part_files)
            .await
            .unwrap();
        assert_eq!(broker.messages_utf8("nsfw"), expected);
    }

    #[tokio::test]
    async fn test_e2e_config_file_drives_queues() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dispatch.toml");
        std::fs::write(
            &path,
            "[storage]\noutput_root_template = \"/out/{}\"\n\n[queues]\nwork = \"work\"\nlog = \"audit\"\n",
        )
        .unwrap();

        let bp = config_loader::ConfigLoader::load_from_path(&path).unwrap();
        let broker = InMemoryBroker::new();
        Dispatcher::new(broker.clone(), DispatcherConfig::from_blueprint(&bp))
            .dispatch(&[contracts::PartFile::new("part-00000")])
            .await
            .unwrap();

        assert_eq!(broker.messages_utf8("work"), vec!["part-00000"]);
        assert_eq!(broker.messages("audit").len(), 1);
        assert!(!broker.is_declared("nsfw"));
    }
}
