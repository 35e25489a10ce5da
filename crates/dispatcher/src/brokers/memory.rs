//! 内存 broker
//!
//! 用于单元测试的 fake 实现：模拟队列声明语义、记录已发布消息、
//! 统计连接/关闭次数，并支持注入连接失败与发布失败。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use contracts::{BrokerConnector, ContractError, MessageBroker, QueueSpec};
use tracing::instrument;

#[derive(Debug, Default)]
struct MemoryQueue {
    durable: bool,
    messages: Vec<Bytes>,
}

#[derive(Debug, Default)]
struct BrokerState {
    /// 已声明的队列
    queues: HashMap<String, MemoryQueue>,
    /// 连接尝试次数 (含失败)
    connect_attempts: usize,
    /// 关闭次数
    closes: usize,
    /// 声明次数
    declares: usize,
    /// 连接失败信息
    fail_connect: Option<String>,
    /// 队列 -> 失败匹配子串 (空串 = 全部失败)
    fail_publish: HashMap<String, String>,
    /// 允许成功的发布次数，用尽后连接断开
    drop_connection_after: Option<usize>,
    /// 发布尝试次数 (含失败)
    publish_attempts: usize,
    /// 全局发布顺序 (队列, 消息体)
    publish_log: Vec<(String, Bytes)>,
}

/// 内存 broker (同时充当 connector)
///
/// Clone 共享同一份状态；跨 "多次运行" 复用同一实例即可模拟持久的 broker。
#[derive(Debug, Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl InMemoryBroker {
    /// 创建内存 broker
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有连接尝试失败
    pub fn with_connect_failure(self, message: &str) -> Self {
        self.state().fail_connect = Some(message.to_string());
        self
    }

    /// 向 `queue` 发布且消息体包含 `needle` 时失败 (空串匹配全部)
    pub fn with_publish_failure(self, queue: &str, needle: &str) -> Self {
        self.state()
            .fail_publish
            .insert(queue.to_string(), needle.to_string());
        self
    }

    /// 前 `publishes` 次发布成功，之后连接断开
    pub fn with_connection_loss_after(self, publishes: usize) -> Self {
        self.state().drop_connection_after = Some(publishes);
        self
    }

    /// 跨队列的发布顺序
    pub fn publish_order(&self) -> Vec<(String, String)> {
        self.state()
            .publish_log
            .iter()
            .map(|(queue, body)| (queue.clone(), String::from_utf8_lossy(body).into_owned()))
            .collect()
    }

    pub fn publish_attempts(&self) -> usize {
        self.state().publish_attempts
    }

    /// 获取队列中的消息
    pub fn messages(&self, queue: &str) -> Vec<Bytes> {
        self.state()
            .queues
            .get(queue)
            .map(|q| q.messages.clone())
            .unwrap_or_default()
    }

    /// 获取队列中的消息 (UTF-8)
    pub fn messages_utf8(&self, queue: &str) -> Vec<String> {
        self.messages(queue)
            .iter()
            .map(|m| String::from_utf8_lossy(m).into_owned())
            .collect()
    }

    /// 队列是否已声明
    pub fn is_declared(&self, queue: &str) -> bool {
        self.state().queues.contains_key(queue)
    }

    pub fn connect_attempts(&self) -> usize {
        self.state().connect_attempts
    }

    pub fn close_count(&self) -> usize {
        self.state().closes
    }

    pub fn declare_count(&self) -> usize {
        self.state().declares
    }

    fn state(&self) -> MutexGuard<'_, BrokerState> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<BrokerState>) -> MutexGuard<'_, BrokerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BrokerConnector for InMemoryBroker {
    type Broker = InMemoryChannel;

    fn endpoint(&self) -> String {
        "memory".to_string()
    }

    #[instrument(name = "memory_broker_connect", skip(self))]
    async fn connect(&self) -> Result<InMemoryChannel, ContractError> {
        let mut state = self.state();
        state.connect_attempts += 1;

        if let Some(message) = &state.fail_connect {
            return Err(ContractError::broker_connection(message.clone()));
        }

        Ok(InMemoryChannel {
            state: Arc::clone(&self.state),
            open: true,
        })
    }
}

/// 内存 broker 上的一个通道
#[derive(Debug)]
pub struct InMemoryChannel {
    state: Arc<Mutex<BrokerState>>,
    open: bool,
}

impl InMemoryChannel {
    fn ensure_open(&self) -> Result<(), ContractError> {
        if self.open {
            Ok(())
        } else {
            Err(ContractError::broker_connection("channel closed"))
        }
    }
}

impl MessageBroker for InMemoryChannel {
    fn name(&self) -> &str {
        "memory"
    }

    #[instrument(name = "memory_broker_declare", skip(self, queue), fields(queue = %queue.name))]
    async fn declare_queue(&mut self, queue: &QueueSpec) -> Result<(), ContractError> {
        self.ensure_open()?;
        let mut state = lock(&self.state);
        state.declares += 1;

        let existing = state.queues.get(&queue.name).map(|q| q.durable);
        match existing {
            Some(durable) if durable != queue.durable => {
                // 与 RabbitMQ 相同: 参数不一致时 PRECONDITION_FAILED
                Err(ContractError::broker_connection(format!(
                    "PRECONDITION_FAILED - inequivalent arg 'durable' for queue '{}'",
                    queue.name
                )))
            }
            Some(_) => Ok(()),
            None => {
                state.queues.insert(
                    queue.name.clone(),
                    MemoryQueue {
                        durable: queue.durable,
                        messages: Vec::new(),
                    },
                );
                Ok(())
            }
        }
    }

    #[instrument(name = "memory_broker_publish", skip(self, payload), fields(queue = %queue))]
    async fn publish(&mut self, queue: &str, payload: Bytes) -> Result<(), ContractError> {
        self.ensure_open()?;
        let mut state = lock(&self.state);
        state.publish_attempts += 1;

        if let Some(limit) = state.drop_connection_after {
            if state.publish_attempts > limit {
                return Err(ContractError::broker_connection("connection reset"));
            }
        }

        if let Some(needle) = state.fail_publish.get(queue) {
            let body = String::from_utf8_lossy(&payload);
            if body.contains(needle.as_str()) {
                return Err(ContractError::publish(queue, "injected publish failure"));
            }
        }

        let target = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| ContractError::publish(queue, "queue not declared"))?;
        target.messages.push(payload.clone());
        state.publish_log.push((queue.to_string(), payload));
        Ok(())
    }

    #[instrument(name = "memory_broker_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if self.open {
            self.open = false;
            lock(&self.state).closes += 1;
        }
        Ok(())
    }
}
