//! Configuration：执行端、全局钩子与元数据注册表的组合，传给 `Example::of`。

use crate::executor::NamedParameterExecutor;
use crate::hooks::HookRegistry;
use crate::metadata::MetadataRegistry;
use std::fmt;
use std::sync::Arc;

/// 查询上下文；内部全部是 `Arc`，克隆开销很小。
#[derive(Clone)]
pub struct Configuration {
    executor: Arc<dyn NamedParameterExecutor>,
    hooks: Arc<HookRegistry>,
    registry: Arc<MetadataRegistry>,
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("hooks", &self.hooks)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Configuration {
    /// 使用默认钩子注册表和进程级元数据注册表。
    pub fn new(executor: impl NamedParameterExecutor + 'static) -> Self {
        Self::builder(executor).build()
    }

    pub fn builder(executor: impl NamedParameterExecutor + 'static) -> ConfigurationBuilder {
        ConfigurationBuilder {
            executor: Arc::new(executor),
            hooks: None,
            registry: None,
        }
    }

    pub fn executor(&self) -> &Arc<dyn NamedParameterExecutor> {
        &self.executor
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn registry(&self) -> &Arc<MetadataRegistry> {
        &self.registry
    }
}

pub struct ConfigurationBuilder {
    executor: Arc<dyn NamedParameterExecutor>,
    hooks: Option<Arc<HookRegistry>>,
    registry: Option<Arc<MetadataRegistry>>,
}

impl ConfigurationBuilder {
    /// 多个配置共享同一个钩子注册表。
    pub fn hooks(mut self, hooks: Arc<HookRegistry>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// 使用独立的元数据注册表（测试或自定义命名转换）。
    pub fn registry(mut self, registry: Arc<MetadataRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Configuration {
        Configuration {
            executor: self.executor,
            hooks: self.hooks.unwrap_or_default(),
            registry: self.registry.unwrap_or_else(MetadataRegistry::global),
        }
    }
}
