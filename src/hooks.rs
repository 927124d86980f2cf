//! 查询钩子：全局注册表与钩子类型。
//!
//! 注册表只追加不删除，通常在进程启动时注册一次；读取时复制一份快照再调用，
//! 钩子内部再注册新钩子不会死锁。

use crate::criteria::Clauses;
use crate::entity::EntityInfo;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, RwLock};

/// 全局 before 钩子：执行前拿到类型无关的片段存储与结果类型描述。
pub type BeforeQueryHook = Arc<dyn Fn(&mut Clauses, &EntityInfo) + Send + Sync>;

/// after 钩子：拿到结果集（实际类型为 `Vec<T>`）与结果类型描述。
pub type AfterQueryHook = Arc<dyn Fn(&mut dyn Any, &EntityInfo) + Send + Sync>;

/// 把针对 `Vec<T>` 的回调包装成类型擦除的 after 钩子；结果类型不匹配时不调用。
pub fn typed_after_hook<T, H>(hook: H) -> AfterQueryHook
where
    T: 'static,
    H: Fn(&mut Vec<T>, &EntityInfo) + Send + Sync + 'static,
{
    Arc::new(move |rows: &mut dyn Any, info: &EntityInfo| {
        if let Some(rows) = rows.downcast_mut::<Vec<T>>() {
            hook(rows, info);
        }
    })
}

#[derive(Default)]
pub struct HookRegistry {
    before: RwLock<Vec<BeforeQueryHook>>,
    after: RwLock<Vec<AfterQueryHook>>,
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("before", &self.before_query_hooks().len())
            .field("after", &self.after_query_hooks().len())
            .finish()
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_before_query<H>(&self, hook: H) -> &Self
    where
        H: Fn(&mut Clauses, &EntityInfo) + Send + Sync + 'static,
    {
        self.before
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::new(hook));
        self
    }

    pub fn add_after_query<H>(&self, hook: H) -> &Self
    where
        H: Fn(&mut dyn Any, &EntityInfo) + Send + Sync + 'static,
    {
        self.after
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::new(hook));
        self
    }

    /// 只对结果类型为 `T` 的查询生效的 after 钩子。
    pub fn add_after_query_for<T, H>(&self, hook: H) -> &Self
    where
        T: 'static,
        H: Fn(&mut Vec<T>, &EntityInfo) + Send + Sync + 'static,
    {
        self.after
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(typed_after_hook(hook));
        self
    }

    /// 按注册顺序返回 before 钩子快照。
    pub fn before_query_hooks(&self) -> Vec<BeforeQueryHook> {
        self.before
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn after_query_hooks(&self) -> Vec<AfterQueryHook> {
        self.after
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
