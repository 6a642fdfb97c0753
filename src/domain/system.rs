//! 内容会话上下文
//!
//! 加载信息、应用域、加载上下文，以及把它们串起来的 [`ContentSession`]。
//! 会话对象以引用的方式传给需要它的组件，取代进程级的全局槽位：
//! "当前加载上下文"和"允许运行构造函数"都只属于某一个会话。

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::display::StageRef;
use crate::impl_default_and_new;

use super::execution::DomainRef;

static NEXT_APPLICATION_DOMAIN_ID: AtomicU64 = AtomicU64::new(1);

/// 加载信息：描述产生某个资源的那次内容加载
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderInfo {
    /// 内容来源 URL
    pub url: String,
    /// 内容版本
    pub content_version: u8,
}

/// 应用域：内容定义所在的命名空间，绑定到一个执行域
#[derive(Clone)]
pub struct ApplicationDomain {
    id: u64,
    domain: DomainRef,
}

impl ApplicationDomain {
    pub fn new(domain: DomainRef) -> Self {
        Self {
            id: NEXT_APPLICATION_DOMAIN_ID.fetch_add(1, Ordering::Relaxed),
            domain,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn domain(&self) -> &DomainRef {
        &self.domain
    }
}

impl std::fmt::Debug for ApplicationDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationDomain")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// 加载上下文
#[derive(Debug, Clone)]
pub struct LoaderContext {
    pub check_policy_file: bool,
    pub application_domain: ApplicationDomain,
}

impl LoaderContext {
    pub fn new(check_policy_file: bool, application_domain: ApplicationDomain) -> Self {
        Self {
            check_policy_file,
            application_domain,
        }
    }
}

/// 内容会话
///
/// 每个会话恰好一个。引导成功后才会填入 `domain` 与 `stage`。
#[derive(Debug)]
pub struct ContentSession {
    pub loader_info: Option<Arc<LoaderInfo>>,
    pub application_domain: Option<ApplicationDomain>,
    /// 当前加载上下文（后写者覆盖）
    pub active_loader_context: Option<LoaderContext>,
    /// 流式加载期间通常被抑制的构造函数是否允许运行
    pub constructors_allowed: bool,
    pub domain: Option<DomainRef>,
    pub stage: Option<StageRef>,
}

impl_default_and_new!(ContentSession {
    loader_info: None,
    application_domain: None,
    active_loader_context: None,
    constructors_allowed: false,
    domain: None,
    stage: None,
});

impl ContentSession {
    pub fn shared() -> SessionRef {
        Rc::new(RefCell::new(Self::new()))
    }

    /// 执行域是否已经对宿主可见
    pub fn is_ready(&self) -> bool {
        self.domain.is_some()
    }
}

pub type SessionRef = Rc<RefCell<ContentSession>>;
