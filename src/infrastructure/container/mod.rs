//! 依赖注入容器
//!
//! 提供按名字注册和解析服务的功能，支持：
//! - 预构造值、工厂和构造函数三种注册方式
//! - 单例缓存
//! - 通过模块加载器延迟加载的模块
//! - 分层命令注册与匹配
//! - 公开 API 视图
//! - 循环依赖检测
//! - 统一释放

pub mod dispose;
pub mod instance;
pub mod public_api;
pub mod registry;
pub mod resolver;

pub use instance::{Disposable, Instance};
pub use public_api::PublicApi;
pub use registry::{Constructor, Descriptor, Factory};
pub use resolver::{Dependencies, ExtraArgs, Resolvable};

use super::command_tree::{CommandTree, HierarchicalCommand, DEV_COMMAND_PREFIX};
use super::module::{ModuleLoader, StaticModuleLoader};
use crate::config::InjectorConfig;
use crate::errors::InjectorError;
use parking_lot::{Mutex, RwLock};
use public_api::PublicEntry;
use registry::Registry;
use resolver::ResolutionStack;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Weak};

/// 容器以此名字把自身注册为服务
pub const INJECTOR_SERVICE: &str = "injector";

/// 命令的实现来源
#[derive(Debug, Clone)]
pub enum CommandSource {
    Constructor(Constructor),
    Module(String),
}

impl From<Constructor> for CommandSource {
    fn from(ctor: Constructor) -> Self {
        CommandSource::Constructor(ctor)
    }
}

impl From<&str> for CommandSource {
    fn from(path: &str) -> Self {
        CommandSource::Module(path.to_string())
    }
}

struct InjectorInner {
    config: InjectorConfig,
    loader: Arc<dyn ModuleLoader>,
    services: RwLock<Registry>,
    commands: RwLock<Registry>,
    command_tree: RwLock<CommandTree>,
    public_api: RwLock<BTreeMap<String, PublicEntry>>,
    /// 所有曾写入单例缓存的实例，按产生顺序
    produced: Mutex<Vec<Instance>>,
    disposed: Mutex<HashSet<usize>>,
    /// 正在解析的名字，重入解析也能检测到循环
    resolving: ResolutionStack,
}

/// 依赖注入容器
///
/// 克隆得到的容器与原容器共享同一份注册表和缓存。
#[derive(Clone)]
pub struct Injector {
    inner: Arc<InjectorInner>,
}

impl Injector {
    /// 创建使用空模块加载器的容器
    pub fn new() -> Self {
        Self::with_loader(Arc::new(StaticModuleLoader::new()))
    }

    pub fn with_loader(loader: Arc<dyn ModuleLoader>) -> Self {
        Self::with_config(InjectorConfig::default(), loader)
    }

    pub fn with_config(config: InjectorConfig, loader: Arc<dyn ModuleLoader>) -> Self {
        let injector = Self {
            inner: Arc::new(InjectorInner {
                config,
                loader,
                services: RwLock::new(Registry::default()),
                commands: RwLock::new(Registry::default()),
                command_tree: RwLock::new(CommandTree::default()),
                public_api: RwLock::new(BTreeMap::new()),
                produced: Mutex::new(Vec::new()),
                disposed: Mutex::new(HashSet::new()),
                resolving: ResolutionStack::default(),
            }),
        };
        injector.register_value(INJECTOR_SERVICE, injector.handle());
        injector
    }

    /// 不持有所有权的容器句柄
    pub fn handle(&self) -> InjectorHandle {
        InjectorHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> &InjectorConfig {
        &self.inner.config
    }

    // ===== 服务注册 =====

    /// 注册服务；同名注册以最后一次为准，并清除已缓存的实例
    pub fn register(&self, name: &str, descriptor: impl Into<Descriptor>) {
        let descriptor = descriptor.into();
        tracing::debug!(service = name, kind = descriptor.kind(), "registering service");
        if self.inner.services.write().insert(name, descriptor).is_some() {
            tracing::warn!(service = name, "re-registration evicted a cached instance");
        }
    }

    /// 注册预构造的值
    pub fn register_value<T: std::any::Any + Send + Sync>(&self, name: &str, value: T) {
        self.register(name, Descriptor::value(value));
    }

    /// 注册工厂
    pub fn register_factory<F>(&self, name: &str, factory: F)
    where
        F: Fn() -> Result<Instance, InjectorError> + Send + Sync + 'static,
    {
        self.register(name, Descriptor::factory(factory));
    }

    /// 登记一个延迟加载的模块；同名模块不能 require 两次
    pub fn require(&self, name: &str, module_path: &str) -> Result<(), InjectorError> {
        let evicted = self.inner.services.write().require(
            name,
            module_path,
            self.inner.config.allow_require_override,
        )?;
        if evicted.is_some() {
            tracing::warn!(service = name, "require override evicted a cached instance");
        }
        tracing::debug!(service = name, module = module_path, "required module");
        Ok(())
    }

    /// require 并把解析结果公开到公开 API
    pub fn require_public(&self, name: &str, module_path: &str) -> Result<(), InjectorError> {
        self.require(name, module_path)?;
        self.inner
            .public_api
            .write()
            .insert(name.to_string(), PublicEntry::Service);
        Ok(())
    }

    /// require 并把模块导出本身原样公开，每次访问都读取注册表的当前状态
    pub fn require_public_class(&self, name: &str, module_path: &str) -> Result<(), InjectorError> {
        self.require(name, module_path)?;
        self.inner
            .public_api
            .write()
            .insert(name.to_string(), PublicEntry::Class);
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.services.read().contains(name)
    }

    pub fn registered_names(&self) -> Vec<String> {
        self.inner.services.read().names()
    }

    // ===== 命令注册 =====

    /// 注册命令，名字可以用 `|` 分层，以 `*` 开头的段为默认子命令
    pub fn register_command(
        &self,
        name: &str,
        source: impl Into<CommandSource>,
    ) -> Result<(), InjectorError> {
        let source = source.into();
        self.inner.command_tree.write().insert(name)?;

        let mut commands = self.inner.commands.write();
        match source {
            CommandSource::Constructor(ctor) => {
                commands.insert(name, Descriptor::Constructor(ctor));
            }
            CommandSource::Module(path) => {
                commands.require(name, &path, self.inner.config.allow_require_override)?;
            }
        }
        tracing::debug!(command = name, "registered command");
        Ok(())
    }

    /// 以模块路径注册命令
    pub fn require_command(&self, name: &str, module_path: &str) -> Result<(), InjectorError> {
        self.register_command(name, CommandSource::Module(module_path.to_string()))
    }

    /// 同一实现注册在多个命令名下，解析得到同一个实例
    pub fn register_command_aliases(
        &self,
        names: &[&str],
        source: impl Into<CommandSource>,
    ) -> Result<(), InjectorError> {
        let Some((primary, aliases)) = names.split_first() else {
            return Err(InjectorError::InvalidCommandName(String::new()));
        };
        // 别名指向自身会无限解析
        if let Some(alias) = aliases.iter().find(|alias| alias.eq_ignore_ascii_case(primary)) {
            return Err(InjectorError::InvalidCommandName(alias.to_string()));
        }
        self.register_command(primary, source)?;

        let target = primary.to_string();
        let handle = self.handle();
        let shared = Constructor::parameterless(format!("alias of {target}"), move || {
            handle
                .upgrade()
                .ok_or_else(|| InjectorError::creation(&target, "injector has been dropped"))?
                .resolve_command(&target)?
                .ok_or_else(|| InjectorError::UnresolvedName(target.clone()))
        });
        for alias in aliases {
            self.register_command(alias, shared.clone())?;
        }
        Ok(())
    }

    /// 解析命令；未注册时返回 `None`，依赖缺失时报错
    pub fn resolve_command(&self, name: &str) -> Result<Option<Instance>, InjectorError> {
        {
            let commands = self.inner.commands.read();
            if let Some(instance) = commands.cached(name) {
                return Ok(Some(instance));
            }
            if !commands.contains(name) {
                return Ok(None);
            }
        }
        self.resolve_command_instance(name).map(Some)
    }

    pub fn is_command_registered(&self, name: &str) -> bool {
        self.inner.commands.read().contains(name)
    }

    /// 已注册的命令名，`dev-` 开头的命令仅在 `include_dev` 时列出
    pub fn registered_command_names(&self, include_dev: bool) -> Vec<String> {
        self.inner
            .commands
            .read()
            .names()
            .into_iter()
            .filter(|name| include_dev || !name.starts_with(DEV_COMMAND_PREFIX))
            .collect()
    }

    /// 在 `root` 下为参数找到最具体的分层命令
    pub fn build_hierarchical_command<S: AsRef<str>>(
        &self,
        root: &str,
        tokens: &[S],
    ) -> Option<HierarchicalCommand> {
        self.inner
            .command_tree
            .read()
            .build_hierarchical_command(root, tokens)
    }

    pub fn is_hierarchical_command(&self, root: &str) -> bool {
        self.inner.command_tree.read().is_hierarchical(root)
    }

    pub fn child_command_names(&self, root: &str) -> Vec<String> {
        self.inner.command_tree.read().child_command_names(root)
    }

    pub fn default_command(&self, root: &str) -> Option<String> {
        self.inner.command_tree.read().default_command(root)
    }

    pub fn public_api(&self) -> PublicApi<'_> {
        PublicApi::new(self)
    }

    fn track(&self, instance: &Instance) {
        self.inner.produced.lock().push(instance.clone());
    }
}

/// 容器的弱引用
///
/// 注册表中保存的是它而不是容器本身，命令和服务可以通过它回到容器。
#[derive(Clone)]
pub struct InjectorHandle {
    inner: Weak<InjectorInner>,
}

impl InjectorHandle {
    pub fn upgrade(&self) -> Option<Injector> {
        self.inner.upgrade().map(|inner| Injector { inner })
    }
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}
