//! 依赖解析
//!
//! 按构造函数声明的依赖名从注册表中逐个解析，缺失的依赖在普通服务解析中
//! 以空参数注入，在命令解析中直接报错。

use super::instance::Instance;
use super::registry::{Constructor, Descriptor, Registry};
use super::Injector;
use crate::errors::InjectorError;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::ThreadId;

/// 解析目标：注册名或者裸构造函数
#[derive(Debug, Clone, Copy)]
pub enum Resolvable<'a> {
    Name(&'a str),
    Constructor(&'a Constructor),
}

impl<'a> From<&'a str> for Resolvable<'a> {
    fn from(name: &'a str) -> Self {
        Resolvable::Name(name)
    }
}

impl<'a> From<&'a String> for Resolvable<'a> {
    fn from(name: &'a String) -> Self {
        Resolvable::Name(name.as_str())
    }
}

impl<'a> From<&'a Constructor> for Resolvable<'a> {
    fn from(ctor: &'a Constructor) -> Self {
        Resolvable::Constructor(ctor)
    }
}

/// 额外参数，注入时优先于注册表
#[derive(Debug, Clone, Default)]
pub struct ExtraArgs {
    values: HashMap<String, Instance>,
}

impl ExtraArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, instance: Instance) -> Self {
        self.values.insert(name.into(), instance);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug)]
struct Dependency {
    declared: String,
    name: String,
    value: Option<Instance>,
}

/// 注入给构造函数的参数列表，按声明顺序排列
#[derive(Debug, Default)]
pub struct Dependencies {
    entries: Vec<Dependency>,
}

impl Dependencies {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按位置取参数
    pub fn at(&self, index: usize) -> Option<&Instance> {
        self.entries.get(index).and_then(|d| d.value.as_ref())
    }

    /// 按名字取参数，带不带前缀均可
    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.entries
            .iter()
            .find(|d| d.name == name || d.declared == name)
            .and_then(|d| d.value.as_ref())
    }

    pub fn get<T: std::any::Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.instance(name).and_then(Instance::downcast::<T>)
    }

    /// 取必需的参数，缺失或类型不符时报错
    pub fn require<T: std::any::Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, InjectorError> {
        let instance = self
            .instance(name)
            .ok_or_else(|| InjectorError::UnresolvedName(name.to_string()))?;
        instance.downcast::<T>().ok_or(InjectorError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Instance>)> {
        self.entries
            .iter()
            .map(|d| (d.declared.as_str(), d.value.as_ref()))
    }
}

/// 缺失依赖的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Injection {
    /// 缺失的依赖注入为空
    Lenient,
    /// 缺失的依赖导致解析失败
    Strict,
}

/// 循环依赖检测栈，按线程记录正在解析的名字
///
/// 保存在容器上，构造函数通过容器句柄重入解析时与外层解析共用同一个栈。
#[derive(Debug, Default)]
pub(crate) struct ResolutionStack {
    threads: Mutex<HashMap<ThreadId, Vec<String>>>,
}

impl ResolutionStack {
    fn enter(&self, label: String) -> Result<ResolutionGuard<'_>, InjectorError> {
        let thread = std::thread::current().id();
        let mut threads = self.threads.lock();
        let names = threads.entry(thread).or_default();
        if names.contains(&label) {
            let mut chain = names.clone();
            chain.push(label);
            return Err(InjectorError::CircularDependency { chain });
        }
        names.push(label);
        Ok(ResolutionGuard {
            stack: self,
            thread,
        })
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        let thread = std::thread::current().id();
        self.threads.lock().get(&thread).map_or(0, Vec::len)
    }
}

/// 离开作用域（包括出错和 panic）时弹出栈顶
#[derive(Debug)]
pub(crate) struct ResolutionGuard<'a> {
    stack: &'a ResolutionStack,
    thread: ThreadId,
}

impl Drop for ResolutionGuard<'_> {
    fn drop(&mut self) {
        let mut threads = self.stack.threads.lock();
        if let Some(names) = threads.get_mut(&self.thread) {
            names.pop();
            if names.is_empty() {
                threads.remove(&self.thread);
            }
        }
    }
}

impl Injector {
    /// 解析注册名（返回单例）或裸构造函数（每次新建）
    pub fn resolve<'a>(&self, target: impl Into<Resolvable<'a>>) -> Result<Instance, InjectorError> {
        self.resolve_with(target, &ExtraArgs::default())
    }

    /// 同 `resolve`，但构造函数的依赖先从 `extra` 中查找
    pub fn resolve_with<'a>(
        &self,
        target: impl Into<Resolvable<'a>>,
        extra: &ExtraArgs,
    ) -> Result<Instance, InjectorError> {
        match target.into() {
            Resolvable::Name(name) => self.resolve_service(name, extra),
            Resolvable::Constructor(ctor) => self.instantiate(ctor, extra, Injection::Lenient),
        }
    }

    /// 构造一个新实例，不缓存
    pub fn construct(&self, ctor: &Constructor) -> Result<Instance, InjectorError> {
        self.resolve(ctor)
    }

    pub(crate) fn resolve_service(
        &self,
        name: &str,
        extra: &ExtraArgs,
    ) -> Result<Instance, InjectorError> {
        if let Some(instance) = self.inner.services.read().cached(name) {
            tracing::trace!(service = name, "singleton cache hit");
            return Ok(instance);
        }

        let _guard = self.inner.resolving.enter(name.to_string())?;
        self.materialize(&self.inner.services, name, extra, Injection::Lenient)
    }

    pub(crate) fn resolve_command_instance(&self, name: &str) -> Result<Instance, InjectorError> {
        let _guard = self.inner.resolving.enter(format!("commands.{name}"))?;
        self.materialize(
            &self.inner.commands,
            name,
            &ExtraArgs::default(),
            Injection::Strict,
        )
    }

    /// 按描述生成实例并写入单例缓存
    fn materialize(
        &self,
        registry: &RwLock<Registry>,
        name: &str,
        extra: &ExtraArgs,
        injection: Injection,
    ) -> Result<Instance, InjectorError> {
        let (descriptor, generation) = registry
            .read()
            .lookup(name)
            .ok_or_else(|| InjectorError::UnresolvedName(name.to_string()))?;

        let descriptor = match descriptor {
            Descriptor::Module(path) => {
                let loaded = self.load_module(&path)?;
                registry.write().replace_loaded(name, generation, loaded.clone());
                loaded
            }
            other => other,
        };

        tracing::debug!(service = name, kind = descriptor.kind(), "materializing");
        let instance = match descriptor {
            Descriptor::Value(instance) => instance,
            Descriptor::Factory(factory) => factory()?,
            Descriptor::Constructor(ctor) => self.instantiate(&ctor, extra, injection)?,
            Descriptor::Module(path) => {
                return Err(InjectorError::ModuleLoad {
                    path,
                    reason: "module export is itself an unloaded module reference".to_string(),
                })
            }
        };

        let filled = registry.write().fill(name, generation, instance);
        if filled.cached {
            self.track(&filled.instance);
        }
        Ok(filled.instance)
    }

    /// 解析构造函数的依赖并调用它
    pub(crate) fn instantiate(
        &self,
        ctor: &Constructor,
        extra: &ExtraArgs,
        injection: Injection,
    ) -> Result<Instance, InjectorError> {
        let nested = ExtraArgs::default();
        let mut entries = Vec::with_capacity(ctor.dependencies().len());

        for declared in ctor.dependencies() {
            let name = self.strip_sigil(declared);
            let value = match extra.get(name) {
                Some(instance) => Some(instance.clone()),
                None => match self.resolve_service(name, &nested) {
                    Ok(instance) => Some(instance),
                    Err(InjectorError::UnresolvedName(missing))
                        if missing == name && injection == Injection::Lenient =>
                    {
                        tracing::debug!(
                            constructor = ctor.name(),
                            dependency = name,
                            "dependency not registered, injecting nothing"
                        );
                        None
                    }
                    Err(err) => return Err(err),
                },
            };
            entries.push(Dependency {
                declared: declared.clone(),
                name: name.to_string(),
                value,
            });
        }

        ctor.build(&Dependencies { entries })
    }

    fn strip_sigil<'n>(&self, declared: &'n str) -> &'n str {
        declared
            .strip_prefix(self.inner.config.dependency_sigil)
            .unwrap_or(declared)
    }

    fn load_module(&self, path: &str) -> Result<Descriptor, InjectorError> {
        tracing::debug!(module = path, "loading module");
        self.inner.loader.load(path)
    }
}
