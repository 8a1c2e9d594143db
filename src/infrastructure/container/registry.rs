//! 服务注册表
//!
//! 名称到注册描述的映射，每个注册项持有一个可选的单例缓存。

use super::instance::Instance;
use super::resolver::Dependencies;
use crate::errors::InjectorError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 无参工厂函数，首次解析时调用一次
pub type Factory = Arc<dyn Fn() -> Result<Instance, InjectorError> + Send + Sync>;

type BuildFn = dyn Fn(&Dependencies) -> Result<Instance, InjectorError> + Send + Sync;

/// 需要依赖注入的构造函数
///
/// `dependencies` 按声明顺序列出要注入的服务名，每个名字可以带一个 `$` 前缀。
#[derive(Clone)]
pub struct Constructor {
    name: String,
    dependencies: Vec<String>,
    build: Arc<BuildFn>,
}

impl Constructor {
    pub fn new<I, S, F>(name: impl Into<String>, dependencies: I, build: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Dependencies) -> Result<Instance, InjectorError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            build: Arc::new(build),
        }
    }

    /// 无依赖的构造函数
    pub fn parameterless<F>(name: impl Into<String>, build: F) -> Self
    where
        F: Fn() -> Result<Instance, InjectorError> + Send + Sync + 'static,
    {
        Self::new(name, Vec::<String>::new(), move |_| build())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub(crate) fn build(&self, dependencies: &Dependencies) -> Result<Instance, InjectorError> {
        (self.build)(dependencies)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// 注册描述：如何得到某个名字对应的实例
#[derive(Clone)]
pub enum Descriptor {
    /// 预构造的值，原样返回
    Value(Instance),
    /// 工厂函数
    Factory(Factory),
    /// 需要注入依赖的构造函数
    Constructor(Constructor),
    /// 尚未加载的模块，首次解析时通过 ModuleLoader 加载
    Module(String),
}

impl Descriptor {
    pub fn value<T: std::any::Any + Send + Sync>(value: T) -> Self {
        Descriptor::Value(Instance::new(value))
    }

    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Instance, InjectorError> + Send + Sync + 'static,
    {
        Descriptor::Factory(Arc::new(factory))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Descriptor::Value(_) => "value",
            Descriptor::Factory(_) => "factory",
            Descriptor::Constructor(_) => "constructor",
            Descriptor::Module(_) => "module",
        }
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Value(instance) => f.debug_tuple("Value").field(instance).finish(),
            Descriptor::Factory(_) => f.write_str("Factory"),
            Descriptor::Constructor(ctor) => f.debug_tuple("Constructor").field(ctor).finish(),
            Descriptor::Module(path) => f.debug_tuple("Module").field(path).finish(),
        }
    }
}

impl From<Instance> for Descriptor {
    fn from(instance: Instance) -> Self {
        Descriptor::Value(instance)
    }
}

impl From<Constructor> for Descriptor {
    fn from(ctor: Constructor) -> Self {
        Descriptor::Constructor(ctor)
    }
}

/// 注册项
#[derive(Debug, Clone)]
struct Registration {
    descriptor: Descriptor,
    instance: Option<Instance>,
    /// 每次重新注册递增，防止旧描述的产物写入新注册的缓存
    generation: u64,
}

/// 单例缓存写入结果
pub(crate) struct Filled {
    pub instance: Instance,
    /// 本次写入是否真正填充了缓存
    pub cached: bool,
}

/// 名称注册表
#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: HashMap<String, Registration>,
    /// 通过 require 注册的名字及其模块路径
    required: HashMap<String, String>,
    next_generation: u64,
}

impl Registry {
    /// 存储描述，覆盖同名的旧描述并清除其缓存。返回被清除的实例。
    pub fn insert(&mut self, name: &str, descriptor: Descriptor) -> Option<Instance> {
        self.next_generation += 1;
        let registration = Registration {
            descriptor,
            instance: None,
            generation: self.next_generation,
        };
        self.entries
            .insert(name.to_string(), registration)
            .and_then(|previous| previous.instance)
    }

    /// 以模块路径登记；重复 require 时报错，除非允许覆盖
    pub fn require(
        &mut self,
        name: &str,
        module_path: &str,
        allow_override: bool,
    ) -> Result<Option<Instance>, InjectorError> {
        if let Some(existing) = self.required.get(name) {
            if !allow_override {
                return Err(InjectorError::DuplicateRequire {
                    name: name.to_string(),
                    existing: existing.clone(),
                    attempted: module_path.to_string(),
                });
            }
        }
        self.required
            .insert(name.to_string(), module_path.to_string());
        Ok(self.insert(name, Descriptor::Module(module_path.to_string())))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn cached(&self, name: &str) -> Option<Instance> {
        self.entries.get(name).and_then(|r| r.instance.clone())
    }

    /// 当前描述及其代号
    pub fn lookup(&self, name: &str) -> Option<(Descriptor, u64)> {
        self.entries
            .get(name)
            .map(|r| (r.descriptor.clone(), r.generation))
    }

    /// 用加载后的模块导出替换模块占位描述
    pub fn replace_loaded(&mut self, name: &str, generation: u64, loaded: Descriptor) {
        if let Some(registration) = self.entries.get_mut(name) {
            if registration.generation == generation {
                registration.descriptor = loaded;
            }
        }
    }

    /// 检查后写入单例缓存；已有缓存时返回已有实例
    pub fn fill(&mut self, name: &str, generation: u64, instance: Instance) -> Filled {
        match self.entries.get_mut(name) {
            Some(registration) if registration.generation == generation => {
                if let Some(existing) = &registration.instance {
                    return Filled {
                        instance: existing.clone(),
                        cached: false,
                    };
                }
                registration.instance = Some(instance.clone());
                Filled {
                    instance,
                    cached: true,
                }
            }
            _ => Filled {
                instance,
                cached: false,
            },
        }
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reinsert_evicts_cached_instance() {
        let mut registry = Registry::default();
        registry.insert("foo", Descriptor::value(1u32));
        let (_, generation) = registry.lookup("foo").unwrap();
        let first = Instance::new(1u32);
        assert!(registry.fill("foo", generation, first.clone()).cached);

        let evicted = registry.insert("foo", Descriptor::value(2u32));
        assert!(evicted.unwrap().same_as(&first));
        assert!(registry.cached("foo").is_none());
    }

    #[test]
    fn fill_keeps_first_instance() {
        let mut registry = Registry::default();
        registry.insert("foo", Descriptor::value(1u32));
        let (_, generation) = registry.lookup("foo").unwrap();
        let first = Instance::new(1u32);
        registry.fill("foo", generation, first.clone());

        let second = registry.fill("foo", generation, Instance::new(2u32));
        assert!(!second.cached);
        assert!(second.instance.same_as(&first));
    }

    #[test]
    fn fill_ignores_stale_generation() {
        let mut registry = Registry::default();
        registry.insert("foo", Descriptor::value(1u32));
        let (_, stale) = registry.lookup("foo").unwrap();
        registry.insert("foo", Descriptor::value(2u32));

        let filled = registry.fill("foo", stale, Instance::new(1u32));
        assert!(!filled.cached);
        assert!(registry.cached("foo").is_none());
    }

    #[test]
    fn require_twice_fails_unless_overridden() {
        let mut registry = Registry::default();
        registry.require("foo", "test", false).unwrap();
        let err = registry.require("foo", "test2", false).unwrap_err();
        assert!(matches!(err, InjectorError::DuplicateRequire { .. }));

        registry.require("foo", "test2", true).unwrap();
        assert!(matches!(
            registry.lookup("foo"),
            Some((Descriptor::Module(path), _)) if path == "test2"
        ));
    }
}
