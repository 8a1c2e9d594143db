//! 模块加载
//!
//! `require` 只记录模块路径，真正的加载在首次解析时通过 [`ModuleLoader`] 完成。

use super::container::Descriptor;
use crate::errors::InjectorError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// 模块加载器：把模块路径变成注册描述
pub trait ModuleLoader: Send + Sync {
    fn load(&self, path: &str) -> Result<Descriptor, InjectorError>;
}

/// 为闭包实现 ModuleLoader，测试中可以直接传入函数
impl<F> ModuleLoader for F
where
    F: Fn(&str) -> Result<Descriptor, InjectorError> + Send + Sync,
{
    fn load(&self, path: &str) -> Result<Descriptor, InjectorError> {
        self(path)
    }
}

type ModuleFactory = Arc<dyn Fn() -> Descriptor + Send + Sync>;

/// 基于内存表的模块加载器
#[derive(Default)]
pub struct StaticModuleLoader {
    modules: RwLock<HashMap<String, ModuleFactory>>,
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记模块，`export` 在每次加载时调用
    pub fn with_module<F>(self, path: &str, export: F) -> Self
    where
        F: Fn() -> Descriptor + Send + Sync + 'static,
    {
        self.add(path, export);
        self
    }

    pub fn add<F>(&self, path: &str, export: F)
    where
        F: Fn() -> Descriptor + Send + Sync + 'static,
    {
        self.modules.write().insert(path.to_string(), Arc::new(export));
    }

    pub fn contains(&self, path: &str) -> bool {
        self.modules.read().contains_key(path)
    }
}

impl ModuleLoader for StaticModuleLoader {
    fn load(&self, path: &str) -> Result<Descriptor, InjectorError> {
        let export = self
            .modules
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| InjectorError::ModuleLoad {
                path: path.to_string(),
                reason: "module not found".to_string(),
            })?;
        Ok(export())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::container::Instance;

    #[test]
    fn static_loader_returns_registered_export() {
        let loader = StaticModuleLoader::new().with_module("./answer", || Descriptor::value(42u32));
        assert!(loader.contains("./answer"));

        match loader.load("./answer").unwrap() {
            Descriptor::Value(instance) => assert_eq!(*instance.downcast::<u32>().unwrap(), 42),
            other => panic!("unexpected export {other:?}"),
        }
    }

    #[test]
    fn static_loader_reports_missing_module() {
        let loader = StaticModuleLoader::new();
        let err = loader.load("./missing").unwrap_err();
        assert!(matches!(err, InjectorError::ModuleLoad { path, .. } if path == "./missing"));
    }

    #[test]
    fn closures_are_loaders() {
        let loader = |path: &str| -> Result<Descriptor, InjectorError> {
            Ok(Descriptor::Value(Instance::new(path.to_string())))
        };
        let loaded = ModuleLoader::load(&loader, "x").unwrap();
        assert!(matches!(loaded, Descriptor::Value(_)));
    }
}
