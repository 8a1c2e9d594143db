//! 公开 API 视图
//!
//! 对外暴露的名字集合，每次访问时才通过容器求值。

use super::instance::Instance;
use super::registry::Descriptor;
use super::Injector;
use crate::errors::InjectorError;

/// 公开条目的求值方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PublicEntry {
    /// 解析为单例服务
    Service,
    /// 原样返回注册表中当前的导出
    Class,
}

/// 容器的公开 API
pub struct PublicApi<'a> {
    injector: &'a Injector,
}

impl<'a> PublicApi<'a> {
    pub(crate) fn new(injector: &'a Injector) -> Self {
        Self { injector }
    }

    /// 已公开的名字，按字母序
    pub fn names(&self) -> Vec<String> {
        self.injector.inner.public_api.read().keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.injector.inner.public_api.read().contains_key(name)
    }

    /// 读取公开条目
    pub fn get(&self, name: &str) -> Result<Instance, InjectorError> {
        let entry = self
            .injector
            .inner
            .public_api
            .read()
            .get(name)
            .copied()
            .ok_or_else(|| InjectorError::UnresolvedName(name.to_string()))?;

        match entry {
            PublicEntry::Service => self.injector.resolve(name),
            PublicEntry::Class => self.export(name),
        }
    }

    /// 不经过构造注入，直接返回名字当前对应的导出
    fn export(&self, name: &str) -> Result<Instance, InjectorError> {
        let services = &self.injector.inner.services;
        if let Some(instance) = services.read().cached(name) {
            return Ok(instance);
        }

        let (descriptor, generation) = services
            .read()
            .lookup(name)
            .ok_or_else(|| InjectorError::UnresolvedName(name.to_string()))?;
        let descriptor = match descriptor {
            Descriptor::Module(path) => {
                let loaded = self.injector.inner.loader.load(&path)?;
                services.write().replace_loaded(name, generation, loaded.clone());
                loaded
            }
            other => other,
        };

        Ok(match descriptor {
            Descriptor::Value(instance) => instance,
            Descriptor::Constructor(ctor) => Instance::new(ctor),
            Descriptor::Factory(factory) => Instance::new(factory),
            Descriptor::Module(path) => Instance::new(path),
        })
    }
}
