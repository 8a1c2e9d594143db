//! 类型擦除的服务实例
//!
//! 容器中的所有值（预构造对象、工厂结果、构造函数产物）都以 [`Instance`] 的形式存放。

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 可释放资源的服务
///
/// 容器在 `dispose()` 时对每个不同的实例调用一次。
pub trait Disposable: Send + Sync {
    fn dispose(&self);
}

/// 共享的服务实例
///
/// 克隆只增加引用计数，克隆出的实例与原实例是同一个实例。
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    disposable: Option<Arc<dyn Disposable>>,
}

impl Instance {
    /// 包装一个普通值
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// 包装一个已共享的值，保留其身份
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_name: std::any::type_name::<T>(),
            disposable: None,
        }
    }

    /// 包装一个带释放能力的值
    pub fn disposable<T: Disposable + Any>(value: T) -> Self {
        Self::disposable_arc(Arc::new(value))
    }

    pub fn disposable_arc<T: Disposable + Any>(value: Arc<T>) -> Self {
        let disposable: Arc<dyn Disposable> = value.clone();
        Self {
            value,
            type_name: std::any::type_name::<T>(),
            disposable: Some(disposable),
        }
    }

    /// 向下转型为具体类型
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// 两个句柄是否指向同一个底层对象
    pub fn same_as(&self, other: &Instance) -> bool {
        self.identity() == other.identity()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.value) as *const () as usize
    }

    pub(crate) fn teardown(&self) -> Option<&Arc<dyn Disposable>> {
        self.disposable.as_ref()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.type_name)
            .field("disposable", &self.disposable.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    impl Disposable for Counter {
        fn dispose(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn clones_share_identity() {
        let a = Instance::new(String::from("foo"));
        let b = a.clone();
        assert!(a.same_as(&b));
        assert!(!a.same_as(&Instance::new(String::from("foo"))));
    }

    #[test]
    fn downcast_checks_type() {
        let instance = Instance::new(123i32);
        assert_eq!(*instance.downcast::<i32>().unwrap(), 123);
        assert!(instance.downcast::<String>().is_none());
        assert!(instance.is::<i32>());
    }

    #[test]
    fn disposable_exposes_teardown() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let instance = Instance::disposable_arc(counter.clone());
        instance.teardown().unwrap().dispose();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert!(Instance::new(1u8).teardown().is_none());
    }
}
