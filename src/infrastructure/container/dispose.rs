//! 统一释放单例

use super::Injector;

impl Injector {
    /// 对所有曾缓存过的单例调用一次 `dispose`
    ///
    /// 同一个底层对象注册在多个名字下时只释放一次，重复调用不会再次释放。
    /// 按产生顺序的逆序释放。
    pub fn dispose(&self) {
        let pending = {
            let produced = self.inner.produced.lock();
            let mut disposed = self.inner.disposed.lock();
            produced
                .iter()
                .rev()
                .filter_map(|instance| {
                    let teardown = instance.teardown()?;
                    disposed
                        .insert(instance.identity())
                        .then(|| (instance.type_name(), teardown.clone()))
                })
                .collect::<Vec<_>>()
        };

        for (type_name, teardown) in pending {
            tracing::debug!(service = type_name, "disposing");
            teardown.dispose();
        }
    }
}
