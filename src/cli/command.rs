//! 可执行命令

use crate::infrastructure::{Constructor, Instance};
use std::sync::Arc;

/// 注册在容器命令表中的可执行命令
pub trait Command: Send + Sync {
    /// 执行命令，`args` 为层级匹配后剩余的参数
    fn execute(&self, args: &[String]) -> anyhow::Result<()>;

    /// 执行前的检查，返回 `false` 时不会执行
    fn can_execute(&self, _args: &[String]) -> anyhow::Result<bool> {
        Ok(true)
    }

    fn description(&self) -> &str {
        ""
    }
}

pub type SharedCommand = Arc<dyn Command>;

/// 把命令包装成容器实例
pub fn command_instance<C: Command + 'static>(command: C) -> Instance {
    let shared: SharedCommand = Arc::new(command);
    Instance::new(shared)
}

/// 从容器实例中取出命令
pub fn as_command(instance: &Instance) -> Option<SharedCommand> {
    instance.downcast::<SharedCommand>().map(|command| (*command).clone())
}

/// 为闭包实现 Command，方便注册简单命令
impl<F> Command for F
where
    F: Fn(&[String]) -> anyhow::Result<()> + Send + Sync,
{
    fn execute(&self, args: &[String]) -> anyhow::Result<()> {
        self(args)
    }
}

/// 不带依赖的命令构造函数
pub fn command_constructor<F>(name: &str, command: F) -> Constructor
where
    F: Fn(&[String]) -> anyhow::Result<()> + Send + Sync + Clone + 'static,
{
    Constructor::parameterless(name, move || Ok(command_instance(command.clone())))
}
