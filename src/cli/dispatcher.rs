//! 把命令行参数分派到容器中注册的命令

use super::command::as_command;
use crate::errors::DispatchError;
use crate::infrastructure::Injector;
use crate::logging::OperationTimer;

/// 没有参数时执行的命令
pub const HELP_COMMAND: &str = "help";

/// 分派目标：命令全名和交给它的参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTarget {
    pub command_name: String,
    pub arguments: Vec<String>,
}

pub struct CommandDispatcher {
    injector: Injector,
}

impl CommandDispatcher {
    pub fn new(injector: Injector) -> Self {
        Self { injector }
    }

    /// 只做匹配，不执行
    ///
    /// 命令段在第一个以 `-` 开头的参数处结束，之后的参数原样交给命令。
    pub fn target(&self, tokens: &[String]) -> Result<DispatchTarget, DispatchError> {
        let Some((first, rest)) = tokens.split_first() else {
            return Ok(DispatchTarget {
                command_name: HELP_COMMAND.to_string(),
                arguments: Vec::new(),
            });
        };
        let root = first.to_lowercase();
        let words = rest
            .iter()
            .position(|token| token.starts_with('-'))
            .unwrap_or(rest.len());
        let (segments, flags) = rest.split_at(words);

        if let Some(found) = self.injector.build_hierarchical_command(&root, segments) {
            let mut arguments = found.remaining_arguments;
            arguments.extend_from_slice(flags);
            return Ok(DispatchTarget {
                command_name: found.command_name,
                arguments,
            });
        }

        let target = |command_name: String| DispatchTarget {
            command_name,
            arguments: rest.to_vec(),
        };

        if self.injector.is_hierarchical_command(&root) {
            if let Some(default) = self.injector.default_command(&root) {
                return Ok(target(default));
            }
            if let Some(registered) = self.registered_root(&root) {
                return Ok(target(registered));
            }
            return Err(DispatchError::InvalidSubCommand {
                available: self.injector.child_command_names(&root),
                root,
            });
        }

        match self.registered_root(&root) {
            Some(registered) => Ok(target(registered)),
            None => Err(DispatchError::UnknownCommand(root)),
        }
    }

    /// 按不区分大小写的方式查找已注册的顶层命令名
    fn registered_root(&self, root: &str) -> Option<String> {
        if self.injector.is_command_registered(root) {
            return Some(root.to_string());
        }
        self.injector
            .registered_command_names(true)
            .into_iter()
            .find(|name| name.to_lowercase() == root)
    }

    /// 匹配、解析并执行命令
    pub fn dispatch(&self, tokens: &[String]) -> anyhow::Result<()> {
        let DispatchTarget {
            command_name,
            arguments,
        } = self.target(tokens)?;
        tracing::debug!(command = %command_name, args = ?arguments, "dispatching command");

        let instance = self
            .injector
            .resolve_command(&command_name)?
            .ok_or_else(|| DispatchError::UnknownCommand(command_name.clone()))?;
        let command =
            as_command(&instance).ok_or_else(|| DispatchError::NotACommand(command_name.clone()))?;

        if !command.can_execute(&arguments)? {
            return Err(DispatchError::CannotExecute(command_name).into());
        }

        let timer = OperationTimer::new("execute_command").with_metadata("command", &command_name);
        command.execute(&arguments)?;
        timer.finish();
        Ok(())
    }
}
