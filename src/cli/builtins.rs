//! 内置命令

use super::args::Options;
use super::command::{as_command, command_instance, Command};
use super::output::Output;
use crate::config::AppConfig;
use crate::infrastructure::{is_default_command, Constructor, Injector, InjectorHandle};
use serde_json::json;
use std::sync::Arc;

pub const HELP: &str = "help";
pub const SERVICES_LIST: &str = "services|*list";
pub const COMMANDS_LIST: &str = "commands|*list";
pub const DEV_CONFIG: &str = "dev-config";

fn upgrade(handle: &InjectorHandle) -> anyhow::Result<Injector> {
    handle
        .upgrade()
        .ok_or_else(|| anyhow::anyhow!("injector is no longer available"))
}

/// `devices|*list` 显示为 `devices list`
fn display_name(name: &str) -> String {
    name.split('|')
        .map(|segment| segment.trim_start_matches('*'))
        .collect::<Vec<_>>()
        .join(" ")
}

/// 列出可用命令
pub struct HelpCommand {
    injector: InjectorHandle,
    output: Arc<Output>,
}

impl HelpCommand {
    pub fn constructor() -> Constructor {
        Constructor::new(HELP, ["$injector", "$output"], |deps| {
            Ok(command_instance(HelpCommand {
                injector: (*deps.require::<InjectorHandle>("injector")?).clone(),
                output: deps.require::<Output>("output")?,
            }))
        })
    }
}

impl Command for HelpCommand {
    fn execute(&self, _args: &[String]) -> anyhow::Result<()> {
        let injector = upgrade(&self.injector)?;
        self.output.line("Usage: wirebox [OPTIONS] <COMMAND> [ARGS]...");
        self.output.line("");
        self.output.line("Commands:");
        for name in injector.registered_command_names(false) {
            // 描述需要构造命令，失败时只显示名字
            let description = match injector.resolve_command(&name) {
                Ok(Some(instance)) => as_command(&instance)
                    .map(|command| command.description().to_string())
                    .unwrap_or_default(),
                Ok(None) => String::new(),
                Err(e) => {
                    tracing::warn!(command = %name, error = %e, "cannot resolve command for help");
                    String::new()
                }
            };
            let marker = if is_default_command(&name) { " (default)" } else { "" };
            self.output.line(
                format!("  {:<24}{}{}", display_name(&name), description, marker)
                    .trim_end()
                    .to_string(),
            );
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "Show available commands"
    }
}

/// 列出已注册的服务及其是否公开
pub struct ServicesListCommand {
    injector: InjectorHandle,
    output: Arc<Output>,
    options: Arc<Options>,
}

impl ServicesListCommand {
    pub fn constructor() -> Constructor {
        Constructor::new(SERVICES_LIST, ["$injector", "$output", "$options"], |deps| {
            Ok(command_instance(ServicesListCommand {
                injector: (*deps.require::<InjectorHandle>("injector")?).clone(),
                output: deps.require::<Output>("output")?,
                options: deps.require::<Options>("options")?,
            }))
        })
    }
}

impl Command for ServicesListCommand {
    fn execute(&self, args: &[String]) -> anyhow::Result<()> {
        let injector = upgrade(&self.injector)?;
        let public_api = injector.public_api();
        let services: Vec<(String, bool)> = injector
            .registered_names()
            .into_iter()
            .map(|name| {
                let public = public_api.contains(&name);
                (name, public)
            })
            .collect();

        if self.options.wants_json(args) {
            let listing: Vec<_> = services
                .iter()
                .map(|(name, public)| json!({ "name": name, "public": public }))
                .collect();
            self.output.line(serde_json::to_string_pretty(&listing)?);
        } else {
            for (name, public) in services {
                let suffix = if public { " (public)" } else { "" };
                self.output.line(format!("{name}{suffix}"));
            }
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "List registered services"
    }
}

/// 列出已注册的命令，`--all` 时包含开发命令
pub struct CommandsListCommand {
    injector: InjectorHandle,
    output: Arc<Output>,
    options: Arc<Options>,
}

impl CommandsListCommand {
    pub fn constructor() -> Constructor {
        Constructor::new(COMMANDS_LIST, ["$injector", "$output", "$options"], |deps| {
            Ok(command_instance(CommandsListCommand {
                injector: (*deps.require::<InjectorHandle>("injector")?).clone(),
                output: deps.require::<Output>("output")?,
                options: deps.require::<Options>("options")?,
            }))
        })
    }
}

impl Command for CommandsListCommand {
    fn execute(&self, args: &[String]) -> anyhow::Result<()> {
        let injector = upgrade(&self.injector)?;
        let include_dev = args.iter().any(|arg| arg == "--all");
        let names = injector.registered_command_names(include_dev);

        if self.options.wants_json(args) {
            self.output.line(serde_json::to_string_pretty(&names)?);
        } else {
            for name in names {
                self.output.line(name);
            }
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "List registered commands"
    }
}

/// 打印生效的配置
pub struct DevConfigCommand {
    config: Arc<AppConfig>,
    output: Arc<Output>,
}

impl DevConfigCommand {
    pub fn constructor() -> Constructor {
        Constructor::new(DEV_CONFIG, ["$config", "$output"], |deps| {
            Ok(command_instance(DevConfigCommand {
                config: deps.require::<AppConfig>("config")?,
                output: deps.require::<Output>("output")?,
            }))
        })
    }
}

impl Command for DevConfigCommand {
    fn execute(&self, _args: &[String]) -> anyhow::Result<()> {
        self.output.line(self.config.to_toml()?.trim_end().to_string());
        Ok(())
    }

    fn description(&self) -> &str {
        "Print the effective configuration"
    }
}
