//! wirebox CLI 应用程序结构

use super::args::{Args, Options};
use super::builtins::{
    CommandsListCommand, DevConfigCommand, HelpCommand, ServicesListCommand, COMMANDS_LIST,
    DEV_CONFIG, HELP, SERVICES_LIST,
};
use super::dispatcher::CommandDispatcher;
use super::output::Output;
use crate::config::AppConfig;
use crate::errors::InjectorError;
use crate::infrastructure::{Descriptor, Injector, Instance, StaticModuleLoader};
use std::sync::Arc;

pub const CONFIG_SERVICE: &str = "config";
pub const OPTIONS_SERVICE: &str = "options";
pub const OUTPUT_SERVICE: &str = "output";

/// wirebox CLI 应用程序主入口点
pub struct CliApp {
    args: Args,
    injector: Injector,
    loader: Arc<StaticModuleLoader>,
    output: Arc<Output>,
}

impl CliApp {
    pub fn new(args: Args, config: AppConfig) -> Self {
        Self::with_output(args, config, Output::stdout())
    }

    /// 使用指定的输出创建应用，测试中传入 [`Output::capture`]
    pub fn with_output(args: Args, config: AppConfig, output: Output) -> Self {
        let loader = Arc::new(builtin_modules());
        let injector = Injector::with_config(config.injector.clone(), loader.clone());

        let options = Options::from(&args);
        loader.add("./config", move || Descriptor::value(config.clone()));
        loader.add("./options", move || Descriptor::value(options));

        Self {
            args,
            injector,
            loader,
            output: Arc::new(output),
        }
    }

    /// 注册内置服务和命令
    pub fn bootstrap(&self) -> Result<(), InjectorError> {
        self.injector.require_public(CONFIG_SERVICE, "./config")?;
        self.injector.require_public(OPTIONS_SERVICE, "./options")?;
        self.injector
            .register(OUTPUT_SERVICE, Instance::from_arc(self.output.clone()));

        self.injector.require_command(HELP, "./commands/help")?;
        self.injector
            .require_command(SERVICES_LIST, "./commands/services-list")?;
        self.injector
            .require_command(COMMANDS_LIST, "./commands/commands-list")?;
        self.injector.require_command(DEV_CONFIG, "./commands/dev-config")?;

        tracing::debug!(
            services = self.injector.registered_names().len(),
            commands = self.injector.registered_command_names(true).len(),
            "bootstrap completed"
        );
        Ok(())
    }

    /// 运行命令行中给出的命令
    pub fn run(&self) -> anyhow::Result<()> {
        CommandDispatcher::new(self.injector.clone()).dispatch(&self.args.tokens)
    }

    /// 释放容器中创建的所有实例
    pub fn shutdown(&self) {
        self.injector.dispose();
    }

    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    /// 额外的模块可以在 bootstrap 之前或之后登记
    pub fn loader(&self) -> &StaticModuleLoader {
        &self.loader
    }

    pub fn output(&self) -> &Output {
        &self.output
    }
}

fn builtin_modules() -> StaticModuleLoader {
    StaticModuleLoader::new()
        .with_module("./commands/help", || {
            Descriptor::Constructor(HelpCommand::constructor())
        })
        .with_module("./commands/services-list", || {
            Descriptor::Constructor(ServicesListCommand::constructor())
        })
        .with_module("./commands/commands-list", || {
            Descriptor::Constructor(CommandsListCommand::constructor())
        })
        .with_module("./commands/dev-config", || {
            Descriptor::Constructor(DevConfigCommand::constructor())
        })
}
