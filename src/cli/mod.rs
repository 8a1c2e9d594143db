//! 命令行层：参数解析、命令分派和内置命令

pub mod app;
pub mod args;
pub mod builtins;
pub mod command;
pub mod dispatcher;
pub mod output;

pub use app::CliApp;
pub use args::{Args, Options};
pub use command::{as_command, command_constructor, command_instance, Command, SharedCommand};
pub use dispatcher::{CommandDispatcher, DispatchTarget};
pub use output::Output;
