//! 基础设施层
//!
//! 提供容器的具体实现，包括：
//! - 依赖注入容器
//! - 分层命令索引
//! - 模块加载

pub mod command_tree;
pub mod container;
pub mod module;

// 重新导出API
pub use command_tree::{is_default_command, HierarchicalCommand};
pub use container::{
    CommandSource, Constructor, Dependencies, Descriptor, Disposable, ExtraArgs, Injector,
    InjectorHandle, Instance, INJECTOR_SERVICE,
};
pub use module::{ModuleLoader, StaticModuleLoader};
