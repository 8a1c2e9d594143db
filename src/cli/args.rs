use clap::Parser;

/// wirebox 命令行参数
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    name = "wirebox",
    version,
    about = "Lazy name-keyed dependency injection with hierarchical commands",
    long_about = "wirebox resolves services by name on first use and dispatches pipe-delimited hierarchical commands registered in its injector."
)]
pub struct Args {
    /// Path to an alternative configuration file
    #[clap(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Raise the log level to DEBUG
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Print listings as JSON
    #[clap(long, global = true)]
    pub json: bool,

    /// Command tokens, e.g. `services list`
    #[clap(allow_hyphen_values = true, trailing_var_arg = true)]
    pub tokens: Vec<String>,
}

/// 命令可见的全局选项，以 `options` 名字注册到容器
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    pub json: bool,
    pub verbose: bool,
}

impl From<&Args> for Options {
    fn from(args: &Args) -> Self {
        Self {
            json: args.json,
            verbose: args.verbose,
        }
    }
}

impl Options {
    /// `--json` 既可以写在命令前，也可以混在命令参数中
    pub fn wants_json(&self, args: &[String]) -> bool {
        self.json || args.iter().any(|arg| arg == "--json")
    }
}
