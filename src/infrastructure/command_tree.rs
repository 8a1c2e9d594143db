//! 分层命令索引
//!
//! 命令名按 `|` 切分成段。以 `*` 开头的段是父节点的默认子命令，
//! 同层没有字面匹配的兄弟节点时它匹配任意参数。匹配不区分大小写。

use crate::errors::InjectorError;
use std::collections::BTreeMap;

pub const COMMAND_SEPARATOR: char = '|';
pub const DEFAULT_COMMAND_MARKER: char = '*';
/// 带此前缀的命令不出现在命令列表中
pub const DEV_COMMAND_PREFIX: &str = "dev-";

/// 分层匹配结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchicalCommand {
    /// 匹配到的命令的完整注册名，例如 `devices|*list`
    pub command_name: String,
    /// 匹配之后剩余的参数
    pub remaining_arguments: Vec<String>,
}

#[derive(Debug, Default)]
struct CommandNode {
    segment: String,
    is_default: bool,
    /// 该路径本身是命令时的注册名
    command: Option<String>,
    children: BTreeMap<String, CommandNode>,
}

impl CommandNode {
    fn new(segment: &str, is_default: bool) -> Self {
        Self {
            segment: segment.to_string(),
            is_default,
            ..Default::default()
        }
    }

    fn default_child(&self) -> Option<&CommandNode> {
        self.children.values().find(|child| child.is_default)
    }

    fn collect_commands(&self, into: &mut Vec<String>) {
        for child in self.children.values() {
            if let Some(command) = &child.command {
                into.push(command.clone());
            }
            child.collect_commands(into);
        }
    }
}

#[derive(Debug, Default)]
pub struct CommandTree {
    roots: BTreeMap<String, CommandNode>,
}

/// `name` 的最后一段是否标记为默认子命令
pub fn is_default_command(name: &str) -> bool {
    name.rsplit(COMMAND_SEPARATOR)
        .next()
        .is_some_and(|segment| segment.starts_with(DEFAULT_COMMAND_MARKER))
}

fn parse_segment(raw: &str) -> (String, bool) {
    match raw.strip_prefix(DEFAULT_COMMAND_MARKER) {
        Some(stripped) => (stripped.to_lowercase(), true),
        None => (raw.to_lowercase(), false),
    }
}

impl CommandTree {
    /// 把 `name` 加入索引，并把末端节点标记为命令
    pub fn insert(&mut self, name: &str) -> Result<(), InjectorError> {
        let segments: Vec<(String, bool)> = name.split(COMMAND_SEPARATOR).map(parse_segment).collect();
        if segments.iter().any(|(key, _)| key.is_empty()) {
            return Err(InjectorError::InvalidCommandName(name.to_string()));
        }

        let raw: Vec<&str> = name.split(COMMAND_SEPARATOR).collect();
        let (root_key, root_default) = &segments[0];
        let mut node = self
            .roots
            .entry(root_key.clone())
            .or_insert_with(|| CommandNode::new(raw[0], *root_default));

        for (depth, (key, is_default)) in segments.iter().enumerate().skip(1) {
            if *is_default {
                if let Some(existing) = node.default_child() {
                    if existing.segment.trim_start_matches(DEFAULT_COMMAND_MARKER).to_lowercase() != *key {
                        return Err(InjectorError::AmbiguousDefaultCommand {
                            parent: raw[..depth].join("|"),
                            existing: existing.segment.clone(),
                            attempted: raw[depth].to_string(),
                        });
                    }
                }
            }

            let child = node
                .children
                .entry(key.clone())
                .or_insert_with(|| CommandNode::new(raw[depth], *is_default));
            if *is_default && !child.is_default {
                child.is_default = true;
                child.segment = raw[depth].to_string();
            }
            node = child;
        }

        if let Some(previous) = node.command.replace(name.to_string()) {
            if previous != name {
                tracing::warn!(previous = %previous, command = name, "command path registered twice");
            }
        }
        Ok(())
    }

    /// 在 `root` 下按 `tokens` 逐层匹配，返回到达的最深命令
    ///
    /// 字面匹配优先于默认子命令。匹配是贪心的，不回溯。
    pub fn build_hierarchical_command<S: AsRef<str>>(
        &self,
        root: &str,
        tokens: &[S],
    ) -> Option<HierarchicalCommand> {
        let mut node = self.roots.get(&root.to_lowercase())?;
        let mut deepest: Option<(&str, usize)> = None;

        for (index, token) in tokens.iter().enumerate() {
            let key = token.as_ref().to_lowercase();
            let Some(next) = node.children.get(&key).or_else(|| node.default_child()) else {
                break;
            };
            node = next;
            if let Some(command) = &node.command {
                deepest = Some((command.as_str(), index + 1));
            }
        }

        deepest.map(|(command, consumed)| HierarchicalCommand {
            command_name: command.to_string(),
            remaining_arguments: tokens[consumed..]
                .iter()
                .map(|t| t.as_ref().to_string())
                .collect(),
        })
    }

    /// `root` 是否有子命令
    pub fn is_hierarchical(&self, root: &str) -> bool {
        self.roots
            .get(&root.to_lowercase())
            .is_some_and(|node| !node.children.is_empty())
    }

    /// `root` 下所有命令的完整名字
    pub fn child_command_names(&self, root: &str) -> Vec<String> {
        let mut names = Vec::new();
        if let Some(node) = self.roots.get(&root.to_lowercase()) {
            node.collect_commands(&mut names);
        }
        names
    }

    /// `root` 的直接默认子命令（需本身是命令）
    pub fn default_command(&self, root: &str) -> Option<String> {
        self.roots
            .get(&root.to_lowercase())?
            .default_child()?
            .command
            .clone()
    }
}
