use parking_lot::Mutex;

/// 命令输出
///
/// 默认写到标准输出；`capture` 模式下收集到内存中。
#[derive(Debug, Default)]
pub struct Output {
    captured: Option<Mutex<Vec<String>>>,
}

impl Output {
    pub fn stdout() -> Self {
        Self { captured: None }
    }

    pub fn capture() -> Self {
        Self {
            captured: Some(Mutex::new(Vec::new())),
        }
    }

    pub fn line(&self, line: impl Into<String>) {
        let line = line.into();
        match &self.captured {
            Some(lines) => lines.lock().push(line),
            None => println!("{line}"),
        }
    }

    /// 已收集的输出；非 capture 模式下为空
    pub fn captured(&self) -> Vec<String> {
        self.captured
            .as_ref()
            .map(|lines| lines.lock().clone())
            .unwrap_or_default()
    }
}
