//! 文本分块模块
//!
//! 按行单次扫描文档，把行累积成不超过阈值的块。围栏代码块和块级公式是受保护区域，
//! 区域未闭合时绝不在其中切分，此时块可以超过阈值。
//!
//! 每种区域是一个独立的小状态机（关闭 → 打开 → 关闭），转移函数只依赖
//! (当前状态, 当前行)。两个状态机并行推进，任一处于打开状态即视为受保护。
//! 关闭标记所在的行仍属于区域本身，因此最早只能在关闭行之后的下一行结束一块。
//!
//! 未闭合的区域会让文档剩余部分不再切分，这是接受的退化行为而不是错误。

/// 成对出现、同一个标记既开又关的块级公式定界符
pub const SYMMETRIC_MATH_DELIMITERS: &[&str] = &["$$"];

/// 只负责打开的块级公式定界符
pub const MATH_OPEN_DELIMITERS: &[&str] = &[
    "\\[",
    "\\begin{equation}",
    "\\begin{equation*}",
    "\\begin{align}",
    "\\begin{align*}",
];

/// 只负责关闭的块级公式定界符
pub const MATH_CLOSE_DELIMITERS: &[&str] = &[
    "\\]",
    "\\end{equation}",
    "\\end{equation*}",
    "\\end{align}",
    "\\end{align*}",
];

const FENCE_CHARS: [char; 2] = ['`', '~'];
const MIN_FENCE_RUN: usize = 3;

/// 围栏代码块状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FenceState {
    #[default]
    Closed,
    Open {
        marker: char,
        run: usize,
    },
}

impl FenceState {
    /// 读入一行后的新状态。不支持嵌套：打开期间只认同字符、长度不小于开启长度的纯围栏行。
    pub fn next(self, line: &str) -> Self {
        let stripped = line.trim();
        match self {
            FenceState::Closed => match leading_fence(stripped) {
                Some((marker, run)) => FenceState::Open { marker, run },
                None => FenceState::Closed,
            },
            FenceState::Open { marker, run } => {
                let closing_run = stripped.chars().count();
                if closing_run >= run && stripped.chars().all(|c| c == marker) {
                    FenceState::Closed
                } else {
                    self
                }
            }
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, FenceState::Open { .. })
    }
}

/// 行首的围栏字符及其连续长度（至少 3 个）
fn leading_fence(stripped: &str) -> Option<(char, usize)> {
    let first = stripped.chars().next()?;
    if !FENCE_CHARS.contains(&first) {
        return None;
    }
    let run = stripped.chars().take_while(|&c| c == first).count();
    (run >= MIN_FENCE_RUN).then_some((first, run))
}

/// 块级公式状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MathState {
    #[default]
    Closed,
    Open,
}

impl MathState {
    pub fn next(self, line: &str) -> Self {
        let stripped = line.trim();
        if SYMMETRIC_MATH_DELIMITERS.contains(&stripped) {
            match self {
                MathState::Closed => MathState::Open,
                MathState::Open => MathState::Closed,
            }
        } else if MATH_OPEN_DELIMITERS.contains(&stripped) {
            MathState::Open
        } else if MATH_CLOSE_DELIMITERS.contains(&stripped) {
            MathState::Closed
        } else {
            self
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, MathState::Open)
    }
}

/// 两种受保护区域的组合跟踪器
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionTracker {
    fence: FenceState,
    math: MathState,
}

impl RegionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 推进两个状态机，返回该行是否属于受保护区域（含开启行与关闭行）
    pub fn advance(&mut self, line: &str) -> bool {
        let was_protected = self.is_protected();
        self.math = self.math.next(line);
        self.fence = self.fence.next(line);
        was_protected || self.is_protected()
    }

    /// 当前位置是否处于受保护区域内（已计入最近一行）
    pub fn is_protected(&self) -> bool {
        self.fence.is_open() || self.math.is_open()
    }
}

/// 按阈值分块的分块器
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_length: usize,
}

impl Chunker {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        split_text(text, self.max_length)
    }
}

/// 将文档切分为有序块
///
/// # 参数
///
/// * `text` - 原始文档，可以为空
/// * `max_length` - 阈值，按累积行的字符数计算，不含换行符
///
/// # 返回
///
/// 块内各行以 `\n` 重新连接。某一块在累积长度刚超过阈值且当前行不属于受保护区域时结束，
/// 所以不含受保护区域的块去掉最后一行后不超过阈值。空文档恰好返回一个空块。
pub fn split_text(text: &str, max_length: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_length = 0usize;
    let mut regions = RegionTracker::new();

    for line in text.split('\n') {
        current.push(line);
        current_length += line.chars().count();
        let protected = regions.advance(line);

        if current_length > max_length && !protected {
            chunks.push(current.join("\n"));
            current.clear();
            current_length = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current.join("\n"));
    }

    chunks
}
