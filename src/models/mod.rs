// 数据模型模块
// 定义内容目录的类型化结构：课程 → 周 → 主题 → 题目 → 测试用例

use serde::{Deserialize, Serialize};

/// 题目类型枚举
///
/// 持久层以蛇形字符串存储（`full_program` 等）。目录作者提供的字符串
/// 通过 [`QuestionType::parse`] 做封闭映射，未知值视为内容错误而不是兜底。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// 完整程序：提交代码作为可执行程序运行，stdin 驱动
    FullProgram,
    /// 函数题：提交代码作为可调用定义库，由 test_code 驱动
    Function,
    /// 改错题
    FixBug,
    /// 输出预测题
    PredictOutput,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::FullProgram => "full_program",
            QuestionType::Function => "function",
            QuestionType::FixBug => "fix_bug",
            QuestionType::PredictOutput => "predict_output",
        }
    }

    /// 封闭映射：目录中作者书写的类型字符串 → 枚举
    /// 未知字符串返回 None，由同步校验上报为内容错误
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "full_program" => Some(QuestionType::FullProgram),
            "function" => Some(QuestionType::Function),
            "fix_bug" => Some(QuestionType::FixBug),
            "predict_output" => Some(QuestionType::PredictOutput),
            _ => None,
        }
    }

    /// 数据库回读用的全映射。旧版本写入的未知值退回 FullProgram，
    /// 这是唯一允许兜底的路径；作者输入永远不走这里。
    pub fn from_db(key: &str) -> Self {
        Self::parse(key).unwrap_or(QuestionType::FullProgram)
    }
}

/// 测试用例
///
/// 评测引擎消费的契约数据。`test_code` 存在时该用例为驱动注入模式，
/// 语义见 services::contract。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// stdin 载荷，可为空
    #[serde(default)]
    pub input: String,
    /// 期望输出，精确匹配（允许去掉一个尾部换行）
    pub expected_output: String,
    /// 隐藏用例：不展示给学习者，但判分必须通过
    #[serde(default)]
    pub is_hidden: bool,
    /// 可选驱动代码：替换默认程序入口，对提交的定义做独立调用
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_code: Option<String>,
}

/// 目录中作者书写的题目记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub slug: String,
    pub title: String,
    /// 作者书写的类型字符串，同步时经 QuestionType::parse 校验
    pub question_type: String,
    pub prompt: String,
    pub constraints: Option<String>,
    /// 难度序数 1-5
    pub difficulty: i32,
    pub estimated_minutes: i32,
    pub points: i32,
    pub starter_code: String,
    pub solution_code: String,
    pub tests: Vec<TestCase>,
    /// 提示列表，逐条递进
    pub hints: Vec<String>,
    pub tags: Vec<String>,
}

/// 主题的题目切片范围：对周题目数组的半开区间 [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRange {
    pub start: usize,
    pub end: usize,
}

impl QuestionRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 目录中的主题记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSpec {
    pub slug: String,
    pub title: String,
    /// 习题前展示的学习内容（Markdown）
    pub intro_markdown: Option<String>,
    /// 对所在周扁平题目数组的切片
    pub question_range: QuestionRange,
}

/// 目录中的周记录
///
/// 题目以扁平数组书写，由各主题的 question_range 切分；
/// 切片必须无缝无重叠地覆盖整个数组。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekSpec {
    pub week_number: i32,
    pub title: String,
    pub summary: Option<String>,
    pub topics: Vec<TopicSpec>,
    pub questions: Vec<QuestionSpec>,
}

/// 目录中的课程记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSpec {
    pub slug: String,
    pub name: String,
    pub description: String,
    /// 教学语言，如 "python"
    pub language: String,
    pub is_locked: bool,
    pub weeks: Vec<WeekSpec>,
}

/// 内容目录：同步管线的唯一输入
///
/// 显式构造的不可变值，作为参数传入 sync()，不做进程级单例。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentCatalog {
    pub courses: Vec<CourseSpec>,
}

/// 成就判定条件
///
/// 由外部进度引擎求值，本管线只负责落库
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AchievementCriteria {
    /// 首次通过任意题目
    FirstPass,
    /// 连续通过 count 道题目
    Streak { count: u32 },
    /// 不使用提示通过 count 道题目
    NoHints { count: u32 },
    /// 完成一整周
    CompleteWeek,
    /// 在 seconds 秒内通过一道题目
    TimeLimit { seconds: u32 },
    /// 一个主题内全部题目满分
    PerfectTopic,
}

/// 成就定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementSpec {
    /// 自然键，全局唯一
    pub code: String,
    pub name: String,
    pub description: String,
    pub criteria: AchievementCriteria,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_type_roundtrip() {
        for key in ["full_program", "function", "fix_bug", "predict_output"] {
            let qt = QuestionType::parse(key).unwrap();
            assert_eq!(qt.as_str(), key);
        }
    }

    #[test]
    fn test_question_type_unknown_rejected() {
        assert_eq!(QuestionType::parse("essay"), None);
        assert_eq!(QuestionType::parse(""), None);
    }

    #[test]
    fn test_question_type_from_db_defaults() {
        // 旧数据兜底，不用于作者输入
        assert_eq!(QuestionType::from_db("essay"), QuestionType::FullProgram);
        assert_eq!(QuestionType::from_db("function"), QuestionType::Function);
    }

    #[test]
    fn test_criteria_json_tag() {
        let c = AchievementCriteria::Streak { count: 5 };
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"kind\":\"streak\""));
        assert!(json.contains("\"count\":5"));

        let back: AchievementCriteria = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_test_case_optional_fields() {
        let json = r#"{"expected_output":"42"}"#;
        let case: TestCase = serde_json::from_str(json).unwrap();
        assert_eq!(case.input, "");
        assert!(!case.is_hidden);
        assert!(case.test_code.is_none());
    }

    #[test]
    fn test_question_range_len() {
        assert_eq!(QuestionRange::new(15, 25).len(), 10);
        assert_eq!(QuestionRange::new(3, 3).len(), 0);
    }
}
