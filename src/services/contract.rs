// 测试用例契约模块
// 规定评测引擎执行一道题目测试集时必须遵守的语义：
// 执行模式选择、输出比对、隐藏用例强制参与判分

use crate::models::TestCase;
use serde::{Deserialize, Serialize};

/// 单个用例的执行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// 提交代码作为完整程序运行，input 作为整个 stdin 流
    Stdin,
    /// 提交代码作为可调用定义库，test_code 是实际执行的驱动代码，
    /// 该用例不使用 input/stdin
    Driver,
}

/// 用例级判定结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult {
    pub index: usize,
    pub is_hidden: bool,
    pub passed: bool,
}

/// 题目级判定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// 全部用例（含隐藏）通过才为 true
    pub passed: bool,
    pub total_cases: usize,
    pub passed_cases: usize,
    /// 仅可见用例的明细，隐藏用例不逐条下发给学习者
    pub visible_results: Vec<CaseResult>,
    /// 隐藏用例失败数，只给计数不给内容
    pub hidden_failures: usize,
}

/// 测试集形状错误，同时被目录校验复用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestSuiteError {
    /// 测试集为空
    Empty,
    /// 没有任何可见用例，学习者拿不到可见反馈
    NoVisibleCase,
}

impl std::fmt::Display for TestSuiteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestSuiteError::Empty => write!(f, "tests 为空"),
            TestSuiteError::NoVisibleCase => write!(f, "没有可见测试用例"),
        }
    }
}

/// 选择用例的执行模式
///
/// test_code 存在 ⇒ 驱动注入模式。该规则由观测到的目录数据推断，
/// 待评测引擎侧确认；当前作为契约执行。
pub fn execution_mode(case: &TestCase) -> ExecutionMode {
    if case.test_code.is_some() {
        ExecutionMode::Driver
    } else {
        ExecutionMode::Stdin
    }
}

/// 输出归一化：只去掉一个尾部换行（连同其前面的 \r），其余字节原样保留
///
/// 契约的唯一正确性语义是精确匹配，不存在容差模式；
/// 浮点格式是目录作者的责任。
pub fn normalize_output(raw: &str) -> &str {
    let stripped = raw.strip_suffix('\n').unwrap_or(raw);
    stripped.strip_suffix('\r').unwrap_or(stripped)
}

/// 单用例比对：归一化后逐字节比较
pub fn case_passes(case: &TestCase, actual_output: &str) -> bool {
    normalize_output(actual_output) == normalize_output(&case.expected_output)
}

/// 校验测试集形状：至少一个用例，且至少一个可见用例
pub fn validate_suite(tests: &[TestCase]) -> Result<(), TestSuiteError> {
    if tests.is_empty() {
        return Err(TestSuiteError::Empty);
    }
    if tests.iter().all(|c| c.is_hidden) {
        return Err(TestSuiteError::NoVisibleCase);
    }
    Ok(())
}

/// 学习者可见的用例子集，隐藏用例绝不出现在返回值里
pub fn visible_cases(tests: &[TestCase]) -> Vec<&TestCase> {
    tests.iter().filter(|c| !c.is_hidden).collect()
}

/// 题目级判分
///
/// `actual_outputs` 是执行引擎按测试集顺序逐用例产出的原始 stdout。
/// 隐藏用例强制参与判分：只满足可见用例拿不到通过判定。
/// 输出数与用例数不符按缺失用例计为失败。
pub fn grade(tests: &[TestCase], actual_outputs: &[String]) -> Verdict {
    let mut passed_cases = 0;
    let mut hidden_failures = 0;
    let mut visible_results = Vec::new();

    for (index, case) in tests.iter().enumerate() {
        let passed = actual_outputs
            .get(index)
            .map(|out| case_passes(case, out))
            .unwrap_or(false);

        if passed {
            passed_cases += 1;
        } else if case.is_hidden {
            hidden_failures += 1;
        }

        if !case.is_hidden {
            visible_results.push(CaseResult {
                index,
                is_hidden: false,
                passed,
            });
        }
    }

    Verdict {
        passed: passed_cases == tests.len() && !tests.is_empty(),
        total_cases: tests.len(),
        passed_cases,
        visible_results,
        hidden_failures,
    }
}
