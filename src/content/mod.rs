// 内容目录模块
// 代码书写的课程内容：按周组织扁平题目数组，由主题切片划分。
// 顶层聚合函数构造不可变的 ContentCatalog 值传给同步引擎。

use crate::models::{
    ContentCatalog, CourseSpec, QuestionRange, QuestionSpec, TestCase, TopicSpec, WeekSpec,
};

fn case(input: &str, expected: &str) -> TestCase {
    TestCase {
        input: input.to_string(),
        expected_output: expected.to_string(),
        is_hidden: false,
        test_code: None,
    }
}

fn hidden(input: &str, expected: &str) -> TestCase {
    TestCase {
        is_hidden: true,
        ..case(input, expected)
    }
}

fn driver(code: &str, expected: &str) -> TestCase {
    TestCase {
        input: String::new(),
        expected_output: expected.to_string(),
        is_hidden: false,
        test_code: Some(code.to_string()),
    }
}

/// 第一周：输入输出与变量
fn week_one_questions() -> Vec<QuestionSpec> {
    vec![
        QuestionSpec {
            slug: "hello-world".to_string(),
            title: "你好，世界".to_string(),
            question_type: "full_program".to_string(),
            prompt: "编写程序，输出一行 Hello, World!".to_string(),
            constraints: None,
            difficulty: 1,
            estimated_minutes: 3,
            points: 5,
            starter_code: "# 在下面写你的代码\n".to_string(),
            solution_code: "print(\"Hello, World!\")\n".to_string(),
            tests: vec![case("", "Hello, World!"), hidden("", "Hello, World!")],
            hints: vec!["print 函数可以输出一行文本".to_string()],
            tags: vec!["io".to_string()],
        },
        QuestionSpec {
            slug: "echo-name".to_string(),
            title: "回显姓名".to_string(),
            question_type: "full_program".to_string(),
            prompt: "读入一行姓名，输出 你好, <姓名>!".to_string(),
            constraints: Some("姓名不含空格".to_string()),
            difficulty: 1,
            estimated_minutes: 5,
            points: 10,
            starter_code: "name = input()\n".to_string(),
            solution_code: "name = input()\nprint(f\"你好, {name}!\")\n".to_string(),
            tests: vec![
                case("小明\n", "你好, 小明!"),
                hidden("Alice\n", "你好, Alice!"),
            ],
            hints: vec![
                "input() 读入一行".to_string(),
                "f-string 可以拼接变量".to_string(),
            ],
            tags: vec!["io".to_string(), "string".to_string()],
        },
        QuestionSpec {
            slug: "sum-two".to_string(),
            title: "两数之和".to_string(),
            question_type: "full_program".to_string(),
            prompt: "读入两行整数，输出它们的和。".to_string(),
            constraints: Some("-10^9 <= a, b <= 10^9".to_string()),
            difficulty: 1,
            estimated_minutes: 5,
            points: 10,
            starter_code: "a = int(input())\nb = int(input())\n".to_string(),
            solution_code: "a = int(input())\nb = int(input())\nprint(a + b)\n".to_string(),
            tests: vec![
                case("1\n2\n", "3"),
                case("10\n-4\n", "6"),
                hidden("1000000000\n1000000000\n", "2000000000"),
            ],
            hints: vec!["int() 把字符串转成整数".to_string()],
            tags: vec!["math".to_string()],
        },
        QuestionSpec {
            slug: "predict-division".to_string(),
            title: "预测除法输出".to_string(),
            question_type: "predict_output".to_string(),
            prompt: "以下程序会输出什么？\n\nprint(7 // 2)\nprint(7 / 2)".to_string(),
            constraints: None,
            difficulty: 2,
            estimated_minutes: 3,
            points: 5,
            starter_code: String::new(),
            solution_code: "3\n3.5\n".to_string(),
            tests: vec![case("", "3\n3.5"), hidden("", "3\n3.5")],
            hints: vec!["// 是整除，/ 是浮点除法".to_string()],
            tags: vec!["operator".to_string()],
        },
        QuestionSpec {
            slug: "fix-swap".to_string(),
            title: "修复变量交换".to_string(),
            question_type: "fix_bug".to_string(),
            prompt: "下面的程序想交换 a、b 后输出，但结果不对，请修复。".to_string(),
            constraints: None,
            difficulty: 2,
            estimated_minutes: 8,
            points: 15,
            starter_code: "a = int(input())\nb = int(input())\na = b\nb = a\nprint(a, b)\n"
                .to_string(),
            solution_code: "a = int(input())\nb = int(input())\na, b = b, a\nprint(a, b)\n"
                .to_string(),
            tests: vec![case("1\n2\n", "2 1"), hidden("7\n7\n", "7 7")],
            hints: vec![
                "先赋值 a = b 之后，a 原来的值已经丢了".to_string(),
                "Python 支持 a, b = b, a".to_string(),
            ],
            tags: vec!["variable".to_string()],
        },
    ]
}

fn week_one() -> WeekSpec {
    WeekSpec {
        week_number: 1,
        title: "输入输出与变量".to_string(),
        summary: Some("print、input 与基本运算".to_string()),
        topics: vec![
            TopicSpec {
                slug: "first-steps".to_string(),
                title: "第一步".to_string(),
                intro_markdown: Some(
                    "# 第一步\n\n每个程序都从输出一行文本开始。\
                     本节先熟悉 `print` 与 `input`。"
                        .to_string(),
                ),
                question_range: QuestionRange::new(0, 3),
            },
            TopicSpec {
                slug: "operators".to_string(),
                title: "运算符".to_string(),
                intro_markdown: Some(
                    "# 运算符\n\n整除、浮点除法与多重赋值的细节。".to_string(),
                ),
                question_range: QuestionRange::new(3, 5),
            },
        ],
        questions: week_one_questions(),
    }
}

/// 第二周：函数
///
/// 后半程题目开始使用 test_code 驱动注入：提交代码作为定义库，
/// 由用例自带的驱动语句做多组独立调用。
fn week_two_questions() -> Vec<QuestionSpec> {
    vec![
        QuestionSpec {
            slug: "define-add".to_string(),
            title: "定义加法函数".to_string(),
            question_type: "function".to_string(),
            prompt: "定义函数 add(a, b)，返回两数之和。不要自己写输入输出。".to_string(),
            constraints: None,
            difficulty: 2,
            estimated_minutes: 8,
            points: 15,
            starter_code: "def add(a, b):\n    pass\n".to_string(),
            solution_code: "def add(a, b):\n    return a + b\n".to_string(),
            tests: vec![
                driver("print(add(2, 3))", "5"),
                driver("print(add(-1, 1))", "0"),
                TestCase {
                    input: String::new(),
                    expected_output: "2000000000".to_string(),
                    is_hidden: true,
                    test_code: Some("print(add(10**9, 10**9))".to_string()),
                },
            ],
            hints: vec!["return 而不是 print".to_string()],
            tags: vec!["function".to_string()],
        },
        QuestionSpec {
            slug: "define-max3".to_string(),
            title: "三数取最大".to_string(),
            question_type: "function".to_string(),
            prompt: "定义函数 max3(a, b, c)，返回三个数中的最大值，不使用内置 max。"
                .to_string(),
            constraints: Some("禁止调用内置 max".to_string()),
            difficulty: 3,
            estimated_minutes: 10,
            points: 20,
            starter_code: "def max3(a, b, c):\n    pass\n".to_string(),
            solution_code: "def max3(a, b, c):\n    m = a\n    if b > m:\n        m = b\n    if c > m:\n        m = c\n    return m\n"
                .to_string(),
            tests: vec![
                driver("print(max3(1, 2, 3))", "3"),
                driver("print(max3(5, 5, 5))", "5"),
                TestCase {
                    input: String::new(),
                    expected_output: "-1".to_string(),
                    is_hidden: true,
                    test_code: Some("print(max3(-3, -1, -2))".to_string()),
                },
            ],
            hints: vec![
                "先假定第一个数最大".to_string(),
                "逐个比较并更新".to_string(),
            ],
            tags: vec!["function".to_string(), "condition".to_string()],
        },
    ]
}

fn week_two() -> WeekSpec {
    WeekSpec {
        week_number: 2,
        title: "函数".to_string(),
        summary: Some("定义与调用函数，驱动注入判题".to_string()),
        topics: vec![TopicSpec {
            slug: "functions-intro".to_string(),
            title: "函数入门".to_string(),
            intro_markdown: Some(
                "# 函数入门\n\n把重复的逻辑收进函数。\
                 本节题目只需提交定义，调用由判题驱动完成。"
                    .to_string(),
            ),
            question_range: QuestionRange::new(0, 2),
        }],
        questions: week_two_questions(),
    }
}

/// 顶层聚合：构造整个内容目录
pub fn catalog() -> ContentCatalog {
    ContentCatalog {
        courses: vec![CourseSpec {
            slug: "python-basics".to_string(),
            name: "Python 编程基础".to_string(),
            description: "面向零基础学习者的 Python 入门课程".to_string(),
            language: "python".to_string(),
            is_locked: false,
            weeks: vec![week_one(), week_two()],
        }],
    }
}
