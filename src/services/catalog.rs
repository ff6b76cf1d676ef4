// 目录校验模块
// 同步前对作者书写的内容目录做两类检查：
// 自然键重复（致命，中止整次运行）与实体级内容形状错误（可恢复，跳过并上报）

use crate::models::{ContentCatalog, QuestionSpec, QuestionType, WeekSpec};
use crate::services::contract;
use anyhow::{bail, Result};
use regex::Regex;
use std::collections::HashSet;

/// 实体类别，用于报告分桶
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Course,
    Week,
    Topic,
    Question,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Course => "course",
            EntityKind::Week => "week",
            EntityKind::Topic => "topic",
            EntityKind::Question => "question",
        }
    }
}

/// 内容形状错误：实体级可恢复，跳过该实体继续兄弟节点
#[derive(Debug, Clone, PartialEq)]
pub struct ContentError {
    pub kind: EntityKind,
    /// 出错实体的自然键路径，如 py-basics/week-1/loops/sum-two
    pub natural_key: String,
    pub reason: ContentErrorReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentErrorReason {
    /// tests 为空或没有任何可见用例
    TestSuite(contract::TestSuiteError),
    /// question_type 不在已知枚举内
    UnknownQuestionType(String),
    /// slug 不符合格式要求
    BadSlug(String),
    /// 难度序数超出 1-5
    DifficultyOutOfRange(i32),
    /// 周的主题切片没有无缝无重叠覆盖题目数组
    RangePartition(String),
}

impl std::fmt::Display for ContentErrorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentErrorReason::TestSuite(e) => write!(f, "{}", e),
            ContentErrorReason::UnknownQuestionType(t) => {
                write!(f, "未知题目类型 {:?}", t)
            }
            ContentErrorReason::BadSlug(s) => write!(f, "非法 slug {:?}", s),
            ContentErrorReason::DifficultyOutOfRange(d) => {
                write!(f, "难度 {} 超出 1-5", d)
            }
            ContentErrorReason::RangePartition(detail) => {
                write!(f, "主题切片未覆盖题目数组: {}", detail)
            }
        }
    }
}

impl std::fmt::Display for ContentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.kind.as_str(), self.natural_key, self.reason)
    }
}

/// slug 格式：小写字母数字加连字符
pub fn is_valid_slug(slug: &str) -> bool {
    let pattern = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
    pattern.is_match(slug)
}

/// 致命校验：同一作用域内自然键重复
///
/// 重复的 (父, slug) 意味着身份解析有歧义——默默取其一会破坏排序，
/// 并让被丢弃一方关联的进度数据成为孤儿，因此整次运行中止。
pub fn check_duplicate_keys(catalog: &ContentCatalog) -> Result<()> {
    let mut course_slugs = HashSet::new();
    for course in &catalog.courses {
        if !course_slugs.insert(course.slug.as_str()) {
            bail!("课程 slug 重复: {:?}", course.slug);
        }

        let mut week_numbers = HashSet::new();
        for week in &course.weeks {
            if !week_numbers.insert(week.week_number) {
                bail!("课程 {} 周编号重复: {}", course.slug, week.week_number);
            }

            let mut topic_slugs = HashSet::new();
            for topic in &week.topics {
                if !topic_slugs.insert(topic.slug.as_str()) {
                    bail!(
                        "课程 {} 第 {} 周主题 slug 重复: {:?}",
                        course.slug,
                        week.week_number,
                        topic.slug
                    );
                }

                // 切片越界时留给分区校验上报，这里只查合法切片内的重复
                let Some(slice) = week
                    .questions
                    .get(topic.question_range.start..topic.question_range.end.min(week.questions.len()))
                else {
                    continue;
                };
                let mut question_slugs = HashSet::new();
                for question in slice {
                    if !question_slugs.insert(question.slug.as_str()) {
                        bail!(
                            "课程 {} 第 {} 周主题 {} 题目 slug 重复: {:?}",
                            course.slug,
                            week.week_number,
                            topic.slug,
                            question.slug
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

/// 周级校验：主题切片必须按主题书写顺序首尾相接，
/// 恰好覆盖 [0, 题目总数)
pub fn validate_week_partition(week: &WeekSpec, natural_key: &str) -> Result<(), ContentError> {
    let total = week.questions.len();
    let err = |detail: String| ContentError {
        kind: EntityKind::Week,
        natural_key: natural_key.to_string(),
        reason: ContentErrorReason::RangePartition(detail),
    };

    let mut cursor = 0usize;
    for topic in &week.topics {
        let range = topic.question_range;
        if range.end < range.start {
            return Err(err(format!(
                "主题 {} 区间 [{}, {}) 终点小于起点",
                topic.slug, range.start, range.end
            )));
        }
        if range.start != cursor {
            return Err(err(format!(
                "主题 {} 起点 {}，期望 {}（空缺或重叠）",
                topic.slug, range.start, cursor
            )));
        }
        cursor = range.end;
    }

    if cursor != total {
        return Err(err(format!(
            "切片覆盖到 {}，题目总数 {}",
            cursor, total
        )));
    }
    Ok(())
}

/// 题目级校验，通过时返回解析好的类型枚举
pub fn validate_question(
    question: &QuestionSpec,
    natural_key: &str,
) -> Result<QuestionType, ContentError> {
    let err = |reason: ContentErrorReason| ContentError {
        kind: EntityKind::Question,
        natural_key: natural_key.to_string(),
        reason,
    };

    if !is_valid_slug(&question.slug) {
        return Err(err(ContentErrorReason::BadSlug(question.slug.clone())));
    }

    let question_type = QuestionType::parse(&question.question_type).ok_or_else(|| {
        err(ContentErrorReason::UnknownQuestionType(
            question.question_type.clone(),
        ))
    })?;

    if !(1..=5).contains(&question.difficulty) {
        return Err(err(ContentErrorReason::DifficultyOutOfRange(
            question.difficulty,
        )));
    }

    contract::validate_suite(&question.tests)
        .map_err(|e| err(ContentErrorReason::TestSuite(e)))?;

    Ok(question_type)
}
