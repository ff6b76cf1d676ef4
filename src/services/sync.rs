// 同步引擎模块
// 将内容目录自上而下幂等投影到持久层：课程 → 周 → 主题 → 题目
// 子实体的 upsert 依赖父实体已解析的身份，顺序是正确性要求而非优化

use crate::models::ContentCatalog;
use crate::services::catalog::{self, ContentError};
use crate::services::database::DatabaseService;
use anyhow::Result;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// 单类实体的计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounters {
    pub created: usize,
    pub updated: usize,
    pub rejected: usize,
}

impl EntityCounters {
    fn record(&mut self, created: bool) {
        if created {
            self.created += 1;
        } else {
            self.updated += 1;
        }
    }
}

impl std::fmt::Display for EntityCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "新建 {} / 更新 {} / 拒绝 {}",
            self.created, self.updated, self.rejected
        )
    }
}

/// 一次同步运行的汇总报告
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub courses: EntityCounters,
    pub weeks: EntityCounters,
    pub topics: EntityCounters,
    pub questions: EntityCounters,
    /// 本次被软删除（目录中已移除）的题目数
    pub deactivated_questions: usize,
    /// 被拒绝实体的明细，自然键 + 违反的约束
    pub rejections: Vec<ContentError>,
}

impl SyncReport {
    /// 有任何内容被拒绝即为部分失败，进程应以非零码退出
    pub fn has_rejections(&self) -> bool {
        !self.rejections.is_empty()
    }

    /// 运维日志输出：每类实体一行计数，每条拒绝一行诊断
    pub fn log_summary(&self) {
        info!("课程: {}", self.courses);
        info!("周:   {}", self.weeks);
        info!("主题: {}", self.topics);
        info!("题目: {}", self.questions);
        if self.deactivated_questions > 0 {
            info!("下架题目: {}", self.deactivated_questions);
        }
        for rejection in &self.rejections {
            warn!("已拒绝 {}", rejection);
        }
    }
}

/// 同步引擎
pub struct SyncEngine<'a> {
    db: &'a DatabaseService,
}

impl<'a> SyncEngine<'a> {
    pub fn new(db: &'a DatabaseService) -> Self {
        Self { db }
    }

    /// 同步整个目录
    ///
    /// 身份冲突（自然键在目录内重复）与存储层故障是致命错误；
    /// 实体级内容错误只跳过该实体并记入报告，兄弟节点继续。
    /// 所有写入都是幂等 upsert，失败后整次重跑是安全的。
    pub fn sync(&self, catalog_value: &ContentCatalog) -> Result<SyncReport> {
        catalog::check_duplicate_keys(catalog_value)?;

        let mut report = SyncReport::default();

        for (course_index, course) in catalog_value.courses.iter().enumerate() {
            let course_outcome = self.db.upsert_course(course, course_index as i64)?;
            report.courses.record(course_outcome.created);
            info!(
                "同步课程 {} ({} 周)",
                course.slug,
                course.weeks.len()
            );

            for (week_index, week) in course.weeks.iter().enumerate() {
                let week_key = format!("{}/week-{}", course.slug, week.week_number);
                let week_outcome = self.db.upsert_week(&course_outcome.id, week, week_index as i64)?;
                report.weeks.record(week_outcome.created);

                // 切片分区被破坏时整个子树不可归属，周行本身保留
                if let Err(err) = catalog::validate_week_partition(week, &week_key) {
                    report.topics.rejected += week.topics.len();
                    report.questions.rejected += week.questions.len();
                    report.rejections.push(err);
                    continue;
                }

                for (topic_index, topic) in week.topics.iter().enumerate() {
                    let topic_outcome =
                        self.db.upsert_topic(&week_outcome.id, topic, topic_index as i64)?;
                    report.topics.record(topic_outcome.created);

                    let slice =
                        &week.questions[topic.question_range.start..topic.question_range.end];

                    for (offset, question) in slice.iter().enumerate() {
                        let question_key =
                            format!("{}/{}/{}", week_key, topic.slug, question.slug);

                        let question_type = match catalog::validate_question(question, &question_key)
                        {
                            Ok(qt) => qt,
                            Err(err) => {
                                report.questions.rejected += 1;
                                report.rejections.push(err);
                                continue;
                            }
                        };

                        // 排序号纯粹来自切片内位置，每次运行重算
                        let question_outcome = self.db.upsert_question(
                            &topic_outcome.id,
                            question,
                            question_type,
                            offset as i64,
                        )?;
                        report.questions.record(question_outcome.created);
                    }

                    // 软删除清扫：目录里还在的 slug（含被拒绝的）保持现状，
                    // 其余标记下架
                    let keep_slugs: Vec<&str> =
                        slice.iter().map(|q| q.slug.as_str()).collect();
                    report.deactivated_questions += self
                        .db
                        .deactivate_missing_questions(&topic_outcome.id, &keep_slugs)?;
                }
            }
        }

        Ok(report)
    }
}
