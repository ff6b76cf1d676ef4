// 数据库服务模块
// 提供 SQLite 持久层：自然键幂等 upsert、软删除清扫与面向评测/看板的读取接口

use crate::models::{
    AchievementSpec, CourseSpec, QuestionSpec, QuestionType, TestCase, TopicSpec, WeekSpec,
};
use crate::utils;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// 单次 upsert 的结果：解析到的稳定身份 + 是否新建
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: String,
    pub created: bool,
}

/// 题目持久化行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRow {
    pub id: String,
    pub topic_id: String,
    pub slug: String,
    pub title: String,
    pub question_type: QuestionType,
    pub prompt: String,
    pub constraints: Option<String>,
    pub difficulty: i32,
    pub estimated_minutes: i32,
    pub points: i32,
    pub starter_code: String,
    pub solution_code: String,
    pub tests: Vec<TestCase>,
    pub hints: Vec<String>,
    pub tags: Vec<String>,
    pub order_index: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 课程持久化行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRow {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub language: String,
    pub order_index: i64,
    pub is_locked: bool,
}

/// 周持久化行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekRow {
    pub id: String,
    pub course_id: String,
    pub week_number: i32,
    pub title: String,
    pub summary: Option<String>,
    pub order_index: i64,
}

/// 主题持久化行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRow {
    pub id: String,
    pub week_id: String,
    pub slug: String,
    pub title: String,
    pub intro_markdown: Option<String>,
    pub order_index: i64,
}

/// 评测引擎读取的打包数据：测试集 + 脚手架代码
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingBundle {
    pub question_id: String,
    pub starter_code: String,
    pub solution_code: String,
    pub tests: Vec<TestCase>,
}

/// 数据库服务
pub struct DatabaseService {
    pool: Arc<Mutex<Connection>>,
}

impl DatabaseService {
    /// 按默认路径打开数据库并建表
    pub fn new() -> Result<Self> {
        Self::open(&utils::get_database_path())
    }

    /// 打开指定路径的数据库
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("创建数据目录失败: {}", parent.display()))?;
            }
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("打开数据库失败: {}", db_path.display()))?;
        Self::from_connection(conn)
    }

    /// 内存数据库，测试用
    pub fn new_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let service = Self {
            pool: Arc::new(Mutex::new(conn)),
        };
        service.initialize()?;
        Ok(service)
    }

    /// 初始化表结构
    ///
    /// 每个自然键落成 UNIQUE 约束，既是 upsert 的冲突目标，
    /// 也是并发运行时的防重入口。
    pub fn initialize(&self) -> Result<()> {
        let conn = self.pool.lock().unwrap();

        // Enable WAL mode for better concurrency
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS courses (
                id TEXT PRIMARY KEY,
                slug TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                language TEXT NOT NULL,
                order_index INTEGER NOT NULL,
                is_locked INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS weeks (
                id TEXT PRIMARY KEY,
                course_id TEXT NOT NULL,
                week_number INTEGER NOT NULL,
                title TEXT NOT NULL,
                summary TEXT,
                order_index INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(course_id, week_number),
                FOREIGN KEY (course_id) REFERENCES courses(id)
            );

            CREATE TABLE IF NOT EXISTS topics (
                id TEXT PRIMARY KEY,
                week_id TEXT NOT NULL,
                slug TEXT NOT NULL,
                title TEXT NOT NULL,
                intro_markdown TEXT,
                order_index INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(week_id, slug),
                FOREIGN KEY (week_id) REFERENCES weeks(id)
            );

            CREATE TABLE IF NOT EXISTS questions (
                id TEXT PRIMARY KEY,
                topic_id TEXT NOT NULL,
                slug TEXT NOT NULL,
                title TEXT NOT NULL,
                question_type TEXT NOT NULL CHECK(question_type IN
                    ('full_program', 'function', 'fix_bug', 'predict_output')),
                prompt TEXT NOT NULL,
                constraints TEXT,
                difficulty INTEGER NOT NULL CHECK(difficulty BETWEEN 1 AND 5),
                estimated_minutes INTEGER NOT NULL,
                points INTEGER NOT NULL,
                starter_code TEXT NOT NULL,
                solution_code TEXT NOT NULL,
                tests TEXT NOT NULL,
                hints TEXT NOT NULL,
                tags TEXT NOT NULL,
                order_index INTEGER NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(topic_id, slug),
                FOREIGN KEY (topic_id) REFERENCES topics(id)
            );

            CREATE TABLE IF NOT EXISTS achievements (
                id TEXT PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                criteria TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS enrollments (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                course_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(user_id, course_id),
                FOREIGN KEY (course_id) REFERENCES courses(id)
            );

            CREATE TABLE IF NOT EXISTS attempts (
                id TEXT PRIMARY KEY,
                question_id TEXT NOT NULL,
                submitted_code TEXT NOT NULL,
                passed INTEGER NOT NULL DEFAULT 0,
                score INTEGER NOT NULL DEFAULT 0,
                time_spent_seconds INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                FOREIGN KEY (question_id) REFERENCES questions(id)
            );

            CREATE INDEX IF NOT EXISTS idx_weeks_course ON weeks(course_id, order_index);
            CREATE INDEX IF NOT EXISTS idx_topics_week ON topics(week_id, order_index);
            CREATE INDEX IF NOT EXISTS idx_questions_topic ON questions(topic_id, order_index);
            CREATE INDEX IF NOT EXISTS idx_questions_active ON questions(is_active);
            CREATE INDEX IF NOT EXISTS idx_attempts_question ON attempts(question_id);
        ",
        )?;

        Ok(())
    }

    // ==================== 幂等 upsert ====================
    //
    // 统一套路：INSERT … ON CONFLICT(自然键) DO UPDATE … RETURNING id, created_at。
    // 单条条件写入，不做先读后写；冲突时保留原 id 与 created_at，
    // 返回的 created_at 等于本次写入时间戳即说明是新建行。

    /// 按 slug upsert 课程，返回稳定身份
    pub fn upsert_course(&self, course: &CourseSpec, order_index: i64) -> Result<UpsertOutcome> {
        let conn = self.pool.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let (id, created_at): (String, String) = conn
            .query_row(
                "INSERT INTO courses
                     (id, slug, name, description, language, order_index, is_locked,
                      created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                 ON CONFLICT(slug) DO UPDATE SET
                     name = excluded.name,
                     description = excluded.description,
                     language = excluded.language,
                     order_index = excluded.order_index,
                     is_locked = excluded.is_locked,
                     updated_at = excluded.updated_at
                 RETURNING id, created_at",
                params![
                    Uuid::new_v4().to_string(),
                    course.slug,
                    course.name,
                    course.description,
                    course.language,
                    order_index,
                    course.is_locked as i32,
                    now,
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .with_context(|| format!("upsert 课程失败: {}", course.slug))?;

        Ok(UpsertOutcome {
            id,
            created: created_at == now,
        })
    }

    /// 按 (course_id, week_number) upsert 周
    pub fn upsert_week(
        &self,
        course_id: &str,
        week: &WeekSpec,
        order_index: i64,
    ) -> Result<UpsertOutcome> {
        let conn = self.pool.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let (id, created_at): (String, String) = conn
            .query_row(
                "INSERT INTO weeks
                     (id, course_id, week_number, title, summary, order_index,
                      created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                 ON CONFLICT(course_id, week_number) DO UPDATE SET
                     title = excluded.title,
                     summary = excluded.summary,
                     order_index = excluded.order_index,
                     updated_at = excluded.updated_at
                 RETURNING id, created_at",
                params![
                    Uuid::new_v4().to_string(),
                    course_id,
                    week.week_number,
                    week.title,
                    week.summary,
                    order_index,
                    now,
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .with_context(|| format!("upsert 周失败: week-{}", week.week_number))?;

        Ok(UpsertOutcome {
            id,
            created: created_at == now,
        })
    }

    /// 按 (week_id, slug) upsert 主题，intro_markdown 无条件覆盖
    pub fn upsert_topic(
        &self,
        week_id: &str,
        topic: &TopicSpec,
        order_index: i64,
    ) -> Result<UpsertOutcome> {
        let conn = self.pool.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let (id, created_at): (String, String) = conn
            .query_row(
                "INSERT INTO topics
                     (id, week_id, slug, title, intro_markdown, order_index,
                      created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                 ON CONFLICT(week_id, slug) DO UPDATE SET
                     title = excluded.title,
                     intro_markdown = excluded.intro_markdown,
                     order_index = excluded.order_index,
                     updated_at = excluded.updated_at
                 RETURNING id, created_at",
                params![
                    Uuid::new_v4().to_string(),
                    week_id,
                    topic.slug,
                    topic.title,
                    topic.intro_markdown,
                    order_index,
                    now,
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .with_context(|| format!("upsert 主题失败: {}", topic.slug))?;

        Ok(UpsertOutcome {
            id,
            created: created_at == now,
        })
    }

    /// 按 (topic_id, slug) upsert 题目
    ///
    /// 覆盖全部可变字段并强制 is_active = 1：
    /// 下架后重新回到目录的题目必须复活。
    pub fn upsert_question(
        &self,
        topic_id: &str,
        question: &QuestionSpec,
        question_type: QuestionType,
        order_index: i64,
    ) -> Result<UpsertOutcome> {
        let conn = self.pool.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let tests_json = serde_json::to_string(&question.tests)?;
        let hints_json = serde_json::to_string(&question.hints)?;
        let tags_json = serde_json::to_string(&question.tags)?;

        let (id, created_at): (String, String) = conn
            .query_row(
                "INSERT INTO questions
                     (id, topic_id, slug, title, question_type, prompt, constraints,
                      difficulty, estimated_minutes, points, starter_code, solution_code,
                      tests, hints, tags, order_index, is_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                         ?13, ?14, ?15, ?16, 1, ?17, ?17)
                 ON CONFLICT(topic_id, slug) DO UPDATE SET
                     title = excluded.title,
                     question_type = excluded.question_type,
                     prompt = excluded.prompt,
                     constraints = excluded.constraints,
                     difficulty = excluded.difficulty,
                     estimated_minutes = excluded.estimated_minutes,
                     points = excluded.points,
                     starter_code = excluded.starter_code,
                     solution_code = excluded.solution_code,
                     tests = excluded.tests,
                     hints = excluded.hints,
                     tags = excluded.tags,
                     order_index = excluded.order_index,
                     is_active = 1,
                     updated_at = excluded.updated_at
                 RETURNING id, created_at",
                params![
                    Uuid::new_v4().to_string(),
                    topic_id,
                    question.slug,
                    question.title,
                    question_type.as_str(),
                    question.prompt,
                    question.constraints,
                    question.difficulty,
                    question.estimated_minutes,
                    question.points,
                    question.starter_code,
                    question.solution_code,
                    tests_json,
                    hints_json,
                    tags_json,
                    order_index,
                    now,
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .with_context(|| format!("upsert 题目失败: {}", question.slug))?;

        Ok(UpsertOutcome {
            id,
            created: created_at == now,
        })
    }

    /// 软删除清扫：主题下不在目录里的题目标记 is_active = 0
    ///
    /// 绝不物理删除，进度数据仍以外键引用这些行。返回本次标记的行数。
    pub fn deactivate_missing_questions(
        &self,
        topic_id: &str,
        keep_slugs: &[&str],
    ) -> Result<usize> {
        let conn = self.pool.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let placeholders = (0..keep_slugs.len())
            .map(|i| format!("?{}", i + 3))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE questions SET is_active = 0, updated_at = ?1
             WHERE topic_id = ?2 AND is_active = 1 AND slug NOT IN ({})",
            placeholders
        );

        let mut values: Vec<&str> = Vec::with_capacity(keep_slugs.len() + 2);
        values.push(&now);
        values.push(topic_id);
        values.extend_from_slice(keep_slugs);
        let changed = conn.execute(&sql, params_from_iter(values))?;
        Ok(changed)
    }

    // ==================== 成就与报名 ====================

    /// 按 code upsert 成就定义
    pub fn upsert_achievement(&self, achievement: &AchievementSpec) -> Result<UpsertOutcome> {
        let conn = self.pool.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let criteria_json = serde_json::to_string(&achievement.criteria)?;

        let (id, created_at): (String, String) = conn
            .query_row(
                "INSERT INTO achievements
                     (id, code, name, description, criteria, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 ON CONFLICT(code) DO UPDATE SET
                     name = excluded.name,
                     description = excluded.description,
                     criteria = excluded.criteria,
                     updated_at = excluded.updated_at
                 RETURNING id, created_at",
                params![
                    Uuid::new_v4().to_string(),
                    achievement.code,
                    achievement.name,
                    achievement.description,
                    criteria_json,
                    now,
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .with_context(|| format!("upsert 成就失败: {}", achievement.code))?;

        Ok(UpsertOutcome {
            id,
            created: created_at == now,
        })
    }

    /// 按 (user_id, course_id) upsert 报名关系
    pub fn upsert_enrollment(&self, user_id: &str, course_id: &str) -> Result<UpsertOutcome> {
        let conn = self.pool.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let (id, created_at): (String, String) = conn.query_row(
            "INSERT INTO enrollments (id, user_id, course_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(user_id, course_id) DO UPDATE SET
                 updated_at = excluded.updated_at
             RETURNING id, created_at",
            params![Uuid::new_v4().to_string(), user_id, course_id, now],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(UpsertOutcome {
            id,
            created: created_at == now,
        })
    }

    // ==================== 学习进度 ====================

    /// 记录一次提交，返回新记录 id
    pub fn record_attempt(
        &self,
        question_id: &str,
        submitted_code: &str,
        passed: bool,
        score: i32,
        time_spent_seconds: i32,
    ) -> Result<String> {
        let conn = self.pool.lock().unwrap();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO attempts
                 (id, question_id, submitted_code, passed, score, time_spent_seconds, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![id, question_id, submitted_code, passed as i32, score, time_spent_seconds, now],
        )?;

        Ok(id)
    }

    /// 题目的提交次数
    pub fn count_attempts(&self, question_id: &str) -> Result<i64> {
        let conn = self.pool.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM attempts WHERE question_id = ?1",
            params![question_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ==================== 读取接口 ====================

    /// 评测引擎读取：某题目的有序测试集与脚手架代码
    pub fn get_grading_bundle(&self, question_id: &str) -> Result<Option<GradingBundle>> {
        let conn = self.pool.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT id, starter_code, solution_code, tests
                 FROM questions WHERE id = ?1",
                params![question_id],
                |row| {
                    let tests_raw: String = row.get(3)?;
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        tests_raw,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((question_id, starter_code, solution_code, tests_raw)) => {
                let tests: Vec<TestCase> = serde_json::from_str(&tests_raw)
                    .with_context(|| format!("题目 {} 的 tests 列无法解析", question_id))?;
                Ok(Some(GradingBundle {
                    question_id,
                    starter_code,
                    solution_code,
                    tests,
                }))
            }
            None => Ok(None),
        }
    }

    /// 按自然键取题目行
    pub fn get_question_by_key(&self, topic_id: &str, slug: &str) -> Result<Option<QuestionRow>> {
        let conn = self.pool.lock().unwrap();
        let row = conn
            .query_row(
                &format!("{} WHERE topic_id = ?1 AND slug = ?2", QUESTION_SELECT),
                params![topic_id, slug],
                Self::row_to_question,
            )
            .optional()?;
        Ok(row)
    }

    /// 看板读取：主题下的活跃题目，按 order_index 排序
    pub fn list_active_questions(&self, topic_id: &str) -> Result<Vec<QuestionRow>> {
        let conn = self.pool.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "{} WHERE topic_id = ?1 AND is_active = 1 ORDER BY order_index",
            QUESTION_SELECT
        ))?;
        let rows = stmt.query_map(params![topic_id], Self::row_to_question)?;

        let mut questions = Vec::new();
        for row in rows {
            questions.push(row?);
        }
        Ok(questions)
    }

    /// 主题下全部题目（含下架），测试与运维排查用
    pub fn list_all_questions(&self, topic_id: &str) -> Result<Vec<QuestionRow>> {
        let conn = self.pool.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "{} WHERE topic_id = ?1 ORDER BY order_index",
            QUESTION_SELECT
        ))?;
        let rows = stmt.query_map(params![topic_id], Self::row_to_question)?;

        let mut questions = Vec::new();
        for row in rows {
            questions.push(row?);
        }
        Ok(questions)
    }

    /// 看板读取：全部课程，按 order_index 排序
    pub fn list_courses(&self) -> Result<Vec<CourseRow>> {
        let conn = self.pool.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, slug, name, description, language, order_index, is_locked
             FROM courses ORDER BY order_index",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CourseRow {
                id: row.get(0)?,
                slug: row.get(1)?,
                name: row.get(2)?,
                description: row.get(3)?,
                language: row.get(4)?,
                order_index: row.get(5)?,
                is_locked: row.get::<_, i32>(6)? != 0,
            })
        })?;

        let mut courses = Vec::new();
        for row in rows {
            courses.push(row?);
        }
        Ok(courses)
    }

    /// 课程下的周列表，按 order_index 排序（与 week_number 无关）
    pub fn list_weeks(&self, course_id: &str) -> Result<Vec<WeekRow>> {
        let conn = self.pool.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, course_id, week_number, title, summary, order_index
             FROM weeks WHERE course_id = ?1 ORDER BY order_index",
        )?;
        let rows = stmt.query_map(params![course_id], |row| {
            Ok(WeekRow {
                id: row.get(0)?,
                course_id: row.get(1)?,
                week_number: row.get(2)?,
                title: row.get(3)?,
                summary: row.get(4)?,
                order_index: row.get(5)?,
            })
        })?;

        let mut weeks = Vec::new();
        for row in rows {
            weeks.push(row?);
        }
        Ok(weeks)
    }

    /// 周下的主题列表，按 order_index 排序
    pub fn list_topics(&self, week_id: &str) -> Result<Vec<TopicRow>> {
        let conn = self.pool.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, week_id, slug, title, intro_markdown, order_index
             FROM topics WHERE week_id = ?1 ORDER BY order_index",
        )?;
        let rows = stmt.query_map(params![week_id], |row| {
            Ok(TopicRow {
                id: row.get(0)?,
                week_id: row.get(1)?,
                slug: row.get(2)?,
                title: row.get(3)?,
                intro_markdown: row.get(4)?,
                order_index: row.get(5)?,
            })
        })?;

        let mut topics = Vec::new();
        for row in rows {
            topics.push(row?);
        }
        Ok(topics)
    }

    /// 主题介绍渲染为 HTML，看板展示用
    pub fn get_topic_intro_html(&self, topic_id: &str) -> Result<Option<String>> {
        let conn = self.pool.lock().unwrap();
        let intro: Option<Option<String>> = conn
            .query_row(
                "SELECT intro_markdown FROM topics WHERE id = ?1",
                params![topic_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(intro
            .flatten()
            .map(|markdown| utils::markdown_to_html(&markdown)))
    }

    // ==================== 辅助方法 ====================

    /// 从数据库行转换为 QuestionRow
    fn row_to_question(row: &Row) -> rusqlite::Result<QuestionRow> {
        let question_type_raw: String = row.get(4)?;
        let tests_raw: String = row.get(12)?;
        let hints_raw: String = row.get(13)?;
        let tags_raw: String = row.get(14)?;

        Ok(QuestionRow {
            id: row.get(0)?,
            topic_id: row.get(1)?,
            slug: row.get(2)?,
            title: row.get(3)?,
            question_type: QuestionType::from_db(&question_type_raw),
            prompt: row.get(5)?,
            constraints: row.get(6)?,
            difficulty: row.get(7)?,
            estimated_minutes: row.get(8)?,
            points: row.get(9)?,
            starter_code: row.get(10)?,
            solution_code: row.get(11)?,
            tests: parse_json_column(12, &tests_raw)?,
            hints: parse_json_column(13, &hints_raw)?,
            tags: parse_json_column(14, &tags_raw)?,
            order_index: row.get(15)?,
            is_active: row.get::<_, i32>(16)? != 0,
            created_at: parse_time_column(17, &row.get::<_, String>(17)?)?,
            updated_at: parse_time_column(18, &row.get::<_, String>(18)?)?,
        })
    }
}

const QUESTION_SELECT: &str = "SELECT id, topic_id, slug, title, question_type, prompt, \
     constraints, difficulty, estimated_minutes, points, starter_code, solution_code, \
     tests, hints, tags, order_index, is_active, created_at, updated_at FROM questions";

/// JSON TEXT 列解码，解析失败映射为 rusqlite 转换错误
fn parse_json_column<T: serde::de::DeserializeOwned>(
    index: usize,
    raw: &str,
) -> rusqlite::Result<T> {
    serde_json::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// RFC 3339 TEXT 列解码
fn parse_time_column(index: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AchievementCriteria;

    fn sample_course(slug: &str) -> CourseSpec {
        CourseSpec {
            slug: slug.to_string(),
            name: "Python 基础".to_string(),
            description: "入门课程".to_string(),
            language: "python".to_string(),
            is_locked: false,
            weeks: vec![],
        }
    }

    fn sample_week(number: i32) -> WeekSpec {
        WeekSpec {
            week_number: number,
            title: format!("第 {} 周", number),
            summary: None,
            topics: vec![],
            questions: vec![],
        }
    }

    fn sample_topic(slug: &str) -> TopicSpec {
        TopicSpec {
            slug: slug.to_string(),
            title: slug.to_string(),
            intro_markdown: Some("# 循环\n\n先看示例".to_string()),
            question_range: crate::models::QuestionRange::new(0, 0),
        }
    }

    fn sample_question(slug: &str) -> QuestionSpec {
        QuestionSpec {
            slug: slug.to_string(),
            title: slug.to_string(),
            question_type: "full_program".to_string(),
            prompt: "输出 42".to_string(),
            constraints: None,
            difficulty: 1,
            estimated_minutes: 5,
            points: 10,
            starter_code: String::new(),
            solution_code: "print(42)".to_string(),
            tests: vec![TestCase {
                input: String::new(),
                expected_output: "42".to_string(),
                is_hidden: false,
                test_code: None,
            }],
            hints: vec!["用 print".to_string()],
            tags: vec!["io".to_string()],
        }
    }

    #[test]
    fn test_course_upsert_is_idempotent() {
        let db = DatabaseService::new_in_memory().unwrap();
        let first = db.upsert_course(&sample_course("py-basics"), 0).unwrap();
        assert!(first.created);

        let second = db.upsert_course(&sample_course("py-basics"), 0).unwrap();
        assert!(!second.created);
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn test_course_update_overwrites_fields() {
        let db = DatabaseService::new_in_memory().unwrap();
        let outcome = db.upsert_course(&sample_course("py-basics"), 0).unwrap();

        let mut edited = sample_course("py-basics");
        edited.name = "Python 基础（修订）".to_string();
        let again = db.upsert_course(&edited, 3).unwrap();
        assert_eq!(outcome.id, again.id);

        let conn = db.pool.lock().unwrap();
        let (name, order_index): (String, i64) = conn
            .query_row(
                "SELECT name, order_index FROM courses WHERE slug = 'py-basics'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(name, "Python 基础（修订）");
        assert_eq!(order_index, 3);
    }

    #[test]
    fn test_question_identity_stable_and_reactivated() {
        let db = DatabaseService::new_in_memory().unwrap();
        let course = db.upsert_course(&sample_course("c"), 0).unwrap();
        let week = db.upsert_week(&course.id, &sample_week(1), 0).unwrap();
        let topic = db.upsert_topic(&week.id, &sample_topic("loops"), 0).unwrap();

        let q = sample_question("sum-two");
        let first = db
            .upsert_question(&topic.id, &q, QuestionType::FullProgram, 0)
            .unwrap();

        // 下架后再次 upsert 必须复活且身份不变
        db.deactivate_missing_questions(&topic.id, &[]).unwrap();
        let row = db.get_question_by_key(&topic.id, "sum-two").unwrap().unwrap();
        assert!(!row.is_active);

        let second = db
            .upsert_question(&topic.id, &q, QuestionType::FullProgram, 7)
            .unwrap();
        assert_eq!(first.id, second.id);
        assert!(!second.created);

        let row = db.get_question_by_key(&topic.id, "sum-two").unwrap().unwrap();
        assert!(row.is_active);
        assert_eq!(row.order_index, 7);
    }

    #[test]
    fn test_deactivate_keeps_listed_slugs() {
        let db = DatabaseService::new_in_memory().unwrap();
        let course = db.upsert_course(&sample_course("c"), 0).unwrap();
        let week = db.upsert_week(&course.id, &sample_week(1), 0).unwrap();
        let topic = db.upsert_topic(&week.id, &sample_topic("t"), 0).unwrap();

        for (i, slug) in ["a", "b", "c"].iter().enumerate() {
            db.upsert_question(
                &topic.id,
                &sample_question(slug),
                QuestionType::FullProgram,
                i as i64,
            )
            .unwrap();
        }

        let deactivated = db.deactivate_missing_questions(&topic.id, &["a", "c"]).unwrap();
        assert_eq!(deactivated, 1);

        let active = db.list_active_questions(&topic.id).unwrap();
        let slugs: Vec<&str> = active.iter().map(|q| q.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "c"]);
        // 行本身还在
        assert_eq!(db.list_all_questions(&topic.id).unwrap().len(), 3);
    }

    #[test]
    fn test_attempt_rows_survive_deactivation() {
        let db = DatabaseService::new_in_memory().unwrap();
        let course = db.upsert_course(&sample_course("c"), 0).unwrap();
        let week = db.upsert_week(&course.id, &sample_week(1), 0).unwrap();
        let topic = db.upsert_topic(&week.id, &sample_topic("t"), 0).unwrap();
        let q = db
            .upsert_question(
                &topic.id,
                &sample_question("sum-two"),
                QuestionType::FullProgram,
                0,
            )
            .unwrap();

        db.record_attempt(&q.id, "print(42)", true, 10, 30).unwrap();
        db.deactivate_missing_questions(&topic.id, &[]).unwrap();
        assert_eq!(db.count_attempts(&q.id).unwrap(), 1);
    }

    #[test]
    fn test_grading_bundle_roundtrip() {
        let db = DatabaseService::new_in_memory().unwrap();
        let course = db.upsert_course(&sample_course("c"), 0).unwrap();
        let week = db.upsert_week(&course.id, &sample_week(1), 0).unwrap();
        let topic = db.upsert_topic(&week.id, &sample_topic("t"), 0).unwrap();

        let mut q = sample_question("add");
        q.tests.push(TestCase {
            input: String::new(),
            expected_output: "5".to_string(),
            is_hidden: true,
            test_code: Some("print(add(2, 3))".to_string()),
        });
        let outcome = db
            .upsert_question(&topic.id, &q, QuestionType::Function, 0)
            .unwrap();

        let bundle = db.get_grading_bundle(&outcome.id).unwrap().unwrap();
        assert_eq!(bundle.tests.len(), 2);
        assert_eq!(bundle.tests[1].test_code.as_deref(), Some("print(add(2, 3))"));
        assert_eq!(bundle.solution_code, "print(42)");

        assert!(db.get_grading_bundle("missing").unwrap().is_none());
    }

    #[test]
    fn test_achievement_and_enrollment_upserts() {
        let db = DatabaseService::new_in_memory().unwrap();
        let spec = AchievementSpec {
            code: "first-pass".to_string(),
            name: "首胜".to_string(),
            description: "通过第一道题".to_string(),
            criteria: AchievementCriteria::FirstPass,
        };
        let first = db.upsert_achievement(&spec).unwrap();
        let second = db.upsert_achievement(&spec).unwrap();
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.id, second.id);

        let course = db.upsert_course(&sample_course("c"), 0).unwrap();
        let e1 = db.upsert_enrollment("user-1", &course.id).unwrap();
        let e2 = db.upsert_enrollment("user-1", &course.id).unwrap();
        assert_eq!(e1.id, e2.id);
        assert!(!e2.created);
    }

    #[test]
    fn test_week_display_order_independent_of_week_number() {
        let db = DatabaseService::new_in_memory().unwrap();
        let course = db.upsert_course(&sample_course("c"), 0).unwrap();

        // 第 2 周排在第 1 周前面：展示顺序只看 order_index
        db.upsert_week(&course.id, &sample_week(2), 0).unwrap();
        db.upsert_week(&course.id, &sample_week(1), 1).unwrap();

        let weeks = db.list_weeks(&course.id).unwrap();
        let numbers: Vec<i32> = weeks.iter().map(|w| w.week_number).collect();
        assert_eq!(numbers, vec![2, 1]);
    }

    #[test]
    fn test_list_courses_ordered() {
        let db = DatabaseService::new_in_memory().unwrap();
        db.upsert_course(&sample_course("b-course"), 1).unwrap();
        db.upsert_course(&sample_course("a-course"), 0).unwrap();

        let courses = db.list_courses().unwrap();
        let slugs: Vec<&str> = courses.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a-course", "b-course"]);
    }

    #[test]
    fn test_topic_intro_html() {
        let db = DatabaseService::new_in_memory().unwrap();
        let course = db.upsert_course(&sample_course("c"), 0).unwrap();
        let week = db.upsert_week(&course.id, &sample_week(1), 0).unwrap();
        let topic = db.upsert_topic(&week.id, &sample_topic("t"), 0).unwrap();

        let html = db.get_topic_intro_html(&topic.id).unwrap().unwrap();
        assert!(html.contains("<h1>"));
    }
}
