// 引导模块
// 内置成就定义的幂等种子与报名关系 glue：
// 与同步引擎相同的按自然键 upsert 语义，无排序要求

use crate::models::{AchievementCriteria, AchievementSpec};
use crate::services::database::DatabaseService;
use anyhow::Result;
use log::info;

/// 内置成就集合
///
/// criteria 由外部进度引擎求值，这里只定义并落库
pub fn builtin_achievements() -> Vec<AchievementSpec> {
    vec![
        AchievementSpec {
            code: "first-pass".to_string(),
            name: "初战告捷".to_string(),
            description: "首次通过任意一道题目".to_string(),
            criteria: AchievementCriteria::FirstPass,
        },
        AchievementSpec {
            code: "streak-5".to_string(),
            name: "连胜五场".to_string(),
            description: "连续通过 5 道题目".to_string(),
            criteria: AchievementCriteria::Streak { count: 5 },
        },
        AchievementSpec {
            code: "streak-10".to_string(),
            name: "势如破竹".to_string(),
            description: "连续通过 10 道题目".to_string(),
            criteria: AchievementCriteria::Streak { count: 10 },
        },
        AchievementSpec {
            code: "no-hints-10".to_string(),
            name: "独立思考".to_string(),
            description: "不看提示通过 10 道题目".to_string(),
            criteria: AchievementCriteria::NoHints { count: 10 },
        },
        AchievementSpec {
            code: "complete-week".to_string(),
            name: "周而复始".to_string(),
            description: "完成一整周的全部题目".to_string(),
            criteria: AchievementCriteria::CompleteWeek,
        },
        AchievementSpec {
            code: "speed-run".to_string(),
            name: "极速通关".to_string(),
            description: "在 120 秒内通过一道题目".to_string(),
            criteria: AchievementCriteria::TimeLimit { seconds: 120 },
        },
        AchievementSpec {
            code: "perfect-topic".to_string(),
            name: "完美主题".to_string(),
            description: "一个主题内全部题目拿到满分".to_string(),
            criteria: AchievementCriteria::PerfectTopic,
        },
    ]
}

/// 种子内置成就，返回 (新建数, 更新数)
pub fn seed_achievements(db: &DatabaseService) -> Result<(usize, usize)> {
    let mut created = 0;
    let mut updated = 0;
    for achievement in builtin_achievements() {
        if db.upsert_achievement(&achievement)?.created {
            created += 1;
        } else {
            updated += 1;
        }
    }
    info!("成就种子完成: 新建 {} / 更新 {}", created, updated);
    Ok((created, updated))
}

/// 报名 glue：按 (user_id, course_id) 幂等建立关系
pub fn enroll(db: &DatabaseService, user_id: &str, course_id: &str) -> Result<String> {
    Ok(db.upsert_enrollment(user_id, course_id)?.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_codes_unique() {
        let achievements = builtin_achievements();
        let mut codes: Vec<&str> = achievements.iter().map(|a| a.code.as_str()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), achievements.len());
    }

    #[test]
    fn test_seed_twice_is_idempotent() {
        let db = DatabaseService::new_in_memory().unwrap();
        let (created, updated) = seed_achievements(&db).unwrap();
        assert_eq!(created, builtin_achievements().len());
        assert_eq!(updated, 0);

        let (created, updated) = seed_achievements(&db).unwrap();
        assert_eq!(created, 0);
        assert_eq!(updated, builtin_achievements().len());
    }

    #[test]
    fn test_enroll_returns_stable_id() {
        let db = DatabaseService::new_in_memory().unwrap();
        let course = db
            .upsert_course(
                &crate::models::CourseSpec {
                    slug: "c".to_string(),
                    name: String::new(),
                    description: String::new(),
                    language: "python".to_string(),
                    is_locked: false,
                    weeks: vec![],
                },
                0,
            )
            .unwrap();

        let first = enroll(&db, "user-1", &course.id).unwrap();
        let second = enroll(&db, "user-1", &course.id).unwrap();
        assert_eq!(first, second);
    }
}
