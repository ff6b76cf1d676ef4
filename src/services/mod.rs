// 服务模块
// 提供核心业务逻辑服务

pub mod bootstrap;
pub mod catalog;
pub mod contract;
pub mod database;
pub mod sync;

pub use bootstrap::{builtin_achievements, enroll, seed_achievements};

pub use catalog::{
    check_duplicate_keys,
    validate_question,
    validate_week_partition,
    ContentError,
    ContentErrorReason,
    EntityKind,
};

pub use contract::{
    case_passes,
    execution_mode,
    grade,
    normalize_output,
    validate_suite,
    visible_cases,
    CaseResult,
    ExecutionMode,
    TestSuiteError,
    Verdict,
};

pub use database::{
    CourseRow,
    DatabaseService,
    GradingBundle,
    QuestionRow,
    TopicRow,
    UpsertOutcome,
    WeekRow,
};

pub use sync::{EntityCounters, SyncEngine, SyncReport};
