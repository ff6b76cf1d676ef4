// 工具模块
// 数据库路径解析与 Markdown 渲染

use pulldown_cmark::{html, Options, Parser};
use std::path::PathBuf;

/// 数据目录：随可执行文件放置，可用 KECHENG_DB_PATH 覆盖
pub fn get_database_path() -> PathBuf {
    if let Ok(path) = std::env::var("KECHENG_DB_PATH") {
        return PathBuf::from(path);
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    exe_dir.join("data").join("kecheng.db")
}

/// 主题介绍 Markdown 渲染为 HTML
pub fn markdown_to_html(content: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(content, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_to_html() {
        let html = markdown_to_html("# 循环\n\n| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<h1>"));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_db_path_env_override() {
        std::env::set_var("KECHENG_DB_PATH", "/tmp/kecheng-test.db");
        assert_eq!(
            get_database_path(),
            PathBuf::from("/tmp/kecheng-test.db")
        );
        std::env::remove_var("KECHENG_DB_PATH");
    }
}
