// tests/cli_dispatch_test.rs

use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;
use std::fs;
use tempfile::{TempDir, tempdir};

const COURSE_BODY: &str = r#"{
    "id": "rust-101",
    "title": "Rust 入门",
    "sections": [{
        "id": "s1",
        "title": "第一章 基础",
        "lectures": [
            {"id": "l1", "title": "开篇", "content_type": "video",
             "url": "https://cdn.example.com/l1.mp4", "duration": 120, "position": 0},
            {"id": "l2", "title": "所有权讲义", "content_type": "document",
             "url": "https://cdn.example.com/l2.pdf", "position": 1},
            {"id": "l3", "title": "借用", "content_type": "video",
             "url": "https://cdn.example.com/l3.mp4", "duration": 300, "position": 2}
        ]
    }]
}"#;

// 辅助函数，避免重复。HOME 指向临时目录，避免读写真实的配置文件。
fn main_command(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env("CLICOLOR", "0")
        .env_remove("ACCESS_TOKEN")
        .env_remove("CLICOLOR_FORCE");
    cmd
}

// --- 测试基本 CLI 行为 ---

#[test]
fn test_help_flag() {
    let home = tempdir().unwrap();
    main_command(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("显示此帮助信息并退出"));
}

#[test]
fn test_missing_arguments_shows_help() {
    let home = tempdir().unwrap();
    main_command(&home)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: lecture-progress"));
}

#[test]
fn test_interactive_conflicts_with_replay() {
    let home = tempdir().unwrap();
    main_command(&home)
        .args(["--course", "rust-101", "-i", "--replay", "events.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// --- 测试核心分发逻辑 ---

#[test]
fn test_outline_mode_prints_lock_states() {
    let home = tempdir().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/courses/rust-101/structure")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(COURSE_BODY)
        .create();

    main_command(&home)
        .args(["--course", "rust-101", "--api-base", &server.url()])
        .assert()
        .success()
        .stdout(predicate::str::contains("课程大纲: Rust 入门"))
        .stdout(predicate::str::contains("未开始"))
        .stdout(predicate::str::contains("未解锁"))
        .stdout(predicate::str::contains("继续学习: 开篇 [l1]"));

    mock.assert();
    // 首次运行时创建默认配置文件
    assert!(home.path().join(".lecture-progress").join("config.json").is_file());
}

#[test]
fn test_missing_course_reports_not_found() {
    let home = tempdir().unwrap();
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/api/courses/ghost/structure")
        .with_status(404)
        .create();

    main_command(&home)
        .args(["--course", "ghost", "--api-base", &server.url()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("资源不存在"));
}

#[test]
fn test_replay_mode_applies_events_and_syncs_progress() {
    let home = tempdir().unwrap();
    let mut server = mockito::Server::new();
    let structure = server
        .mock("GET", "/api/courses/rust-101/structure")
        .with_status(200)
        .with_body(COURSE_BODY)
        .create();
    // time 60 / ended / viewed 各推送一次
    let progress = server
        .mock("POST", Matcher::Regex(r"^/api/lectures/l[12]/progress$".to_string()))
        .with_status(200)
        .expect(3)
        .create();

    let replay_path = home.path().join("events.txt");
    fs::write(
        &replay_path,
        "# 回放脚本\nopen l1\ntime 60\nseek 115\nopen l3\nended\nopen l2\nviewed\nfly away\n",
    )
    .unwrap();

    main_command(&home)
        .args(["--course", "rust-101", "--api-base", &server.url(), "--replay"])
        .arg(&replay_path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("不能跳过尚未观看的内容"))
        .stdout(predicate::str::contains("下一课时: 所有权讲义"))
        .stdout(predicate::str::contains("成功事件: 6"))
        .stdout(predicate::str::contains("跳过事件: 1"))
        .stdout(predicate::str::contains("失败事件: 1"))
        .stderr(predicate::str::contains("尚未解锁"))
        .stderr(predicate::str::contains("1 个回放事件执行失败"));

    structure.assert();
    progress.assert();
}
