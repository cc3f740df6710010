// src/main.rs

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use lecture_progress::{cli::Cli, logging, run_from_cli};
use std::{
    env,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

#[tokio::main]
async fn main() {
    // 为 Windows 终端启用 ANSI 颜色支持。
    #[cfg(windows)]
    {
        colored::control::set_virtual_terminal(true).ok();
    }

    let cancellation_token = Arc::new(AtomicBool::new(false));
    let ctrl_c_token = cancellation_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.store(true, Ordering::Relaxed);
            println!("\n{} 用户强制中断程序。", "[!]".yellow());
            // 给正在进行的进度推送留一点时间
            tokio::time::sleep(Duration::from_millis(100)).await;
            std::process::exit(130);
        }
    });

    let bin_name = env::var("CARGO_BIN_NAME").unwrap_or_else(|_| "lecture-progress".to_string());

    let after_help = format!(
        "示例:\n  # 查看课程大纲与解锁状态\n  {bin} --course rust-101\n\n  # 启动交互式播放会话\n  {bin} --course rust-101 -i\n\n  # 回放播放器事件文件\n  {bin} --course rust-101 --replay events.txt",
        bin = bin_name
    );

    let cmd = Cli::command().after_help(after_help);

    let args = match Cli::from_arg_matches(&cmd.get_matches()) {
        Ok(args) => Arc::new(args),
        Err(e) => e.exit(),
    };

    logging::init_logger(args.log_level);

    if let Err(e) = run_from_cli(args, cancellation_token).await {
        eprintln!("\n{} {}", "[X]".red(), format!("程序执行出错: {}", e).red());
        std::process::exit(1);
    }
}
