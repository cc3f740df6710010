// src/cli.rs

use clap::{Parser, ValueEnum, command, crate_version};
use std::path::PathBuf;

/// 定义日志输出级别
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// command 属性
#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    arg_required_else_help = true,
    disable_help_flag = true,
    disable_version_flag = true,
)]
pub struct Cli {
    // --- 课程 (Course) ---
    /// 要学习的课程 ID
    #[arg(short, long, value_name = "ID", help_heading = "Course")]
    pub course: String,

    // --- 运行模式 (Mode) ---
    /// 启动交互式播放会话，逐行输入播放器事件
    #[arg(
        short,
        long,
        action = clap::ArgAction::SetTrue,
        help_heading = "Mode",
        conflicts_with = "replay"
    )]
    pub interactive: bool,
    /// 从文本文件回放播放器事件 (每行一个)
    #[arg(short, long, value_name = "FILE", help_heading = "Mode")]
    pub replay: Option<PathBuf>,

    // --- 选项 (Options) ---
    /// 后端地址，覆盖配置文件中的设置
    #[arg(long, value_name = "URL", help_heading = "Options")]
    pub api_base: Option<String>,
    /// 提供访问令牌 (Access Token)，优先级最高
    #[arg(long, help_heading = "Options")]
    pub token: Option<String>,
    /// 拖动进度条的容差 (秒)
    #[arg(long, value_name = "SECS", help_heading = "Options")]
    pub seek_slack: Option<f64>,

    // --- 通用选项 (General) ---
    /// 显示此帮助信息并退出
    #[arg(short = 'h', long, action = clap::ArgAction::Help, global = true, help_heading = "General")]
    _help: Option<bool>,
    /// 显示版本信息并退出
    #[arg(short = 'V', long, action = clap::ArgAction::Version, global = true, help_heading = "General")]
    _version: Option<bool>,
    /// (隐藏参数) 设置日志文件的输出级别，用于调试
    #[arg(long, value_enum, default_value_t = LogLevel::Off, global = true, hide = true)]
    pub log_level: LogLevel,
}
