// src/ui.rs

use crate::{
    constants,
    models::{CourseSummary, LectureState},
    symbols,
    tracker::OutlineRow,
    utils,
};
use colored::*;
use std::io::{self, Write};

pub fn print_header(title: &str) {
    println!("\n{}", "═".repeat(constants::UI_WIDTH));
    println!(" {}", title.cyan().bold());
    println!("{}", "═".repeat(constants::UI_WIDTH));
}

pub fn print_sub_header(title: &str) {
    println!("\n--- {} ---", title.bold());
}

pub fn plain(message: &str) {
    println!("{}", message);
}

pub fn info(message: &str) {
    println!("{} {}", *symbols::INFO, message);
}

pub fn success(message: &str) {
    println!("{} {}", *symbols::OK, message.green());
}

pub fn warn(message: &str) {
    println!("{} {}", *symbols::WARN, message.yellow());
}

pub fn error(message: &str) {
    eprintln!("{} {}", *symbols::ERROR, message.red());
}

pub fn prompt(message: &str, default: Option<&str>) -> io::Result<String> {
    let default_str = default.map_or("".to_string(), |d| format!(" (默认: {})", d));
    print!("\n>>> {}{}: ", message, default_str);
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        // stdin 已关闭，视为中断
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
    }
    let input = input.trim().to_string();
    if input.is_empty() {
        Ok(default.unwrap_or("").to_string())
    } else {
        Ok(input)
    }
}

pub fn print_outline(course_title: &str, rows: &[OutlineRow]) {
    print_header(&format!("课程大纲: {}", course_title));
    let mut current_section: Option<&str> = None;
    for row in rows {
        if current_section != Some(row.section_title.as_str()) {
            print_sub_header(&row.section_title);
            current_section = Some(row.section_title.as_str());
        }
        let (symbol, color_func, label) = row.state.get_display_info();
        let title = utils::truncate_text(&row.title, constants::TITLE_TRUNCATE_LENGTH);
        let marker = if row.is_current { "*" } else { " " };
        let detail = match row.state {
            LectureState::InProgress => format!("{:.0}%", row.progress_percent),
            _ => label.to_string(),
        };
        println!(
            " {}{} {} [{}] ({}, {}) - {}",
            marker,
            symbol,
            color_func(title.normal()),
            row.lecture_id,
            row.content_label,
            utils::format_duration(row.duration),
            detail
        );
    }
}

pub fn print_summary(summary: &CourseSummary) {
    println!(
        "\n课程进度: {} {:.0}% ({}/{})",
        utils::progress_bar(summary.percent, 30).green(),
        summary.percent,
        summary.completed,
        summary.total
    );
}
