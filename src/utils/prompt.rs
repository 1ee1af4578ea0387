//! 交互确认

use std::io::{self, BufRead, IsTerminal, Write};

/// 询问是/否，空输入或非交互终端时返回默认值
pub fn confirm(question: &str, default: bool) -> bool {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        log::debug!("非交互终端，使用默认回答: {}", default);
        return default;
    }

    print!("{} ", question);
    let _ = io::stdout().flush();

    let mut answer = String::new();
    match stdin.lock().read_line(&mut answer) {
        Ok(_) => parse_answer(&answer, default),
        Err(_) => default,
    }
}

/// 解析回答：y/yes/是 为真，n/no/否 为假，其他取默认值
pub fn parse_answer(answer: &str, default: bool) -> bool {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" | "是" => true,
        "n" | "no" | "否" => false,
        _ => default,
    }
}
