// Terminal rendering for run progress
// Everything but task stdout goes to stderr so piped output stays clean

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD_RED: &str = "\x1b[1;31m";
const BOLD_GREEN: &str = "\x1b[1;32m";
const BOLD_BLUE: &str = "\x1b[1;34m";
const BOLD_CYAN: &str = "\x1b[1;36m";

fn paint(style: &str, text: &str) -> String {
    format!("{}{}{}", style, text, RESET)
}

/// Right-aligned verb, cargo style: "     Loading pipeline.json"
pub fn status(action: &str, message: &str) {
    eprintln!("{} {}", paint(BOLD_CYAN, &format!("{:>12}", action)), message);
}

pub fn header(message: &str) {
    eprintln!("{}", paint(BOLD, &format!("==> {}", message)));
}

/// "[2/4] stage-1"
pub fn task_header(index: usize, total: usize, task: &str) {
    let position = format!("[{}/{}]", index + 1, total);
    eprintln!("{} {}", paint(BOLD_BLUE, &position), task);
}

pub fn task_output(line: &str) {
    println!("      | {}", line);
}

pub fn task_error(line: &str) {
    eprintln!("{}", paint(RED, &format!("      | {}", line)));
}

pub fn success(message: &str) {
    eprintln!("  {} {}", paint(BOLD_GREEN, "\u{2713}"), message);
}

pub fn failure(message: &str) {
    eprintln!("  {} {}", paint(BOLD_RED, "\u{2717}"), message);
}

pub fn warning(message: &str) {
    eprintln!("  {} {}", paint(YELLOW, "!"), message);
}

pub fn dim(message: &str) {
    eprintln!("{}", paint(DIM, message));
}

/// Last line of a failed invocation
pub fn fatal(message: &str) {
    eprintln!("{} {}", paint(BOLD_RED, "ERROR:"), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_wraps_in_reset() {
        assert_eq!(paint(RED, "boom"), "\x1b[31mboom\x1b[0m");
    }
}
