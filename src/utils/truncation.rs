/// Lines of engine output kept when a failed stage is logged.
pub const FAILURE_TAIL_LINES: usize = 20;

/// The last `max_lines` lines of `output`, prefixed with a marker when lines
/// were dropped.
pub fn output_tail(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.trim_end().lines().collect();
    if lines.len() <= max_lines {
        return lines.join("\n");
    }
    let dropped = lines.len() - max_lines;
    format!("... [{} lines omitted]\n{}", dropped, lines[dropped..].join("\n"))
}
