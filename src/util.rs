/// `mm:ss` countdown label
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub fn share_text(display_score: u64) -> String {
    format!("I scored {display_score} points in Skewdle! Can you beat my score?")
}
