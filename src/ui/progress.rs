use indicatif::{ProgressBar, ProgressStyle};

pub fn create_beat_progress(ticks_per_beat: u64) -> ProgressBar {
    let pb = ProgressBar::new(ticks_per_beat);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:.bold} [{bar:24.cyan}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("⣀⣤⣦⣶⣷⣿ "),
    );
    pb.set_prefix("Beat");
    pb
}

pub fn create_transport_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix("Transport");
    pb
}
