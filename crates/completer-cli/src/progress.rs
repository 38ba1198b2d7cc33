// Download progress bar

use completer_http::ProgressFn;
use indicatif::{ProgressBar, ProgressStyle};

/// Percent-based bar plus the callback that drives it
pub fn download_progress(message: &str, quiet: bool) -> (ProgressBar, ProgressFn) {
    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(100)
    };
    let style = ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {pos}%")
        .unwrap_or_else(|e| {
            eprintln!("Failed to create progress bar template: {}", e);
            ProgressStyle::default_bar()
        })
        .progress_chars("=>-");
    pb.set_style(style);
    pb.set_message(message.to_string());

    let handle = pb.clone();
    let callback: ProgressFn = Box::new(move |fraction: f64| {
        handle.set_position(percent(fraction));
    });
    (pb, callback)
}

fn percent(fraction: f64) -> u64 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_moves_bar() {
        let (pb, mut callback) = download_progress("Downloading", true);
        callback(0.4);
        assert_eq!(pb.position(), 40);
        callback(1.0);
        assert_eq!(pb.position(), 100);
    }

    #[test]
    fn test_percent_clamps() {
        assert_eq!(percent(-1.0), 0);
        assert_eq!(percent(2.0), 100);
        assert_eq!(percent(0.333), 33);
    }
}
