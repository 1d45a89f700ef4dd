pub mod bench;
pub mod decoding;
pub mod encoding;
pub mod manifest;
pub mod simulate;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

pub(crate) fn progress_bar(len: u64, template: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(ProgressStyle::with_template(template)?.progress_chars("=> "));
    Ok(pb)
}
