//! `risk_score(target)` (§4.8, §9 open question): the exact
//! pattern-to-score mapping is left to the implementer provided the
//! §8 boundaries hold. Fixed buckets:
//!
//! - a transient target (`/tmp/*`, `/var/tmp/*`) that was written
//!   within the window scores 85 (≥80 required);
//! - a path under a recognised system binary directory scores 10
//!   (≤20 required);
//! - anything else starts at 40 and drops by 20 (floored at 0) when
//!   it's inside the caller's working directory, so ordinary
//!   development writes never exceed 30 even if recently written
//!   (≤30 required).

use std::path::Path;

use crate::patterns::{is_system_binary, is_transient};
use crate::window::{EventKind, Window};

pub fn risk_score(target: &str, cwd: &Path, window: &Window) -> u32 {
    let recently_written = window
        .iter_oldest_first()
        .any(|e| e.kind == EventKind::Write && e.normalized_target == target);

    if is_transient(target) && recently_written {
        return 85;
    }
    if is_system_binary(target) {
        return 10;
    }

    let mut score: i32 = 40;
    if Path::new(target).starts_with(cwd) {
        score -= 20;
    }
    score.max(0) as u32
}
