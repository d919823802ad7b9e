use std::time::Duration;

/// 写线程发布的进度记录
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportProgress {
    /// Cumulative count after each written batch.
    Written {
        frames_written: usize,
        elapsed: Duration,
    },
    /// Output finalized.
    Finished { elapsed: Duration },
}

impl ExportProgress {
    /// (frames per second, estimated seconds remaining) for a `Written` record.
    pub fn rate(&self, total_frames: usize) -> Option<(f64, f64)> {
        match *self {
            ExportProgress::Written {
                frames_written,
                elapsed,
            } => {
                let secs = elapsed.as_secs_f64();
                if frames_written == 0 || secs <= 0.0 {
                    return None;
                }
                let fps = frames_written as f64 / secs;
                let remaining = total_frames.saturating_sub(frames_written) as f64 / fps;
                Some((fps, remaining))
            }
            ExportProgress::Finished { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate() {
        let progress = ExportProgress::Written {
            frames_written: 50,
            elapsed: Duration::from_secs(5),
        };
        let (fps, remaining) = progress.rate(150).unwrap();
        assert!((fps - 10.0).abs() < 1e-9);
        assert!((remaining - 10.0).abs() < 1e-9);

        let finished = ExportProgress::Finished {
            elapsed: Duration::from_secs(1),
        };
        assert!(finished.rate(10).is_none());
    }
}
