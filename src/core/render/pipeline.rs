//! 标注视频导出：读帧 -> 绘制 -> 写出，三个线程，之间用有界队列连接
//!
//! 上游发送端被丢弃即表示数据结束；任一阶段出错都会置位共享的中止标志，
//! 其余阶段在下一个块之前看到标志后退出，写线程丢弃已写出的部分。

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, sync_channel};
use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};

use image::RgbImage;
use log::{debug, error, info};
use rayon::prelude::*;

use super::error::RenderError;
use super::marker::FrameMarker;
use super::progress::ExportProgress;
use super::sink::VideoSink;
use crate::core::labels::LabelStore;
use crate::core::video::{Frame, Video};

#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Frames read and annotated together.
    pub chunk_size: usize,
    /// Pending chunks per queue before the producer blocks.
    pub queue_capacity: usize,
    pub marker_radius: u32,
    pub jpeg_quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64,
            queue_capacity: 4,
            marker_radius: 4,
            jpeg_quality: 90,
        }
    }
}

impl ExportConfig {
    /// 小块 + 低质量，适合快速预览
    pub fn for_preview() -> Self {
        Self {
            chunk_size: 16,
            jpeg_quality: 60,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSummary {
    pub frames_written: usize,
    pub elapsed: Duration,
}

struct Chunk {
    indices: Vec<usize>,
    frames: Vec<Frame>,
}

fn flag_on_error<T>(abort: &AtomicBool, result: Result<T, RenderError>) -> Result<T, RenderError> {
    if result.is_err() {
        abort.store(true, Ordering::SeqCst);
    }
    result
}

fn join_stage<T>(
    handle: ScopedJoinHandle<'_, Result<T, RenderError>>,
    stage: &'static str,
) -> Result<T, RenderError> {
    handle.join().unwrap_or_else(|_| {
        error!("💥 {} stage panicked", stage);
        Err(RenderError::StagePanicked { stage })
    })
}

/// Render `frames` of `video` with their labeled instances drawn on top and
/// write them, in list order, to `sink`.
///
/// `on_progress` runs on the calling thread for every progress record;
/// returning `ControlFlow::Break` stops the export before the next chunk and
/// the sink's partial output is discarded.
pub fn save_labeled_video<F>(
    video: &dyn Video,
    labels: &dyn LabelStore,
    frames: &[usize],
    mut sink: Box<dyn VideoSink>,
    config: &ExportConfig,
    mut on_progress: F,
) -> Result<ExportSummary, RenderError>
where
    F: FnMut(&ExportProgress) -> ControlFlow<()>,
{
    let start = Instant::now();
    let total = frames.len();
    let chunk_size = config.chunk_size.max(1);
    let capacity = config.queue_capacity.max(1);
    let threads = num_cpus::get().min(4);

    info!(
        "🎬 Writing labeled video {}: {} frames, {} chunks of {}",
        video.name(),
        total,
        total.div_ceil(chunk_size),
        chunk_size
    );

    let abort = AtomicBool::new(false);
    let marker = FrameMarker::new(labels, video, config.marker_radius);

    let frames_written = thread::scope(|s| {
        let abort = &abort;
        let marker = &marker;
        let (chunk_tx, chunk_rx) = sync_channel::<Chunk>(capacity);
        let (annotated_tx, annotated_rx) = sync_channel::<Vec<RgbImage>>(capacity);
        let (progress_tx, progress_rx) = channel::<ExportProgress>();

        let reader = s.spawn(move || -> Result<(), RenderError> {
            for (n, indices) in frames.chunks(chunk_size).enumerate() {
                if abort.load(Ordering::SeqCst) {
                    break;
                }
                let t0 = Instant::now();
                let chunk_frames =
                    flag_on_error(abort, video.get_frames(indices).map_err(Into::into))?;
                debug!(
                    "reading chunk {} ({} frames) in {:?}",
                    n,
                    indices.len(),
                    t0.elapsed()
                );
                let chunk = Chunk {
                    indices: indices.to_vec(),
                    frames: chunk_frames,
                };
                if chunk_tx.send(chunk).is_err() {
                    break;
                }
            }
            Ok(())
        });

        let annotator = s.spawn(move || -> Result<(), RenderError> {
            let pool = flag_on_error(
                abort,
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(Into::into),
            )?;
            for (n, chunk) in chunk_rx.into_iter().enumerate() {
                if abort.load(Ordering::SeqCst) {
                    break;
                }
                let t0 = Instant::now();
                let images: Vec<RgbImage> = pool.install(|| {
                    chunk
                        .indices
                        .par_iter()
                        .zip(chunk.frames.par_iter())
                        .map(|(&index, frame)| marker.annotate(index, frame))
                        .collect()
                });
                debug!("drawing chunk {} in {:?}", n, t0.elapsed());
                if annotated_tx.send(images).is_err() {
                    break;
                }
            }
            Ok(())
        });

        let writer = s.spawn(move || -> Result<usize, RenderError> {
            let t0 = Instant::now();
            let mut written = 0;
            for batch in annotated_rx {
                if abort.load(Ordering::SeqCst) {
                    break;
                }
                for image in &batch {
                    if let Err(e) = sink.write_frame(image) {
                        abort.store(true, Ordering::SeqCst);
                        sink.abort();
                        return Err(e);
                    }
                }
                written += batch.len();
                let _ = progress_tx.send(ExportProgress::Written {
                    frames_written: written,
                    elapsed: t0.elapsed(),
                });
            }

            if abort.load(Ordering::SeqCst) {
                sink.abort();
                return Err(RenderError::Cancelled {
                    frames_written: written,
                });
            }
            if let Err(e) = sink.finish() {
                error!("❌ Finishing output failed: {}", e);
                abort.store(true, Ordering::SeqCst);
                sink.abort();
                return Err(e);
            }
            let _ = progress_tx.send(ExportProgress::Finished {
                elapsed: t0.elapsed(),
            });
            Ok(written)
        });

        for progress in progress_rx {
            if let ExportProgress::Written { frames_written, .. } = progress {
                if let Some((fps, remaining)) = progress.rate(total) {
                    info!(
                        "⏳ {} / {} frames, fps = {:.1}, approx {:.1}s remaining",
                        frames_written, total, fps, remaining
                    );
                }
            }
            if on_progress(&progress).is_break() && !abort.swap(true, Ordering::SeqCst) {
                info!("⏹️ Export cancelled by caller");
            }
        }

        let reader_result = join_stage(reader, "reader");
        let annotator_result = join_stage(annotator, "marker");
        let writer_result = join_stage(writer, "writer");
        reader_result.and(annotator_result).and(writer_result)
    })?;

    let elapsed = start.elapsed();
    info!(
        "✅ Done: {} frames in {:.2}s ({:.1} fps)",
        frames_written,
        elapsed.as_secs_f64(),
        frames_written as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    Ok(ExportSummary {
        frames_written,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::labels::{Instance, LabeledFrame, Labels, Point, Skeleton};
    use crate::core::video::{InMemoryVideo, VideoError};
    use std::sync::{Arc, Mutex};

    /// 记录写入的帧，供断言使用
    #[derive(Default, Clone)]
    struct CollectSink {
        frames: Arc<Mutex<Vec<RgbImage>>>,
        finished: Arc<AtomicBool>,
        aborted: Arc<AtomicBool>,
        delay: Option<Duration>,
        fail_finish: bool,
    }

    impl VideoSink for CollectSink {
        fn write_frame(&mut self, image: &RgbImage) -> Result<(), RenderError> {
            if let Some(delay) = self.delay {
                thread::sleep(delay);
            }
            self.frames.lock().unwrap().push(image.clone());
            Ok(())
        }

        fn finish(&mut self) -> Result<(), RenderError> {
            if self.fail_finish {
                return Err(RenderError::Io(std::io::Error::other("close failed")));
            }
            self.finished.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn abort(self: Box<Self>) {
            self.aborted.store(true, Ordering::SeqCst);
        }
    }

    struct FailingSink;

    impl VideoSink for FailingSink {
        fn write_frame(&mut self, _image: &RgbImage) -> Result<(), RenderError> {
            Err(RenderError::Io(std::io::Error::other("disk full")))
        }

        fn finish(&mut self) -> Result<(), RenderError> {
            Ok(())
        }

        fn abort(self: Box<Self>) {}
    }

    /// 第 i 帧的像素值为 i
    fn numbered_video(frame_count: usize) -> InMemoryVideo {
        let frames = (0..frame_count)
            .map(|i| Frame::new(6, 4, 1, vec![i as u8; 24], i).unwrap())
            .collect();
        InMemoryVideo::new("clip", frames).unwrap()
    }

    fn keep_going(_: &ExportProgress) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    #[test]
    fn test_output_order_matches_input_for_any_chunk_size() {
        let video = numbered_video(40);
        let labels = Labels::default();
        let frames: Vec<usize> = vec![5, 3, 39, 0, 0, 12, 7, 20, 21, 1, 33];

        for chunk_size in [1, 2, 3, 4, 64] {
            let sink = CollectSink::default();
            let config = ExportConfig {
                chunk_size,
                queue_capacity: 1,
                ..Default::default()
            };
            let summary = save_labeled_video(
                &video,
                &labels,
                &frames,
                Box::new(sink.clone()),
                &config,
                keep_going,
            )
            .unwrap();

            assert_eq!(summary.frames_written, frames.len());
            let written = sink.frames.lock().unwrap();
            let values: Vec<usize> = written
                .iter()
                .map(|img| img.get_pixel(0, 0)[0] as usize)
                .collect();
            assert_eq!(values, frames, "chunk size {}", chunk_size);
            assert!(sink.finished.load(Ordering::SeqCst));
            assert!(!sink.aborted.load(Ordering::SeqCst));
        }
    }

    #[test]
    fn test_progress_records() {
        let video = numbered_video(10);
        let labels = Labels::default();
        let frames: Vec<usize> = (0..10).collect();
        let config = ExportConfig {
            chunk_size: 4,
            ..Default::default()
        };

        let mut records = Vec::new();
        save_labeled_video(
            &video,
            &labels,
            &frames,
            Box::new(CollectSink::default()),
            &config,
            |p| {
                records.push(*p);
                ControlFlow::Continue(())
            },
        )
        .unwrap();

        let counts: Vec<usize> = records
            .iter()
            .filter_map(|p| match p {
                ExportProgress::Written { frames_written, .. } => Some(*frames_written),
                ExportProgress::Finished { .. } => None,
            })
            .collect();
        assert_eq!(counts, vec![4, 8, 10]);
        assert!(matches!(records.last(), Some(ExportProgress::Finished { .. })));
    }

    #[test]
    fn test_empty_frame_list() {
        let video = numbered_video(3);
        let sink = CollectSink::default();
        let summary = save_labeled_video(
            &video,
            &Labels::default(),
            &[],
            Box::new(sink.clone()),
            &ExportConfig::default(),
            keep_going,
        )
        .unwrap();
        assert_eq!(summary.frames_written, 0);
        assert!(sink.finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_annotations_drawn() {
        let video = numbered_video(3);
        let mut labels = Labels::new(Skeleton::new(&["p"], &[]));
        labels.push_frame(
            "clip",
            LabeledFrame::new(
                1,
                vec![Instance::new(vec![("p".to_string(), Point::new(3.0, 2.0))])],
            ),
        );

        let sink = CollectSink::default();
        save_labeled_video(
            &video,
            &labels,
            &[0, 1],
            Box::new(sink.clone()),
            &ExportConfig::default(),
            keep_going,
        )
        .unwrap();

        let written = sink.frames.lock().unwrap();
        assert_eq!(written[0].get_pixel(3, 2).0, [0, 0, 0]);
        assert_eq!(written[1].get_pixel(3, 2).0, [0, 114, 189]);
    }

    #[test]
    fn test_reader_failure_aborts_sink() {
        let video = numbered_video(5);
        let sink = CollectSink::default();
        let result = save_labeled_video(
            &video,
            &Labels::default(),
            &[0, 1, 99],
            Box::new(sink.clone()),
            &ExportConfig::default(),
            keep_going,
        );

        assert!(matches!(
            result,
            Err(RenderError::Video(VideoError::FrameOutOfRange { index: 99, .. }))
        ));
        assert!(sink.aborted.load(Ordering::SeqCst));
        assert!(!sink.finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_writer_failure_reported() {
        let video = numbered_video(50);
        let frames: Vec<usize> = (0..50).collect();
        let config = ExportConfig {
            chunk_size: 2,
            queue_capacity: 1,
            ..Default::default()
        };
        let result = save_labeled_video(
            &video,
            &Labels::default(),
            &frames,
            Box::new(FailingSink),
            &config,
            keep_going,
        );
        assert!(matches!(result, Err(RenderError::Io(_))));
    }

    #[test]
    fn test_finish_failure_discards_output() {
        let video = numbered_video(6);
        let frames: Vec<usize> = (0..6).collect();
        let sink = CollectSink {
            fail_finish: true,
            ..Default::default()
        };
        let mut records = Vec::new();
        let result = save_labeled_video(
            &video,
            &Labels::default(),
            &frames,
            Box::new(sink.clone()),
            &ExportConfig::default(),
            |p| {
                records.push(*p);
                ControlFlow::Continue(())
            },
        );

        assert!(matches!(result, Err(RenderError::Io(_))));
        assert_eq!(sink.frames.lock().unwrap().len(), 6);
        assert!(sink.aborted.load(Ordering::SeqCst));
        assert!(!sink.finished.load(Ordering::SeqCst));
        assert!(!records
            .iter()
            .any(|p| matches!(p, ExportProgress::Finished { .. })));
    }

    #[test]
    fn test_cancel_between_chunks() {
        let video = numbered_video(60);
        let frames: Vec<usize> = (0..60).collect();
        let sink = CollectSink {
            delay: Some(Duration::from_millis(10)),
            ..Default::default()
        };
        let config = ExportConfig {
            chunk_size: 1,
            queue_capacity: 1,
            ..Default::default()
        };

        let result = save_labeled_video(
            &video,
            &Labels::default(),
            &frames,
            Box::new(sink.clone()),
            &config,
            |_| ControlFlow::Break(()),
        );

        match result {
            Err(RenderError::Cancelled { frames_written }) => assert!(frames_written < 60),
            other => panic!("expected cancellation, got {:?}", other),
        }
        assert!(sink.aborted.load(Ordering::SeqCst));
        assert!(!sink.finished.load(Ordering::SeqCst));
    }
}
