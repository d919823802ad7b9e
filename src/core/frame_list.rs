//! 帧列表解析："1,2,3" 或 "1-3"（闭区间），也可以混用 "0-2,7"

use thiserror::Error;

/// 一个帧列表最多展开的帧数
pub const MAX_LISTED_FRAMES: usize = 10_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameListError {
    #[error("Invalid frame index: {0:?}")]
    InvalidIndex(String),
    #[error("Invalid frame range {start}-{end}: end is before start")]
    ReversedRange { start: usize, end: usize },
    #[error("Frame list expands to more than {limit} frames")]
    TooManyFrames { limit: usize },
}

/// Parse a frame list; an empty (or blank) string means "use the default frames".
pub fn parse_frame_list(input: &str) -> Result<Option<Vec<usize>>, FrameListError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let mut frames = Vec::new();
    for part in input.split(',') {
        let part = part.trim();
        match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_index(start)?;
                let end = parse_index(end)?;
                if end < start {
                    return Err(FrameListError::ReversedRange { start, end });
                }
                // end - start + 1 可能溢出，所以比较差值
                if end - start >= MAX_LISTED_FRAMES - frames.len() {
                    return Err(FrameListError::TooManyFrames {
                        limit: MAX_LISTED_FRAMES,
                    });
                }
                frames.extend(start..=end);
            }
            None => {
                if frames.len() >= MAX_LISTED_FRAMES {
                    return Err(FrameListError::TooManyFrames {
                        limit: MAX_LISTED_FRAMES,
                    });
                }
                frames.push(parse_index(part)?);
            }
        }
    }
    Ok(Some(frames))
}

fn parse_index(s: &str) -> Result<usize, FrameListError> {
    let s = s.trim();
    s.parse::<usize>()
        .map_err(|_| FrameListError::InvalidIndex(s.to_string()))
}
