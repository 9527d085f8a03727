//! Frame planning and the per-frame reveal rule.
//!
//! Every series is drawn from its first point towards its last, one point per
//! frame. At frame `n` a series shows its first `min(n, len)` points, so the
//! frame count is one more than the longest series: the last frame shows every
//! point of every series, and shorter series hold at full length once they are
//! done.

/// Number of frames needed to fully reveal the longest series.
pub fn frame_count<I>(lengths: I) -> usize
where
    I: IntoIterator<Item = usize>,
{
    lengths.into_iter().max().unwrap_or(0) + 1
}

/// Number of points of a series of length `len` visible at `frame`.
#[inline]
pub fn reveal(frame: usize, len: usize) -> usize {
    frame.min(len)
}

/// The visible prefix of `points` at `frame`.
#[inline]
pub fn visible<T>(points: &[T], frame: usize) -> &[T] {
    &points[..reveal(frame, points.len())]
}

/// Current state of the animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationState {
    /// No frame has been produced yet
    NotStarted,
    /// Frames are being produced
    Running,
    /// The last frame has been produced
    Completed,
}

/// Drives the frame index from `0` to `frame_count - 1`, once.
///
/// The controller does not handle timing: the caller asks for the next frame
/// whenever its own timer fires. There is no pause, seek or loop.
///
/// ```rust
/// use animplot::animation::{AnimationController, AnimationState};
///
/// let mut controller = AnimationController::new(3);
/// assert_eq!(controller.state(), AnimationState::NotStarted);
/// assert_eq!(controller.tick(), Some(0));
/// assert_eq!(controller.tick(), Some(1));
/// assert_eq!(controller.tick(), Some(2));
/// assert_eq!(controller.state(), AnimationState::Completed);
/// assert_eq!(controller.tick(), None);
/// ```
#[derive(Clone, Debug)]
pub struct AnimationController {
    /// Total number of frames
    frame_count: usize,
    /// Index of the next frame to produce
    next_frame: usize,
    state: AnimationState,
}

impl AnimationController {
    pub fn new(frame_count: usize) -> Self {
        Self {
            frame_count,
            next_frame: 0,
            state: AnimationState::NotStarted,
        }
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    #[inline]
    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// The most recently produced frame, if any.
    pub fn current_frame(&self) -> Option<usize> {
        self.next_frame.checked_sub(1)
    }

    /// Advance to the next frame and return its index, or `None` once the
    /// animation has completed.
    pub fn tick(&mut self) -> Option<usize> {
        if self.next_frame >= self.frame_count {
            self.state = AnimationState::Completed;
            return None;
        }

        let frame = self.next_frame;
        self.next_frame += 1;
        self.state = if self.next_frame == self.frame_count {
            AnimationState::Completed
        } else {
            AnimationState::Running
        };
        Some(frame)
    }
}

impl Iterator for AnimationController {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        self.tick()
    }
}
