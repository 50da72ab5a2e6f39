//! Polyline path followed by every attacker.
//!
//! Movement is expressed as a distance budget consumed along the segments.
//! A single call may cross any number of waypoints; leftover distance always
//! carries over into the next segment, so one large step lands exactly where
//! the equivalent sequence of small steps would.

use lane_defence_core::{ConfigError, Vec2};

/// Immutable polyline built from at least two waypoints.
#[derive(Clone, Debug)]
pub struct Path {
    waypoints: Vec<Vec2>,
    segments: Vec<Segment>,
    total_length: f32,
}

#[derive(Clone, Copy, Debug)]
struct Segment {
    start: Vec2,
    length: f32,
    offset: f32,
    direction: Vec2,
}

/// Position of a traveller along a [`Path`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathCursor {
    segment_index: usize,
    segment_offset: f32,
    distance_traveled: f32,
    finished: bool,
}

impl PathCursor {
    /// Index of the segment the cursor currently occupies.
    #[must_use]
    pub const fn segment_index(&self) -> usize {
        self.segment_index
    }

    /// Distance covered since the start of the path.
    #[must_use]
    pub const fn distance_traveled(&self) -> f32 {
        self.distance_traveled
    }
}

/// Result of sampling a cursor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathSample {
    /// World position of the cursor.
    pub position: Vec2,
    /// Unit direction of the segment the cursor occupies.
    pub heading: Vec2,
    /// Reports whether the final waypoint was reached.
    pub reached_end: bool,
}

impl Path {
    /// Builds a path from ordered waypoints.
    ///
    /// Zero-length segments are allowed and borrow the heading of the nearest
    /// segment with length.
    pub fn new(waypoints: Vec<Vec2>) -> Result<Self, ConfigError> {
        if waypoints.len() < 2 {
            return Err(ConfigError::DegeneratePath {
                waypoints: waypoints.len(),
            });
        }
        if let Some(index) = waypoints.iter().position(|point| !point.is_finite()) {
            return Err(ConfigError::NonFiniteWaypoint { index });
        }

        let mut segments = Vec::with_capacity(waypoints.len() - 1);
        let mut offset = 0.0;
        for pair in waypoints.windows(2) {
            let delta = pair[1] - pair[0];
            let length = delta.length();
            segments.push(Segment {
                start: pair[0],
                length,
                offset,
                direction: delta.normalize_or_zero(),
            });
            offset += length;
        }

        if offset <= 0.0 {
            return Err(ConfigError::ZeroLengthPath);
        }

        fill_degenerate_headings(&mut segments);

        Ok(Self {
            waypoints,
            segments,
            total_length: offset,
        })
    }

    /// Sum of all segment lengths.
    #[must_use]
    pub const fn total_length(&self) -> f32 {
        self.total_length
    }

    /// Cursor placed on the first waypoint.
    #[must_use]
    pub const fn start(&self) -> PathCursor {
        PathCursor {
            segment_index: 0,
            segment_offset: 0.0,
            distance_traveled: 0.0,
            finished: false,
        }
    }

    /// Moves `cursor` forward by `distance` and samples the new position.
    ///
    /// # Panics
    ///
    /// Panics when `distance` is negative or not finite, or when the cursor
    /// does not belong to this path.
    pub fn advance(&self, cursor: &mut PathCursor, distance: f32) -> PathSample {
        assert!(
            distance.is_finite() && distance >= 0.0,
            "path advance distance must be finite and non-negative, got {distance}"
        );
        assert!(
            cursor.segment_index < self.segments.len(),
            "cursor segment {} is outside the path",
            cursor.segment_index
        );

        if cursor.finished {
            return self.sample(cursor);
        }

        let last_segment = self.segments.len() - 1;
        let mut remaining = distance;
        loop {
            let segment = &self.segments[cursor.segment_index];
            let left_on_segment = segment.length - cursor.segment_offset;
            if remaining < left_on_segment {
                cursor.segment_offset += remaining;
                break;
            }

            remaining -= left_on_segment;
            if cursor.segment_index == last_segment {
                cursor.segment_offset = segment.length;
                cursor.finished = true;
                break;
            }
            cursor.segment_index += 1;
            cursor.segment_offset = 0.0;
        }

        let segment = &self.segments[cursor.segment_index];
        cursor.distance_traveled = if cursor.finished {
            self.total_length
        } else {
            segment.offset + cursor.segment_offset
        };

        self.sample(cursor)
    }

    /// Samples the position and heading of `cursor` without moving it.
    #[must_use]
    pub fn sample(&self, cursor: &PathCursor) -> PathSample {
        let index = cursor.segment_index.min(self.segments.len() - 1);
        let segment = &self.segments[index];
        let position = if cursor.finished {
            self.waypoints[self.waypoints.len() - 1]
        } else {
            segment.start + segment.direction * cursor.segment_offset
        };

        PathSample {
            position,
            heading: segment.direction,
            reached_end: cursor.finished,
        }
    }

    /// Fraction of the path covered by `cursor`, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self, cursor: &PathCursor) -> f32 {
        (cursor.distance_traveled / self.total_length).clamp(0.0, 1.0)
    }
}

fn fill_degenerate_headings(segments: &mut [Segment]) {
    let mut previous = None;
    for segment in segments.iter_mut() {
        if segment.length > 0.0 {
            previous = Some(segment.direction);
        } else if let Some(direction) = previous {
            segment.direction = direction;
        }
    }

    let mut following = None;
    for segment in segments.iter_mut().rev() {
        if segment.length > 0.0 {
            following = Some(segment.direction);
        } else if segment.direction == Vec2::ZERO {
            if let Some(direction) = following {
                segment.direction = direction;
            }
        }
    }
}
