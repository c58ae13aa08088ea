/// Identifier generation for albums and tracks
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use wavevault_core::{AlbumId, TrackId};

pub trait IdGenerator: Send + Sync {
    fn album_id(&self) -> AlbumId;
    fn track_id(&self) -> TrackId;
}

/// `ALB-<millis>` / `TRK-<millis>` ids from the wall clock
///
/// Two ids generated within the same millisecond would collide, so the
/// counter never hands out the same value twice: it takes the current time or
/// the previous value plus one, whichever is larger.
#[derive(Debug, Default)]
pub struct TimestampIdGenerator {
    last: AtomicI64,
}

impl TimestampIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_millis(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut last = self.last.load(Ordering::Acquire);
        loop {
            let next = now.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

impl IdGenerator for TimestampIdGenerator {
    fn album_id(&self) -> AlbumId {
        AlbumId::new(format!("ALB-{}", self.next_millis()))
    }

    fn track_id(&self) -> TrackId {
        TrackId::new(format!("TRK-{}", self.next_millis()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_prefix() {
        let ids = TimestampIdGenerator::new();
        assert!(ids.album_id().as_str().starts_with("ALB-"));
        assert!(ids.track_id().as_str().starts_with("TRK-"));
    }

    #[test]
    fn ids_are_strictly_increasing() {
        let ids = TimestampIdGenerator::new();
        let millis: Vec<i64> = (0..1000)
            .map(|_| {
                ids.album_id().as_str()["ALB-".len()..]
                    .parse::<i64>()
                    .unwrap()
            })
            .collect();
        assert!(millis.windows(2).all(|w| w[0] < w[1]));
    }
}
