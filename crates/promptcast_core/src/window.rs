use std::fmt;

/// Hour-of-day gate for publishing, as a half-open range `[start, end)` of
/// local hours. `start == end` covers the whole day; `start > end` wraps past
/// midnight (e.g. 19..7 is 19:00 through 06:59).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishWindow {
    start_hour: u8,
    end_hour: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    HourOutOfRange(u32),
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowError::HourOutOfRange(hour) => write!(f, "hour {hour} is outside 0..=23"),
        }
    }
}

impl std::error::Error for WindowError {}

impl PublishWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Result<Self, WindowError> {
        for hour in [start_hour, end_hour] {
            if hour > 23 {
                return Err(WindowError::HourOutOfRange(hour));
            }
        }
        Ok(Self {
            start_hour: start_hour as u8,
            end_hour: end_hour as u8,
        })
    }

    pub fn start_hour(&self) -> u32 {
        u32::from(self.start_hour)
    }

    pub fn end_hour(&self) -> u32 {
        u32::from(self.end_hour)
    }

    pub fn contains(&self, hour: u32) -> bool {
        if hour > 23 {
            return false;
        }
        let (start, end) = (self.start_hour(), self.end_hour());
        if start == end {
            true
        } else if start < end {
            (start..end).contains(&hour)
        } else {
            hour >= start || hour < end
        }
    }
}

impl fmt::Display for PublishWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start_hour, self.end_hour)
    }
}
