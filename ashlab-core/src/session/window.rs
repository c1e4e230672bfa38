use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Time-of-day trading hours and the unit size traded inside them.
///
/// Not tied to a date; see [`SessionHours::for_date`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub unit_size: u32,
}

impl SessionHours {
    pub fn for_date(&self, date: NaiveDate) -> SessionWindow {
        SessionWindow {
            date,
            open: date.and_time(self.open),
            close: date.and_time(self.close),
            unit_size: self.unit_size,
        }
    }
}

impl Default for SessionHours {
    /// Regular US equity hours, 09:30 to 16:00, one unit.
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 30, 0).expect("09:30 is a valid time"),
            close: NaiveTime::from_hms_opt(16, 0, 0).expect("16:00 is a valid time"),
            unit_size: 1,
        }
    }
}

/// Trading window `[open, close)` on one calendar day.
///
/// Both endpoints fall on `date`; deserialization rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WindowFields")]
pub struct SessionWindow {
    date: NaiveDate,
    open: NaiveDateTime,
    close: NaiveDateTime,
    unit_size: u32,
}

#[derive(Deserialize)]
struct WindowFields {
    date: NaiveDate,
    open: NaiveDateTime,
    close: NaiveDateTime,
    unit_size: u32,
}

impl TryFrom<WindowFields> for SessionWindow {
    type Error = String;

    fn try_from(f: WindowFields) -> Result<Self, Self::Error> {
        if f.open.date() != f.date || f.close.date() != f.date {
            return Err(format!(
                "session window {} to {} is not on {}",
                f.open, f.close, f.date
            ));
        }
        Ok(Self {
            date: f.date,
            open: f.open,
            close: f.close,
            unit_size: f.unit_size,
        })
    }
}

impl SessionWindow {
    /// Default hours on `date`.
    pub fn regular(date: NaiveDate) -> Self {
        SessionHours::default().for_date(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn opens_at(&self) -> NaiveDateTime {
        self.open
    }

    pub fn closes_at(&self) -> NaiveDateTime {
        self.close
    }

    pub fn unit_size(&self) -> u32 {
        self.unit_size
    }

    /// Half-open check: the close boundary itself is outside the window.
    pub fn in_window(&self, timestamp: NaiveDateTime) -> bool {
        timestamp >= self.open && timestamp < self.close
    }

    /// Unit size inside the window, zero outside.
    pub fn allowed_size(&self, timestamp: NaiveDateTime) -> u32 {
        if self.in_window(timestamp) {
            self.unit_size
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 2, 22).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn open_boundary_is_inside() {
        let w = SessionWindow::regular(day());
        assert!(w.in_window(at(9, 30)));
        assert_eq!(w.allowed_size(at(9, 30)), 1);
    }

    #[test]
    fn close_boundary_is_outside() {
        let w = SessionWindow::regular(day());
        assert!(w.in_window(at(15, 59)));
        assert!(!w.in_window(at(16, 0)));
        assert_eq!(w.allowed_size(at(16, 0)), 0);
    }

    #[test]
    fn pre_market_is_outside() {
        let w = SessionWindow::regular(day());
        assert!(!w.in_window(at(9, 29)));
        assert!(!w.in_window(at(4, 0)));
    }

    #[test]
    fn other_calendar_day_is_outside() {
        let w = SessionWindow::regular(day());
        let next_day = NaiveDate::from_ymd_opt(2021, 2, 23)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert!(!w.in_window(next_day));
    }

    #[test]
    fn deserialized_window_must_stay_on_its_date() {
        let w = SessionWindow::regular(day());
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(serde_json::from_str::<SessionWindow>(&json).unwrap(), w);

        let mut value = serde_json::to_value(w).unwrap();
        value["open"] = serde_json::json!("2021-02-23T09:30:00");
        let err = serde_json::from_value::<SessionWindow>(value).unwrap_err();
        assert!(err.to_string().contains("is not on 2021-02-22"));
    }

    #[test]
    fn custom_hours_and_size() {
        let hours = SessionHours {
            open: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            close: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            unit_size: 5,
        };
        let w = hours.for_date(day());
        assert_eq!(w.allowed_size(at(9, 45)), 0);
        assert_eq!(w.allowed_size(at(10, 30)), 5);
        assert_eq!(w.allowed_size(at(11, 0)), 0);
        assert_eq!(w.unit_size(), 5);
    }
}
