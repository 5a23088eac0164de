use crate::time::{Interval, TimeOfDay};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Horaires d'ouverture par jour de semaine (0 = dimanche … 6 = samedi).
///
/// `None` signifie fermé toute la journée. Les bornes sont inclusives : un
/// cours peut finir exactement à l'heure de fermeture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    days: [Option<Interval>; 7],
}

impl Default for WorkingHours {
    /// Lundi–samedi 08:00–21:00, dimanche fermé.
    fn default() -> Self {
        let open = TimeOfDay::from_hm(8, 0).zip(TimeOfDay::from_hm(21, 0));
        let day = open.and_then(|(start, end)| Interval::new(start, end).ok());
        let mut days = [day; 7];
        days[0] = None;
        Self { days }
    }
}

impl WorkingHours {
    /// Établissement fermé tous les jours.
    pub fn closed() -> Self {
        Self { days: [None; 7] }
    }

    /// Même plage tous les jours, dimanche compris.
    pub fn uniform(hours: Interval) -> Self {
        Self {
            days: [Some(hours); 7],
        }
    }

    pub fn with_day(mut self, weekday: Weekday, hours: Option<Interval>) -> Self {
        self.days[weekday.num_days_from_sunday() as usize] = hours;
        self
    }

    pub fn hours_for(&self, weekday: Weekday) -> Option<Interval> {
        self.days[weekday.num_days_from_sunday() as usize]
    }

    pub fn is_within_working_hours(&self, date: NaiveDate, time: TimeOfDay) -> bool {
        self.hours_for(date.weekday())
            .is_some_and(|open| open.contains_inclusive(time))
    }

    /// Vrai si le début et la fin du créneau tombent dans les horaires du jour.
    pub fn allows(&self, date: NaiveDate, slot: &Interval) -> bool {
        self.is_within_working_hours(date, slot.start())
            && self.is_within_working_hours(date, slot.end())
    }
}
